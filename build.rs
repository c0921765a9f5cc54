fn main() {
    println!("cargo:rerun-if-env-changed=CCLINE_RELEASE_VERSION");

    // The packaging pipeline stamps the native release this wrapper ships with.
    // Without it, the wrapper and the native binary share a version number.
    let version = std::env::var("CCLINE_RELEASE_VERSION")
        .ok()
        .map(|v| v.trim().trim_start_matches('v').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| std::env::var("CARGO_PKG_VERSION").unwrap_or_default());

    println!("cargo:rustc-env=CCLINE_RELEASE_VERSION={}", version);
}
