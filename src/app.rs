use log::debug;
use std::ffi::OsString;

use crate::{
    dispatch::{NativeBinary, dispatch},
    error::WrapperError,
    install::config::Config,
    manifest::BUILTIN_VERSION,
    platform::PlatformKey,
    runtime::Runtime,
};

/// Entry point for one invocation on the host described by `os`/`arch`.
///
/// The platform is resolved before `load_config` reads anything from disk,
/// so an unsupported host reports that even when the payload is broken.
#[tracing::instrument(skip(load_config, args))]
pub async fn start<R, F>(
    os: &str,
    arch: &str,
    load_config: F,
    args: &[OsString],
) -> Result<i32, WrapperError>
where
    R: Runtime + Clone,
    F: FnOnce() -> Result<Config<R>, WrapperError>,
{
    let key = PlatformKey::from_parts(os, arch)?;
    debug!("Host platform: {}", key);

    let config = load_config()?;
    run(&config, key, args).await
}

/// Make sure the native binary for `key` is in place, run it with `args`,
/// and return the exit code to terminate with.
#[tracing::instrument(skip(config, args))]
pub async fn run<R: Runtime + Clone>(
    config: &Config<R>,
    key: PlatformKey,
    args: &[OsString],
) -> Result<i32, WrapperError> {
    let installer = config.installer();
    let binary_path = installer.binary_path(key);
    if config.exe == binary_path {
        return Err(WrapperError::installation(
            &binary_path,
            anyhow::anyhow!("the wrapper itself occupies the install path"),
        ));
    }

    let record = installer.ensure_installed(key).await?;
    let binary = NativeBinary::new(record.path);

    // The lookup is bounded, so it never outlives a short ccline run by much
    let checker = config.version_checker();
    let (code, notice) = tokio::join!(
        dispatch(&binary, args),
        checker.check_for_update(&config.manifest.version),
    );
    let code = code?;

    if let Some(notice) = notice {
        eprintln!("{}", notice);
    }
    debug!(
        "Wrapper {} finished with exit code {}",
        BUILTIN_VERSION, code
    );
    Ok(code)
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::http::HttpClient;
    use crate::install::paths::RECORD_FILE;
    use crate::manifest::ReleaseManifest;
    use crate::runtime::RealRuntime;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    /// A payload directory whose only binary is a shell script for this host.
    fn payload(dir: &Path, script: &str) -> ReleaseManifest {
        let key = PlatformKey::detect().unwrap();
        let binary = dir.join(key.to_string()).join(key.binary_name());
        fs::create_dir_all(binary.parent().unwrap()).unwrap();
        fs::write(&binary, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();

        let manifest = format!(
            r#"{{
                "version": "1.0.4",
                "update_check_url": "http://127.0.0.1:9/latest",
                "artifacts": {{ "{key}": {{ "path": "{key}/{name}" }} }}
            }}"#,
            key = key,
            name = key.binary_name()
        );
        let manifest_path = dir.join("manifest.json");
        fs::write(&manifest_path, manifest).unwrap();
        ReleaseManifest::load(&RealRuntime, &manifest_path).unwrap()
    }

    fn config(root: &Path, manifest: ReleaseManifest) -> Config<RealRuntime> {
        Config {
            runtime: RealRuntime,
            http: HttpClient::with_defaults().unwrap(),
            exe: root.join("bin").join("ccline-wrapper"),
            install_dir: root.join("home/.claude/ccline"),
            manifest,
            update_check_timeout: Duration::from_millis(200),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_run_installs_then_dispatches() {
        let root = tempdir().unwrap();
        let manifest = payload(&root.path().join("dist"), "exit 5");
        let config = config(root.path(), manifest);

        let code = run(&config, PlatformKey::detect().unwrap(), &[OsString::from("--version")]).await.unwrap();

        assert_eq!(code, 5);
        assert!(config.install_dir.join(RECORD_FILE).is_file());
        let key = PlatformKey::detect().unwrap();
        assert!(config.install_dir.join(key.binary_name()).is_file());
    }

    #[tokio::test]
    async fn test_run_refuses_to_dispatch_to_itself() {
        let root = tempdir().unwrap();
        let manifest = payload(&root.path().join("dist"), "exit 0");
        let mut config = config(root.path(), manifest);
        let key = PlatformKey::detect().unwrap();
        config.exe = config.install_dir.join(key.binary_name());

        let err = run(&config, PlatformKey::detect().unwrap(), &[]).await.unwrap_err();
        assert!(matches!(err, WrapperError::Installation { .. }));
    }

    #[tokio::test]
    async fn test_run_reports_missing_artifact_as_unsupported() {
        let root = tempdir().unwrap();
        let dist = root.path().join("dist");
        fs::create_dir_all(&dist).unwrap();
        fs::write(
            dist.join("manifest.json"),
            r#"{"version": "1.0.4", "artifacts": {}}"#,
        )
        .unwrap();
        let manifest = ReleaseManifest::load(&RealRuntime, &dist.join("manifest.json")).unwrap();
        let config = config(root.path(), manifest);

        let err = run(&config, PlatformKey::detect().unwrap(), &[]).await.unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_UNSUPPORTED_PLATFORM);
    }
}
