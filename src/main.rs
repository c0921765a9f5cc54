use clap::Parser;
use std::ffi::OsString;
use std::process;

use ccline::app;
use ccline::error::WrapperError;
use ccline::install::config::Config;
use ccline::install::paths::default_install_dir;
use ccline::runtime::RealRuntime;

/// ccline - Claude Code status line
///
/// Installs the native ccline binary for this platform on first use and
/// runs it with the given arguments. Every argument, including --help and
/// --version, belongs to the native binary.
#[derive(Parser, Debug)]
#[command(
    name = "ccline",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Arguments passed through to the native binary
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<OsString>,
}

impl Cli {
    /// Parse the wrapper's own arguments (without the binary name).
    ///
    /// A leading `--` ends option parsing, so every argument, including a
    /// user-supplied `--`, is kept verbatim and in order.
    fn parse_passthrough<I>(raw: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        let argv = [OsString::from("ccline"), OsString::from("--")]
            .into_iter()
            .chain(raw);
        Self::parse_from(argv)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse_passthrough(std::env::args_os().skip(1));
    let runtime = RealRuntime;

    let load_config = || {
        Config::load(runtime).map_err(|e| {
            WrapperError::installation(default_install_dir(&runtime).unwrap_or_default(), e)
        })
    };
    let result = app::start(
        std::env::consts::OS,
        std::env::consts::ARCH,
        load_config,
        &cli.args,
    )
    .await;

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            let code = e.exit_code();
            eprintln!("ccline: {:#}", anyhow::Error::from(e));
            process::exit(code);
        }
    }
}
