//! Runs the installed native binary in the foreground.

use async_trait::async_trait;
use log::debug;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};

use crate::error::WrapperError;

/// Exit code reported when the child ended without a code or a signal.
const EXIT_UNKNOWN: i32 = 1;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Executable: Send + Sync {
    /// Runs to completion with `args`, returning the exit code to propagate.
    async fn run(&self, args: &[OsString]) -> Result<i32, WrapperError>;
}

/// The native ccline binary at its install path.
#[derive(Debug, Clone)]
pub struct NativeBinary {
    path: PathBuf,
}

impl NativeBinary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dispatch_error(&self, source: io::Error) -> WrapperError {
        WrapperError::Dispatch {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl Executable for NativeBinary {
    #[tracing::instrument(skip(self, args), fields(path = %self.path.display()))]
    async fn run(&self, args: &[OsString]) -> Result<i32, WrapperError> {
        // Claude Code talks to ccline over stdin/stdout; nothing is captured
        let mut child = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.dispatch_error(e))?;

        let status = wait_with_signals(&mut child)
            .await
            .map_err(|e| self.dispatch_error(e))?;

        let code = exit_code(status);
        debug!("ccline exited with {} ({})", code, status);
        Ok(code)
    }
}

/// Forwards to `exe` and reports the exit code to terminate with.
pub async fn dispatch<E: Executable + ?Sized>(
    exe: &E,
    args: &[OsString],
) -> Result<i32, WrapperError> {
    debug!("Dispatching {:?}", args);
    exe.run(args).await
}

/// Waits for the child without dying first and orphaning it.
///
/// A terminal Ctrl-C already reaches the whole foreground process group, so
/// SIGINT is only absorbed here. SIGTERM is aimed at the wrapper alone and is
/// relayed to the child.
#[cfg(unix)]
async fn wait_with_signals(child: &mut Child) -> io::Result<ExitStatus> {
    use nix::sys::signal::Signal;
    use tokio::signal::unix::{SignalKind, signal};

    let pid = child.id();
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            status = child.wait() => return status,
            _ = interrupt.recv() => debug!("SIGINT received, waiting for ccline"),
            _ = terminate.recv() => forward_signal(pid, Signal::SIGTERM),
        }
    }
}

#[cfg(unix)]
fn forward_signal(pid: Option<u32>, sig: nix::sys::signal::Signal) {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return;
    };
    debug!("Forwarding {} to ccline (pid {})", sig, pid);
    if let Err(e) = kill(Pid::from_raw(pid as i32), sig) {
        debug!("Failed to forward {}: {}", sig, e);
    }
}

/// Ctrl-C reaches the whole console process group, so the child sees it
/// directly. Keep waiting so its exit code is still reported.
#[cfg(not(unix))]
async fn wait_with_signals(child: &mut Child) -> io::Result<ExitStatus> {
    loop {
        tokio::select! {
            status = child.wait() => return status,
            _ = tokio::signal::ctrl_c() => debug!("Ctrl-C received, waiting for ccline"),
        }
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }

    EXIT_UNKNOWN
}
