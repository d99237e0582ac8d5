//! Spawn-and-wait handoff with signal forwarding.

use std::process::ExitStatus;

use tokio::process::Child;
use tracing::{debug, info, warn};

use super::{HandoffError, WorkerCommand};

/// Runs the worker as a child and returns the exit code to propagate.
pub async fn supervise(cmd: &WorkerCommand) -> Result<u8, HandoffError> {
    // Handlers are installed before spawning; early signals queue up and
    // are relayed once the worker exists.
    let mut relay = SignalRelay::install().map_err(HandoffError::Signals)?;

    let mut child = tokio::process::Command::from(cmd.to_std())
        .spawn()
        .map_err(|e| HandoffError::from_start(cmd, e))?;

    info!(
        "Worker started (pid {})",
        child.id().map_or_else(|| "?".to_owned(), |id| id.to_string())
    );

    let status = relay.wait(&mut child).await.map_err(HandoffError::Wait)?;
    let code = exit_code_of(status);
    info!("Worker exited with {} (code {})", status, code);

    Ok(code)
}

/// Maps a child's exit status to the code the supervisor exits with.
///
/// A worker killed by a signal yields `128 + signal`, as a shell reports it.
#[must_use]
pub fn exit_code_of(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code & 0xff).unwrap_or(1);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return u8::try_from(128 + signal).unwrap_or(1);
        }
    }

    1
}

/// Termination signals the supervisor relays to the worker.
#[cfg(unix)]
struct SignalRelay {
    term: tokio::signal::unix::Signal,
    int: tokio::signal::unix::Signal,
    hup: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalRelay {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
            hup: signal(SignalKind::hangup())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    async fn wait(&mut self, child: &mut Child) -> std::io::Result<ExitStatus> {
        use nix::sys::signal::Signal;

        loop {
            let received = tokio::select! {
                status = child.wait() => return status,
                _ = self.term.recv() => Signal::SIGTERM,
                _ = self.int.recv() => Signal::SIGINT,
                _ = self.hup.recv() => Signal::SIGHUP,
                _ = self.quit.recv() => Signal::SIGQUIT,
            };
            forward(child, received);
        }
    }
}

#[cfg(unix)]
fn forward(child: &Child, sig: nix::sys::signal::Signal) {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        debug!("Worker already exited; dropping {}", sig);
        return;
    };

    match kill(Pid::from_raw(pid), sig) {
        Ok(()) => info!("Forwarded {} to worker (pid {})", sig, pid),
        Err(e) => warn!("Failed to forward {} to worker (pid {}): {}", sig, pid, e),
    }
}

#[cfg(not(unix))]
struct SignalRelay;

#[cfg(not(unix))]
impl SignalRelay {
    #[allow(clippy::unnecessary_wraps)]
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn wait(&mut self, child: &mut Child) -> std::io::Result<ExitStatus> {
        tokio::select! {
            status = child.wait() => status,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping worker...");
                if let Err(e) = child.start_kill() {
                    warn!("Failed to stop worker: {}", e);
                }
                child.wait().await
            }
        }
    }
}
