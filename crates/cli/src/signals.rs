use flume::Sender;
use tokio::signal::unix::{SignalKind, signal};
use tracing::debug;

/// Events the signal handlers translate Unix signals into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    /// SIGINT / SIGTERM: stop the loop after the in-flight cycle.
    Shutdown,
    /// SIGHUP: re-read the config files and push the result to the engine.
    ReloadConfig,
    /// SIGUSR1: log the current config and actuation state.
    DumpStatus,
}

/// Install the Unix signal handlers and forward every delivery as a
/// [`SignalEvent`]. Never returns on its own; the caller aborts the task
/// once the engine has stopped.
pub async fn wait_for_signal(tx: Sender<SignalEvent>) -> anyhow::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    let mut user1 = signal(SignalKind::user_defined1())?;

    loop {
        let event = tokio::select! {
            _ = interrupt.recv() => SignalEvent::Shutdown,
            _ = terminate.recv() => SignalEvent::Shutdown,
            _ = hangup.recv() => SignalEvent::ReloadConfig,
            _ = user1.recv() => SignalEvent::DumpStatus,
        };
        debug!(?event, "signal received");
        tx.send_async(event).await?;
    }
}
