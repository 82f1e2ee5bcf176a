//! Graceful shutdown for the HTTP services.
//!
//! [`SignalHandler::spawn_listener`] waits for SIGTERM or SIGINT (Ctrl+C on
//! other platforms) and flips a watch flag. Servers hand a
//! [`ShutdownSignal`] to axum so in-flight requests drain before exit.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// Owner of the shutdown flag.
#[derive(Debug, Clone)]
pub struct SignalHandler {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self { flag: Arc::new(flag) }
    }

    /// Spawns the task that turns the first termination signal into a
    /// shutdown. Call once at startup.
    pub fn spawn_listener(&self) {
        let handler = self.clone();
        tokio::spawn(async move {
            let name = termination().await;
            info!(signal = name, "shutting down");
            handler.trigger_shutdown();
        });
    }

    /// A future-like handle that resolves once shutdown starts.
    pub fn shutdown(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.flag.subscribe(),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.flag.borrow()
    }

    pub fn trigger_shutdown(&self) {
        self.flag.send_replace(true);
    }
}

/// Resolves once shutdown has been requested.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub async fn wait(mut self) {
        // Sees a flag set before the call; a dropped sender also ends the wait.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

#[cfg(unix)]
async fn termination() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut term), Ok(mut int)) => tokio::select! {
            _ = term.recv() => "SIGTERM",
            _ = int.recv() => "SIGINT",
        },
        (Err(e), _) | (_, Err(e)) => {
            warn!("cannot install unix signal handlers ({e}), listening for Ctrl+C only");
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn termination() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl+C ({e}); shutdown only on request");
        std::future::pending::<()>().await;
    }
    "Ctrl+C"
}
