// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Termination signal watching and the shutdown coordinator.
//!
//! The coordinator is an explicit task bound to the worker handle's
//! lifetime: it is spawned only after the handle exists and before the run
//! starts, and it is cancelled and joined when the orchestrator reaches the
//! disconnect step. Exactly one signal kind triggers a stop; everything else
//! is observed and ignored.

use crate::worker::Worker;
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Termination-relevant signal kinds observed by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    /// SIGQUIT: the graceful-termination request
    Quit,
    /// SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGHUP
    Hangup,
}

impl fmt::Display for TermSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TermSignal::Quit => "SIGQUIT",
            TermSignal::Interrupt => "SIGINT",
            TermSignal::Terminate => "SIGTERM",
            TermSignal::Hangup => "SIGHUP",
        };
        write!(f, "{name}")
    }
}

/// Watches a signal channel and converts graceful-termination requests into
/// `stop` calls on the running worker.
pub struct ShutdownCoordinator {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Spawn the coordinator task over the given signal channel.
    ///
    /// Every [`TermSignal::Quit`] delivers one `stop` call; duplicate quits
    /// deliver duplicate stops, which the worker contract requires to be
    /// safe. All other signal kinds are logged and ignored.
    pub fn spawn(mut signals: mpsc::Receiver<TermSignal>, worker: Arc<dyn Worker>) -> Self {
        let token = CancellationToken::new();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    sig = signals.recv() => match sig {
                        Some(TermSignal::Quit) => {
                            debug!("Received signal `{}`", TermSignal::Quit);
                            worker.stop();
                        }
                        Some(other) => {
                            debug!("Ignoring signal `{other}`");
                        }
                        None => break,
                    },
                }
            }
        });

        Self { handle, token }
    }

    /// Cancel the coordinator and wait for its task to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            error!("Shutdown coordinator task failed: {}", e);
        }
    }
}

/// Wire the OS signal streams into a channel consumable by the coordinator.
pub fn os_signals() -> io::Result<mpsc::Receiver<TermSignal>> {
    let (tx, rx) = mpsc::channel(8);

    let watched = [
        (SignalKind::quit(), TermSignal::Quit),
        (SignalKind::interrupt(), TermSignal::Interrupt),
        (SignalKind::terminate(), TermSignal::Terminate),
        (SignalKind::hangup(), TermSignal::Hangup),
    ];

    for (kind, sig) in watched {
        let mut stream = signal(kind)?;
        let tx = tx.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                if tx.send(sig).await.is_err() {
                    break;
                }
            }
        });
    }

    Ok(rx)
}
