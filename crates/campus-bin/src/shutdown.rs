// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Graceful shutdown.
//!
//! A [`ShutdownCoordinator`] holds a `watch` channel that moves once from
//! "running" to the [`ShutdownReason`] that stopped the process. The HTTP
//! server and the revocation sweeper each hold a [`ShutdownSignal`]; both
//! resolve even when they subscribe after the transition.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

// =============================================================================
// ShutdownReason
// =============================================================================

/// What stopped the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGTERM.
    Terminate,
    /// SIGINT or Ctrl+C.
    Interrupt,
    /// [`ShutdownCoordinator::initiate_shutdown`] was called.
    Requested,
    /// The HTTP server stopped on its own.
    ServerExited,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Terminate => "SIGTERM",
            Self::Interrupt => "SIGINT",
            Self::Requested => "requested",
            Self::ServerExited => "server exited",
        };
        f.write_str(text)
    }
}

// =============================================================================
// ShutdownCoordinator
// =============================================================================

/// Shared shutdown state. Clones observe the same transition.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    state: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator in the running state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Returns a future-producing handle that resolves once shutdown begins.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.state.subscribe(),
        }
    }

    /// Requests shutdown.
    pub fn initiate_shutdown(&self) {
        self.shutdown_with(ShutdownReason::Requested);
    }

    /// Begins shutdown for `reason`. Only the first call has an effect.
    pub fn shutdown_with(&self, reason: ShutdownReason) {
        let changed = self.state.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
        if changed {
            info!(%reason, "Shutdown initiated");
        }
    }

    /// Returns the reason once shutdown has begun.
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.state.borrow()
    }

    /// Returns `true` once shutdown has begun.
    pub fn is_shutdown_initiated(&self) -> bool {
        self.reason().is_some()
    }

    /// Waits for an OS signal or an earlier [`shutdown_with`](Self::shutdown_with)
    /// and returns the reason that won.
    pub async fn wait_for_shutdown(&self) -> ShutdownReason {
        let signal = self.shutdown_signal();
        tokio::select! {
            reason = os_signal() => {
                self.shutdown_with(reason);
            }
            _ = signal.wait() => {}
        }
        self.reason().unwrap_or(ShutdownReason::Requested)
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on SIGTERM or SIGINT (Ctrl+C elsewhere).
///
/// If no handler can be installed this never resolves; requested shutdown
/// still works.
async fn os_signal() -> ShutdownReason {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => tokio::select! {
                _ = sigterm.recv() => ShutdownReason::Terminate,
                _ = sigint.recv() => ShutdownReason::Interrupt,
            },
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to install signal handlers");
                std::future::pending().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => ShutdownReason::Interrupt,
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending().await
            }
        }
    }
}

// =============================================================================
// ShutdownSignal
// =============================================================================

/// One subscriber's view of the shutdown state.
pub struct ShutdownSignal {
    receiver: watch::Receiver<Option<ShutdownReason>>,
}

impl ShutdownSignal {
    /// Resolves once shutdown has begun, including when it already has.
    pub async fn wait(mut self) {
        // Err only once every coordinator is dropped.
        let _ = self.receiver.wait_for(Option::is_some).await;
    }
}

// =============================================================================
// Tests
// =============================================================================
