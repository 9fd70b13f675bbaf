// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! The client-side session controller.
//!
//! Owns the process-wide current-session state for an application shell:
//! looks up any provider-held session at startup, re-runs profile
//! reconciliation on every session-change notification, and publishes the
//! resulting [`SessionState`] through a watch channel.
//!
//! The change subscription lives exactly as long as the [`SessionSubscription`]
//! guard returned by [`SessionController::start`]; dropping the guard (when
//! the owning UI surface is torn down) releases it.
//!
//! Notifications are processed by a single task in arrival order, so a
//! notification arriving while a reconciliation is in flight is buffered,
//! not dropped, and the latest notification's resulting state wins.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::auth::ProfileReconciler;
use crate::models::{Identity, Profile};
use crate::provider::{IdentityProvider, ProfileStore, SessionEvent};

/// Current session state of the process.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Before the controller has started.
    Uninitialized,
    /// Startup lookup in progress.
    Loading,
    /// A verified identity with its reconciled profile.
    ///
    /// Only ever built from a completed reconciliation; there is no
    /// half-authenticated state.
    Authenticated {
        identity: Identity,
        profile: Profile,
    },
    /// No session (signed out, or recovery from a failed reconciliation).
    Anonymous,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            SessionState::Authenticated { profile, .. } => Some(profile),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.profile()
            .map(|p| p.role == crate::auth::Role::Admin)
            .unwrap_or(false)
    }
}

/// Guard for the session-change subscription.
///
/// Dropping it stops the controller's event task and releases the
/// subscription (scoped acquisition/release; no process-lifetime global).
pub struct SessionSubscription {
    task: JoinHandle<()>,
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct SessionController {
    provider: Arc<dyn IdentityProvider>,
    reconciler: Arc<ProfileReconciler>,
    state: watch::Sender<SessionState>,
}

impl SessionController {
    pub fn new(provider: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            provider,
            reconciler: Arc::new(ProfileReconciler::new(profiles)),
            state,
        }
    }

    /// Watch the session state. The receiver always holds the latest value.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Start the controller: run the startup session lookup, then process
    /// change notifications until the returned guard is dropped.
    pub fn start(self: &Arc<Self>) -> SessionSubscription {
        // Subscribe before the startup lookup so a sign-in racing startup is
        // buffered rather than missed.
        let events = self.provider.subscribe_session_changes();
        let controller = self.clone();

        let task = tokio::spawn(async move {
            controller.state.send_replace(SessionState::Loading);

            match controller.provider.fetch_session().await {
                Ok(existing) => controller.apply(existing).await,
                Err(e) => {
                    warn!(error = %e, "startup session lookup failed");
                    controller.state.send_replace(SessionState::Anonymous);
                }
            }

            controller.run_event_loop(events).await;
        });

        SessionSubscription { task }
    }

    /// Sign out: instruct the provider to invalidate the session, then clear
    /// local state no matter what the provider call returned.
    pub async fn sign_out(&self) {
        if let Err(e) = self.provider.invalidate_session().await {
            warn!(error = %e, "provider session invalidation failed; clearing local state anyway");
        }
        self.state.send_replace(SessionState::Anonymous);
    }

    async fn run_event_loop(&self, mut events: broadcast::Receiver<SessionEvent>) {
        loop {
            match events.recv().await {
                Ok(SessionEvent::SignedIn(identity))
                | Ok(SessionEvent::TokenRefreshed(identity)) => {
                    self.apply(Some(identity)).await;
                }
                Ok(SessionEvent::SignedOut) => {
                    self.state.send_replace(SessionState::Anonymous);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Only the latest notification's state matters; the next
                    // recv resumes at the newest buffered event.
                    debug!(skipped, "session event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Reconcile-then-transition for one notification.
    ///
    /// Reconciliation failure fails open to `Anonymous`, never to a
    /// half-built authenticated state.
    async fn apply(&self, identity: Option<Identity>) {
        let next = match identity {
            Some(identity) => match self.reconciler.reconcile(&identity).await {
                Ok(profile) => SessionState::Authenticated { identity, profile },
                Err(e) => {
                    warn!(error = %e, "session reconciliation failed; treating as signed out");
                    SessionState::Anonymous
                }
            },
            None => SessionState::Anonymous,
        };
        self.state.send_replace(next);
    }
}
