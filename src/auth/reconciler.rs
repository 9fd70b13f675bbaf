// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! The profile reconciler.
//!
//! Guarantees a one-to-one mapping between a verified identity and a
//! persisted `user_profiles` row:
//!
//! 1. fetch by id; found rows are returned unchanged (no write)
//! 2. otherwise upsert the first-sight payload with `id` as the conflict key;
//!    a concurrent first-sight insert converges to the single existing row
//! 3. if the upsert itself fails, one final fetch retry runs before the
//!    terminal failure surfaces - the common failure mode is the create
//!    racing a concurrent create, not a backend outage
//!
//! A reconciled profile is always a persisted row; no code path fabricates
//! one locally and treats it as authoritative.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{Identity, NewProfile, Profile};
use crate::provider::{ProfileStore, ProviderError};

use super::AuthError;

pub struct ProfileReconciler {
    store: Arc<dyn ProfileStore>,
}

impl ProfileReconciler {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Resolve `identity` to its persisted profile, creating the row on
    /// first sight.
    ///
    /// Idempotent after the first success: subsequent calls are a pure read.
    pub async fn reconcile(&self, identity: &Identity) -> Result<Profile, AuthError> {
        match self.store.fetch_by_id(&identity.id).await {
            Ok(profile) => return Ok(profile),
            Err(ProviderError::NotFound) => {}
            Err(e) => {
                // A fetch error and a genuine miss both proceed to the
                // conflict-tolerant upsert; the two are indistinguishable to
                // the caller. The detail stays visible in the log.
                debug!(user_id = %identity.id, error = %e, "profile fetch failed, attempting upsert");
            }
        }

        let payload = NewProfile::for_identity(identity);
        let upsert_error = match self.store.upsert(&payload).await {
            Ok(profile) => return Ok(profile),
            Err(e) => e,
        };

        warn!(
            user_id = %identity.id,
            error = %upsert_error,
            "profile upsert failed, retrying fetch"
        );

        self.store.fetch_by_id(&identity.id).await.map_err(|e| {
            warn!(user_id = %identity.id, error = %e, "profile reconciliation failed");
            AuthError::ProfileReconciliationFailed
        })
    }
}
