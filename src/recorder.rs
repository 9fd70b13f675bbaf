// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! The usage recorder.
//!
//! Best-effort logging of module-run outcomes, attributed to the verified
//! identity. A failed write is logged and swallowed - it never surfaces as a
//! failure of the operation it is attached to, and it never blocks that
//! operation's completion.

use std::sync::Arc;

use tracing::warn;

use crate::models::{Identity, NewUsageRecord, UsageStatus};
use crate::provider::UsageStore;

/// Fields of a usage record the caller supplies; attribution is added by the
/// recorder from the verified identity.
#[derive(Debug, Clone)]
pub struct UsageEntry {
    pub module_name: String,
    pub input_data: serde_json::Value,
    pub output_data: serde_json::Value,
    pub processing_time_ms: i64,
    pub status: UsageStatus,
}

#[derive(Clone)]
pub struct UsageRecorder {
    store: Arc<dyn UsageStore>,
}

impl UsageRecorder {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    /// Record a module run, fire-and-forget.
    ///
    /// Skipped entirely when no identity is present - records are never
    /// attributed to an anonymous bucket. The insert runs on its own task so
    /// the calling operation completes without waiting for it.
    pub fn record(&self, identity: Option<&Identity>, entry: UsageEntry) {
        let Some(identity) = identity else {
            return;
        };

        let record = NewUsageRecord {
            user_id: identity.id.clone(),
            module_name: entry.module_name,
            input_data: entry.input_data,
            output_data: entry.output_data,
            processing_time_ms: entry.processing_time_ms,
            status: entry.status,
        };

        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.insert(&record).await {
                warn!(
                    user_id = %record.user_id,
                    module_name = %record.module_name,
                    error = %e,
                    "failed to record module usage"
                );
            }
        });
    }
}
