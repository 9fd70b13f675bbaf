// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! # Data Models
//!
//! Row and wire types shared by the auth pipeline, the provider clients, and
//! the REST API. All API-facing types derive `Serialize`, `Deserialize`, and
//! `ToSchema` for automatic JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Identity**: the provider-owned principal (read-only to this system)
//! - **Profile**: our own `user_profiles` row, keyed 1:1 by identity id
//! - **Usage**: append-only `module_usage` rows

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

// =============================================================================
// Identity
// =============================================================================

/// A verified principal as returned by the identity provider.
///
/// Produced and owned entirely by the provider; this system never writes it.
/// The `id` is stable across calls for the same underlying principal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Identity {
    /// Stable unique identifier assigned by the provider.
    pub id: String,
    /// Email address on record with the provider.
    pub email: String,
    /// Free-form user metadata (e.g. `full_name` captured at sign-up).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Identity {
    /// The `full_name` metadata field, empty string when absent.
    pub fn full_name(&self) -> String {
        self.metadata.get("full_name").cloned().unwrap_or_default()
    }
}

// =============================================================================
// Profile
// =============================================================================

/// A `user_profiles` row.
///
/// Exactly one profile exists per identity that has authenticated at least
/// once; the reconciler creates it on first sight with `role = user`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Profile {
    /// Primary key, equal to the identity's `id`. Immutable.
    pub id: String,
    /// Email synced from the identity at creation.
    pub email: String,
    /// Display name, mutable by the owning user.
    pub full_name: String,
    /// Authorization role. Mutable only through the admin-gated endpoint.
    pub role: Role,
    /// Row creation timestamp (store-assigned).
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp (store-assigned).
    pub updated_at: DateTime<Utc>,
}

/// Payload for the conflict-tolerant profile upsert (first-sight creation).
///
/// The store treats `id` as the conflict key; a concurrent insert of the same
/// identity converges to a single row instead of erroring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl NewProfile {
    /// Build the first-sight payload for a verified identity.
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            full_name: identity.full_name(),
            role: Role::User,
        }
    }
}

// =============================================================================
// Usage
// =============================================================================

/// Outcome status of a module run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    /// The module run finished and produced output.
    Completed,
    /// The module run failed.
    Failed,
    /// The module run is still in flight.
    Processing,
}

impl Default for UsageStatus {
    fn default() -> Self {
        UsageStatus::Completed
    }
}

/// A `module_usage` row. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UsageRecord {
    /// Unique identifier for this record.
    pub id: String,
    /// The profile/identity id the run is attributed to.
    pub user_id: String,
    /// Name of the module that was run.
    pub module_name: String,
    /// Input payload as captured at run time.
    pub input_data: serde_json::Value,
    /// Output payload, if any.
    pub output_data: serde_json::Value,
    /// Wall-clock processing time in milliseconds.
    pub processing_time_ms: i64,
    /// Outcome of the run.
    pub status: UsageStatus,
    /// Row creation timestamp (store-assigned).
    pub created_at: DateTime<Utc>,
}

/// The profile fields joined into each row of the admin usage listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UsageActor {
    pub email: String,
    pub full_name: String,
}

/// A `module_usage` row for the admin listing, with the owning profile's
/// contact fields embedded by the store-side join.
///
/// `user` is `None` when the profile row is gone (e.g. a deleted account
/// whose usage rows remain).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AdminUsageRecord {
    #[serde(flatten)]
    pub record: UsageRecord,
    #[serde(rename = "user_profiles")]
    pub user: Option<UsageActor>,
}

/// A usage record before the store assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct NewUsageRecord {
    pub user_id: String,
    pub module_name: String,
    #[serde(default)]
    pub input_data: serde_json::Value,
    #[serde(default)]
    pub output_data: serde_json::Value,
    #[serde(default)]
    pub processing_time_ms: i64,
    #[serde(default)]
    pub status: UsageStatus,
}
