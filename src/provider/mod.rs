// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! # Identity Provider & Row Store Contracts
//!
//! Trait seams for everything this system consumes from the hosted
//! backend-as-a-service: token verification, session lifecycle, profile rows,
//! and usage rows. The HTTP implementations in [`identity`], [`profiles`],
//! and [`usage`] speak the provider's REST surface through the shared client
//! in [`http`]; tests substitute the in-memory doubles in `memory`.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::auth::Role;
use crate::models::{AdminUsageRecord, Identity, NewProfile, NewUsageRecord, Profile, UsageRecord};

pub mod http;
pub mod identity;
pub mod profiles;
pub mod usage;

#[cfg(test)]
pub mod memory;

pub use http::ProviderClient;
pub use identity::HttpIdentityProvider;
pub use profiles::HttpProfileStore;
pub use usage::HttpUsageStore;

/// Errors from provider calls.
///
/// These never cross the HTTP boundary verbatim; callers map them onto the
/// stable outward error taxonomy and log the detail.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider configuration missing: {0}")]
    MissingConfig(String),

    #[error("provider rejected the credential: {0}")]
    Rejected(String),

    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider response was invalid: {0}")]
    InvalidResponse(String),

    #[error("row not found")]
    NotFound,
}

/// A change to the identity provider's session, delivered to subscribers in
/// arrival order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session was established (sign-in or signup with auto-confirm).
    SignedIn(Identity),
    /// The session's token was refreshed; the identity is unchanged.
    TokenRefreshed(Identity),
    /// The session ended (sign-out, or the provider reported no session).
    SignedOut,
}

/// The identity provider contract: verify, session lookup, change
/// notifications, invalidation.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an opaque bearer token for a verified identity.
    ///
    /// Token validation is entirely the provider's job; no local
    /// cryptographic check happens on this side.
    async fn verify_token(&self, token: &str) -> Result<Identity, ProviderError>;

    /// Look up the currently held session, if any.
    async fn fetch_session(&self) -> Result<Option<Identity>, ProviderError>;

    /// Subscribe to session change notifications.
    fn subscribe_session_changes(&self) -> broadcast::Receiver<SessionEvent>;

    /// Invalidate the currently held session.
    async fn invalidate_session(&self) -> Result<(), ProviderError>;
}

/// Mutable fields accepted by [`ProfileStore::update`]. Absent fields are
/// left untouched by the store.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// The `user_profiles` row store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile with the given id. `Err(NotFound)` when no row exists.
    async fn fetch_by_id(&self, id: &str) -> Result<Profile, ProviderError>;

    /// Insert-or-converge on the row keyed by `payload.id`.
    ///
    /// Must be conflict-tolerant on the primary key: a concurrent insert of
    /// the same id converges to the single existing row (last write wins on
    /// the payload) instead of erroring.
    async fn upsert(&self, payload: &NewProfile) -> Result<Profile, ProviderError>;

    /// Apply `changes` to an existing row and return the updated row.
    async fn update(&self, id: &str, changes: &ProfileChanges) -> Result<Profile, ProviderError>;

    /// List all profiles, newest first.
    async fn list(&self) -> Result<Vec<Profile>, ProviderError>;
}

/// The append-only `module_usage` row store.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Insert a usage row and return it with store-assigned fields.
    async fn insert(&self, entry: &NewUsageRecord) -> Result<UsageRecord, ProviderError>;

    /// List one user's usage rows, newest first.
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<UsageRecord>, ProviderError>;

    /// List all usage rows, newest first, with the owning profile's contact
    /// fields joined in. Admin surface only.
    async fn list_all(&self, limit: usize) -> Result<Vec<AdminUsageRecord>, ProviderError>;
}
