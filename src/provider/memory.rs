// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! In-memory provider doubles for tests.
//!
//! These implement the provider traits over plain maps, with knobs for
//! injecting failures and simulating a concurrent reconciliation winning a
//! first-sight race.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{
    IdentityProvider, ProfileChanges, ProfileStore, ProviderError, SessionEvent, UsageStore,
};
use crate::models::{
    AdminUsageRecord, Identity, NewProfile, NewUsageRecord, Profile, UsageActor, UsageRecord,
};

// =============================================================================
// Identity provider double
// =============================================================================

pub struct MemoryIdentityProvider {
    tokens: Mutex<HashMap<String, Identity>>,
    session: Mutex<Option<Identity>>,
    events: broadcast::Sender<SessionEvent>,
    invalidate_fails: AtomicBool,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            tokens: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            events,
            invalidate_fails: AtomicBool::new(false),
        }
    }

    /// Register a token the provider will accept.
    pub fn issue_token(&self, token: &str, identity: Identity) {
        self.tokens.lock().unwrap().insert(token.to_string(), identity);
    }

    /// Pretend a session already exists (startup lookup path).
    pub fn set_session(&self, identity: Identity) {
        *self.session.lock().unwrap() = Some(identity);
    }

    /// Deliver a session-change notification to subscribers.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Make `invalidate_session` fail (the session then stays held
    /// provider-side, exercising the caller's unconditional local clear).
    pub fn fail_invalidate(&self) {
        self.invalidate_fails.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<Identity, ProviderError> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected("unknown token".into()))
    }

    async fn fetch_session(&self) -> Result<Option<Identity>, ProviderError> {
        Ok(self.session.lock().unwrap().clone())
    }

    fn subscribe_session_changes(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn invalidate_session(&self) -> Result<(), ProviderError> {
        if self.invalidate_fails.load(Ordering::SeqCst) {
            return Err(ProviderError::Request("logout endpoint unavailable".into()));
        }
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }
}

// =============================================================================
// Profile store double
// =============================================================================

#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Mutex<HashMap<String, Profile>>,
    fetch_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    fetch_failures_remaining: AtomicUsize,
    upsert_failures_remaining: AtomicUsize,
    update_failures_remaining: AtomicUsize,
    insert_despite_upsert_failure: AtomicBool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, profile: Profile) {
        self.rows.lock().unwrap().insert(profile.id.clone(), profile);
    }

    pub fn row(&self, id: &str) -> Option<Profile> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Make the next `n` fetches fail with a transport error.
    pub fn fail_next_fetches(&self, n: usize) {
        self.fetch_failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` upserts fail with a transport error.
    pub fn fail_next_upserts(&self, n: usize) {
        self.upsert_failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` updates fail with a transport error.
    pub fn fail_next_updates(&self, n: usize) {
        self.update_failures_remaining.store(n, Ordering::SeqCst);
    }

    /// When a failing upsert runs, still materialize the row, as if a
    /// concurrent reconciliation inserted it first.
    pub fn concurrent_writer_wins(&self) {
        self.insert_despite_upsert_failure.store(true, Ordering::SeqCst);
    }

    fn consume_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn materialize(payload: &NewProfile, existing: Option<&Profile>) -> Profile {
        let now = Utc::now();
        Profile {
            id: payload.id.clone(),
            email: payload.email.clone(),
            full_name: payload.full_name.clone(),
            role: payload.role,
            created_at: existing.map(|p| p.created_at).unwrap_or(now),
            updated_at: now,
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch_by_id(&self, id: &str) -> Result<Profile, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if Self::consume_failure(&self.fetch_failures_remaining) {
            return Err(ProviderError::Request("fetch unavailable".into()));
        }
        self.rows
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(ProviderError::NotFound)
    }

    async fn upsert(&self, payload: &NewProfile) -> Result<Profile, ProviderError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        if Self::consume_failure(&self.upsert_failures_remaining) {
            if self.insert_despite_upsert_failure.load(Ordering::SeqCst) {
                let mut rows = self.rows.lock().unwrap();
                let row = Self::materialize(payload, rows.get(&payload.id));
                rows.insert(payload.id.clone(), row);
            }
            return Err(ProviderError::Request("upsert unavailable".into()));
        }

        let mut rows = self.rows.lock().unwrap();
        let row = Self::materialize(payload, rows.get(&payload.id));
        rows.insert(payload.id.clone(), row.clone());
        Ok(row)
    }

    async fn update(&self, id: &str, changes: &ProfileChanges) -> Result<Profile, ProviderError> {
        if Self::consume_failure(&self.update_failures_remaining) {
            return Err(ProviderError::Request("update unavailable".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(id).ok_or(ProviderError::NotFound)?;
        if let Some(full_name) = &changes.full_name {
            row.full_name = full_name.clone();
        }
        if let Some(role) = changes.role {
            row.role = role;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn list(&self) -> Result<Vec<Profile>, ProviderError> {
        let rows = self.rows.lock().unwrap();
        let mut all: Vec<Profile> = rows.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

// =============================================================================
// Usage store double
// =============================================================================

#[derive(Default)]
pub struct MemoryUsageStore {
    rows: Mutex<Vec<UsageRecord>>,
    actors: Mutex<HashMap<String, UsageActor>>,
    insert_fails: AtomicBool,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_inserts(&self) {
        self.insert_fails.store(true, Ordering::SeqCst);
    }

    /// Register the profile fields the admin listing joins in for `user_id`.
    pub fn seed_actor(&self, user_id: &str, email: &str, full_name: &str) {
        self.actors.lock().unwrap().insert(
            user_id.to_string(),
            UsageActor {
                email: email.to_string(),
                full_name: full_name.to_string(),
            },
        );
    }

    pub fn rows(&self) -> Vec<UsageRecord> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn insert(&self, entry: &NewUsageRecord) -> Result<UsageRecord, ProviderError> {
        if self.insert_fails.load(Ordering::SeqCst) {
            return Err(ProviderError::Request("insert unavailable".into()));
        }
        let row = UsageRecord {
            id: Uuid::new_v4().to_string(),
            user_id: entry.user_id.clone(),
            module_name: entry.module_name.clone(),
            input_data: entry.input_data.clone(),
            output_data: entry.output_data.clone(),
            processing_time_ms: entry.processing_time_ms,
            status: entry.status,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<UsageRecord>, ProviderError> {
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<UsageRecord> = rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn list_all(&self, limit: usize) -> Result<Vec<AdminUsageRecord>, ProviderError> {
        let rows = self.rows.lock().unwrap();
        let actors = self.actors.lock().unwrap();
        let mut all: Vec<UsageRecord> = rows.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        Ok(all
            .into_iter()
            .map(|record| {
                let user = actors.get(&record.user_id).cloned();
                AdminUsageRecord { record, user }
            })
            .collect())
    }
}
