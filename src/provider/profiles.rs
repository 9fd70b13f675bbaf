// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! HTTP profile store (PostgREST-style `user_profiles` rows).
//!
//! The conflict-tolerant upsert is expressed through the provider's native
//! uniqueness handling: `on_conflict=id` plus `resolution=merge-duplicates`
//! makes a concurrent first-sight insert converge to the single existing row
//! instead of erroring.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::http::encode_query_value;
use super::{ProfileChanges, ProfileStore, ProviderClient, ProviderError};
use crate::models::{NewProfile, Profile};

const TABLE: &str = "user_profiles";

pub struct HttpProfileStore {
    client: ProviderClient,
}

impl HttpProfileStore {
    pub fn new(client: ProviderClient) -> Self {
        Self { client }
    }

    fn row_path(&self, id: &str) -> String {
        format!("/rest/v1/{TABLE}?id=eq.{}&select=*", encode_query_value(id))
    }
}

#[async_trait]
impl ProfileStore for HttpProfileStore {
    async fn fetch_by_id(&self, id: &str) -> Result<Profile, ProviderError> {
        let response = self.client.get_json(&self.row_path(id), None).await?;
        first_row(response)?.ok_or(ProviderError::NotFound)
    }

    async fn upsert(&self, payload: &NewProfile) -> Result<Profile, ProviderError> {
        let body = json!([payload]);
        let response = self
            .client
            .post_json(
                &format!("/rest/v1/{TABLE}?on_conflict=id"),
                &body,
                None,
                Some("resolution=merge-duplicates,return=representation"),
            )
            .await?;

        first_row(response)?.ok_or_else(|| {
            ProviderError::InvalidResponse("upsert returned no representation".into())
        })
    }

    async fn update(&self, id: &str, changes: &ProfileChanges) -> Result<Profile, ProviderError> {
        let body = serde_json::to_value(changes)
            .map_err(|e| ProviderError::InvalidResponse(format!("serialize changes: {e}")))?;
        let response = self
            .client
            .patch_json(&self.row_path(id), &body, Some("return=representation"))
            .await?;

        first_row(response)?.ok_or(ProviderError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Profile>, ProviderError> {
        let response = self
            .client
            .get_json(
                &format!("/rest/v1/{TABLE}?select=*&order=created_at.desc"),
                None,
            )
            .await?;
        all_rows(response)
    }
}

/// The first row of a PostgREST array response, `None` when empty.
fn first_row(response: Value) -> Result<Option<Profile>, ProviderError> {
    let mut rows = all_rows(response)?;
    if rows.is_empty() {
        Ok(None)
    } else {
        Ok(Some(rows.swap_remove(0)))
    }
}

fn all_rows(response: Value) -> Result<Vec<Profile>, ProviderError> {
    serde_json::from_value(response)
        .map_err(|e| ProviderError::InvalidResponse(format!("profile rows malformed: {e}")))
}
