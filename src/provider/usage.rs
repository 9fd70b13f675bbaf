// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! HTTP usage store (PostgREST-style `module_usage` rows).

use async_trait::async_trait;
use serde_json::{json, Value};

use super::http::encode_query_value;
use super::{ProviderClient, ProviderError, UsageStore};
use crate::models::{AdminUsageRecord, NewUsageRecord, UsageRecord};

const TABLE: &str = "module_usage";

pub struct HttpUsageStore {
    client: ProviderClient,
}

impl HttpUsageStore {
    pub fn new(client: ProviderClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UsageStore for HttpUsageStore {
    async fn insert(&self, entry: &NewUsageRecord) -> Result<UsageRecord, ProviderError> {
        let body = json!([entry]);
        let response = self
            .client
            .post_json(
                &format!("/rest/v1/{TABLE}"),
                &body,
                None,
                Some("return=representation"),
            )
            .await?;

        let mut rows: Vec<UsageRecord> = parse_rows(response)?;
        if rows.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "insert returned no representation".into(),
            ));
        }
        Ok(rows.swap_remove(0))
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<UsageRecord>, ProviderError> {
        let path = format!(
            "/rest/v1/{TABLE}?user_id=eq.{}&select=*&order=created_at.desc&limit={limit}",
            encode_query_value(user_id)
        );
        parse_rows(self.client.get_json(&path, None).await?)
    }

    async fn list_all(&self, limit: usize) -> Result<Vec<AdminUsageRecord>, ProviderError> {
        // Embedded select joins the owning profile's contact fields into
        // each row.
        let path = format!(
            "/rest/v1/{TABLE}?select=*,user_profiles(email,full_name)&order=created_at.desc&limit={limit}"
        );
        let response = self.client.get_json(&path, None).await?;
        serde_json::from_value(response)
            .map_err(|e| ProviderError::InvalidResponse(format!("usage rows malformed: {e}")))
    }
}

fn parse_rows(response: Value) -> Result<Vec<UsageRecord>, ProviderError> {
    serde_json::from_value(response)
        .map_err(|e| ProviderError::InvalidResponse(format!("usage rows malformed: {e}")))
}
