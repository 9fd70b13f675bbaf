// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! Shared HTTP client for the hosted provider.
//!
//! Both trust boundaries use the same client type with different keys:
//! the server instance carries the service-role key (unrestricted row
//! access, must never reach the client runtime), the client instance
//! carries the restricted public key and relies on the provider's
//! row-level policies.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use super::ProviderError;
use crate::config::{ANON_KEY_ENV, PROVIDER_URL_ENV, SERVICE_ROLE_KEY_ENV};

/// Network timeout for provider calls. The provider client's timeout is the
/// only one in this layer; a timed-out call surfaces as a request failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ProviderClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl ProviderClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Build the server-side client (service-role key trust boundary).
    pub fn from_env() -> Result<Self, ProviderError> {
        let base_url = env_required(PROVIDER_URL_ENV)?;
        let service_key = env_required(SERVICE_ROLE_KEY_ENV)?;
        Self::new(base_url, service_key)
    }

    /// Build the client-side client (restricted public key trust boundary).
    pub fn from_env_anon() -> Result<Self, ProviderError> {
        let base_url = env_required(PROVIDER_URL_ENV)?;
        let anon_key = env_required(ANON_KEY_ENV)?;
        Self::new(base_url, anon_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document. `bearer` overrides the api key in the
    /// Authorization header (used for user-scoped auth endpoints).
    pub async fn get_json(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let request = self
            .http
            .get(self.url(path))
            .header("apikey", &self.api_key)
            .header(
                "Authorization",
                format!("Bearer {}", bearer.unwrap_or(&self.api_key)),
            );

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("GET {path} failed: {e}")))?;

        Self::json_body("GET", path, response).await
    }

    /// POST a JSON body and parse the JSON response. `prefer` sets the
    /// provider's `Prefer` header (upsert resolution, representation).
    pub async fn post_json(
        &self,
        path: &str,
        body: &Value,
        bearer: Option<&str>,
        prefer: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let mut request = self
            .http
            .post(self.url(path))
            .header("apikey", &self.api_key)
            .header(
                "Authorization",
                format!("Bearer {}", bearer.unwrap_or(&self.api_key)),
            )
            .header("Content-Type", "application/json")
            .json(body);

        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("POST {path} failed: {e}")))?;

        Self::json_body("POST", path, response).await
    }

    /// POST without caring about the response body (e.g. logout).
    pub async fn post_empty(
        &self,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<(), ProviderError> {
        let response = self
            .http
            .post(self.url(path))
            .header("apikey", &self.api_key)
            .header(
                "Authorization",
                format!("Bearer {}", bearer.unwrap_or(&self.api_key)),
            )
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!(
                "POST {path} returned {status}: {body}"
            )));
        }
        Ok(())
    }

    /// PUT a JSON body and parse the JSON response. `bearer` overrides the
    /// api key in the Authorization header.
    pub async fn put_json(
        &self,
        path: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let response = self
            .http
            .put(self.url(path))
            .header("apikey", &self.api_key)
            .header(
                "Authorization",
                format!("Bearer {}", bearer.unwrap_or(&self.api_key)),
            )
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("PUT {path} failed: {e}")))?;

        Self::json_body("PUT", path, response).await
    }

    /// PATCH a JSON body and parse the JSON response.
    pub async fn patch_json(
        &self,
        path: &str,
        body: &Value,
        prefer: Option<&str>,
    ) -> Result<Value, ProviderError> {
        let mut request = self
            .http
            .patch(self.url(path))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body);

        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("PATCH {path} failed: {e}")))?;

        Self::json_body("PATCH", path, response).await
    }

    async fn json_body(
        method: &str,
        path: &str,
        response: reqwest::Response,
    ) -> Result<Value, ProviderError> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected(format!(
                "{method} {path} returned {status}: {body}"
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!(
                "{method} {path} returned {status}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("{method} {path} invalid JSON: {e}"))
        })
    }
}

/// Percent-encode a value used inside a query-string filter (`id=eq.<value>`).
pub fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn env_required(name: &str) -> Result<String, ProviderError> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                Err(ProviderError::MissingConfig(name.to_string()))
            } else {
                Ok(trimmed)
            }
        }
        Err(_) => Err(ProviderError::MissingConfig(name.to_string())),
    }
}
