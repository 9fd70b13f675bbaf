// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! The credential verifier.
//!
//! Turns the `Authorization: Bearer <token>` header into a verified
//! [`Identity`]. A missing or malformed header is rejected locally and never
//! reaches the provider; every provider-side rejection or transport failure
//! collapses to the single outward `InvalidOrExpiredCredential` signal.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::debug;

use crate::models::Identity;
use crate::provider::IdentityProvider;

use super::AuthError;

/// Extract the bearer token from request headers.
///
/// Only the `Bearer` scheme is accepted; anything else (including
/// `Token abc`) is `MissingCredential` without any provider call.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MissingCredential)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingCredential)?;

    Ok(token)
}

pub struct CredentialVerifier {
    provider: Arc<dyn IdentityProvider>,
}

impl CredentialVerifier {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Exchange an opaque bearer token for a verified identity.
    pub async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.provider.verify_token(token).await.map_err(|e| {
            // The detail stays in the log; the caller sees one generic signal
            // regardless of which provider failure occurred.
            debug!(error = %e, "token verification failed");
            AuthError::InvalidOrExpiredCredential
        })
    }
}
