// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! Axum extractors for the authentication pipeline.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(ctx): Auth) -> impl IntoResponse {
//!     // ctx.identity is verified, ctx.profile is reconciled
//! }
//! ```
//!
//! Each extraction runs the full verify -> reconcile -> gate sequence; a
//! request whose credential fails verification never reaches the reconciler
//! or the handler.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};

use crate::models::{Identity, Profile};
use crate::state::AppState;

use super::gate::{authorize, Capability, Decision, DenyReason};
use super::verifier::bearer_token;
use super::AuthError;

/// A verified identity together with its reconciled profile.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Identity,
    pub profile: Profile,
}

impl From<DenyReason> for AuthError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthenticated => AuthError::Unauthenticated,
            DenyReason::InsufficientPrivilege => AuthError::InsufficientPrivilege,
        }
    }
}

/// Extractor for authenticated callers (`AuthenticatedOnly` capability).
pub struct Auth(pub AuthContext);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // A previous extractor on the same request already did the work.
        if let Some(ctx) = parts.extensions.get::<AuthContext>().cloned() {
            return Ok(Auth(ctx));
        }

        let token = bearer_token(&parts.headers)?;
        let identity = state.verifier.verify(token).await?;
        let profile = state.reconciler.reconcile(&identity).await?;

        let ctx = AuthContext { identity, profile };
        match authorize(Some(&ctx.profile), Capability::AuthenticatedOnly) {
            Decision::Allow => {
                parts.extensions.insert(ctx.clone());
                Ok(Auth(ctx))
            }
            Decision::Deny(reason) => Err(reason.into()),
        }
    }
}

/// Extractor that requires the admin role (`AdminOnly` capability).
pub struct AdminOnly(pub AuthContext);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(ctx) = Auth::from_request_parts(parts, state).await?;

        match authorize(Some(&ctx.profile), Capability::AdminOnly) {
            Decision::Allow => Ok(AdminOnly(ctx)),
            Decision::Deny(reason) => Err(reason.into()),
        }
    }
}

/// Optional authentication (`Optional` capability).
///
/// Returns `None` instead of rejecting when no valid credential is present;
/// the handler adapts to the possibly-absent profile.
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(ctx)) => Ok(OptionalAuth(Some(ctx))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}
