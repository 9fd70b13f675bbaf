// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication pipeline error type.
///
/// Every outward-facing failure carries a stable machine-readable code and a
/// generic message. Provider error detail is logged at the call site and
/// never forwarded verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authorization header absent or not `Bearer <token>`
    MissingCredential,
    /// The provider rejected the token, or the verification call failed
    InvalidOrExpiredCredential,
    /// A profile read failed outside the reconcile path
    ProfileFetchFailed,
    /// The reconciler could not produce a persisted profile
    ProfileReconciliationFailed,
    /// The caller's role does not satisfy the required capability
    InsufficientPrivilege,
    /// No authenticated caller where one is required
    Unauthenticated,
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the stable error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::InvalidOrExpiredCredential => "invalid_or_expired_credential",
            AuthError::ProfileFetchFailed => "profile_fetch_failed",
            AuthError::ProfileReconciliationFailed => "profile_reconciliation_failed",
            AuthError::InsufficientPrivilege => "insufficient_privilege",
            AuthError::Unauthenticated => "unauthenticated",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::InvalidOrExpiredCredential
            | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPrivilege => StatusCode::FORBIDDEN,
            AuthError::ProfileFetchFailed | AuthError::ProfileReconciliationFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredential => {
                write!(f, "Missing or invalid authorization header")
            }
            AuthError::InvalidOrExpiredCredential => write!(f, "Invalid or expired token"),
            AuthError::ProfileFetchFailed => write!(f, "Failed to fetch user profile"),
            AuthError::ProfileReconciliationFailed => {
                write!(f, "Failed to create user profile")
            }
            AuthError::InsufficientPrivilege => write!(f, "Admin privileges required"),
            AuthError::Unauthenticated => write!(f, "Authentication required"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            success: false,
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
