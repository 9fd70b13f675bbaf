// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! API error type and the JSON failure envelope.
//!
//! Every response body follows `{ "success": bool, "data"? | "error"? }`.
//! Failures additionally carry a stable `error_code`; provider error detail
//! is logged at the call site and replaced by a generic message here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::provider::ProviderError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 - bad request payload (e.g. a disallowed role string).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// 500 with a generic message; the detail belongs in the log.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// Map a failed profile read or write outside the reconcile path.
    ///
    /// A missing row stays a 404; everything else surfaces as the
    /// `profile_fetch_failed` signal with the detail in the log.
    pub fn profile_read(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound => Self::not_found("Profile not found"),
            other => {
                tracing::error!(error = %other, "profile read failed");
                AuthError::ProfileFetchFailed.into()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self {
            status: err.status_code(),
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound => Self::not_found("Record not found"),
            other => {
                tracing::error!(error = %other, "provider call failed");
                Self::internal("Upstream provider request failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            error: self.message,
            error_code: self.code.to_string(),
        });
        (self.status, body).into_response()
    }
}
