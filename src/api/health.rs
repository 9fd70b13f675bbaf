// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::OptionalAuth;

/// Simple health check response for liveness probes.
///
/// `authenticated_as` is present only when the probe carried a valid
/// credential; a bare probe gets the same 200 either way.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticated_as: Option<String>,
}

/// Liveness probe. Authentication is optional and never required.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse),
    )
)]
pub async fn health(OptionalAuth(ctx): OptionalAuth) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        authenticated_as: ctx.map(|c| c.identity.id),
    })
}
