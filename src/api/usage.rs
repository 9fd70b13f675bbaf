// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! Module-usage endpoints.
//!
//! `POST /v1/usage` is the synchronous insert the client calls to report a
//! module run (201 with the stored row). The in-process fire-and-forget path
//! for protected operations is [`crate::recorder::UsageRecorder`].

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    models::{AdminUsageRecord, NewUsageRecord, UsageRecord, UsageStatus},
    state::AppState,
};

/// Default page size for a user's own usage listing.
const DEFAULT_USER_LIMIT: usize = 10;
/// Default page size for the admin listing.
const DEFAULT_ADMIN_LIMIT: usize = 100;

/// Query parameters for usage listings.
#[derive(Debug, Deserialize, IntoParams)]
pub struct UsageQueryParams {
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
}

/// Envelope for a usage listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsageListResponse {
    pub success: bool,
    pub data: Vec<UsageRecord>,
}

/// Envelope for the admin usage listing, rows joined with profile fields.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUsageListResponse {
    pub success: bool,
    pub data: Vec<AdminUsageRecord>,
}

/// Envelope for a single usage row.
#[derive(Debug, Serialize, ToSchema)]
pub struct UsageResponse {
    pub success: bool,
    pub data: UsageRecord,
}

/// Request to report a module run.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackUsageRequest {
    /// Name of the module that was run.
    pub module_name: String,
    /// Input payload as captured at run time.
    #[serde(default)]
    pub input_data: serde_json::Value,
    /// Output payload, if any.
    #[serde(default)]
    pub output_data: serde_json::Value,
    /// Wall-clock processing time in milliseconds.
    #[serde(default)]
    pub processing_time_ms: i64,
    /// Outcome of the run; defaults to `completed`.
    #[serde(default)]
    pub status: UsageStatus,
}

/// List the caller's own usage rows, newest first.
#[utoipa::path(
    get,
    path = "/v1/usage",
    tag = "Usage",
    security(("bearer" = [])),
    params(UsageQueryParams),
    responses(
        (status = 200, description = "The caller's usage rows", body = UsageListResponse),
        (status = 401, description = "Missing or invalid credential"),
    )
)]
pub async fn get_my_usage(
    Auth(ctx): Auth,
    State(state): State<AppState>,
    Query(params): Query<UsageQueryParams>,
) -> Result<Json<UsageListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_USER_LIMIT);
    let rows = state.usage.list_for_user(&ctx.identity.id, limit).await?;
    Ok(Json(UsageListResponse {
        success: true,
        data: rows,
    }))
}

/// List all usage rows across users, newest first. Admin only.
#[utoipa::path(
    get,
    path = "/v1/usage/all",
    tag = "Usage",
    security(("bearer" = [])),
    params(UsageQueryParams),
    responses(
        (status = 200, description = "All usage rows with owner contact fields", body = AdminUsageListResponse),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Admin privileges required"),
    )
)]
pub async fn get_all_usage(
    AdminOnly(_ctx): AdminOnly,
    State(state): State<AppState>,
    Query(params): Query<UsageQueryParams>,
) -> Result<Json<AdminUsageListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_ADMIN_LIMIT);
    let rows = state.usage.list_all(limit).await?;
    Ok(Json(AdminUsageListResponse {
        success: true,
        data: rows,
    }))
}

/// Report a module run, attributed to the caller.
#[utoipa::path(
    post,
    path = "/v1/usage",
    tag = "Usage",
    security(("bearer" = [])),
    request_body = TrackUsageRequest,
    responses(
        (status = 201, description = "Stored usage row", body = UsageResponse),
        (status = 400, description = "Missing module name"),
        (status = 401, description = "Missing or invalid credential"),
    )
)]
pub async fn track_usage(
    Auth(ctx): Auth,
    State(state): State<AppState>,
    Json(request): Json<TrackUsageRequest>,
) -> Result<(StatusCode, Json<UsageResponse>), ApiError> {
    if request.module_name.trim().is_empty() {
        return Err(ApiError::validation("Module name is required"));
    }

    // Attribution comes from the verified identity, never the payload.
    let entry = NewUsageRecord {
        user_id: ctx.identity.id,
        module_name: request.module_name,
        input_data: request.input_data,
        output_data: request.output_data,
        processing_time_ms: request.processing_time_ms,
        status: request.status,
    };
    let row = state.usage.insert(&entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(UsageResponse {
            success: true,
            data: row,
        }),
    ))
}
