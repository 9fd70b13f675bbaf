// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

//! Profile and user-management endpoints.

use std::time::Instant;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::{
    auth::{AdminOnly, Auth, Role},
    error::ApiError,
    models::{Profile, UsageStatus},
    provider::ProfileChanges,
    recorder::UsageEntry,
    state::AppState,
};

/// Envelope for a single profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: Profile,
}

impl ProfileResponse {
    fn new(data: Profile) -> Self {
        Self { success: true, data }
    }
}

/// Envelope for a profile listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileListResponse {
    pub success: bool,
    pub data: Vec<Profile>,
}

/// Request to update the caller's own profile.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    /// New display name.
    pub full_name: String,
}

/// Request to change a user's role.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// The new role, `"admin"` or `"user"`.
    pub role: String,
}

/// Get the caller's reconciled profile.
#[utoipa::path(
    get,
    path = "/v1/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = ProfileResponse),
        (status = 401, description = "Missing or invalid credential"),
    )
)]
pub async fn get_me(Auth(ctx): Auth) -> Json<ProfileResponse> {
    Json(ProfileResponse::new(ctx.profile))
}

/// Update the caller's own profile.
///
/// Only `full_name` is writable here; `id`, `email`, and `role` are not.
#[utoipa::path(
    put,
    path = "/v1/me",
    tag = "Users",
    security(("bearer" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 401, description = "Missing or invalid credential"),
    )
)]
pub async fn update_me(
    Auth(ctx): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let started = Instant::now();
    let changes = ProfileChanges {
        full_name: Some(request.full_name.clone()),
        role: None,
    };
    let updated = state
        .profiles
        .update(&ctx.profile.id, &changes)
        .await
        .map_err(ApiError::profile_read)?;

    state.recorder.record(
        Some(&ctx.identity),
        UsageEntry {
            module_name: "profile_update".to_string(),
            input_data: json!({ "full_name": request.full_name }),
            output_data: json!({ "updated_at": updated.updated_at }),
            processing_time_ms: started.elapsed().as_millis() as i64,
            status: UsageStatus::Completed,
        },
    );

    Ok(Json(ProfileResponse::new(updated)))
}

/// List all user profiles, newest first. Admin only.
#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All profiles", body = ProfileListResponse),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Admin privileges required"),
    )
)]
pub async fn list_users(
    AdminOnly(_ctx): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<ProfileListResponse>, ApiError> {
    let profiles = state.profiles.list().await.map_err(ApiError::profile_read)?;
    Ok(Json(ProfileListResponse {
        success: true,
        data: profiles,
    }))
}

/// Change a user's role. Admin only.
///
/// The actor cannot change their own role through this endpoint; promoting
/// the first admin happens out of band in the provider dashboard.
#[utoipa::path(
    put,
    path = "/v1/users/{id}/role",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Target user id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Invalid role value or self-targeting"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "No such user"),
    )
)]
pub async fn update_role(
    AdminOnly(actor): AdminOnly,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let Some(role) = Role::parse(&request.role) else {
        return Err(ApiError::validation("Valid role (admin or user) is required"));
    };

    if id == actor.profile.id {
        return Err(ApiError::validation("Cannot change your own role"));
    }

    let started = Instant::now();
    let changes = ProfileChanges {
        full_name: None,
        role: Some(role),
    };
    let updated = state
        .profiles
        .update(&id, &changes)
        .await
        .map_err(ApiError::profile_read)?;

    tracing::info!(
        actor_id = %actor.profile.id,
        target_id = %updated.id,
        role = %role,
        "user role updated"
    );

    state.recorder.record(
        Some(&actor.identity),
        UsageEntry {
            module_name: "role_update".to_string(),
            input_data: json!({ "target_id": updated.id, "role": role.to_string() }),
            output_data: json!({ "updated_at": updated.updated_at }),
            processing_time_ms: started.elapsed().as_millis() as i64,
            status: UsageStatus::Completed,
        },
    );

    Ok(Json(ProfileResponse::new(updated)))
}
