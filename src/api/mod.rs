// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{AdminUsageRecord, Profile, UsageActor, UsageRecord, UsageStatus},
    state::AppState,
};

pub mod health;
pub mod usage;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/me", get(users::get_me).put(users::update_me))
        .route("/users", get(users::list_users))
        .route("/users/{id}/role", put(users::update_role))
        .route("/usage", get(usage::get_my_usage).post(usage::track_usage))
        .route("/usage/all", get(usage::get_all_usage));

    // The health route shares the state so its optional-credential
    // enrichment can run; a bare probe still never touches the provider.
    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::get_me,
        users::update_me,
        users::list_users,
        users::update_role,
        usage::get_my_usage,
        usage::get_all_usage,
        usage::track_usage
    ),
    components(
        schemas(
            crate::auth::Role,
            Profile,
            UsageRecord,
            UsageStatus,
            UsageActor,
            AdminUsageRecord,
            health::HealthResponse,
            users::ProfileResponse,
            users::ProfileListResponse,
            users::UpdateProfileRequest,
            users::UpdateRoleRequest,
            usage::UsageListResponse,
            usage::AdminUsageListResponse,
            usage::UsageResponse,
            usage::TrackUsageRequest
        )
    ),
    tags(
        (name = "Health", description = "Liveness probes"),
        (name = "Users", description = "Profiles and role management"),
        (name = "Usage", description = "Module usage tracking")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::models::{Identity, NewProfile};
    use crate::provider::memory::{MemoryIdentityProvider, MemoryProfileStore, MemoryUsageStore};
    use crate::provider::ProfileStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct TestBackend {
        app: Router,
        provider: Arc<MemoryIdentityProvider>,
        profiles: Arc<MemoryProfileStore>,
        usage: Arc<MemoryUsageStore>,
    }

    fn backend() -> TestBackend {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let profiles = Arc::new(MemoryProfileStore::new());
        let usage = Arc::new(MemoryUsageStore::new());
        let state = AppState::new(provider.clone(), profiles.clone(), usage.clone());
        TestBackend {
            app: router(state),
            provider,
            profiles,
            usage,
        }
    }

    /// Let any spawned recorder task run to completion.
    async fn settle() {
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    fn identity(id: &str) -> Identity {
        let mut metadata = HashMap::new();
        metadata.insert("full_name".to_string(), "Ann".to_string());
        Identity {
            id: id.to_string(),
            email: format!("{id}@x.com"),
            metadata,
        }
    }

    async fn seed_admin(backend: &TestBackend, id: &str, token: &str) {
        backend.provider.issue_token(token, identity(id));
        backend
            .profiles
            .upsert(&NewProfile {
                id: id.to_string(),
                email: format!("{id}@x.com"),
                full_name: "Root".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap()
        };
        (status, body)
    }

    fn get_request(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, path: &str, token: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_needs_no_credential() {
        let backend = backend();
        let (status, body) = send(backend.app, get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body.get("authenticated_as").is_none());
    }

    #[tokio::test]
    async fn health_names_the_caller_when_credentialed() {
        let backend = backend();
        backend.provider.issue_token("tok_1", identity("u1"));

        let (status, body) = send(backend.app, get_request("/health", Some("tok_1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["authenticated_as"], "u1");
    }

    #[tokio::test]
    async fn health_stays_200_with_a_bad_credential() {
        let backend = backend();
        let (status, body) = send(backend.app, get_request("/health", Some("nope"))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("authenticated_as").is_none());
    }

    #[tokio::test]
    async fn wrong_auth_scheme_is_401_without_provider_call() {
        let backend = backend();
        let request = Request::builder()
            .uri("/v1/me")
            .header("Authorization", "Token abc")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(backend.app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "missing_credential");
    }

    #[tokio::test]
    async fn unknown_token_is_401() {
        let backend = backend();
        let (status, body) = send(backend.app, get_request("/v1/me", Some("nope"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "invalid_or_expired_credential");
    }

    #[tokio::test]
    async fn me_reconciles_on_first_sight() {
        let backend = backend();
        backend.provider.issue_token("tok_1", identity("u1"));

        let (status, body) = send(backend.app, get_request("/v1/me", Some("tok_1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], "u1");
        assert_eq!(body["data"]["full_name"], "Ann");
        assert_eq!(body["data"]["role"], "user");
        assert_eq!(backend.profiles.row_count(), 1);
    }

    #[tokio::test]
    async fn update_me_changes_only_full_name() {
        let backend = backend();
        backend.provider.issue_token("tok_1", identity("u1"));

        let request = json_request("PUT", "/v1/me", "tok_1", json!({ "full_name": "Ann Droid" }));
        let (status, body) = send(backend.app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["full_name"], "Ann Droid");
        assert_eq!(body["data"]["role"], "user");
    }

    #[tokio::test]
    async fn user_role_cannot_list_users() {
        let backend = backend();
        backend.provider.issue_token("tok_1", identity("u1"));

        let (status, body) = send(backend.app, get_request("/v1/users", Some("tok_1"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "insufficient_privilege");
    }

    #[tokio::test]
    async fn admin_lists_users_newest_first() {
        let backend = backend();
        seed_admin(&backend, "root", "tok_admin").await;
        backend.provider.issue_token("tok_1", identity("u1"));

        // Reconcile u1 through the API first.
        let app = backend.app.clone();
        send(app, get_request("/v1/me", Some("tok_1"))).await;

        let (status, body) = send(backend.app, get_request("/v1/users", Some("tok_admin"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn admin_updates_another_users_role() {
        let backend = backend();
        seed_admin(&backend, "root", "tok_admin").await;
        backend.provider.issue_token("tok_1", identity("u1"));
        let app = backend.app.clone();
        send(app, get_request("/v1/me", Some("tok_1"))).await;

        let request = json_request(
            "PUT",
            "/v1/users/u1/role",
            "tok_admin",
            json!({ "role": "admin" }),
        );
        let (status, body) = send(backend.app.clone(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["role"], "admin");
        assert_eq!(backend.profiles.row("u1").unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn non_admin_cannot_update_roles() {
        let backend = backend();
        backend.provider.issue_token("tok_1", identity("u1"));
        backend.provider.issue_token("tok_2", identity("u2"));
        let app = backend.app.clone();
        send(app, get_request("/v1/me", Some("tok_2"))).await;

        let request = json_request(
            "PUT",
            "/v1/users/u2/role",
            "tok_1",
            json!({ "role": "admin" }),
        );
        let (status, body) = send(backend.app.clone(), request).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(backend.profiles.row("u2").unwrap().role, Role::User);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn invalid_role_value_is_400() {
        let backend = backend();
        seed_admin(&backend, "root", "tok_admin").await;

        let request = json_request(
            "PUT",
            "/v1/users/u1/role",
            "tok_admin",
            json!({ "role": "superuser" }),
        );
        let (status, body) = send(backend.app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "validation_error");
    }

    #[tokio::test]
    async fn admin_cannot_change_own_role() {
        let backend = backend();
        seed_admin(&backend, "root", "tok_admin").await;

        let request = json_request(
            "PUT",
            "/v1/users/root/role",
            "tok_admin",
            json!({ "role": "user" }),
        );
        let (status, _body) = send(backend.app.clone(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(backend.profiles.row("root").unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn role_update_is_recorded_as_usage() {
        let backend = backend();
        seed_admin(&backend, "root", "tok_admin").await;
        backend.provider.issue_token("tok_1", identity("u1"));
        send(backend.app.clone(), get_request("/v1/me", Some("tok_1"))).await;

        let request = json_request(
            "PUT",
            "/v1/users/u1/role",
            "tok_admin",
            json!({ "role": "admin" }),
        );
        let (status, _) = send(backend.app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        settle().await;

        let rows = backend.usage.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "root", "attributed to the acting admin");
        assert_eq!(rows[0].module_name, "role_update");
    }

    #[tokio::test]
    async fn role_update_survives_a_failing_usage_write() {
        let backend = backend();
        seed_admin(&backend, "root", "tok_admin").await;
        backend.provider.issue_token("tok_1", identity("u1"));
        send(backend.app.clone(), get_request("/v1/me", Some("tok_1"))).await;
        backend.usage.fail_inserts();

        let request = json_request(
            "PUT",
            "/v1/users/u1/role",
            "tok_admin",
            json!({ "role": "admin" }),
        );
        let (status, body) = send(backend.app.clone(), request).await;
        settle().await;

        // The record write failing never fails the operation it rides on.
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(backend.usage.rows().is_empty());
    }

    #[tokio::test]
    async fn profile_update_failure_is_profile_fetch_failed() {
        let backend = backend();
        backend.provider.issue_token("tok_1", identity("u1"));
        send(backend.app.clone(), get_request("/v1/me", Some("tok_1"))).await;
        backend.profiles.fail_next_updates(1);

        let request = json_request("PUT", "/v1/me", "tok_1", json!({ "full_name": "Ann D" }));
        let (status, body) = send(backend.app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error_code"], "profile_fetch_failed");
    }

    #[tokio::test]
    async fn role_update_for_unknown_user_is_404() {
        let backend = backend();
        seed_admin(&backend, "root", "tok_admin").await;

        let request = json_request(
            "PUT",
            "/v1/users/ghost/role",
            "tok_admin",
            json!({ "role": "admin" }),
        );
        let (status, _body) = send(backend.app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn track_usage_attributes_to_the_caller() {
        let backend = backend();
        backend.provider.issue_token("tok_1", identity("u1"));

        let request = json_request(
            "POST",
            "/v1/usage",
            "tok_1",
            json!({
                "module_name": "summarizer",
                "input_data": { "text": "hello" },
                "output_data": { "summary": "hi" },
                "processing_time_ms": 1200,
                // user_id in the payload is ignored; attribution comes from
                // the verified identity.
                "user_id": "someone-else"
            }),
        );
        let (status, body) = send(backend.app, request).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["user_id"], "u1");
        assert_eq!(body["data"]["status"], "completed");
    }

    #[tokio::test]
    async fn track_usage_requires_module_name() {
        let backend = backend();
        backend.provider.issue_token("tok_1", identity("u1"));

        let request = json_request("POST", "/v1/usage", "tok_1", json!({ "module_name": " " }));
        let (status, _body) = send(backend.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn usage_listing_is_scoped_to_the_caller() {
        let backend = backend();
        backend.provider.issue_token("tok_1", identity("u1"));
        backend.provider.issue_token("tok_2", identity("u2"));

        for (token, module) in [("tok_1", "summarizer"), ("tok_2", "translator")] {
            let request = json_request(
                "POST",
                "/v1/usage",
                token,
                json!({ "module_name": module }),
            );
            send(backend.app.clone(), request).await;
        }

        let (status, body) = send(backend.app.clone(), get_request("/v1/usage", Some("tok_1"))).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["module_name"], "summarizer");
    }

    #[tokio::test]
    async fn usage_all_embeds_owner_contact_fields() {
        let backend = backend();
        seed_admin(&backend, "root", "tok_admin").await;
        backend.provider.issue_token("tok_1", identity("u1"));
        backend.usage.seed_actor("u1", "u1@x.com", "Ann");

        let request = json_request(
            "POST",
            "/v1/usage",
            "tok_1",
            json!({ "module_name": "summarizer" }),
        );
        send(backend.app.clone(), request).await;

        let (status, body) = send(
            backend.app,
            get_request("/v1/usage/all", Some("tok_admin")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["module_name"], "summarizer");
        assert_eq!(rows[0]["user_profiles"]["email"], "u1@x.com");
        assert_eq!(rows[0]["user_profiles"]["full_name"], "Ann");
    }

    #[tokio::test]
    async fn usage_all_requires_admin() {
        let backend = backend();
        seed_admin(&backend, "root", "tok_admin").await;
        backend.provider.issue_token("tok_1", identity("u1"));

        let (status, _) = send(
            backend.app.clone(),
            get_request("/v1/usage/all", Some("tok_1")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            backend.app,
            get_request("/v1/usage/all", Some("tok_admin")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}
