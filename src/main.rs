// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ModuleHub Contributors

use std::{env, net::SocketAddr, sync::Arc};

use tracing_subscriber::EnvFilter;

use modulehub_server::api::router;
use modulehub_server::provider::{
    HttpIdentityProvider, HttpProfileStore, HttpUsageStore, ProviderClient,
};
use modulehub_server::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    // The service-role client bypasses row-level security; it must never be
    // handed to request handlers that echo provider responses verbatim.
    let service_client = ProviderClient::from_env().unwrap_or_else(|err| {
        eprintln!("provider configuration error: {err}");
        std::process::exit(1);
    });
    let anon_client = ProviderClient::from_env_anon().unwrap_or_else(|err| {
        eprintln!("provider configuration error: {err}");
        std::process::exit(1);
    });

    let identity = Arc::new(HttpIdentityProvider::new(anon_client));
    let profiles = Arc::new(HttpProfileStore::new(service_client.clone()));
    let usage = Arc::new(HttpUsageStore::new(service_client));

    let state = AppState::new(identity, profiles, usage);
    let app = router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!("ModuleHub server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received");
}
