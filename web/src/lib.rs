/*
 * SPDX-FileCopyrightText: 2026 Wavelens GmbH <info@wavelens.io>
 *
 * SPDX-License-Identifier: AGPL-3.0-only
 */

pub mod auth;
mod endpoint;
pub mod requests;

mod error;
mod tests;

use axum::routing::{get, post};
use axum::{Router, middleware};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use appcore::types::ServerState;
use std::sync::Arc;

pub fn app_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(
            state
                .cli
                .serve_url
                .clone()
                .try_into()
                .unwrap_or_else(|_| "http://127.0.0.1:3000".parse().unwrap()),
        ))
        .allow_headers(vec![AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route(
            "/api/build",
            get(endpoint::get_builds).post(endpoint::post_build_batch),
        )
        .route("/api/build/polling", get(endpoint::get_build_polling))
        .route(
            "/api/build/{platform}",
            get(endpoint::get_build).post(endpoint::post_build),
        )
        .route(
            "/api/build/{build}/sync-github",
            post(endpoint::post_build_sync),
        )
        .route("/api/build/{build}/share", post(endpoint::post_share))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::authorize,
        ))
        .route(
            "/api/build/{build}/github-callback",
            post(endpoint::post_github_callback),
        )
        .route("/api/download/{build}", get(endpoint::get_download))
        .route("/api/share/{code}", get(endpoint::get_share))
        .route("/api/health", get(endpoint::get_health))
        .fallback(endpoint::handle_404)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve_web(state: Arc<ServerState>) -> std::io::Result<()> {
    let server_url = format!("{}:{}", state.cli.ip, state.cli.port);
    let app = app_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(&server_url).await?;
    axum::serve(listener, app).await
}
