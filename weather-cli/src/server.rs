use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use std::{net::SocketAddr, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::info;
use weather_core::WeatherLookup;

use crate::{
    error::ApiError,
    rate_limit::{IpRateLimiter, limit_by_ip},
};

const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

pub fn router(lookup: WeatherLookup, limiter: IpRateLimiter) -> Router {
    Router::new()
        .route("/{city}", get(get_weather))
        .route("/{city}/", get(get_weather))
        .with_state(lookup)
        .layer(middleware::from_fn_with_state(limiter, limit_by_ip))
        .layer(TraceLayer::new_for_http())
}

async fn get_weather(
    State(lookup): State<WeatherLookup>,
    Path(city): Path<String>,
) -> Result<Response, ApiError> {
    // Detached so a client disconnect does not cancel the fetch before it is cached.
    let found = tokio::spawn(async move { lookup.lookup(&city).await })
        .await
        .map_err(|e| ApiError::Internal(format!("lookup task failed: {e}")))??;

    Ok(([("x-cache", found.cache.as_str())], Json(found.summary)).into_response())
}

pub async fn serve(
    bind: SocketAddr,
    lookup: WeatherLookup,
    limiter: IpRateLimiter,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    info!("listening on {}", listener.local_addr()?);

    let cleanup = {
        let limiter = limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(LIMITER_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                limiter.retain_recent();
            }
        })
    };

    let app = router(lookup, limiter);
    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed");

    cleanup.abort();
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
