use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

mod extract;
mod models;
mod pipeline;
mod probe;
mod ratelimit;
mod score;
mod urls;

use models::{ScrapeRequest, ScrapeResponse};
use pipeline::{discover, DiscoverError};
use probe::Prober;
use ratelimit::{RateLimitConfig, RateLimiter};

#[derive(Clone)]
struct AppState {
    limiter: Arc<RateLimiter>,
    prober: Arc<Prober>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind = std::env::var("PRESS_API_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    let mut rate_config = RateLimitConfig::default();
    if let Some(n) = env_number("PRESS_API_RATE_LIMIT") {
        rate_config.max_requests = n;
    }
    if let Some(n) = env_number("PRESS_API_RATE_WINDOW_SECS") {
        rate_config.window = Duration::from_secs(u64::from(n));
    }

    let state = AppState {
        limiter: Arc::new(RateLimiter::new(rate_config)),
        prober: Arc::new(Prober::new()),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/scrape-images", post(scrape_images))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind).await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

fn env_number(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn scrape_images(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<ScrapeRequest>,
) -> Response {
    let client_key = addr.ip().to_string();

    // Run discovery in its own task so a panic anywhere inside
    // extraction or scoring surfaces as a 500 instead of tearing
    // down the connection.
    let task = tokio::spawn(async move {
        discover(&request, &client_key, &state.limiter, state.prober.as_ref()).await
    });
    let outcome = match task.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "discovery task failed");
            Err(DiscoverError::Internal("discovery task failed".to_string()))
        }
    };

    match outcome {
        Ok(d) => {
            let returned = d.images.len();
            let response = ScrapeResponse {
                success: true,
                site_url: d.site_url,
                source: d.successful_page,
                images: d.images,
                total_found: d.total_candidates,
                returned,
                tried_pages: d.tried_pages,
                failed_pages: d.failed_pages,
                processing_time_ms: d.elapsed_ms,
                rate_limit_remaining: d.rate_limit_remaining,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let (status, body) = match &e {
                DiscoverError::RateLimited => (
                    StatusCode::TOO_MANY_REQUESTS,
                    json!({"error": "rate_limited", "message": e.to_string()}),
                ),
                DiscoverError::BadRequest(msg) => (
                    StatusCode::BAD_REQUEST,
                    json!({"error": "bad_request", "message": msg}),
                ),
                DiscoverError::Internal(msg) => {
                    tracing::error!(detail = %msg, "internal discovery failure");
                    (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "internal"}))
                }
            };
            (status, Json(body)).into_response()
        }
    }
}
