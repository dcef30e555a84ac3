//! HTTP front end of the exporter.
//!
//! - `GET /probe?target=..` scrapes one modem
//! - `GET /metrics` describes the exporter itself

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use tokio::net::TcpListener;

use crate::error::Error;
use crate::metrics::{encode_registry, exporter_registry};
use crate::probe::{ProbeParams, Prober};

struct AppState {
    prober: Prober,
}

pub fn build_router(prober: Prober) -> Router {
    let state = Arc::new(AppState { prober });

    Router::new()
        .route("/probe", get(handle_probe))
        .route("/metrics", get(handle_metrics))
        .with_state(state)
}

/// Serve until the listener fails.
pub async fn run_server(listener: TcpListener, prober: Prober) -> std::io::Result<()> {
    axum::serve(listener, build_router(prober)).await
}

async fn handle_probe(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProbeParams>,
) -> Response {
    match state.prober.probe(&params).await {
        Ok(body) => exposition(body),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::error!("probe of {:?} failed: {}", params.target, e);
            } else {
                tracing::info!("probe of {:?} rejected: {}", params.target, e);
            }
            (status, e.to_string()).into_response()
        }
    }
}

async fn handle_metrics() -> Response {
    match exporter_registry().and_then(|r| encode_registry(&r)) {
        Ok(body) => exposition(body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn exposition(body: String) -> Response {
    let encoder = TextEncoder::new();
    ([(CONTENT_TYPE, encoder.format_type().to_string())], body).into_response()
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::MissingParameter(_) | Error::InvalidParameter { .. } | Error::InvalidFingerprint(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::LoginFailure(_) | Error::NotLoggedIn => StatusCode::FORBIDDEN,
        Error::Credentials(_) | Error::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    }
}
