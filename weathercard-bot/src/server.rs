//! HTTP host for the outgoing webhook.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tracing::info;
use weathercard_core::{Handler, HandlerError, OutgoingActivity};

/// Build the router with all routes.
pub fn router(handler: Arc<Handler>) -> Router {
    Router::new()
        .route("/api/messages", post(messages))
        .route("/health", get(health))
        .with_state(handler)
}

pub async fn serve(addr: SocketAddr, handler: Arc<Handler>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Webhook endpoint listening");
    axum::serve(listener, router(handler)).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn messages(
    State(handler): State<Arc<Handler>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ServerError> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match handler.handle(authorization, &body).await? {
        Some(result) => Ok(Json(OutgoingActivity::from(result)).into_response()),
        None => Ok(StatusCode::UNAUTHORIZED.into_response()),
    }
}

/// Unrecoverable handler failure, surfaced with the fixed public message.
struct ServerError(HandlerError);

impl From<HandlerError> for ServerError {
    fn from(err: HandlerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.0.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
