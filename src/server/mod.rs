mod handlers;
pub mod router;

use crate::core::site::Site;
use crate::utils::error::{PageError, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub site: Arc<Site>,
    pub started: Instant,
}

impl AppState {
    pub fn new(site: Arc<Site>) -> Self {
        Self {
            site,
            started: Instant::now(),
        }
    }
}

/// Maps [`PageError`] onto an HTTP response with a JSON body.
#[derive(Debug)]
pub struct ApiError(pub PageError);

impl From<PageError> for ApiError {
    fn from(err: PageError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
            "internal error".to_string()
        } else {
            self.0.user_friendly_message()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub async fn serve(site: Arc<Site>, bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind).await?;
    serve_listener(listener, site).await
}

pub async fn serve_listener(listener: TcpListener, site: Arc<Site>) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("Serving '{}' on http://{}", site.name(), addr);

    let app = router::init(AppState::new(site));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(PageError::IoError)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
