use crate::domain::model::{PageChanges, PageId, User};
use crate::server::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    site: String,
    uptime: u64,
}

pub(super) async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = HealthResponse {
        status: "up",
        version: env!("CARGO_PKG_VERSION"),
        site: state.site.name().to_string(),
        uptime: state.started.elapsed().as_secs(),
    };

    (
        [
            (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
}

pub(super) async fn page_view(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = request_user(&state, &headers);
    let rendered = state.site.view(&path, &user).await?;
    tracing::debug!("Serving '{}' as page {}", path, rendered.page.id);
    Ok(Json(rendered))
}

pub(super) async fn edit_page(
    State(state): State<AppState>,
    Path(id): Path<PageId>,
    headers: HeaderMap,
    Json(changes): Json<PageChanges>,
) -> Result<impl IntoResponse, ApiError> {
    let user = request_user(&state, &headers);
    let page = state.site.editor().edit_page(id, changes, &user).await?;
    Ok(Json(page))
}

/// The user named by the bearer token, or anonymous.
fn request_user(state: &AppState, headers: &HeaderMap) -> User {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    match token {
        Some(token) => match state.site.user_by_token(token) {
            Some(user) => user.clone(),
            None => {
                tracing::debug!("Unknown bearer token, continuing as anonymous");
                User::anonymous()
            }
        },
        None => User::anonymous(),
    }
}
