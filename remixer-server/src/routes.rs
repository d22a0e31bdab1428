use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use remixer_core::{CatalogTrack, CoreError, RemixRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::state::AppState;

const LOG_TARGET: &str = "remixer::routes";

/// Request header selecting the completion model
pub const MODEL_HEADER: &str = "x-model";

/// Search terms shorter than this return no tracks
const MIN_SEARCH_TERM_CHARS: usize = 2;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/lyrics", get(health).post(remix))
        .route("/api/search", get(search))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemixResponse {
    lyrics: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    apple_music_url: Option<String>,
}

/// Error body: `lyrics` is always null so clients can branch on it
#[derive(Debug, Serialize)]
struct ErrorBody {
    lyrics: Option<String>,
    error: String,
}

struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self(e)
    }
}

fn status_of(error: &CoreError) -> StatusCode {
    StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.0);
        if status.is_server_error() {
            warn!(target: LOG_TARGET, "Request failed ({}): {}", status, self.0);
        } else {
            info!(target: LOG_TARGET, "Request rejected ({}): {}", status, self.0);
        }

        let body = ErrorBody {
            lyrics: None,
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn remix(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RemixRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|rejection| CoreError::InvalidRequest {
        reason: rejection.body_text(),
    })?;
    let requested_model = headers.get(MODEL_HEADER).and_then(|v| v.to_str().ok());

    info!(
        target: LOG_TARGET,
        "POST /api/lyrics: {} - {} (model header: {:?})",
        request.artist, request.title, requested_model
    );

    let output = state.pipeline.remix(&request, requested_model).await?;

    let mut response = Json(RemixResponse {
        lyrics: output.lyrics,
        apple_music_url: output.apple_music_url,
    })
    .into_response();
    if let Ok(model) = HeaderValue::from_str(output.model.as_str()) {
        response.headers_mut().insert(MODEL_HEADER, model);
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    term: String,
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let term = params.term.trim();
    if term.chars().count() < MIN_SEARCH_TERM_CHARS {
        return Json(Vec::<CatalogTrack>::new()).into_response();
    }

    match state.catalog.search(term, state.search_limit).await {
        Ok(tracks) => Json(tracks).into_response(),
        Err(e) => {
            warn!(target: LOG_TARGET, "Song search for {:?} failed: {}", term, e);
            (status_of(&e), Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}
