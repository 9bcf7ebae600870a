//! HTTP surface: the refresh endpoint and the page bootstrap.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use common::{TraceId, request_span};
use metals::{BootstrapData, PricePayload, REFRESH_ACTION};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::cache::PriceCache;
use crate::error::AppError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<PriceCache>,
    pub price_unit_of_measure: Arc<str>,
    pub ajax_url: Arc<str>,
}

/// Form body of an ajax call. Only `action` is read.
#[derive(Debug, Deserialize)]
pub struct AjaxRequest {
    #[serde(default)]
    pub action: String,
}

pub fn router(state: AppState, ajax_path: &str) -> Router {
    Router::new()
        .route(ajax_path, post(ajax))
        .route("/bootstrap", get(bootstrap))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST <ajax_path> - `action=get_metal_prices` returns the active snapshot.
/// Open to anonymous visitors.
async fn ajax(
    State(state): State<AppState>,
    Form(req): Form<AjaxRequest>,
) -> Result<Json<PricePayload>, AppError> {
    let span = request_span("ajax", &TraceId::new());
    span.record("action", req.action.as_str());

    async move {
        if req.action != REFRESH_ACTION {
            return Err(AppError::UnknownAction(req.action));
        }
        Ok(Json(state.cache.get().await.to_payload()))
    }
    .instrument(span)
    .await
}

/// GET /bootstrap - data the page embeds before its first tick.
async fn bootstrap(State(state): State<AppState>) -> Json<BootstrapData> {
    let span = request_span("bootstrap", &TraceId::new());

    let data = state
        .cache
        .bootstrap(&state.price_unit_of_measure, &state.ajax_url)
        .instrument(span)
        .await;

    Json(data)
}
