use axum::extract::State;
use axum::Json;

use crate::api::AppState;
use crate::domain::Webhook;

pub async fn list_webhooks(State(state): State<AppState>) -> Json<Vec<Webhook>> {
    Json(state.engine.webhooks().snapshot().await)
}
