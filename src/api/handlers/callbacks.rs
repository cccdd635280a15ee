use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};

use crate::api::AppState;
use crate::domain::{ModelType, WatcherError, WebhookPayload};

/// The `(type, id)` pair at the end of a callback path, e.g. `/list/5f1a` or `/hooks/card/9c2/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackPath {
    pub model_type: ModelType,
    pub model_id: String,
}

impl CallbackPath {
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        let (rest, model_id) = trimmed.rsplit_once('/')?;
        let (_, model_type) = rest.rsplit_once('/')?;

        if model_id.is_empty() {
            return None;
        }

        Some(Self {
            model_type: model_type.parse().ok()?,
            model_id: model_id.to_string(),
        })
    }
}

pub async fn handle_callback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Result<StatusCode, WatcherError> {
    // The board service probes every new callback URL with a HEAD and needs a 200.
    if method == Method::HEAD {
        if let Err(err) = state.recorder.mark_verified(uri.path()).await {
            tracing::warn!(path = uri.path(), error = %err, "Failed to mark callback as verified");
        }
        return Ok(StatusCode::OK);
    }

    if method != Method::POST {
        tracing::warn!("Received an unsupported method: {}", method);
        return Ok(StatusCode::METHOD_NOT_ALLOWED);
    }

    let Some(path) = CallbackPath::parse(uri.path()) else {
        tracing::warn!(path = uri.path(), "Callback path is not /{{list|card}}/{{id}}");
        return Ok(StatusCode::NOT_FOUND);
    };

    match WebhookPayload::classify(&body) {
        WebhookPayload::ListChange(change) => {
            let transition = state.engine.handle_list_change(&change).await?;
            tracing::info!(
                card_id = change.card().id,
                transition = ?transition,
                "Handled list change"
            );
        }
        WebhookPayload::CheckItemChange(change) => {
            let outcome = state.engine.handle_check_item_change(&change).await?;
            tracing::info!(
                check_item = change.item_name(),
                outcome = ?outcome,
                "Handled check item change"
            );
        }
        WebhookPayload::Unclassified => {
            state
                .recorder
                .record_unhandled(path.model_type.as_str(), &path.model_id, &body)
                .await?;
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
