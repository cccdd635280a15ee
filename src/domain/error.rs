use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("board service error: {0}")]
    RemoteService(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatcherError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        WatcherError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WatcherError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, WatcherError>;

/// Every handling failure is a 500 to the webhook sender, which redelivers on its own schedule.
impl IntoResponse for WatcherError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let message = match &self {
            WatcherError::NotFound { .. } | WatcherError::Configuration(_) => {
                tracing::warn!("Webhook handling failed: {}", self);
                self.to_string()
            }
            WatcherError::RemoteService(_) | WatcherError::Http(_) => {
                tracing::error!("Board service error: {:?}", self);
                "Board service error".to_string()
            }
            WatcherError::Serialization(_) | WatcherError::Io(_) => {
                tracing::error!("Internal error: {:?}", self);
                "Internal server error".to_string()
            }
        };

        let body = json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
