use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum UrlShareError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no mapping for {0}")]
    NotFound(String),

    #[error("stored target for {key} is not a valid IRI ({value:?}): {source}")]
    MalformedTarget {
        key: String,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("storage failure: {0}")]
    StorageFailure(#[from] rusqlite::Error),

    #[error("storage task failed: {0}")]
    StorageTask(#[from] tokio::task::JoinError),

    #[error("template rendering failed: {0}")]
    TemplateFailure(#[from] askama::Error),

    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UrlShareError>;

impl UrlShareError {
    pub fn status(&self) -> StatusCode {
        match self {
            UrlShareError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            UrlShareError::NotFound(_) => StatusCode::NOT_FOUND,
            UrlShareError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Expected outcomes (bad requests, unknown keys) are not worth an operator's attention.
    pub fn is_operator_relevant(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for UrlShareError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_operator_relevant() {
            if matches!(self, UrlShareError::StorageFailure(_) | UrlShareError::StorageTask(_)) {
                crate::metrics::StoreMetrics::record_failure();
            }
            error!(error = %self, "request failed");
            return (status, "Whoops! Our bad").into_response();
        }
        match self {
            UrlShareError::InvalidInput(_) | UrlShareError::MethodNotAllowed(_) => {
                (status, "That's not how you use this service :-)").into_response()
            }
            _ => (status, "Not found").into_response(),
        }
    }
}
