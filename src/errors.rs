use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Resource not found error.
    NotFound(String),
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// The 404 every lead lookup returns.
    pub fn lead_not_found() -> Self {
        AppError::NotFound("Lead not found".to_string())
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::WithContext { source, .. } => source.status_code(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Client errors carry their message as `{"error": ...}`. Server-side
    /// failures are logged and answered with a generic error plus the
    /// failure details.
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::NotFound(msg) | AppError::BadRequest(msg) => json!({ "error": msg }),
            AppError::WithContext { source, context } if !status.is_server_error() => {
                tracing::debug!("Client error with context: {} -> {}", context, source);
                return source_into_client_response(source);
            }
            _ => {
                // Log full context chain for debugging
                tracing::error!("Request failed: {}", self);
                json!({
                    "error": "Internal Server Error",
                    "details": self.to_string(),
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

fn source_into_client_response(source: &AppError) -> Response {
    match source {
        AppError::NotFound(msg) | AppError::BadRequest(msg) => {
            (source.status_code(), Json(json!({ "error": msg }))).into_response()
        }
        AppError::WithContext { source, .. } => source_into_client_response(source),
        other => (
            other.status_code(),
            Json(json!({ "error": "Internal Server Error", "details": other.to_string() })),
        )
            .into_response(),
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

/// Malformed bodies, wrong field types and a missing JSON content type all
/// surface as a 400 with the same `{"error": ...}` body as validation errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_keeps_message() {
        let response = AppError::lead_not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "Lead not found" }));
    }

    #[tokio::test]
    async fn database_error_is_internal_with_details() {
        let response = AppError::DatabaseError(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal Server Error");
        assert!(body["details"].as_str().unwrap().contains("Database error"));
    }

    #[tokio::test]
    async fn context_preserves_client_status() {
        let err: Result<(), AppError> = Err(AppError::BadRequest("leadId is required.".into()));
        let response = err.context("Sending outreach").unwrap_err().into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "leadId is required." }));
    }

    #[test]
    fn context_chain_is_displayed() {
        let err: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = err.with_context(|| "Loading lead 42".to_string()).unwrap_err();
        assert!(err.to_string().starts_with("Loading lead 42: Database error"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
