//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error body is JSON of the form `{"message": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::cart::{PersistenceError, UpdateError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// The cart update was rejected or could not be saved. The message is
    /// already safe for shoppers.
    #[error(transparent)]
    Cart(#[from] UpdateError),

    /// Reading cart state failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Cart(_) => StatusCode::BAD_REQUEST,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Cart(err) => err.message().to_owned(),
            Self::Persistence(_) => "Internal server error".to_string(),
        };

        (self.status(), Json(ErrorBody { message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use cartkeeper_core::CartId;

    use super::*;
    use crate::cart::GENERIC_UPDATE_FAILURE;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Persistence(PersistenceError::CartNotFound(CartId::new(12)));
        assert_eq!(err.to_string(), "Persistence error: cart 12 not found");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Cart(UpdateError::CouldNotPersist(
                "test".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Persistence(PersistenceError::Unavailable(
                "test".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_cart_error_body_carries_message() {
        let response = AppError::Cart(UpdateError::CouldNotPersist(
            GENERIC_UPDATE_FAILURE.to_string(),
        ))
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["message"], GENERIC_UPDATE_FAILURE);
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::Persistence(PersistenceError::DataCorruption(
            "line 4 has quantity -1".to_string(),
        ))
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
