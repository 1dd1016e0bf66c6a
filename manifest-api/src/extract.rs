use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::error::AppError;

/// `Json` extractor whose rejections are reported as validation errors with
/// the usual `{"error": ...}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(format!("Validation failed: {}", rejection.body_text()))
    }
}
