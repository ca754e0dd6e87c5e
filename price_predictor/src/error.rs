use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::types::FormError;

/// Failures while serving a request. All of them surface as a bare 500.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid form input: {0}")]
    Form(#[from] FormError),

    #[error("prediction failed: {0}")]
    Prediction(#[from] car_model::ModelError),

    #[error("expected exactly one prediction, got {0}")]
    PredictionCount(usize),

    #[error("template rendering failed: {0}")]
    Template(#[from] minijinja::Error),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        tracing::warn!("request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
