use crate::intake::InputError;
use crate::model::InferenceError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

/// Errors surfaced by the HTTP shell.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("Worker pool unavailable")]
    Blocking,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Input(InputError::PayloadTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::Inference(_) | AppError::Blocking => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal failures are logged by the handler, not leaked to clients.
        let error = match self {
            AppError::Input(err) => err.to_string(),
            AppError::Inference(_) | AppError::Blocking => "Inference failed".to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse { error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_client_errors() {
        assert_eq!(
            AppError::from(InputError::MissingImage).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(InputError::PayloadTooLarge { limit: 10 }).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn inference_errors_hide_details() {
        let err = AppError::from(InferenceError::Forward("CUDA out of memory".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
