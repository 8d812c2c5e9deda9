use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use santa_core::GameError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid admin credentials")]
    Unauthorized,
    #[error("game not found")]
    GameNotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Game(#[from] GameError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::GameNotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Game(GameError::ParticipantNotFound) => StatusCode::NOT_FOUND,
            ApiError::Game(GameError::DuplicateParticipant) => StatusCode::CONFLICT,
            ApiError::Game(GameError::EmptyName | GameError::Assignment(_)) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use santa_core::AssignmentError;

    #[test]
    fn insufficient_participants_is_a_bad_request() {
        let err = ApiError::from(GameError::Assignment(
            AssignmentError::InsufficientParticipants { found: 1 },
        ));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "at least 2 participants required, found 1");
    }

    #[test]
    fn lookup_failures_are_not_found() {
        assert_eq!(ApiError::GameNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(GameError::ParticipantNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(GameError::DuplicateParticipant).status(),
            StatusCode::CONFLICT
        );
    }
}
