use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::store::PersistenceError;
use crate::waitlist::dto::SignupResponse;

/// Every way a signup can end other than success.
///
/// The public message of each variant is fixed; inner error details are
/// only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Server not configured")]
    NotConfigured,
    #[error("Invalid email")]
    InvalidEmail,
    #[error("Insert failed")]
    InsertFailed(#[source] PersistenceError),
    #[error("Unexpected error")]
    Unexpected(#[source] anyhow::Error),
}

impl SignupError {
    pub fn status(&self) -> StatusCode {
        match self {
            SignupError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            SignupError::InvalidEmail => StatusCode::BAD_REQUEST,
            SignupError::NotConfigured
            | SignupError::InsertFailed(_)
            | SignupError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PersistenceError> for SignupError {
    fn from(err: PersistenceError) -> Self {
        SignupError::InsertFailed(err)
    }
}

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(SignupResponse::failure(self.to_string()));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_class() {
        assert_eq!(SignupError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(SignupError::InvalidEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(SignupError::NotConfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            SignupError::Unexpected(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rejected_write_is_an_insert_failure() {
        let err = SignupError::from(PersistenceError::Rejected("409 conflict".into()));
        assert!(matches!(err, SignupError::InsertFailed(_)));
        assert_eq!(err.to_string(), "Insert failed");
    }

    #[test]
    fn unreachable_store_is_an_insert_failure() {
        let err = SignupError::from(PersistenceError::Unavailable("connection refused".into()));
        assert!(matches!(err, SignupError::InsertFailed(_)));
        assert_eq!(err.to_string(), "Insert failed");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
