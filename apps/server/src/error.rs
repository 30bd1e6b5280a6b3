//! Maps service errors onto HTTP responses.
//!
//! Clients only ever see a stable code and a fixed message; the underlying error is logged.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use keeper_identity::IdentityError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

/// Error body returned by every unary endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Stable machine-readable code (`ALREADY_EXISTS`, `UNAUTHENTICATED`, ...).
    pub code: String,
    /// Human-readable summary.
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError(IdentityError);

impl From<IdentityError> for ApiError {
    fn from(source: IdentityError) -> Self {
        Self(source)
    }
}

impl ApiError {
    const fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match &self.0 {
            IdentityError::AlreadyExists { .. } => {
                (StatusCode::CONFLICT, "ALREADY_EXISTS", "This username is already taken")
            }
            IdentityError::Unauthenticated { .. } => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", "Wrong username or password")
            }
            IdentityError::Validation { .. } => (
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
                "Username and password must not be empty",
            ),
            IdentityError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            warn!(error = %self.0, code, "Request rejected");
        }

        (status, Json(ErrorResponse { code: code.to_owned(), message: message.to_owned() }))
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keeper_database::StorageError;

    #[test]
    fn identity_errors_map_to_statuses() {
        let cases = [
            (
                IdentityError::AlreadyExists { message: "taken".into(), context: None },
                StatusCode::CONFLICT,
                "ALREADY_EXISTS",
            ),
            (
                IdentityError::Unauthenticated { message: "nope".into(), context: None },
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
            ),
            (
                IdentityError::Validation { message: "blank".into(), context: None },
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
            ),
            (
                IdentityError::from(StorageError::Internal {
                    message: "disk on fire".into(),
                    context: None,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
            ),
        ];

        for (source, status, code) in cases {
            let err = ApiError::from(source);
            assert_eq!(err.parts().0, status);
            assert_eq!(err.parts().1, code);
        }
    }

    #[test]
    fn messages_do_not_leak_error_text() {
        let err = ApiError::from(IdentityError::from(StorageError::Internal {
            message: "disk on fire".into(),
            context: None,
        }));
        assert!(!err.parts().2.contains("disk"));
    }
}
