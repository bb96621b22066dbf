use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tessera_core::AppError;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }

        let payload = Json(ErrorResponse::new(self.0.to_string()));

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use tessera_core::AppError;
    use tessera_domain::{AccessDenial, GrantError};

    use super::ApiError;

    #[test]
    fn denials_and_grant_errors_map_to_status_codes() {
        let forbidden = ApiError::from(AppError::from(AccessDenial::NotAuthorized));
        let conflict = ApiError::from(AppError::from(GrantError::DuplicateGrant {
            resource_id: "r".to_owned(),
            auth_object_id: "u".to_owned(),
        }));
        let immutable = ApiError::from(AppError::from(GrantError::CreatorGrantImmutable {
            grant_id: "g".to_owned(),
        }));

        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(immutable.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
