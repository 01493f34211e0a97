//! Unified service-layer error type
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `BoxError`) and the
//! API-layer error (`AppError`) so handlers can use `?` everywhere.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};
use validator::{Validate, ValidationErrors};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error
///
/// - `Db`: Database/infrastructure errors (logged, mapped to InternalError)
/// - `App`: Business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => ServiceError::App(AppError::new(ErrorCode::NotFound)),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                let mut err = AppError::new(ErrorCode::AlreadyExists);
                if let Some(constraint) = db.constraint() {
                    err = err.with_detail("constraint", constraint);
                }
                ServiceError::App(err)
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                let mut err = AppError::new(ErrorCode::InvalidReference);
                if let Some(constraint) = db.constraint() {
                    err = err.with_detail("constraint", constraint);
                }
                ServiceError::App(err)
            }
            _ => ServiceError::Db(e.into()),
        }
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ErrorCode> for ServiceError {
    fn from(code: ErrorCode) -> Self {
        ServiceError::App(AppError::new(code))
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(e: ValidationErrors) -> Self {
        ServiceError::App(validation_error(&e))
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                let err = AppError::new(ErrorCode::InternalError);
                if cfg!(debug_assertions) {
                    err.with_detail("cause", db_err.to_string())
                } else {
                    err
                }
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl ServiceError {
    /// Error code carried by this error (`InternalError` for infrastructure failures)
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::App(e) => e.code,
            ServiceError::Db(_) => ErrorCode::InternalError,
        }
    }

    /// Unique-constraint violation on the named constraint
    pub fn is_unique_violation_on(&self, constraint: &str) -> bool {
        match self {
            ServiceError::App(e) if e.code == ErrorCode::AlreadyExists => e
                .details
                .as_ref()
                .and_then(|d| d.get("constraint"))
                .and_then(|v| v.as_str())
                .is_some_and(|c| c == constraint),
            _ => false,
        }
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Map validator output to a 400 with per-field messages
pub fn validation_error(errors: &ValidationErrors) -> AppError {
    let mut err = AppError::new(ErrorCode::ValidationFailed);
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        err = err.with_detail(field.to_string(), messages);
    }
    for (field, kind) in errors.errors() {
        if matches!(kind, validator::ValidationErrorsKind::Field(_)) {
            continue;
        }
        err = err.with_detail(field.to_string(), "invalid");
    }
    err
}

/// Run derive-based validation on a request payload
pub fn validate<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(|e| validation_error(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 3))]
        name: String,
        #[validate(range(min = 1))]
        quantity: i32,
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let err = validate(&Probe {
            name: "ab".into(),
            quantity: 0,
        })
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert!(details.contains_key("name"));
        assert!(details.contains_key("quantity"));
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_db_error_becomes_internal() {
        let err = ServiceError::Db("connection reset".into());
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::InternalError);
        assert_eq!(app.http_status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_app_error_passes_through() {
        let err: ServiceError = ErrorCode::CouponExpired.into();
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::CouponExpired);
    }
}
