use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

pub type HrResult<T> = Result<T, HrError>;

/// Failures surfaced by the attendance and leave workflows.
#[derive(Debug, Display)]
pub enum HrError {
    #[display(fmt = "{} not found with id: {}", entity, id)]
    NotFound { entity: &'static str, id: u64 },
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    State(String),
    #[display(fmt = "{}: {}", field, message)]
    Validation { field: &'static str, message: String },
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "internal error: {}", _0)]
    Internal(String),
}

impl HrError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            HrError::NotFound { .. } => "NOT_FOUND",
            HrError::Conflict(_) => "CONFLICT",
            HrError::State(_) => "INVALID_STATE",
            HrError::Validation { .. } => "VALIDATION_ERROR",
            HrError::Database(_) | HrError::Internal(_) => "INTERNAL",
        }
    }
}

impl std::error::Error for HrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HrError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for HrError {
    fn from(value: sqlx::Error) -> Self {
        Self::Database(value)
    }
}

/// True when the database rejected a write on a unique key.
pub fn is_duplicate_key(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

impl ResponseError for HrError {
    fn status_code(&self) -> StatusCode {
        match self {
            HrError::NotFound { .. } => StatusCode::NOT_FOUND,
            HrError::Conflict(_) => StatusCode::CONFLICT,
            HrError::State(_) | HrError::Validation { .. } => StatusCode::BAD_REQUEST,
            HrError::Database(_) | HrError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            HrError::Database(_) | HrError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                json!({ "message": "Internal Server Error", "code": self.code() })
            }
            HrError::Validation { field, message } => json!({
                "message": message,
                "field": field,
                "code": self.code(),
            }),
            _ => json!({ "message": self.to_string(), "code": self.code() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
