use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    fn is_unique_violation(&self) -> bool {
        match self {
            AppError::DbError(sqlx::Error::Database(db)) => {
                db.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, data) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), None),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string(), None),
            AppError::Validation { field, message } => {
                let mut scoped = serde_json::Map::new();
                scoped.insert(
                    (*field).to_string(),
                    serde_json::Value::String(message.clone()),
                );
                (
                    StatusCode::BAD_REQUEST,
                    "Validation error".to_string(),
                    Some(serde_json::Value::Object(scoped)),
                )
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), None),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string(), None),
            // 23505: a duplicate that raced past an application pre-check.
            AppError::DbError(_) if self.is_unique_violation() => (
                StatusCode::BAD_REQUEST,
                "Already exists".to_string(),
                None,
            ),
            AppError::DbError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None),
            AppError::OrmError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None),
        };

        let data = data.unwrap_or_else(|| serde_json::json!({ "error": self.to_string() }));
        let body = ApiResponse {
            message,
            data: Some(data),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
