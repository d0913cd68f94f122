use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Resource not found error.
    NotFound(String),
    /// Bad request error (malformed input).
    BadRequest(String),
    /// Request fields that failed validation, keyed by field name.
    Validation(BTreeMap<String, String>),
    /// Unique constraint violation (duplicate cpf, email or credit code).
    Conflict(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Single-field validation failure.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut details = BTreeMap::new();
        details.insert(field.into(), message.into());
        AppError::Validation(details)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Validation(details) => {
                write!(f, "Validation failed:")?;
                for (field, message) in details {
                    write!(f, " {}: {};", field, message)?;
                }
                Ok(())
            }
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

/// JSON body returned for every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExceptionDetails {
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub exception: String,
    pub details: BTreeMap<String, String>,
}

pub const BAD_REQUEST_TITLE: &str = "Bad Request! Consult the documentation";
pub const NOT_FOUND_TITLE: &str = "Not Found! Consult the documentation";
pub const CONFLICT_TITLE: &str = "Conflict! Consult the documentation";
pub const INTERNAL_ERROR_TITLE: &str = "Internal Server Error! Contact the administrator";

fn single(key: &str, value: String) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();
    details.insert(key.to_string(), value);
    details
}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status and an `ExceptionDetails` body.
    /// Database and internal errors are logged; their text never reaches the client.
    fn into_response(self) -> Response {
        let (status, title, exception, details) = match self {
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_TITLE,
                    "DatabaseError",
                    single("cause", "Database error".to_string()),
                )
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                NOT_FOUND_TITLE,
                "NotFoundError",
                single("message", msg),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                BAD_REQUEST_TITLE,
                "BadRequestError",
                single("message", msg),
            ),
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                BAD_REQUEST_TITLE,
                "ValidationError",
                fields,
            ),
            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    CONFLICT_TITLE,
                    "ConflictError",
                    single("message", msg),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_TITLE,
                    "InternalError",
                    single("cause", "Internal server error".to_string()),
                )
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return (*source).into_response();
            }
        };

        let body = ExceptionDetails {
            title: title.to_string(),
            timestamp: Utc::now(),
            status: status.as_u16(),
            exception: exception.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<validator::ValidationErrors> for AppError {
    /// Keeps the first message reported for each invalid field, keyed by its JSON name.
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => e.code.to_string(),
                    })
                    .unwrap_or_else(|| "invalid".to_string());
                (camel_case(field), message)
            })
            .collect();
        AppError::Validation(details)
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: f(),
        })
    }
}
