use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{catch, Request};
use serde::Serialize;
use thiserror::Error;

use std::io;
use std::sync::PoisonError;

use crate::breakdown::BreakdownError;

#[derive(Debug, Error)]
pub enum InternalError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("task not found: {id}")]
    NotFound { id: String },

    #[error("task already exists: {id}")]
    DuplicateKey { id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("database lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Breakdown(#[from] BreakdownError),
}

impl<T> From<PoisonError<T>> for InternalError {
    fn from(e: PoisonError<T>) -> InternalError {
        InternalError::LockPoisoned(e.to_string())
    }
}

impl From<&str> for InternalError {
    fn from(s: &str) -> InternalError {
        InternalError::InvalidInput(s.to_string())
    }
}

impl InternalError {
    pub fn status(&self) -> Status {
        match self {
            InternalError::NotFound { .. } => Status::NotFound,
            InternalError::DuplicateKey { .. } => Status::Conflict,
            InternalError::InvalidInput(_) => Status::BadRequest,
            InternalError::Breakdown(e) if e.is_unavailable() => Status::ServiceUnavailable,
            _ => Status::InternalServerError,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl<'r> Responder<'r, 'static> for InternalError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        log::error!("{} {} failed: {}", request.method(), request.uri(), self);

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .respond_to(request)
    }
}

pub type InternalResult<T> = Result<T, InternalError>;

fn error_body(message: String) -> Json<ErrorBody> {
    Json(ErrorBody { error: message })
}

#[catch(404)]
pub fn not_found(request: &Request) -> Json<ErrorBody> {
    error_body(format!("no route for {} {}", request.method(), request.uri()))
}

#[catch(422)]
pub fn unprocessable_body(request: &Request) -> Json<ErrorBody> {
    log::warn!("{} {}: request body rejected", request.method(), request.uri());
    error_body("request body is malformed or has invalid fields".to_string())
}

#[catch(default)]
pub fn any_status(status: Status, request: &Request) -> (Status, Json<ErrorBody>) {
    log::warn!("{} {} failed with {}", request.method(), request.uri(), status);
    (status, error_body(status.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_http_statuses() {
        let not_found = InternalError::NotFound { id: "a".into() };
        let duplicate = InternalError::DuplicateKey { id: "a".into() };
        let invalid = InternalError::from("empty title");
        let no_model = InternalError::from(BreakdownError::NoModelAvailable);
        let malformed = InternalError::from(BreakdownError::MalformedResponse("x".into()));

        assert_eq!(not_found.status(), Status::NotFound);
        assert_eq!(duplicate.status(), Status::Conflict);
        assert_eq!(invalid.status(), Status::BadRequest);
        assert_eq!(no_model.status(), Status::ServiceUnavailable);
        assert_eq!(malformed.status(), Status::InternalServerError);
    }
}
