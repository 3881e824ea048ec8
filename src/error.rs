use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// All the ways a request can fail.
///
/// Domain failures carry a machine-readable reason string so that clients can
/// distinguish e.g. `already-voted` (safe to stop retrying) from `not-found`.
/// Infrastructure failures are collapsed into a generic 5xx; no partial
/// success is ever exposed.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Argon2(#[from] argon2::Error),
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("This email is not eligible to vote in this election")]
    Ineligible,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("A vote has already been cast by this voter")]
    AlreadyVoted,
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Jwt(_) | Self::Argon2(_) => Status::InternalServerError,
            Self::Http(_) => Status::BadGateway,
            Self::Unauthenticated(_) => Status::Unauthorized,
            Self::Ineligible => Status::Forbidden,
            Self::Validation(_) | Self::AlreadyVoted => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
        }
    }

    /// A stable machine-readable reason string for the response body.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Db(_) | Self::Jwt(_) | Self::Argon2(_) => "storage-unavailable",
            Self::Http(_) => "upstream-unavailable",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Ineligible => "ineligible",
            Self::Validation(_) => "validation-error",
            Self::AlreadyVoted => "already-voted",
            Self::NotFound(_) => "not-found",
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        // Internal errors get logged in full but are never echoed to the client.
        let message = if status.code >= 500 {
            error!("{} {} failed: {}", req.method(), req.uri(), self);
            "The server could not complete the request".to_string()
        } else {
            warn!("{} {} rejected: {}", req.method(), req.uri(), self);
            self.to_string()
        };
        let body = Json(json!({
            "error": self.reason(),
            "message": message,
        }));
        (status, body).respond_to(req)
    }
}
