use log::{debug, warn};
use rocket::{http::Status, response::Responder};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Bad request: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    AlreadyCompleted(String),
}

impl Error {
    /// Shorthand for a missing resource, described by `what`.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = match self {
            Self::Validation(_) => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::AlreadyCompleted(_) => Status::Conflict,
        };
        if status == Status::NotFound {
            debug!("{} {}: {}", req.method(), req.uri(), self);
        } else {
            warn!("{} {}: {}", req.method(), req.uri(), self);
        }
        Err(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            Error::not_found("Session 'ABC123'").to_string(),
            "Not found: Session 'ABC123'"
        );
        assert_eq!(
            Error::Validation("empty name".to_string()).to_string(),
            "Bad request: empty name"
        );
    }
}
