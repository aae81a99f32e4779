use thiserror::Error;

/// Domain errors surfaced by the account and friendship services.
///
/// Every variant is recovered at the route layer and turned into a status
/// code or a notice redirect; none of these abort the process.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("duplicate: {0}")]
    Duplicate(&'static str),
    #[error("self-reference: {0}")]
    SelfReference(&'static str),
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("permission denied: {0}")]
    Permission(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
