use thiserror::Error;

/// Input validation failures, rejected before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message content is empty")]
    EmptyContent,

    #[error("Message content exceeds {max} characters (got {got})")]
    ContentTooLong { max: usize, got: usize },
}
