use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug)]
pub enum ModelError {
    InvalidId { kind: &'static str, raw: String },
    InvalidProgress(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidId { kind, raw } => {
                write!(f, "invalid {kind} id: {raw:?}")
            }
            ModelError::InvalidProgress(msg) => {
                write!(f, "invalid progress: {msg}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
