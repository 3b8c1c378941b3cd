//! Error taxonomy shared by every stage of the pipeline.
//!
//! All failures are fatal to a run. Variants carry enough context for the command surface to
//! print a single human-readable line; [`ScribeError::class`] folds them into the four classes
//! callers reason about.

use std::path::PathBuf;

use thiserror::Error;

use crate::contract::ServiceError;

#[derive(Debug, Error)]
pub enum ScribeError {
    /// No API credential could be resolved from arguments or environment.
    #[error("API credential not found: {0}")]
    MissingCredential(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The path is not a usable repository (not a repository, bare, no commits, detached HEAD).
    #[error("invalid repository state at {path}: {reason}")]
    InvalidRepositoryState { path: PathBuf, reason: String },

    /// The generative text service failed. The service error is kept as the source untouched.
    #[error("generative service failed during '{stage}': {source}")]
    ExternalService {
        stage: String,
        #[source]
        source: ServiceError,
    },

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error("failed to persist documentation to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: ServiceError,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification used at the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    MissingCredential,
    InvalidArgument,
    InvalidRepositoryState,
    ExternalServiceFailure,
}

impl ScribeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ScribeError::MissingCredential(_) => ErrorClass::MissingCredential,
            ScribeError::InvalidArgument(_) => ErrorClass::InvalidArgument,
            ScribeError::InvalidRepositoryState { .. } => ErrorClass::InvalidRepositoryState,
            ScribeError::ExternalService { .. }
            | ScribeError::Template(_)
            | ScribeError::Persistence { .. }
            | ScribeError::Io { .. } => ErrorClass::ExternalServiceFailure,
        }
    }

    pub(crate) fn repository_state(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ScribeError::InvalidRepositoryState {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScribeError::Io {
            path: path.into(),
            source,
        }
    }
}
