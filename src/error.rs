//! Error types shared across the extraction and generation pipeline.

use std::fmt;

/// Error type for the extraction/generation pipeline
#[derive(Debug)]
pub enum GisError {
    /// `PostgreSQL` error from `may_postgres`
    Postgres(may_postgres::Error),
    /// Configuration error (missing password, bad config file, ...)
    Config(String),
    /// Catalogue file error (unreadable workbook, missing worksheet, ...)
    Catalogue(String),
    /// Template or layout file error
    Template(String),
    /// Script/project-file generation error
    Generation(String),
    /// Filesystem error
    Io(std::io::Error),
}

impl fmt::Display for GisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GisError::Postgres(e) => {
                write!(f, "PostgreSQL error: {e}")
            }
            GisError::Config(s) => {
                write!(f, "Configuration error: {s}")
            }
            GisError::Catalogue(s) => {
                write!(f, "Catalogue error: {s}")
            }
            GisError::Template(s) => {
                write!(f, "Template error: {s}")
            }
            GisError::Generation(s) => {
                write!(f, "Generation error: {s}")
            }
            GisError::Io(e) => {
                write!(f, "I/O error: {e}")
            }
        }
    }
}

impl std::error::Error for GisError {}

impl From<may_postgres::Error> for GisError {
    fn from(err: may_postgres::Error) -> Self {
        GisError::Postgres(err)
    }
}

impl From<std::io::Error> for GisError {
    fn from(err: std::io::Error) -> Self {
        GisError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, GisError>;
