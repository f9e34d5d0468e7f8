//! Error handling for recombination data ingestion.
//!
//! Provides error types for numeric decoding, header and block structure
//! failures, invalid transitions, file selection and persistence, with
//! line and file context attached as errors propagate outward.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Sh95Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Malformed numeric field '{token}': {reason}")]
    Format { token: String, reason: String },

    #[error("Invalid header '{header}': {reason}")]
    Header { header: String, reason: String },

    #[error("Inconsistent block structure: {reason}")]
    Structural { reason: String },

    #[error("Invalid transition n1={n1}, n2={n2} (z={z}): {reason}")]
    Domain {
        n1: u32,
        n2: u32,
        z: u32,
        reason: String,
    },

    #[error("Not a valid data file: {name} - {reason}")]
    FileSelection { name: String, reason: String },

    #[error("Data directory not found at path: {path}")]
    DatasetNotFound { path: PathBuf },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Interrupted by user")]
    Interrupted,

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<Sh95Error>,
    },

    #[error("{path}: {source}")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<Sh95Error>,
    },
}

impl Sh95Error {
    pub fn format(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            token: token.into(),
            reason: reason.into(),
        }
    }

    pub fn header(header: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Header {
            header: header.into(),
            reason: reason.into(),
        }
    }

    pub fn structural(reason: impl Into<String>) -> Self {
        Self::Structural {
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Attach a 1-based line number, unless one is already attached
    pub fn at_line(self, line: usize) -> Self {
        match self {
            located @ Self::AtLine { .. } => located,
            other => Self::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }

    /// Attach the file being ingested
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Self::InFile {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// The underlying error with all location wrappers removed
    pub fn root_cause(&self) -> &Sh95Error {
        match self {
            Self::AtLine { source, .. } | Self::InFile { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Line number attached anywhere in the wrapper chain
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::AtLine { line, .. } => Some(*line),
            Self::InFile { source, .. } => source.line(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Sh95Error>;
