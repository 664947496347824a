// crates/tempflux-core/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

use crate::conversion::ConversionError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to open input file {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input file {path} is empty; expected a header row")]
    MissingHeader { path: PathBuf },

    #[error("data row on line {line} has {found} fields; expected {expected}")]
    MalformedRow {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("line {line}: field {field} is not valid UTF-8")]
    InvalidUtf8 { line: u64, field: usize },

    #[error("data row on line {line}: {source}")]
    Conversion {
        line: u64,
        #[source]
        source: ConversionError,
    },

    #[error("failed to open output file {path}: {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to move staged output into {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure classes a caller can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InputOpen,
    MalformedInput,
    Conversion,
    OutputOpen,
    Io,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::InputOpen { .. } => FailureKind::InputOpen,
            PipelineError::MissingHeader { .. }
            | PipelineError::MalformedRow { .. }
            | PipelineError::InvalidUtf8 { .. } => FailureKind::MalformedInput,
            PipelineError::Conversion { .. } => FailureKind::Conversion,
            PipelineError::OutputOpen { .. } => FailureKind::OutputOpen,
            PipelineError::Csv(_) | PipelineError::Io(_) | PipelineError::Persist { .. } => {
                FailureKind::Io
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
