//! Errors raised by file-backed conversions.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use claimdump_core::{DumpError, TableName};
use thiserror::Error;

use crate::sink::SinkError;

/// Failures that abort a file-backed conversion.
///
/// File outputs are never left half written when one of these is returned.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Opening the input dump failed.
    #[error("failed to open dump at {path:?}")]
    OpenInput {
        /// Input path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Reading a line of the input dump failed, including invalid UTF-8.
    #[error("failed to read line {line_number} of {path:?}")]
    ReadInput {
        /// Input path.
        path: Utf8PathBuf,
        /// 1-based line that could not be read.
        line_number: usize,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Creating an output file or its directory failed.
    #[error("failed to create output {path:?}")]
    CreateOutput {
        /// Output path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing to an output file failed.
    #[error("failed to write output {path:?}")]
    WriteOutput {
        /// Output path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Moving a completed output file into place failed.
    #[error("failed to persist output {path:?}")]
    PersistOutput {
        /// Output path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The dump is structurally invalid.
    #[error("malformed dump {path:?}: {source}")]
    Dump {
        /// Input path.
        path: Utf8PathBuf,
        /// Structural failure.
        #[source]
        source: DumpError,
    },
    /// The relational sink rejected a batch.
    #[error("failed to load table {table}: {source}")]
    Sink {
        /// Table whose rows were being loaded.
        table: TableName,
        /// Sink failure.
        #[source]
        source: SinkError,
    },
}

impl ConvertError {
    /// Attribute a pipeline failure to the input or the output path.
    pub(crate) fn from_dump(source: DumpError, input: &Utf8Path, output: &Utf8Path) -> Self {
        match source {
            DumpError::Write { source } => Self::WriteOutput {
                path: output.to_owned(),
                source,
            },
            other => Self::Dump {
                path: input.to_owned(),
                source: other,
            },
        }
    }
}
