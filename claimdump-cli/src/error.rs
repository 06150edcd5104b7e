//! Error types emitted by the claimdump CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use claimdump_data::{ConvertError, SinkError};
use thiserror::Error;

/// Errors emitted by the claimdump CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The output directory exists but is not a directory.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory { path: Utf8PathBuf },
    /// Opening the schema file failed.
    #[error("failed to open schema file at {path:?}: {source}")]
    OpenSchema {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Schema JSON could not be decoded or failed validation.
    #[error("failed to parse schema file at {path:?}: {source}")]
    ParseSchema {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open database at {path:?}: {source}")]
    OpenDatabase {
        path: Utf8PathBuf,
        #[source]
        source: SinkError,
    },
    /// A conversion or load failed.
    #[error(transparent)]
    Convert(#[from] ConvertError),
    /// Writing the command summary failed.
    #[error("failed to write summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}
