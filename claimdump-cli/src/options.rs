//! Option values and path checks shared by every subcommand.

use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use claimdump_core::{DumpSchema, OrphanPolicy, QuoteStyle};
use claimdump_fs::{dir_is_dir, file_is_file, open_utf8_file};
use serde::{Deserialize, Serialize};

use crate::{ARG_SCHEMA_FILE, CliError};

/// Built-in dump layouts selectable with `--schema`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum SchemaProfile {
    /// `NODES:|`, `EDGES:|` and `CLAIMS:|` sentinels followed by a header line.
    #[default]
    SectionMarkers,
    /// Each table's header line opens its section.
    HeaderMarkers,
}

impl SchemaProfile {
    pub(crate) fn schema(self) -> DumpSchema {
        match self {
            Self::SectionMarkers => DumpSchema::section_markers(),
            Self::HeaderMarkers => DumpSchema::header_markers(),
        }
    }
}

/// Handling of continuation lines with no record to extend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum OrphanMode {
    /// Skip the line with a warning.
    #[default]
    Drop,
    /// Abort on the first orphan line.
    Reject,
}

impl From<OrphanMode> for OrphanPolicy {
    fn from(mode: OrphanMode) -> Self {
        match mode {
            OrphanMode::Drop => Self::Drop,
            OrphanMode::Reject => Self::Reject,
        }
    }
}

/// Escaping applied to text literals in generated SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum QuoteMode {
    /// Double embedded single quotes.
    #[default]
    Escaped,
    /// Copy tokens untouched, as legacy scripts did.
    Verbatim,
}

impl From<QuoteMode> for QuoteStyle {
    fn from(mode: QuoteMode) -> Self {
        match mode {
            QuoteMode::Escaped => Self::Escaped,
            QuoteMode::Verbatim => Self::Verbatim,
        }
    }
}

/// Where a command's [`DumpSchema`] comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SchemaSource {
    Profile(SchemaProfile),
    File(Utf8PathBuf),
}

impl SchemaSource {
    /// A schema file takes precedence over a profile.
    pub(crate) fn select(profile: Option<SchemaProfile>, file: Option<Utf8PathBuf>) -> Self {
        file.map_or_else(|| Self::Profile(profile.unwrap_or_default()), Self::File)
    }

    pub(crate) fn validate(&self) -> Result<(), CliError> {
        match self {
            Self::Profile(_) => Ok(()),
            Self::File(path) => require_existing(path, ARG_SCHEMA_FILE),
        }
    }

    pub(crate) fn load(&self) -> Result<DumpSchema, CliError> {
        match self {
            Self::Profile(profile) => Ok(profile.schema()),
            Self::File(path) => load_schema_file(path),
        }
    }
}

/// Loads a JSON-encoded [`DumpSchema`] from disk.
pub(crate) fn load_schema_file(path: &Utf8Path) -> Result<DumpSchema, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenSchema {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseSchema {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Accept a directory or a path that does not exist yet.
pub(crate) fn require_directory_or_absent(
    path: &Utf8Path,
    field: &'static str,
) -> Result<(), CliError> {
    match dir_is_dir(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::OutputDirectoryNotDirectory {
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}
