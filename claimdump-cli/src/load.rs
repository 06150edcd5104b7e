//! Load command implementation for the claimdump CLI.

use std::fmt;

use camino::Utf8PathBuf;
use clap::Parser;
use claimdump_core::OrphanPolicy;
use claimdump_data::{LoadReport, SqliteSink, load_file};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::options::{OrphanMode, SchemaProfile, SchemaSource, require_existing};
use crate::{
    ARG_DATABASE, ARG_INPUT, ARG_ORPHANS, ARG_SCHEMA, ARG_SCHEMA_FILE, CliError,
    ENV_LOAD_DATABASE, ENV_LOAD_INPUT,
};

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "load",
    long_about = "Insert every record of a dump into a SQLite database as \
                 typed rows. Tables missing from the database are created \
                 with the dump's header columns.",
    about = "Load a dump into a SQLite database"
)]
#[ortho_config(prefix = "CLAIMDUMP")]
pub(crate) struct LoadArgs {
    /// Dump to load.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// SQLite database file, created when missing.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Built-in dump layout.
    #[arg(long = ARG_SCHEMA, value_enum, value_name = "profile")]
    #[serde(default)]
    pub(crate) schema: Option<SchemaProfile>,
    /// JSON schema file, overriding --schema.
    #[arg(long = ARG_SCHEMA_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) schema_file: Option<Utf8PathBuf>,
    /// Handling of continuation lines before the first record.
    #[arg(long = ARG_ORPHANS, value_enum, value_name = "policy")]
    #[serde(default)]
    pub(crate) orphans: Option<OrphanMode>,
}

impl LoadArgs {
    pub(crate) fn into_config(self) -> Result<LoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LoadConfig::try_from(merged)
    }
}

/// Resolved `load` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
    pub(crate) schema: SchemaSource,
    pub(crate) orphans: OrphanPolicy,
}

impl LoadConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input, ARG_INPUT)?;
        self.schema.validate()
    }
}

impl TryFrom<LoadArgs> for LoadConfig {
    type Error = CliError;

    fn try_from(args: LoadArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_LOAD_INPUT,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_LOAD_DATABASE,
        })?;
        Ok(Self {
            input,
            database,
            schema: SchemaSource::select(args.schema, args.schema_file),
            orphans: args.orphans.unwrap_or_default().into(),
        })
    }
}

/// Result of a successful `load` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadOutcome {
    pub(crate) database: Utf8PathBuf,
    pub(crate) report: LoadReport,
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loaded {} rows into {}",
            self.report.total_rows(),
            self.database
        )?;
        for entry in &self.report.tables {
            write!(f, "\n  {}: {}", entry.table, entry.rows)?;
        }
        Ok(())
    }
}

pub(crate) fn run_load(args: LoadArgs) -> Result<LoadOutcome, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_load(&config)
}

pub(crate) fn execute_load(config: &LoadConfig) -> Result<LoadOutcome, CliError> {
    let schema = config.schema.load()?;
    let mut sink =
        SqliteSink::open(&config.database).map_err(|source| CliError::OpenDatabase {
            path: config.database.clone(),
            source,
        })?;
    let report = load_file(&config.input, &schema, config.orphans, &mut sink)?;
    Ok(LoadOutcome {
        database: config.database.clone(),
        report,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<LoadConfig, CliError> {
    let merged = LoadArgs::merge_from_layers(layers).map_err(CliError::from)?;
    LoadConfig::try_from(merged)
}
