//! Clean command implementation for the claimdump CLI.

use std::fmt;

use camino::Utf8PathBuf;
use clap::Parser;
use claimdump_core::OrphanPolicy;
use claimdump_data::{CleanReport, clean_file};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::options::{OrphanMode, SchemaProfile, SchemaSource, require_existing};
use crate::{
    ARG_INPUT, ARG_ORPHANS, ARG_OUTPUT, ARG_SCHEMA, ARG_SCHEMA_FILE, ARG_USE_SCHEMA, CliError,
    ENV_CLEAN_INPUT, ENV_CLEAN_OUTPUT,
};

/// CLI arguments for the `clean` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "clean",
    long_about = "Join wrapped continuation lines so every logical record \
                 occupies one line. Without --use-schema every line that does \
                 not start with a digit is a continuation, which suits the \
                 per-table files written by `split`.",
    about = "Rewrite a dump with one logical record per line"
)]
#[ortho_config(prefix = "CLAIMDUMP")]
pub(crate) struct CleanArgs {
    /// Dump or per-table file to clean.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Destination for the cleaned records.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Keep the schema's table markers and headers on their own lines.
    #[arg(
        long = ARG_USE_SCHEMA,
        value_name = "bool",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) use_schema: Option<bool>,
    /// Built-in dump layout used with --use-schema.
    #[arg(long = ARG_SCHEMA, value_enum, value_name = "profile")]
    #[serde(default)]
    pub(crate) schema: Option<SchemaProfile>,
    /// JSON schema file used with --use-schema, overriding --schema.
    #[arg(long = ARG_SCHEMA_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) schema_file: Option<Utf8PathBuf>,
    /// Handling of continuation lines before the first record.
    #[arg(long = ARG_ORPHANS, value_enum, value_name = "policy")]
    #[serde(default)]
    pub(crate) orphans: Option<OrphanMode>,
}

impl CleanArgs {
    pub(crate) fn into_config(self) -> Result<CleanConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CleanConfig::try_from(merged)
    }
}

/// Resolved `clean` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CleanConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) output: Utf8PathBuf,
    /// Present only when markers should be kept.
    pub(crate) schema: Option<SchemaSource>,
    pub(crate) orphans: OrphanPolicy,
}

impl CleanConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input, ARG_INPUT)?;
        self.schema
            .as_ref()
            .map_or(Ok(()), SchemaSource::validate)
    }
}

impl TryFrom<CleanArgs> for CleanConfig {
    type Error = CliError;

    fn try_from(args: CleanArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_CLEAN_INPUT,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_CLEAN_OUTPUT,
        })?;
        let schema = args
            .use_schema
            .unwrap_or(false)
            .then(|| SchemaSource::select(args.schema, args.schema_file));
        Ok(Self {
            input,
            output,
            schema,
            orphans: args.orphans.unwrap_or_default().into(),
        })
    }
}

/// Result of a successful `clean` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CleanOutcome {
    pub(crate) output: Utf8PathBuf,
    pub(crate) report: CleanReport,
}

impl fmt::Display for CleanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cleaned {} records into {} ({} orphan lines dropped)",
            self.report.records, self.output, self.report.dropped_lines
        )
    }
}

pub(crate) fn run_clean(args: CleanArgs) -> Result<CleanOutcome, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_clean(&config)
}

pub(crate) fn execute_clean(config: &CleanConfig) -> Result<CleanOutcome, CliError> {
    let schema = config.schema.as_ref().map(SchemaSource::load).transpose()?;
    let report = clean_file(
        &config.input,
        &config.output,
        schema.as_ref(),
        config.orphans,
    )?;
    Ok(CleanOutcome {
        output: config.output.clone(),
        report,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<CleanConfig, CliError> {
    let merged = CleanArgs::merge_from_layers(layers).map_err(CliError::from)?;
    CleanConfig::try_from(merged)
}
