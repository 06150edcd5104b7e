//! Split command implementation for the claimdump CLI.

use std::fmt;

use camino::Utf8PathBuf;
use clap::Parser;
use claimdump_data::{SplitReport, split_file};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::options::{SchemaProfile, SchemaSource, require_directory_or_absent, require_existing};
use crate::{
    ARG_INPUT, ARG_OUTPUT_DIR, ARG_SCHEMA, ARG_SCHEMA_FILE, CliError, ENV_SPLIT_INPUT,
    ENV_SPLIT_OUTPUT_DIR,
};

/// CLI arguments for the `split` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "split",
    long_about = "Write each table's data lines to <output-dir>/<table>.txt. \
                 Markers and headers are consumed and wrapped records are \
                 left as they are; run `clean` on each file afterwards.",
    about = "Split an interleaved dump into one file per table"
)]
#[ortho_config(prefix = "CLAIMDUMP")]
pub(crate) struct SplitArgs {
    /// Interleaved dump to split.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Directory receiving one file per table.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Built-in dump layout.
    #[arg(long = ARG_SCHEMA, value_enum, value_name = "profile")]
    #[serde(default)]
    pub(crate) schema: Option<SchemaProfile>,
    /// JSON schema file, overriding --schema.
    #[arg(long = ARG_SCHEMA_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) schema_file: Option<Utf8PathBuf>,
}

impl SplitArgs {
    pub(crate) fn into_config(self) -> Result<SplitConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SplitConfig::try_from(merged)
    }
}

/// Resolved `split` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SplitConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) schema: SchemaSource,
}

impl SplitConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input, ARG_INPUT)?;
        self.schema.validate()?;
        require_directory_or_absent(&self.output_dir, ARG_OUTPUT_DIR)
    }
}

impl TryFrom<SplitArgs> for SplitConfig {
    type Error = CliError;

    fn try_from(args: SplitArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_SPLIT_INPUT,
        })?;
        let output_dir = args.output_dir.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT_DIR,
            env: ENV_SPLIT_OUTPUT_DIR,
        })?;
        Ok(Self {
            input,
            output_dir,
            schema: SchemaSource::select(args.schema, args.schema_file),
        })
    }
}

/// Result of a successful `split` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SplitOutcome {
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) report: SplitReport,
}

impl fmt::Display for SplitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "split into {} table files under {}",
            self.report.files.len(),
            self.output_dir
        )?;
        for file in &self.report.files {
            write!(f, "\n  {}: {} lines -> {}", file.table, file.lines, file.path)?;
        }
        Ok(())
    }
}

pub(crate) fn run_split(args: SplitArgs) -> Result<SplitOutcome, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_split(&config)
}

pub(crate) fn execute_split(config: &SplitConfig) -> Result<SplitOutcome, CliError> {
    let schema = config.schema.load()?;
    let report = split_file(&config.input, &config.output_dir, &schema)?;
    Ok(SplitOutcome {
        output_dir: config.output_dir.clone(),
        report,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SplitConfig, CliError> {
    let merged = SplitArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SplitConfig::try_from(merged)
}
