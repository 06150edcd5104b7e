//! SQL command implementation for the claimdump CLI.

use std::fmt;

use camino::Utf8PathBuf;
use clap::Parser;
use claimdump_core::{ConversionSummary, ConvertOptions};
use claimdump_data::convert_file;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::options::{OrphanMode, QuoteMode, SchemaProfile, SchemaSource, require_existing};
use crate::{
    ARG_INPUT, ARG_ORPHANS, ARG_OUTPUT, ARG_QUOTE_STYLE, ARG_SCHEMA, ARG_SCHEMA_FILE, CliError,
    ENV_SQL_INPUT, ENV_SQL_OUTPUT,
};

/// CLI arguments for the `sql` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "sql",
    long_about = "Reassemble, demultiplex and render a dump as one INSERT \
                 statement per record, framed by a single BEGIN/COMMIT pair. \
                 The script only replaces <output> once it is complete.",
    about = "Convert a dump into a transactional SQL script"
)]
#[ortho_config(prefix = "CLAIMDUMP")]
pub(crate) struct SqlArgs {
    /// Dump to convert.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Destination for the SQL script.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
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
    /// Escaping applied to quoted text literals.
    #[arg(long = ARG_QUOTE_STYLE, value_enum, value_name = "style")]
    #[serde(default)]
    pub(crate) quote_style: Option<QuoteMode>,
}

impl SqlArgs {
    pub(crate) fn into_config(self) -> Result<SqlConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SqlConfig::try_from(merged)
    }
}

/// Resolved `sql` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SqlConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) output: Utf8PathBuf,
    pub(crate) schema: SchemaSource,
    pub(crate) options: ConvertOptions,
}

impl SqlConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.input, ARG_INPUT)?;
        self.schema.validate()
    }
}

impl TryFrom<SqlArgs> for SqlConfig {
    type Error = CliError;

    fn try_from(args: SqlArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_SQL_INPUT,
        })?;
        let output = args.output.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT,
            env: ENV_SQL_OUTPUT,
        })?;
        Ok(Self {
            input,
            output,
            schema: SchemaSource::select(args.schema, args.schema_file),
            options: ConvertOptions {
                orphans: args.orphans.unwrap_or_default().into(),
                quote_style: args.quote_style.unwrap_or_default().into(),
            },
        })
    }
}

/// Result of a successful `sql` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SqlOutcome {
    pub(crate) output: Utf8PathBuf,
    pub(crate) summary: ConversionSummary,
}

impl fmt::Display for SqlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} insert statements to {}",
            self.summary.total_rows(),
            self.output
        )?;
        for entry in self.summary.tables() {
            write!(f, "\n  {}: {}", entry.table, entry.rows)?;
        }
        Ok(())
    }
}

pub(crate) fn run_sql(args: SqlArgs) -> Result<SqlOutcome, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_sql(&config)
}

pub(crate) fn execute_sql(config: &SqlConfig) -> Result<SqlOutcome, CliError> {
    let schema = config.schema.load()?;
    let summary = convert_file(&config.input, &config.output, &schema, config.options)?;
    Ok(SqlOutcome {
        output: config.output.clone(),
        summary,
    })
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SqlConfig, CliError> {
    let merged = SqlArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SqlConfig::try_from(merged)
}
