//! Command-line interface for converting pipe-delimited claim dumps.
#![forbid(unsafe_code)]

use std::{fmt, io::Write};

use clap::{Parser, Subcommand};

mod clean;
mod error;
mod load;
mod options;
mod split;
mod sql;

pub use error::CliError;

use clean::CleanArgs;
use load::LoadArgs;
use split::SplitArgs;
use sql::SqlArgs;

const ARG_INPUT: &str = "input";
const ARG_OUTPUT: &str = "output";
const ARG_OUTPUT_DIR: &str = "output-dir";
const ARG_DATABASE: &str = "database";
const ARG_SCHEMA: &str = "schema";
const ARG_SCHEMA_FILE: &str = "schema-file";
const ARG_ORPHANS: &str = "orphans";
const ARG_QUOTE_STYLE: &str = "quote-style";
const ARG_USE_SCHEMA: &str = "use-schema";
const ENV_CLEAN_INPUT: &str = "CLAIMDUMP_CMDS_CLEAN_INPUT";
const ENV_CLEAN_OUTPUT: &str = "CLAIMDUMP_CMDS_CLEAN_OUTPUT";
const ENV_SPLIT_INPUT: &str = "CLAIMDUMP_CMDS_SPLIT_INPUT";
const ENV_SPLIT_OUTPUT_DIR: &str = "CLAIMDUMP_CMDS_SPLIT_OUTPUT_DIR";
const ENV_SQL_INPUT: &str = "CLAIMDUMP_CMDS_SQL_INPUT";
const ENV_SQL_OUTPUT: &str = "CLAIMDUMP_CMDS_SQL_OUTPUT";
const ENV_LOAD_INPUT: &str = "CLAIMDUMP_CMDS_LOAD_INPUT";
const ENV_LOAD_DATABASE: &str = "CLAIMDUMP_CMDS_LOAD_DATABASE";

/// Run the claimdump CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, &mut stdout)
}

fn run_command(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Clean(args) => write_summary(writer, &clean::run_clean(args)?),
        Command::Split(args) => write_summary(writer, &split::run_split(args)?),
        Command::Sql(args) => write_summary(writer, &sql::run_sql(args)?),
        Command::Load(args) => write_summary(writer, &load::run_load(args)?),
    }
}

fn write_summary(writer: &mut dyn Write, summary: &dyn fmt::Display) -> Result<(), CliError> {
    writeln!(writer, "{summary}").map_err(CliError::WriteSummary)
}

#[derive(Debug, Parser)]
#[command(
    name = "claimdump",
    about = "Convert pipe-delimited Node/Edge/Claim dumps into clean files, SQL or SQLite",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rewrite a dump with one logical record per line.
    Clean(CleanArgs),
    /// Split an interleaved dump into one file per table.
    Split(SplitArgs),
    /// Convert a dump into a transactional SQL script.
    Sql(SqlArgs),
    /// Load a dump into a SQLite database.
    Load(LoadArgs),
}

#[cfg(test)]
mod tests;
