//! Error types produced while decoding a dump and emitting SQL.

use std::io;

use thiserror::Error;

use crate::TableName;

/// Structural and output failures that abort a conversion.
///
/// Every variant is fatal: a script with a missing or malformed statement is
/// worse than no script, so callers discard any partial output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DumpError {
    /// A continuation line arrived before any record had started.
    #[error("continuation on line {line_number} has no record to attach to: {line:?}")]
    OrphanContinuation {
        /// 1-based physical line number.
        line_number: usize,
        /// The trimmed continuation text.
        line: String,
    },
    /// A data line split into a different number of fields than its header.
    #[error(
        "table {table} expects {expected} fields but line {line_number} has {actual}: {line:?}"
    )]
    FieldCountMismatch {
        /// Table the line was routed to.
        table: TableName,
        /// 1-based physical line number where the record started.
        line_number: usize,
        /// The offending record text.
        line: String,
        /// Column count of the header in force.
        expected: usize,
        /// Field count of the data line.
        actual: usize,
    },
    /// A captured header differed from the one configured for its table.
    #[error("table {table} header on line {line_number} is {found:?}, expected {expected:?}")]
    HeaderMismatch {
        /// Table whose header was captured.
        table: TableName,
        /// 1-based physical line number of the header.
        line_number: usize,
        /// Header text configured in the schema.
        expected: String,
        /// Header text found in the dump.
        found: String,
    },
    /// Writing to the SQL sink failed.
    #[error("failed to write SQL output: {source}")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Errors raised when building a [`DumpSchema`](crate::DumpSchema).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// The schema registers no markers, so every line would be dropped.
    #[error("dump schema must register at least one table marker")]
    Empty,
    /// A marker string was empty or whitespace only.
    #[error("marker for table {table} is empty")]
    EmptyMarker {
        /// Table the blank marker was registered for.
        table: TableName,
    },
    /// Two markers share the same text.
    #[error("marker {marker:?} is registered more than once")]
    DuplicateMarker {
        /// The repeated marker text.
        marker: String,
    },
}
