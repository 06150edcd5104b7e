//! Typed bulk loading of dump records into a relational store.
//!
//! [`RelationalSink`] is the seam between the decoding pipeline and a
//! database. [`SqliteSink`] implements it on `rusqlite`; [`load_file`] drives
//! any sink from a dump on disk.

use camino::Utf8PathBuf;
use claimdump_core::SqlLiteral;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use thiserror::Error;

mod load;
mod sqlite;

pub use load::{LOAD_BATCH_ROWS, LoadReport, load_file};
pub use sqlite::{SqliteSink, apply_script};

/// A typed value bound into a parameterised statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`.
    Null,
    /// A value that fits a 64-bit signed integer.
    Integer(i64),
    /// A floating-point value.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes, only produced when reading back from a store.
    Blob(Vec<u8>),
}

/// One row of values, ordered like the column list it is inserted with.
pub type Row = Vec<SqlValue>;

impl From<SqlLiteral<'_>> for SqlValue {
    /// Numeric tokens become integers when they fit an `i64` and reals when
    /// they carry a decimal point. Integers too wide for `i64`, and shapes like
    /// `1.2.3` or `2024-01-05`, stay text so no digits are lost.
    fn from(literal: SqlLiteral<'_>) -> Self {
        match literal {
            SqlLiteral::Null => Self::Null,
            SqlLiteral::Numeric(token) => match token.parse::<i64>() {
                Ok(value) => Self::Integer(value),
                Err(_) if token.contains('.') => token
                    .parse::<f64>()
                    .map_or_else(|_| Self::Text(token.to_owned()), Self::Real),
                Err(_) => Self::Text(token.to_owned()),
            },
            SqlLiteral::Text(token) => Self::Text(token.to_owned()),
        }
    }
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(value) => Self::Integer(value),
            ValueRef::Real(value) => Self::Real(value),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(Value::Null),
            Self::Integer(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            Self::Real(value) => ToSqlOutput::Owned(Value::Real(*value)),
            Self::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
            Self::Blob(value) => ToSqlOutput::Borrowed(ValueRef::Blob(value)),
        })
    }
}

/// Errors raised by relational sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Creating the database's parent directory failed.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A relation was addressed with an empty column list.
    #[error("relation {relation} needs at least one column")]
    NoColumns {
        /// Relation name.
        relation: String,
    },
    /// A row did not match the column list it was inserted with.
    #[error("relation {relation} expects {expected} values per row, got {actual}")]
    ArityMismatch {
        /// Relation name.
        relation: String,
        /// Column count.
        expected: usize,
        /// Values in the offending row.
        actual: usize,
    },
    /// A database operation failed.
    #[error("failed to {operation}")]
    Sqlite {
        /// What was being attempted.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// A relational store that accepts bulk inserts and point lookups.
pub trait RelationalSink {
    /// Make sure `relation` can receive rows with `columns`.
    ///
    /// The default does nothing and assumes the relation already exists.
    fn ensure_relation(&mut self, _relation: &str, _columns: &[String]) -> Result<(), SinkError> {
        Ok(())
    }

    /// Insert `rows` into `relation` atomically, returning the number inserted.
    fn insert_rows(
        &mut self,
        relation: &str,
        columns: &[String],
        rows: &[Row],
    ) -> Result<usize, SinkError>;

    /// Fetch the first row of `relation` whose `column` equals `value`.
    fn fetch_one(
        &self,
        relation: &str,
        column: &str,
        value: &SqlValue,
    ) -> Result<Option<Row>, SinkError>;
}
