//! Facade crate for the claimdump conversion toolkit.
//!
//! This crate re-exports the streaming dump engine and, behind the `data`
//! feature, the file-backed conversions and relational sinks.

#![forbid(unsafe_code)]

pub use claimdump_core::{
    ConversionSummary, ConvertOptions, DumpError, DumpSchema, HeaderSpec, LogicalRecord,
    OrphanPolicy, QuoteStyle, SchemaError, SqlLiteral, TableMarker, TableName, convert_to_sql,
    demultiplex, infer_literal, reassemble,
};

#[cfg(feature = "data")]
pub use claimdump_data::{
    CleanReport, ConvertError, LoadReport, RelationalSink, SinkError, SplitReport, SqlValue,
    SqliteSink, apply_script, clean_file, convert_file, load_file, split_file,
};
