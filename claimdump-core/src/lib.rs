//! Decoding engine for pipe-delimited knowledge-graph dumps.
//!
//! A dump interleaves several tables in one text stream. Records may wrap
//! across physical lines, sections are opened by configurable markers, and
//! every field is untyped text. This crate turns such a stream into a single
//! transactional SQL script in three composable stages:
//!
//! 1. [`Reassembler`] folds wrapped lines back into logical records.
//! 2. [`Demultiplexer`] routes records to tables according to a [`DumpSchema`].
//! 3. [`InsertEmitter`] renders one `INSERT` per record, inferring each
//!    literal with [`infer_literal`].
//!
//! [`SqlPipeline`] and [`convert_to_sql`] run all three in one pass.
//!
//! # Examples
//! ```
//! use claimdump_core::{ConvertOptions, DumpSchema, convert_to_sql};
//!
//! let dump = ["NODES:|", "id|name", "1|Acme", "EDGES:|", "id|label", "2|knows"];
//! let mut script = Vec::new();
//! let summary = convert_to_sql(
//!     dump,
//!     &DumpSchema::section_markers(),
//!     ConvertOptions::default(),
//!     &mut script,
//! )?;
//! assert_eq!(summary.total_rows(), 2);
//! # Ok::<(), claimdump_core::DumpError>(())
//! ```

#![forbid(unsafe_code)]

mod demux;
mod emit;
mod error;
mod literal;
mod reassemble;
mod schema;

pub use demux::{DemuxState, Demultiplexer, Header, Routed, TableStream, TableStreams, demultiplex};
pub use emit::{
    ConversionSummary, ConvertOptions, InsertEmitter, SqlPipeline, TableCount, convert_to_sql,
    infer_row, render_insert,
};
pub use error::{DumpError, SchemaError};
pub use literal::{
    FIELD_DELIMITER, NULL_SENTINEL, QuoteStyle, SqlLiteral, infer_literal, quote_identifier,
    split_fields,
};
pub use reassemble::{LogicalRecord, OrphanPolicy, Reassembler, RecordKind, reassemble};
pub use schema::{DumpSchema, HeaderSpec, TableMarker, TableName};
