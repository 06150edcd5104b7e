//! File-backed conversions and relational loading for claim dumps.
//!
//! This crate drives the streaming decoders from `claimdump-core` over files
//! on disk. It writes cleaned record files, per-table splits and SQL scripts
//! atomically, and loads typed rows into a [`RelationalSink`] such as
//! [`SqliteSink`].
//!
//! # Examples
//! ```
//! use camino::Utf8PathBuf;
//! use claimdump_core::{ConvertOptions, DumpSchema};
//! use claimdump_data::convert_file;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
//!     .map_err(|_| "non-UTF-8 temp dir")?;
//! std::fs::write(root.join("dump.txt"), "CLAIMS:|\nid|statement\n1|Acme\n")?;
//!
//! let summary = convert_file(
//!     &root.join("dump.txt"),
//!     &root.join("dump.sql"),
//!     &DumpSchema::section_markers(),
//!     ConvertOptions::default(),
//! )?;
//! assert_eq!(summary.rows_for("Claim"), Some(1));
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod convert;
mod error;
pub mod sink;

pub use convert::{
    CleanReport, SplitFile, SplitReport, clean_file, convert_file, split_file, split_file_name,
};
pub use error::ConvertError;
pub use sink::{
    LOAD_BATCH_ROWS, LoadReport, RelationalSink, Row, SinkError, SqlValue, SqliteSink,
    apply_script, load_file,
};
