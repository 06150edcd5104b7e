//! Streaming a dump file into a [`RelationalSink`].

use camino::Utf8Path;
use claimdump_core::{
    DemuxState, Demultiplexer, DumpError, DumpSchema, Header, LogicalRecord, OrphanPolicy,
    Reassembler, Routed, TableCount, TableName, infer_row,
};
use log::{debug, info};

use super::{RelationalSink, Row, SqlValue};
use crate::ConvertError;
use crate::convert::open_dump;

/// Rows buffered per table before they are handed to the sink.
pub const LOAD_BATCH_ROWS: usize = 500;

/// Outcome of [`load_file`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows inserted per table, in activation order.
    pub tables: Vec<TableCount>,
    /// Orphan continuation lines discarded during reassembly.
    pub dropped_lines: usize,
}

impl LoadReport {
    /// Rows inserted into `table`, if the dump activated it.
    #[must_use]
    pub fn rows_for(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|entry| entry.table.as_str() == table)
            .map(|entry| entry.rows)
    }

    /// Rows inserted across all tables.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|entry| entry.rows).sum()
    }

    fn activate(&mut self, table: &TableName) {
        if !self.tables.iter().any(|entry| &entry.table == table) {
            self.tables.push(TableCount {
                table: table.clone(),
                rows: 0,
            });
        }
    }

    fn count(&mut self, table: &TableName, rows: usize) {
        if let Some(entry) = self.tables.iter_mut().find(|entry| &entry.table == table) {
            entry.rows += rows;
        }
    }
}

#[derive(Debug)]
struct Batch {
    table: TableName,
    columns: Vec<String>,
    rows: Vec<Row>,
}

struct Loader<'a, S: ?Sized> {
    sink: &'a mut S,
    input: &'a Utf8Path,
    batch: Option<Batch>,
    report: LoadReport,
}

impl<S: RelationalSink + ?Sized> Loader<'_, S> {
    fn dump_error(&self, source: DumpError) -> ConvertError {
        ConvertError::Dump {
            path: self.input.to_owned(),
            source,
        }
    }

    fn route(
        &mut self,
        demux: &mut Demultiplexer<'_>,
        record: &LogicalRecord,
    ) -> Result<(), ConvertError> {
        let routed = demux
            .route(record.line_number, &record.text)
            .map_err(|source| self.dump_error(source))?;
        match routed {
            Routed::Activated => {
                self.flush()?;
                self.batch = None;
                if let DemuxState::InTable { table, .. } = demux.state() {
                    self.report.activate(table);
                }
                if let Some((table, header)) = demux.current() {
                    self.start(table, header)?;
                }
                Ok(())
            }
            Routed::HeaderCaptured => match demux.current() {
                Some((table, header)) => self.start(table, header),
                None => Ok(()),
            },
            Routed::Data(line) => {
                let Some((table, header)) = demux.current() else {
                    return Ok(());
                };
                let row: Row = infer_row(table, header, record.line_number, line)
                    .map_err(|source| self.dump_error(source))?
                    .into_iter()
                    .map(SqlValue::from)
                    .collect();
                let full = self.batch.as_mut().is_some_and(|batch| {
                    batch.rows.push(row);
                    batch.rows.len() >= LOAD_BATCH_ROWS
                });
                if full {
                    self.flush()?;
                }
                Ok(())
            }
            Routed::Dropped => Ok(()),
        }
    }

    fn start(&mut self, table: &TableName, header: &Header) -> Result<(), ConvertError> {
        debug!("loading table {table} with {} columns", header.len());
        self.sink
            .ensure_relation(table.as_str(), header.columns())
            .map_err(|source| ConvertError::Sink {
                table: table.clone(),
                source,
            })?;
        self.batch = Some(Batch {
            table: table.clone(),
            columns: header.columns().to_vec(),
            rows: Vec::with_capacity(LOAD_BATCH_ROWS),
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ConvertError> {
        let Some(batch) = self.batch.as_mut() else {
            return Ok(());
        };
        if batch.rows.is_empty() {
            return Ok(());
        }
        let rows = std::mem::take(&mut batch.rows);
        let inserted = self
            .sink
            .insert_rows(batch.table.as_str(), &batch.columns, &rows)
            .map_err(|source| ConvertError::Sink {
                table: batch.table.clone(),
                source,
            })?;
        self.report.count(&batch.table, inserted);
        Ok(())
    }
}

/// Reassemble and route the dump at `input`, inserting every data record
/// into `sink` as a typed row.
///
/// Rows are handed over in batches of at most [`LOAD_BATCH_ROWS`], each
/// within a single table. Batches already inserted stay in the sink if a
/// later record fails.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use claimdump_core::{DumpSchema, OrphanPolicy};
/// use claimdump_data::{RelationalSink, SqlValue, SqliteSink, load_file};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
///     .map_err(|_| "non-UTF-8 temp dir")?;
/// std::fs::write(root.join("dump.txt"), "NODES:|\nid|name\n1|Acme\n")?;
///
/// let mut sink = SqliteSink::in_memory()?;
/// let report = load_file(
///     &root.join("dump.txt"),
///     &DumpSchema::section_markers(),
///     OrphanPolicy::Drop,
///     &mut sink,
/// )?;
/// assert_eq!(report.rows_for("Node"), Some(1));
/// let row = sink.fetch_one("Node", "id", &SqlValue::Integer(1))?;
/// assert_eq!(row, Some(vec![SqlValue::Integer(1), SqlValue::Text("Acme".into())]));
/// # Ok(())
/// # }
/// ```
pub fn load_file<S>(
    input: &Utf8Path,
    schema: &DumpSchema,
    orphans: OrphanPolicy,
    sink: &mut S,
) -> Result<LoadReport, ConvertError>
where
    S: RelationalSink + ?Sized,
{
    let lines = open_dump(input)?;
    let mut reassembler = Reassembler::with_schema(schema, orphans);
    let mut demux = Demultiplexer::new(schema);
    let mut loader = Loader {
        sink,
        input,
        batch: None,
        report: LoadReport::default(),
    };

    for line in lines {
        let completed = reassembler
            .push(&line?)
            .map_err(|source| loader.dump_error(source))?;
        if let Some(record) = completed {
            loader.route(&mut demux, &record)?;
        }
    }
    if let Some(record) = reassembler.finish() {
        loader.route(&mut demux, &record)?;
    }
    loader.flush()?;

    let mut report = loader.report;
    report.dropped_lines = reassembler.dropped();
    info!(
        "loaded {input}: {} rows across {} tables",
        report.total_rows(),
        report.tables.len()
    );
    Ok(report)
}
