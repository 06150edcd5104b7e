//! SQL emission for demultiplexed dump records.
//!
//! The emitter maps each data record to exactly one parameterless `INSERT`
//! statement and frames the whole script in a single `BEGIN;`/`COMMIT;`
//! transaction. [`SqlPipeline`] chains reassembly, routing and emission into
//! one streaming pass.

use std::io::Write;

use log::info;

use crate::literal::{write_identifier, write_identifier_list, write_value_list};
use crate::{
    DemuxState, Demultiplexer, DumpError, DumpSchema, Header, LogicalRecord, OrphanPolicy,
    QuoteStyle, Reassembler, Routed, SqlLiteral, TableName, infer_literal, split_fields,
};

/// Split a data record into literals, checking it against `header`.
///
/// The record must split into exactly as many fields as `header` has
/// columns; otherwise [`DumpError::FieldCountMismatch`] is returned.
///
/// # Examples
/// ```
/// use claimdump_core::{Header, SqlLiteral, TableName, infer_row};
///
/// let table = TableName::from("Edge");
/// let header = Header::parse("id|label|claimId");
/// let row = infer_row(&table, &header, 3, "5|knows|\\N")?;
/// assert_eq!(row, [SqlLiteral::Numeric("5"), SqlLiteral::Text("knows"), SqlLiteral::Null]);
/// assert!(infer_row(&table, &header, 4, "5|knows").is_err());
/// # Ok::<(), claimdump_core::DumpError>(())
/// ```
pub fn infer_row<'l>(
    table: &TableName,
    header: &Header,
    line_number: usize,
    line: &'l str,
) -> Result<Vec<SqlLiteral<'l>>, DumpError> {
    let row: Vec<SqlLiteral<'l>> = split_fields(line).map(infer_literal).collect();
    if row.len() != header.len() {
        return Err(DumpError::FieldCountMismatch {
            table: table.clone(),
            line_number,
            line: line.to_owned(),
            expected: header.len(),
            actual: row.len(),
        });
    }
    Ok(row)
}

/// Render the `INSERT` statement for one data record.
///
/// Fails like [`infer_row`] when the field count differs from the header.
///
/// # Examples
/// ```
/// use claimdump_core::{Header, QuoteStyle, TableName, render_insert};
///
/// let statement = render_insert(
///     &TableName::from("Node"),
///     &Header::parse("id|name"),
///     1,
///     "1|Acme",
///     QuoteStyle::Escaped,
/// )?;
/// assert_eq!(statement, r#"INSERT INTO "Node" ("id","name") VALUES (1,'Acme');"#);
/// # Ok::<(), claimdump_core::DumpError>(())
/// ```
pub fn render_insert(
    table: &TableName,
    header: &Header,
    line_number: usize,
    line: &str,
    style: QuoteStyle,
) -> Result<String, DumpError> {
    let row = infer_row(table, header, line_number, line)?;
    let mut statement = String::with_capacity(line.len() + 64);
    statement.push_str("INSERT INTO ");
    write_identifier(&mut statement, table.as_str(), style);
    statement.push_str(" (");
    write_identifier_list(
        &mut statement,
        header.columns().iter().map(String::as_str),
        style,
    );
    statement.push_str(") VALUES (");
    write_value_list(&mut statement, &row, style);
    statement.push_str(");");
    Ok(statement)
}

/// Writes transaction framing and one statement per record to `W`.
#[derive(Debug)]
pub struct InsertEmitter<W: Write> {
    writer: W,
    style: QuoteStyle,
    statements: usize,
}

impl<W: Write> InsertEmitter<W> {
    /// Open the transaction by writing `BEGIN;`.
    pub fn begin(mut writer: W, style: QuoteStyle) -> Result<Self, DumpError> {
        writer
            .write_all(b"BEGIN;\n")
            .map_err(|source| DumpError::Write { source })?;
        Ok(Self {
            writer,
            style,
            statements: 0,
        })
    }

    /// Emit the `INSERT` for one data record.
    pub fn emit_row(
        &mut self,
        table: &TableName,
        header: &Header,
        line_number: usize,
        line: &str,
    ) -> Result<(), DumpError> {
        let mut statement = render_insert(table, header, line_number, line, self.style)?;
        statement.push('\n');
        self.writer
            .write_all(statement.as_bytes())
            .map_err(|source| DumpError::Write { source })?;
        self.statements += 1;
        Ok(())
    }

    /// Number of statements written so far.
    #[must_use]
    pub const fn statements(&self) -> usize {
        self.statements
    }

    /// Close the transaction with `COMMIT;`, flush, and return the writer.
    pub fn finish(mut self) -> Result<W, DumpError> {
        self.writer
            .write_all(b"COMMIT;\n")
            .and_then(|()| self.writer.flush())
            .map_err(|source| DumpError::Write { source })?;
        Ok(self.writer)
    }
}

/// Tuning for a dump-to-SQL conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Handling of continuation lines with no record to extend.
    pub orphans: OrphanPolicy,
    /// Escaping applied to quoted text literals and identifiers.
    pub quote_style: QuoteStyle,
}

/// Statement count for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    /// The table.
    pub table: TableName,
    /// Statements emitted for it.
    pub rows: usize,
}

/// Outcome of a completed conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    tables: Vec<TableCount>,
    dropped_lines: usize,
}

impl ConversionSummary {
    /// Per-table counts in activation order.
    #[must_use]
    pub fn tables(&self) -> &[TableCount] {
        &self.tables
    }

    /// Statements emitted for `table`, if it was activated.
    #[must_use]
    pub fn rows_for(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|entry| entry.table.as_str() == table)
            .map(|entry| entry.rows)
    }

    /// Total `INSERT` statements emitted.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|entry| entry.rows).sum()
    }

    /// Orphan continuation lines discarded during reassembly.
    #[must_use]
    pub const fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }

    fn activate(&mut self, table: &TableName) {
        if !self.tables.iter().any(|entry| &entry.table == table) {
            self.tables.push(TableCount {
                table: table.clone(),
                rows: 0,
            });
        }
    }

    fn count(&mut self, table: &TableName) {
        if let Some(entry) = self.tables.iter_mut().find(|entry| &entry.table == table) {
            entry.rows += 1;
        }
    }
}

/// Streaming reassemble, route and emit pipeline.
///
/// Statements follow input order. If any step fails the script written so
/// far is incomplete and must be discarded.
#[derive(Debug)]
pub struct SqlPipeline<'s, W: Write> {
    reassembler: Reassembler<'s>,
    demux: Demultiplexer<'s>,
    emitter: InsertEmitter<W>,
    summary: ConversionSummary,
}

impl<'s, W: Write> SqlPipeline<'s, W> {
    /// Write `BEGIN;` and prepare to accept lines.
    pub fn start(
        schema: &'s DumpSchema,
        options: ConvertOptions,
        writer: W,
    ) -> Result<Self, DumpError> {
        Ok(Self {
            reassembler: Reassembler::with_schema(schema, options.orphans),
            demux: Demultiplexer::new(schema),
            emitter: InsertEmitter::begin(writer, options.quote_style)?,
            summary: ConversionSummary::default(),
        })
    }

    /// Feed one physical line.
    pub fn feed(&mut self, raw: &str) -> Result<(), DumpError> {
        match self.reassembler.push(raw)? {
            Some(record) => self.dispatch(&record),
            None => Ok(()),
        }
    }

    /// Flush the final record, write `COMMIT;` and return the writer.
    pub fn finish(mut self) -> Result<(W, ConversionSummary), DumpError> {
        self.summary.dropped_lines = self.reassembler.dropped();
        if let Some(record) = self.reassembler.finish() {
            self.dispatch(&record)?;
        }
        let writer = self.emitter.finish()?;
        info!(
            "emitted {} statements across {} tables",
            self.summary.total_rows(),
            self.summary.tables.len()
        );
        Ok((writer, self.summary))
    }

    fn dispatch(&mut self, record: &LogicalRecord) -> Result<(), DumpError> {
        match self.demux.route(record.line_number, &record.text)? {
            Routed::Activated => {
                if let DemuxState::InTable { table, .. } = self.demux.state() {
                    self.summary.activate(table);
                }
                Ok(())
            }
            Routed::Data(line) => {
                // Data is only routed once the active table has a header.
                let Some((table, header)) = self.demux.current() else {
                    return Ok(());
                };
                self.emitter
                    .emit_row(table, header, record.line_number, line)?;
                self.summary.count(table);
                Ok(())
            }
            Routed::HeaderCaptured | Routed::Dropped => Ok(()),
        }
    }
}

/// Convert a complete dump into a SQL script written to `writer`.
///
/// # Examples
/// ```
/// use claimdump_core::{ConvertOptions, DumpSchema, convert_to_sql};
///
/// let mut script = Vec::new();
/// let summary = convert_to_sql(
///     ["NODES:|", "id|descrip", "1|\\N"],
///     &DumpSchema::section_markers(),
///     ConvertOptions::default(),
///     &mut script,
/// )?;
/// assert_eq!(summary.rows_for("Node"), Some(1));
/// assert_eq!(
///     String::from_utf8(script)?,
///     "BEGIN;\nINSERT INTO \"Node\" (\"id\",\"descrip\") VALUES (1,NULL);\nCOMMIT;\n"
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn convert_to_sql<I, S, W>(
    lines: I,
    schema: &DumpSchema,
    options: ConvertOptions,
    writer: W,
) -> Result<ConversionSummary, DumpError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    W: Write,
{
    let mut pipeline = SqlPipeline::start(schema, options, writer)?;
    for line in lines {
        pipeline.feed(line.as_ref())?;
    }
    pipeline.finish().map(|(_, summary)| summary)
}
