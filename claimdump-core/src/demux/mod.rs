//! Routing of an interleaved dump into per-table record streams.
//!
//! The demultiplexer is a two-state automaton. While [`DemuxState::Searching`]
//! it drops every line that is not a registered marker. A marker moves it to
//! [`DemuxState::InTable`], where it captures the table header (from the
//! marker itself or from the next line) and then forwards data lines until the
//! next marker. It never looks ahead and never buffers across tables.

use log::debug;

use crate::literal::{FIELD_DELIMITER, split_fields};
use crate::{DumpError, DumpSchema, HeaderSpec, TableName};

/// Ordered column names governing a table's data lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    /// Split a pipe-delimited header line into column names.
    ///
    /// # Examples
    /// ```
    /// use claimdump_core::Header;
    ///
    /// let header = Header::parse("id|nodeUri|name");
    /// assert_eq!(header.columns(), ["id", "nodeUri", "name"]);
    /// ```
    #[must_use]
    pub fn parse(line: &str) -> Self {
        Self {
            columns: split_fields(line).map(str::to_owned).collect(),
        }
    }

    /// Column names in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the header has no columns. A parsed header always has at least one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The header as it appears in the dump.
    #[must_use]
    pub fn to_line(&self) -> String {
        self.columns.join(&FIELD_DELIMITER.to_string())
    }
}

/// Current state of the routing automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemuxState {
    /// No table is active; lines are dropped.
    Searching,
    /// A table is active.
    InTable {
        /// The active table.
        table: TableName,
        /// Header in force, or `None` while waiting for a next-line header.
        header: Option<Header>,
        /// Header text the schema requires, if any.
        expected: Option<String>,
    },
}

/// Outcome of routing a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed<'l> {
    /// The line was a marker and activated a table.
    Activated,
    /// The line was captured as the active table's header.
    HeaderCaptured,
    /// The line is data for the active table.
    Data(&'l str),
    /// No table was active, so the line was discarded.
    Dropped,
}

/// Routes lines to tables according to a [`DumpSchema`].
#[derive(Debug)]
pub struct Demultiplexer<'s> {
    schema: &'s DumpSchema,
    state: DemuxState,
}

impl<'s> Demultiplexer<'s> {
    /// Start in the searching state.
    #[must_use]
    pub const fn new(schema: &'s DumpSchema) -> Self {
        Self {
            schema,
            state: DemuxState::Searching,
        }
    }

    /// Route one line, identified by its 1-based line number for diagnostics.
    ///
    /// Markers are recognised by exact equality only, so a data value that
    /// happens to equal a marker string will switch tables. That collision
    /// cannot be told apart from a genuine marker.
    pub fn route<'l>(
        &mut self,
        line_number: usize,
        line: &'l str,
    ) -> Result<Routed<'l>, DumpError> {
        if let Some(marker) = self.schema.lookup(line) {
            debug!("line {line_number}: activating table {}", marker.table);
            self.state = match &marker.header {
                HeaderSpec::Inline => DemuxState::InTable {
                    table: marker.table.clone(),
                    header: Some(Header::parse(&marker.marker)),
                    expected: None,
                },
                HeaderSpec::NextLine { expected } => DemuxState::InTable {
                    table: marker.table.clone(),
                    header: None,
                    expected: expected.clone(),
                },
            };
            return Ok(Routed::Activated);
        }

        match &mut self.state {
            DemuxState::Searching => Ok(Routed::Dropped),
            DemuxState::InTable {
                header: Some(_), ..
            } => Ok(Routed::Data(line)),
            DemuxState::InTable {
                table,
                header,
                expected,
            } => {
                if let Some(required) = expected.as_deref()
                    && required != line
                {
                    return Err(DumpError::HeaderMismatch {
                        table: table.clone(),
                        line_number,
                        expected: required.to_owned(),
                        found: line.to_owned(),
                    });
                }
                *header = Some(Header::parse(line));
                Ok(Routed::HeaderCaptured)
            }
        }
    }

    /// The automaton's current state.
    #[must_use]
    pub const fn state(&self) -> &DemuxState {
        &self.state
    }

    /// The active table and its header, once the header is known.
    #[must_use]
    pub fn current(&self) -> Option<(&TableName, &Header)> {
        match &self.state {
            DemuxState::InTable {
                table,
                header: Some(header),
                ..
            } => Some((table, header)),
            _ => None,
        }
    }
}

/// Data lines routed to one table, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStream {
    /// Table receiving the lines.
    pub table: TableName,
    /// Header governing every line in the stream.
    pub header: Option<Header>,
    /// Data lines, verbatim.
    pub lines: Vec<String>,
}

/// Per-table streams in the order their tables were first activated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStreams {
    streams: Vec<TableStream>,
}

impl TableStreams {
    /// Look up the stream for `table`.
    #[must_use]
    pub fn get(&self, table: &str) -> Option<&TableStream> {
        self.streams
            .iter()
            .find(|stream| stream.table.as_str() == table)
    }

    /// Iterate over streams in activation order.
    pub fn iter(&self) -> impl Iterator<Item = &TableStream> {
        self.streams.iter()
    }

    /// Number of tables that were activated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether no table was activated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Consume the collection.
    #[must_use]
    pub fn into_inner(self) -> Vec<TableStream> {
        self.streams
    }

    fn activate(&mut self, table: &TableName) -> usize {
        if let Some(index) = self
            .streams
            .iter()
            .position(|stream| &stream.table == table)
        {
            return index;
        }
        self.streams.push(TableStream {
            table: table.clone(),
            header: None,
            lines: Vec::new(),
        });
        self.streams.len() - 1
    }

    fn record_header(
        &mut self,
        slot: Option<usize>,
        current: Option<(&TableName, &Header)>,
        line_number: usize,
    ) -> Result<(), DumpError> {
        let (Some(stream), Some((_, header))) =
            (slot.and_then(|index| self.streams.get_mut(index)), current)
        else {
            return Ok(());
        };
        if stream.header.is_none() {
            stream.header = Some(header.clone());
            return Ok(());
        }
        if let Some(first) = &stream.header
            && first != header
        {
            return Err(DumpError::HeaderMismatch {
                table: stream.table.clone(),
                line_number,
                expected: first.to_line(),
                found: header.to_line(),
            });
        }
        Ok(())
    }

    fn push_line(&mut self, slot: Option<usize>, line: &str) {
        if let Some(stream) = slot.and_then(|index| self.streams.get_mut(index)) {
            stream.lines.push(line.to_owned());
        }
    }
}

/// Split `lines` into per-table streams.
///
/// Markers and headers are consumed; lines before the first marker are
/// dropped. A table that is activated again appends to its existing stream,
/// so its header must match the one captured first; a different header
/// aborts with [`DumpError::HeaderMismatch`].
///
/// # Examples
/// ```
/// use claimdump_core::{DumpSchema, TableMarker, demultiplex};
///
/// let schema = DumpSchema::new([
///     TableMarker::new("NODES:|", "Node"),
///     TableMarker::new("EDGES:|", "Edge"),
/// ])?;
/// let streams = demultiplex(
///     ["NODES:|", "id|name", "1|x", "EDGES:|", "id|label", "2|y"],
///     &schema,
/// )?;
/// assert_eq!(streams.get("Node").map(|s| s.lines.clone()), Some(vec!["1|x".to_owned()]));
/// assert_eq!(streams.get("Edge").map(|s| s.lines.clone()), Some(vec!["2|y".to_owned()]));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn demultiplex<I, S>(lines: I, schema: &DumpSchema) -> Result<TableStreams, DumpError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut demux = Demultiplexer::new(schema);
    let mut streams = TableStreams::default();
    let mut active = None;
    for (index, line) in lines.into_iter().enumerate() {
        let line_number = index + 1;
        match demux.route(line_number, line.as_ref())? {
            Routed::Activated => {
                if let DemuxState::InTable { table, .. } = demux.state() {
                    active = Some(streams.activate(table));
                }
                streams.record_header(active, demux.current(), line_number)?;
            }
            Routed::HeaderCaptured => {
                streams.record_header(active, demux.current(), line_number)?;
            }
            Routed::Data(data) => streams.push_line(active, data),
            Routed::Dropped => {}
        }
    }
    Ok(streams)
}
