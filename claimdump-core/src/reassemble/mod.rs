//! Reassembly of records that the exporter wrapped across physical lines.
//!
//! A record starts on a line whose first character is an ASCII digit (the
//! leading identifier). Any other non-blank line continues the record in
//! progress and is joined to it with a single space. When a [`DumpSchema`]
//! is supplied, marker lines and the header lines that follow them are kept
//! as records of their own so that interleaved dumps survive reassembly.

use log::warn;

use crate::{DumpError, DumpSchema, HeaderSpec};

/// Role of a reassembled record within the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A registered table marker.
    Marker,
    /// The header line following a marker.
    Header,
    /// A pipe-delimited data record.
    Data,
}

/// One logical record after continuation lines have been merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRecord {
    /// 1-based physical line on which the record started.
    pub line_number: usize,
    /// Role of the record.
    pub kind: RecordKind,
    /// Trimmed record text, continuations joined by single spaces.
    pub text: String,
}

impl LogicalRecord {
    fn new(line_number: usize, kind: RecordKind, text: &str) -> Self {
        Self {
            line_number,
            kind,
            text: text.to_owned(),
        }
    }
}

/// What to do with a continuation line that has no record to extend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum OrphanPolicy {
    /// Discard the line and log a warning.
    #[default]
    Drop,
    /// Abort with [`DumpError::OrphanContinuation`].
    Reject,
}

/// Streaming accumulator that folds physical lines into logical records.
///
/// Each call to [`Reassembler::push`] completes at most one record; the last
/// record is released by [`Reassembler::finish`].
///
/// # Examples
/// ```
/// use claimdump_core::{OrphanPolicy, Reassembler};
///
/// let mut reassembler = Reassembler::new(OrphanPolicy::Drop);
/// assert_eq!(reassembler.push("1|a")?, None);
/// assert_eq!(reassembler.push("continued text")?, None);
/// let first = reassembler.push("2|b")?.map(|record| record.text);
/// assert_eq!(first.as_deref(), Some("1|a continued text"));
/// let last = reassembler.finish().map(|record| record.text);
/// assert_eq!(last.as_deref(), Some("2|b"));
/// # Ok::<(), claimdump_core::DumpError>(())
/// ```
#[derive(Debug)]
pub struct Reassembler<'s> {
    schema: Option<&'s DumpSchema>,
    orphans: OrphanPolicy,
    line_number: usize,
    current: Option<LogicalRecord>,
    awaiting_header: bool,
    dropped: usize,
}

impl<'s> Reassembler<'s> {
    /// Reassemble using the leading-digit rule alone.
    #[must_use]
    pub const fn new(orphans: OrphanPolicy) -> Self {
        Self {
            schema: None,
            orphans,
            line_number: 0,
            current: None,
            awaiting_header: false,
            dropped: 0,
        }
    }

    /// Reassemble while keeping `schema` markers and headers intact.
    #[must_use]
    pub const fn with_schema(schema: &'s DumpSchema, orphans: OrphanPolicy) -> Self {
        Self {
            schema: Some(schema),
            orphans,
            line_number: 0,
            current: None,
            awaiting_header: false,
            dropped: 0,
        }
    }

    /// Feed the next physical line, returning the record it completes.
    pub fn push(&mut self, raw: &str) -> Result<Option<LogicalRecord>, DumpError> {
        self.line_number += 1;
        let line = raw.trim();
        if line.is_empty() {
            return Ok(None);
        }

        if let Some(marker) = self.schema.and_then(|schema| schema.lookup(line)) {
            self.awaiting_header = matches!(marker.header, HeaderSpec::NextLine { .. });
            return Ok(self.start(RecordKind::Marker, line));
        }
        if self.awaiting_header {
            self.awaiting_header = false;
            return Ok(self.start(RecordKind::Header, line));
        }
        if starts_record(line) {
            return Ok(self.start(RecordKind::Data, line));
        }

        match self.current.as_mut() {
            Some(record) if record.kind == RecordKind::Data => {
                record.text.push(' ');
                record.text.push_str(line);
                Ok(None)
            }
            _ => self.orphan(line),
        }
    }

    /// Flush the record still in progress.
    #[must_use]
    pub fn finish(&mut self) -> Option<LogicalRecord> {
        self.awaiting_header = false;
        self.current.take()
    }

    /// Number of orphan continuation lines discarded so far.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    fn start(&mut self, kind: RecordKind, line: &str) -> Option<LogicalRecord> {
        self.current
            .replace(LogicalRecord::new(self.line_number, kind, line))
    }

    fn orphan(&mut self, line: &str) -> Result<Option<LogicalRecord>, DumpError> {
        match self.orphans {
            OrphanPolicy::Drop => {
                warn!(
                    "dropping continuation on line {} with no record to extend",
                    self.line_number
                );
                self.dropped += 1;
                Ok(None)
            }
            OrphanPolicy::Reject => Err(DumpError::OrphanContinuation {
                line_number: self.line_number,
                line: line.to_owned(),
            }),
        }
    }
}

fn starts_record(line: &str) -> bool {
    line.chars().next().is_some_and(|ch| ch.is_ascii_digit())
}

/// Reassemble a finite sequence of physical lines.
///
/// Pass a schema to keep its markers and headers as separate records.
pub fn reassemble<I, S>(
    lines: I,
    schema: Option<&DumpSchema>,
    orphans: OrphanPolicy,
) -> Result<Vec<LogicalRecord>, DumpError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut reassembler = match schema {
        Some(schema) => Reassembler::with_schema(schema, orphans),
        None => Reassembler::new(orphans),
    };
    let mut records = Vec::new();
    for line in lines {
        if let Some(record) = reassembler.push(line.as_ref())? {
            records.push(record);
        }
    }
    records.extend(reassembler.finish());
    Ok(records)
}
