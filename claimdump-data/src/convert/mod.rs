//! File-backed conversions: cleaned records, per-table splits and SQL scripts.
//!
//! Every output is written through [`AtomicFile`], so a failed conversion
//! leaves previously existing outputs untouched and creates no new ones.
#![forbid(unsafe_code)]

use std::io::{BufRead, BufReader, Lines, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use claimdump_core::{
    ConversionSummary, ConvertOptions, DemuxState, Demultiplexer, DumpError, DumpSchema, Header,
    OrphanPolicy, Reassembler, Routed, SqlPipeline, TableName,
};
use claimdump_fs::{AtomicFile, CommitError, commit_all, open_utf8_file};
use log::info;

use crate::ConvertError;

/// Physical lines of a dump file, numbered from one.
#[derive(Debug)]
pub(crate) struct DumpLines {
    path: Utf8PathBuf,
    lines: Lines<BufReader<fs_utf8::File>>,
    line_number: usize,
}

impl Iterator for DumpLines {
    type Item = Result<String, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.line_number += 1;
        Some(line.map_err(|source| ConvertError::ReadInput {
            path: self.path.clone(),
            line_number: self.line_number,
            source,
        }))
    }
}

/// Open `path` for line-by-line reading.
pub(crate) fn open_dump(path: &Utf8Path) -> Result<DumpLines, ConvertError> {
    let file = open_utf8_file(path).map_err(|source| ConvertError::OpenInput {
        path: path.to_owned(),
        source,
    })?;
    Ok(DumpLines {
        path: path.to_owned(),
        lines: BufReader::new(file).lines(),
        line_number: 0,
    })
}

fn create_output(path: &Utf8Path) -> Result<AtomicFile, ConvertError> {
    AtomicFile::create(path).map_err(|source| ConvertError::CreateOutput {
        path: path.to_owned(),
        source,
    })
}

fn write_line(file: &mut AtomicFile, line: &str) -> Result<(), ConvertError> {
    file.write_all(line.as_bytes())
        .and_then(|()| file.write_all(b"\n"))
        .map_err(|source| ConvertError::WriteOutput {
            path: file.target().to_owned(),
            source,
        })
}

fn commit(file: AtomicFile) -> Result<(), ConvertError> {
    let path = file.target().to_owned();
    file.commit()
        .map_err(|source| ConvertError::PersistOutput { path, source })
}

/// Outcome of [`clean_file`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Logical records written, one per output line.
    pub records: usize,
    /// Orphan continuation lines discarded.
    pub dropped_lines: usize,
}

/// Rewrite `input` with one logical record per line.
///
/// Without a schema every non-digit line is treated as a continuation, which
/// suits the per-table files produced by [`split_file`]. Pass the dump's
/// schema to clean an interleaved dump while keeping its markers and headers
/// on their own lines.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use claimdump_core::OrphanPolicy;
/// use claimdump_data::clean_file;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
///     .map_err(|_| "non-UTF-8 temp dir")?;
/// std::fs::write(root.join("node.txt"), "1|Acme|makes\n  anvils\n2|Road Runner|\\N\n")?;
///
/// let report = clean_file(
///     &root.join("node.txt"),
///     &root.join("node_clean.txt"),
///     None,
///     OrphanPolicy::Drop,
/// )?;
/// assert_eq!(report.records, 2);
/// assert_eq!(
///     std::fs::read_to_string(root.join("node_clean.txt"))?,
///     "1|Acme|makes anvils\n2|Road Runner|\\N\n"
/// );
/// # Ok(())
/// # }
/// ```
pub fn clean_file(
    input: &Utf8Path,
    output: &Utf8Path,
    schema: Option<&DumpSchema>,
    orphans: OrphanPolicy,
) -> Result<CleanReport, ConvertError> {
    let lines = open_dump(input)?;
    let mut file = create_output(output)?;
    let mut reassembler = match schema {
        Some(schema) => Reassembler::with_schema(schema, orphans),
        None => Reassembler::new(orphans),
    };
    let mut records = 0;
    for line in lines {
        let completed = reassembler
            .push(&line?)
            .map_err(|source| ConvertError::from_dump(source, input, output))?;
        if let Some(record) = completed {
            write_line(&mut file, &record.text)?;
            records += 1;
        }
    }
    if let Some(record) = reassembler.finish() {
        write_line(&mut file, &record.text)?;
        records += 1;
    }
    commit(file)?;

    let report = CleanReport {
        records,
        dropped_lines: reassembler.dropped(),
    };
    info!(
        "cleaned {input} into {output}: {} records, {} orphan lines dropped",
        report.records, report.dropped_lines
    );
    Ok(report)
}

/// One per-table file written by [`split_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFile {
    /// Table whose data lines the file holds.
    pub table: TableName,
    /// Location of the file.
    pub path: Utf8PathBuf,
    /// Data lines written.
    pub lines: usize,
}

/// Outcome of [`split_file`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    /// Files in the order their tables were first activated.
    pub files: Vec<SplitFile>,
    /// Non-blank lines seen before any marker.
    pub dropped_lines: usize,
}

impl SplitReport {
    /// Data lines written for `table`, if it appeared in the dump.
    #[must_use]
    pub fn lines_for(&self, table: &str) -> Option<usize> {
        self.files
            .iter()
            .find(|file| file.table.as_str() == table)
            .map(|file| file.lines)
    }
}

/// File name used for `table`'s data lines.
#[must_use]
pub fn split_file_name(table: &TableName) -> String {
    format!("{}.txt", table.as_str().to_lowercase())
}

/// Split an interleaved dump into one file per table under `output_dir`.
///
/// Lines are trimmed and blank lines skipped, but wrapped records are not
/// joined; run [`clean_file`] on each output for that. Markers and headers
/// are consumed. A file is created for each table the dump activates, named
/// by [`split_file_name`]. A table activated again appends to its file and
/// must bring the same header; a different one aborts with
/// [`DumpError::HeaderMismatch`](claimdump_core::DumpError::HeaderMismatch).
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use claimdump_core::DumpSchema;
/// use claimdump_data::split_file;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
///     .map_err(|_| "non-UTF-8 temp dir")?;
/// std::fs::write(
///     root.join("dump.txt"),
///     "id|nodeUri|name|entType|descrip\n1|u|A|ORG|x\nid|startNodeId|endNodeId|label|claimId\n2|1|1|is|3\n",
/// )?;
///
/// let report = split_file(&root.join("dump.txt"), &root.join("split"), &DumpSchema::header_markers())?;
/// assert_eq!(report.lines_for("Node"), Some(1));
/// assert_eq!(std::fs::read_to_string(root.join("split/edge.txt"))?, "2|1|1|is|3\n");
/// # Ok(())
/// # }
/// ```
pub fn split_file(
    input: &Utf8Path,
    output_dir: &Utf8Path,
    schema: &DumpSchema,
) -> Result<SplitReport, ConvertError> {
    let lines = open_dump(input)?;
    let mut demux = Demultiplexer::new(schema);
    let mut outputs: Vec<TableOutput> = Vec::new();
    let mut active = None;
    let mut dropped_lines = 0;

    for (index, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_number = index + 1;
        let dump_error = |source: DumpError| ConvertError::from_dump(source, input, output_dir);
        let routed = demux.route(line_number, line).map_err(dump_error)?;
        match routed {
            Routed::Activated => {
                if let DemuxState::InTable { table, .. } = demux.state() {
                    active = Some(activate_output(&mut outputs, output_dir, table)?);
                }
            }
            Routed::Data(data) => {
                if let Some(output) = active.and_then(|slot| outputs.get_mut(slot)) {
                    write_line(&mut output.file, data)?;
                    output.meta.lines += 1;
                }
                continue;
            }
            Routed::HeaderCaptured => {}
            Routed::Dropped => {
                dropped_lines += 1;
                continue;
            }
        }
        if let (Some(output), Some((_, header))) =
            (active.and_then(|slot| outputs.get_mut(slot)), demux.current())
        {
            output.record_header(header, line_number).map_err(dump_error)?;
        }
    }

    let (files, pending): (Vec<SplitFile>, Vec<AtomicFile>) = outputs
        .into_iter()
        .map(|output| (output.meta, output.file))
        .unzip();
    commit_all(pending).map_err(|CommitError { path, source }| ConvertError::PersistOutput {
        path,
        source,
    })?;
    info!(
        "split {input} into {} table files under {output_dir}",
        files.len()
    );
    Ok(SplitReport {
        files,
        dropped_lines,
    })
}

/// A split file being written, with the header its lines follow.
#[derive(Debug)]
struct TableOutput {
    meta: SplitFile,
    file: AtomicFile,
    header: Option<Header>,
}

impl TableOutput {
    fn record_header(&mut self, header: &Header, line_number: usize) -> Result<(), DumpError> {
        match &self.header {
            Some(first) if first != header => Err(DumpError::HeaderMismatch {
                table: self.meta.table.clone(),
                line_number,
                expected: first.to_line(),
                found: header.to_line(),
            }),
            Some(_) => Ok(()),
            None => {
                self.header = Some(header.clone());
                Ok(())
            }
        }
    }
}

fn activate_output(
    outputs: &mut Vec<TableOutput>,
    output_dir: &Utf8Path,
    table: &TableName,
) -> Result<usize, ConvertError> {
    let path = output_dir.join(split_file_name(table));
    if let Some(slot) = outputs.iter().position(|output| output.meta.path == path) {
        return Ok(slot);
    }
    let file = create_output(&path)?;
    outputs.push(TableOutput {
        meta: SplitFile {
            table: table.clone(),
            path,
            lines: 0,
        },
        file,
        header: None,
    });
    Ok(outputs.len() - 1)
}

/// Convert the dump at `input` into a transactional SQL script at `output`.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use claimdump_core::{ConvertOptions, DumpSchema};
/// use claimdump_data::convert_file;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
///     .map_err(|_| "non-UTF-8 temp dir")?;
/// std::fs::write(root.join("dump.txt"), "NODES:|\nid|name\n1|Acme\n")?;
///
/// let summary = convert_file(
///     &root.join("dump.txt"),
///     &root.join("dump.sql"),
///     &DumpSchema::section_markers(),
///     ConvertOptions::default(),
/// )?;
/// assert_eq!(summary.total_rows(), 1);
/// # Ok(())
/// # }
/// ```
pub fn convert_file(
    input: &Utf8Path,
    output: &Utf8Path,
    schema: &DumpSchema,
    options: ConvertOptions,
) -> Result<ConversionSummary, ConvertError> {
    let lines = open_dump(input)?;
    let file = create_output(output)?;
    let mut pipeline = SqlPipeline::start(schema, options, file)
        .map_err(|source| ConvertError::from_dump(source, input, output))?;
    for line in lines {
        pipeline
            .feed(&line?)
            .map_err(|source| ConvertError::from_dump(source, input, output))?;
    }
    let (file, summary) = pipeline
        .finish()
        .map_err(|source| ConvertError::from_dump(source, input, output))?;
    commit(file)?;
    info!(
        "converted {input} into {output}: {} statements",
        summary.total_rows()
    );
    Ok(summary)
}
