//! Shared filesystem helpers built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, BufWriter, Write};
use std::path::Component;
use tempfile::{NamedTempFile, TempPath};
use thiserror::Error;

/// Open a UTF-8 file path using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Open the directory containing `path` and return it with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent_or_current(path), ambient_authority())?;
    Ok((dir, file_name))
}

/// Ensure the parent directory for `path` exists, handling absolute paths safely for cap-std.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    ensure_dir(parent)
}

/// Create `dir` and any missing ancestors.
pub fn ensure_dir(dir: &Utf8Path) -> io::Result<()> {
    if dir.as_str().is_empty() || dir == Utf8Path::new("/") {
        return Ok(());
    }
    let (base_dir, relative) = base_dir_and_relative(dir)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Return whether a path exists and is a regular file using capability-based IO.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Return whether a path exists and is a directory.
pub fn dir_is_dir(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_dir())
}

/// Split an absolute or relative parent path into an ambient base directory and a relative suffix.
pub fn base_dir_and_relative(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();

    let (base, relative) = match std_parent.components().next() {
        // Windows absolute path with a drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;

            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;

    Ok((dir, relative))
}

fn parent_or_current(path: &Utf8Path) -> &Utf8Path {
    path.parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."))
}

/// Buffered output file that only appears at its target path on commit.
///
/// Bytes go to a temporary file created next to the target. [`AtomicFile::commit`]
/// flushes it and renames it over the target in one step; dropping the value
/// without committing deletes the temporary file and leaves the target
/// untouched.
///
/// # Examples
/// ```
/// use std::io::Write;
/// use camino::Utf8PathBuf;
/// use claimdump_fs::AtomicFile;
///
/// # fn main() -> std::io::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let target = Utf8PathBuf::from_path_buf(dir.path().join("out.sql"))
///     .map_err(|_| std::io::Error::other("non-UTF-8 temp dir"))?;
/// let mut file = AtomicFile::create(&target)?;
/// file.write_all(b"BEGIN;\n")?;
/// assert!(!target.exists());
/// file.commit()?;
/// assert_eq!(std::fs::read_to_string(&target)?, "BEGIN;\n");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AtomicFile {
    target: Utf8PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicFile {
    /// Start writing a replacement for `target`, creating parent directories.
    pub fn create(target: &Utf8Path) -> io::Result<Self> {
        ensure_parent_dir(target)?;
        let temp = tempfile::Builder::new()
            .prefix(".claimdump-")
            .suffix(".tmp")
            .tempfile_in(parent_or_current(target))?;
        Ok(Self {
            target: target.to_owned(),
            writer: BufWriter::new(temp),
        })
    }

    /// Final destination of the file.
    #[must_use]
    pub fn target(&self) -> &Utf8Path {
        &self.target
    }

    /// Flush buffered bytes and move the file into place.
    pub fn commit(self) -> io::Result<()> {
        self.stage()?.place().map(drop)
    }

    fn stage(self) -> io::Result<Staged> {
        let temp = self
            .writer
            .into_inner()
            .map_err(io::IntoInnerError::into_error)?;
        temp.as_file().sync_all()?;
        Ok(Staged {
            target: self.target,
            temp,
        })
    }
}

/// Failure to move one of several [`AtomicFile`]s into place.
#[derive(Debug, Error)]
#[error("failed to commit {path}")]
pub struct CommitError {
    /// Target whose commit failed.
    pub path: Utf8PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: io::Error,
}

/// Commit every file, or leave every target as it was.
///
/// All files are flushed before any is moved. If moving a later file fails,
/// targets already replaced get their previous contents back and targets that
/// did not exist before are removed.
///
/// # Examples
/// ```
/// use std::io::Write;
/// use camino::Utf8PathBuf;
/// use claimdump_fs::{AtomicFile, commit_all};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
///     .map_err(|_| "non-UTF-8 temp dir")?;
/// let mut node = AtomicFile::create(&root.join("node.txt"))?;
/// node.write_all(b"1|Acme\n")?;
/// let mut edge = AtomicFile::create(&root.join("edge.txt"))?;
/// edge.write_all(b"10|chases\n")?;
/// commit_all(vec![node, edge])?;
/// assert_eq!(std::fs::read_to_string(root.join("edge.txt"))?, "10|chases\n");
/// # Ok(())
/// # }
/// ```
pub fn commit_all(files: Vec<AtomicFile>) -> Result<(), CommitError> {
    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let path = file.target.clone();
        staged.push(file.stage().map_err(|source| CommitError { path, source })?);
    }

    let mut placed: Vec<Placed> = Vec::with_capacity(staged.len());
    for file in staged {
        let path = file.target.clone();
        match file.place() {
            Ok(done) => placed.push(done),
            Err(source) => {
                placed.into_iter().rev().for_each(Placed::undo);
                return Err(CommitError { path, source });
            }
        }
    }
    Ok(())
}

/// Flushed temporary file waiting to be moved over its target.
#[derive(Debug)]
struct Staged {
    target: Utf8PathBuf,
    temp: NamedTempFile,
}

impl Staged {
    fn place(self) -> io::Result<Placed> {
        let Self { target, temp } = self;
        let backup = back_up(&target)?;
        match temp.persist(&target) {
            Ok(_) => Ok(Placed { target, backup }),
            Err(err) => {
                if let Some(previous) = backup {
                    let _ = previous.persist(&target);
                }
                Err(err.error)
            }
        }
    }
}

/// A committed target together with the contents it replaced.
///
/// Dropping it discards the backup.
#[derive(Debug)]
struct Placed {
    target: Utf8PathBuf,
    backup: Option<TempPath>,
}

impl Placed {
    fn undo(self) {
        match self.backup {
            Some(previous) => {
                let _ = previous.persist(&self.target);
            }
            None => {
                if let Ok((dir, name)) = open_dir_and_file(&self.target) {
                    let _ = dir.remove_file(name.as_str());
                }
            }
        }
    }
}

/// Move an existing regular file at `target` aside, returning its new location.
fn back_up(target: &Utf8Path) -> io::Result<Option<TempPath>> {
    let (dir, name) = open_dir_and_file(target)?;
    match dir.metadata(name.as_str()) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Ok(None),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    }
    let backup = tempfile::Builder::new()
        .prefix(".claimdump-")
        .suffix(".bak")
        .tempfile_in(parent_or_current(target))?
        .into_temp_path();
    let backup_name = backup
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::other("non-UTF-8 backup name"))?
        .to_owned();
    dir.rename(name.as_str(), &dir, backup_name.as_str())?;
    Ok(Some(backup))
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
