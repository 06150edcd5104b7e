//! Test helpers for composing dump files and invoking commands.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

pub(super) const SECTION_DUMP: &str = "\
NODES:|
id|name|descrip
1|Acme|makes
  anvils
2|Road Runner|\\N
EDGES:|
id|label
10|chases
";

pub(super) const HEADER_DUMP: &str = "\
id|subject|claim|object|statement
7|1|is|2|Acme is
big
8|2|is|1|Road Runner is fast
";

pub(super) const HEADER_SCHEMA_JSON: &str = r#"{
  "markers": [
    {"marker": "id|subject|claim|object|statement", "table": "Claim", "header": {"kind": "inline"}}
  ]
}"#;

#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub(super) fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).expect("read output")
    }
}

/// Parse `args` as a full command line and run it, capturing stdout.
pub(super) fn invoke<I, S>(args: I) -> Result<String, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(CliError::ArgumentParsing)?;
    let mut stdout = Vec::new();
    run_command(cli.command, &mut stdout)?;
    Ok(String::from_utf8(stdout).expect("summary is UTF-8"))
}
