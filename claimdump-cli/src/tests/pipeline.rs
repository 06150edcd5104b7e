//! End-to-end runs of each subcommand against files on disk.

use super::helpers::{HEADER_DUMP, HEADER_SCHEMA_JSON, SECTION_DUMP, Workspace, invoke};
use super::*;
use claimdump_core::DumpError;
use claimdump_data::ConvertError;
use rstest::{fixture, rstest};
use rusqlite::Connection;

#[fixture]
fn workspace() -> Workspace {
    Workspace::new()
}

#[rstest]
fn sql_command_writes_script(workspace: Workspace) {
    let input = workspace.write("dump.txt", SECTION_DUMP);
    let output = workspace.path("dump.sql");
    let summary = invoke(["claimdump", "sql", input.as_str(), "--output", output.as_str()])
        .expect("sql should succeed");

    assert!(summary.starts_with("wrote 3 insert statements to "));
    assert!(summary.contains("\n  Node: 2\n  Edge: 1"));
    let script = workspace.read("dump.sql");
    assert!(script.starts_with("BEGIN;\n"));
    assert!(script.ends_with("COMMIT;\n"));
    assert!(script.contains(
        "INSERT INTO \"Node\" (\"id\",\"name\",\"descrip\") VALUES (1,'Acme','makes anvils');"
    ));
}

#[rstest]
fn split_then_clean_produces_one_record_per_line(workspace: Workspace) {
    let input = workspace.write("dump.txt", SECTION_DUMP);
    let split_dir = workspace.path("split");
    let summary = invoke([
        "claimdump",
        "split",
        input.as_str(),
        "--output-dir",
        split_dir.as_str(),
    ])
    .expect("split should succeed");
    assert!(summary.starts_with("split into 2 table files"));
    assert_eq!(
        workspace.read("split/node.txt"),
        "1|Acme|makes\nanvils\n2|Road Runner|\\N\n"
    );

    let node = split_dir.join("node.txt");
    let cleaned = split_dir.join("node_clean.txt");
    let summary = invoke([
        "claimdump",
        "clean",
        node.as_str(),
        "--output",
        cleaned.as_str(),
    ])
    .expect("clean should succeed");
    assert!(summary.starts_with("cleaned 2 records into "));
    assert_eq!(
        workspace.read("split/node_clean.txt"),
        "1|Acme|makes anvils\n2|Road Runner|\\N\n"
    );
}

#[rstest]
fn clean_with_schema_keeps_markers(workspace: Workspace) {
    let input = workspace.write("dump.txt", SECTION_DUMP);
    let output = workspace.path("clean.txt");
    invoke([
        "claimdump",
        "clean",
        input.as_str(),
        "--output",
        output.as_str(),
        "--use-schema",
    ])
    .expect("clean should succeed");
    let cleaned = workspace.read("clean.txt");
    assert!(cleaned.starts_with("NODES:|\nid|name|descrip\n1|Acme|makes anvils\n"));
}

#[rstest]
fn load_command_inserts_typed_rows(workspace: Workspace) {
    let input = workspace.write("dump.txt", HEADER_DUMP);
    let database = workspace.path("out/claims.db");
    let summary = invoke([
        "claimdump",
        "load",
        input.as_str(),
        "--database",
        database.as_str(),
        "--schema",
        "header-markers",
    ])
    .expect("load should succeed");
    assert!(summary.starts_with("loaded 2 rows into "));

    let connection = Connection::open(database.as_std_path()).expect("open database");
    let (subject, statement): (i64, String) = connection
        .query_row(
            r#"SELECT "subject", "statement" FROM "Claim" WHERE "id" = 7"#,
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("query claim");
    assert_eq!(subject, 1);
    assert_eq!(statement, "Acme is big");
}

#[rstest]
fn schema_file_drives_conversion(workspace: Workspace) {
    let input = workspace.write("dump.txt", HEADER_DUMP);
    let schema = workspace.write("schema.json", HEADER_SCHEMA_JSON);
    let output = workspace.path("dump.sql");
    let summary = invoke([
        "claimdump",
        "sql",
        input.as_str(),
        "--output",
        output.as_str(),
        "--schema-file",
        schema.as_str(),
    ])
    .expect("sql should succeed");
    assert!(summary.contains("\n  Claim: 2"));
}

#[rstest]
fn missing_input_is_reported_before_any_output(workspace: Workspace) {
    let input = workspace.path("absent.txt");
    let output = workspace.path("dump.sql");
    let err = invoke(["claimdump", "sql", input.as_str(), "--output", output.as_str()])
        .expect_err("missing input should fail");
    match err {
        CliError::MissingSourceFile { field, path } => {
            assert_eq!(field, ARG_INPUT);
            assert_eq!(path, input);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!output.exists());
}

#[rstest]
fn missing_schema_file_is_reported(workspace: Workspace) {
    let input = workspace.write("dump.txt", SECTION_DUMP);
    let schema = workspace.path("schema.json");
    let output = workspace.path("dump.sql");
    let err = invoke([
        "claimdump",
        "sql",
        input.as_str(),
        "--output",
        output.as_str(),
        "--schema-file",
        schema.as_str(),
    ])
    .expect_err("missing schema should fail");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_SCHEMA_FILE),
        other => panic!("unexpected error {other:?}"),
    }
}

#[rstest]
fn split_rejects_a_file_as_output_dir(workspace: Workspace) {
    let input = workspace.write("dump.txt", SECTION_DUMP);
    let blocker = workspace.write("split", "occupied");
    let err = invoke([
        "claimdump",
        "split",
        input.as_str(),
        "--output-dir",
        blocker.as_str(),
    ])
    .expect_err("file output dir should fail");
    assert!(matches!(err, CliError::OutputDirectoryNotDirectory { .. }));
}

#[rstest]
fn rejected_orphans_surface_the_line_number(workspace: Workspace) {
    let input = workspace.write("node.txt", "stray text\n1|a\n");
    let output = workspace.path("clean.txt");
    let err = invoke([
        "claimdump",
        "clean",
        input.as_str(),
        "--output",
        output.as_str(),
        "--orphans",
        "reject",
    ])
    .expect_err("orphan should be rejected");
    match err {
        CliError::Convert(ConvertError::Dump {
            source: DumpError::OrphanContinuation { line_number, .. },
            ..
        }) => assert_eq!(line_number, 1),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!output.exists());
}
