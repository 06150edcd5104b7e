//! Configuration layering tests: file < environment < CLI.

use super::*;
use crate::options::{SchemaProfile, SchemaSource};
use camino::Utf8PathBuf;
use claimdump_core::{OrphanPolicy, QuoteStyle};
use ortho_config::MergeComposer;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn merge_layers_maps_configuration_errors() {
    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "input": 42 }));

    let err = crate::sql::config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn sql_layers_honour_precedence() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "output": "from-file.sql",
            "quote_style": "verbatim",
            "schema": "header-markers",
        }),
        None,
    );
    composer.push_environment(json!({
        "input": "from-env.txt",
        "output": "from-env.sql",
    }));
    composer.push_cli(json!({
        "output": "from-cli.sql",
    }));

    let config = crate::sql::config_from_layers_for_test(composer.layers())
        .expect("merged config should build");
    assert_eq!(config.input, Utf8PathBuf::from("from-env.txt"));
    assert_eq!(config.output, Utf8PathBuf::from("from-cli.sql"));
    assert_eq!(config.options.quote_style, QuoteStyle::Verbatim);
    assert_eq!(config.options.orphans, OrphanPolicy::Drop);
    assert_eq!(
        config.schema,
        SchemaSource::Profile(SchemaProfile::HeaderMarkers)
    );
}

#[rstest]
fn load_layers_merge_schema_file_and_orphans() {
    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "database": "claims.db",
            "schema_file": "schema.json",
            "orphans": "reject",
        }),
        None,
    );
    composer.push_cli(json!({ "input": "dump.txt" }));

    let config = crate::load::config_from_layers_for_test(composer.layers())
        .expect("merged config should build");
    assert_eq!(config.input, Utf8PathBuf::from("dump.txt"));
    assert_eq!(config.database, Utf8PathBuf::from("claims.db"));
    assert_eq!(
        config.schema,
        SchemaSource::File(Utf8PathBuf::from("schema.json"))
    );
    assert_eq!(config.orphans, OrphanPolicy::Reject);
}

#[rstest]
fn missing_values_after_merging_name_the_env_var() {
    let mut composer = MergeComposer::new();
    composer.push_environment(json!({ "input": "dump.txt" }));

    let err = crate::split::config_from_layers_for_test(composer.layers())
        .expect_err("output dir is still missing");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_OUTPUT_DIR);
            assert_eq!(env, ENV_SPLIT_OUTPUT_DIR);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn clean_layers_enable_the_schema() {
    let mut composer = MergeComposer::new();
    composer.push_file(json!({ "use_schema": true, "schema": "header-markers" }), None);
    composer.push_cli(json!({ "input": "dump.txt", "output": "clean.txt" }));

    let config = crate::clean::config_from_layers_for_test(composer.layers())
        .expect("merged config should build");
    assert_eq!(
        config.schema,
        Some(SchemaSource::Profile(SchemaProfile::HeaderMarkers))
    );
}
