//! Property-based tests for the dump decoding stages.
//!
//! # Invariants tested
//!
//! - **Idempotence:** reassembling already-reassembled records changes nothing.
//! - **Record starts:** every data record begins with an ASCII digit.
//! - **Literal totality:** every token maps to exactly one literal kind.
//! - **Statement count:** one `INSERT` per data record, all inside one
//!   transaction.

use claimdump_core::{
    ConvertOptions, DumpSchema, OrphanPolicy, QuoteStyle, SqlLiteral, convert_to_sql,
    infer_literal, reassemble,
};
use proptest::prelude::*;

/// Physical lines mixing record starts, continuations and blanks.
fn physical_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,4}\\|[a-zA-Z ]{0,12}",
        "[a-zA-Z][a-zA-Z0-9 |]{0,16}",
        " {0,3}",
    ]
}

fn field() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("\\N".to_owned()),
        "[0-9]{1,5}",
        "-?[0-9]{1,3}\\.[0-9]{1,3}",
        "[a-zA-Z' ]{0,10}",
    ]
}

/// A header of `width` columns and rows with exactly `width` fields each.
fn table(width: usize) -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    let header = proptest::collection::vec("[a-z]{1,6}", width);
    let rows = proptest::collection::vec(
        (
            "[0-9]{1,6}",
            proptest::collection::vec(field(), width.saturating_sub(1)),
        ),
        0..12,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(id, rest)| {
                std::iter::once(id)
                    .chain(rest)
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect::<Vec<_>>()
    });
    (header, rows)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn reassembly_is_idempotent(lines in proptest::collection::vec(physical_line(), 0..40)) {
        let once = reassemble(&lines, None, OrphanPolicy::Drop).expect("drop never fails");
        let texts: Vec<&str> = once.iter().map(|record| record.text.as_str()).collect();
        let twice = reassemble(&texts, None, OrphanPolicy::Reject)
            .expect("reassembled records contain no orphans");
        let again: Vec<&str> = twice.iter().map(|record| record.text.as_str()).collect();
        prop_assert_eq!(texts, again);
    }

    #[test]
    fn records_start_with_a_digit(lines in proptest::collection::vec(physical_line(), 0..40)) {
        let records = reassemble(&lines, None, OrphanPolicy::Drop).expect("drop never fails");
        for record in records {
            prop_assert!(record.text.starts_with(|ch: char| ch.is_ascii_digit()));
            prop_assert_eq!(record.text.trim(), record.text.as_str());
        }
    }

    #[test]
    fn literal_inference_is_total(token in ".{0,12}") {
        let sql = infer_literal(&token).to_sql(QuoteStyle::Escaped);
        match infer_literal(&token) {
            SqlLiteral::Null => {
                prop_assert!(token.is_empty() || token == "\\N");
                prop_assert_eq!(sql, "NULL");
            }
            SqlLiteral::Numeric(text) => {
                prop_assert_eq!(text, token.as_str());
                prop_assert!(text.chars().any(|ch| ch.is_ascii_digit()));
                prop_assert!(text.chars().all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+')));
            }
            SqlLiteral::Text(text) => {
                prop_assert_eq!(text, token.as_str());
                prop_assert!(sql.starts_with('\'') && sql.ends_with('\''));
            }
        }
    }

    #[test]
    fn one_statement_per_record_inside_one_transaction(
        (header, rows) in (1_usize..6).prop_flat_map(table)
    ) {
        let mut lines = vec!["NODES:|".to_owned(), header.join("|")];
        lines.extend(rows.iter().cloned());
        let mut script = Vec::new();
        let summary = convert_to_sql(
            &lines,
            &DumpSchema::section_markers(),
            ConvertOptions::default(),
            &mut script,
        )
        .expect("well-formed table converts");
        let script = String::from_utf8(script).expect("script is UTF-8");

        prop_assert!(script.starts_with("BEGIN;\n"));
        prop_assert!(script.ends_with("COMMIT;\n"));
        prop_assert_eq!(script.matches("BEGIN;").count(), 1);
        let inserts = script
            .lines()
            .filter(|line| line.starts_with("INSERT INTO \"Node\""))
            .count();
        prop_assert_eq!(inserts, rows.len());
        prop_assert_eq!(summary.rows_for("Node"), Some(rows.len()));
    }
}
