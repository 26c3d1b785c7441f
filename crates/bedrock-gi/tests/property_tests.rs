//! Property-based tests for value coercion and the AGS 3 parser.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p bedrock-gi --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p bedrock-gi --test property_tests
//! ```

use proptest::prelude::*;

use bedrock_gi::diagnostics::DiagnosticKind;
use bedrock_gi::mapping::{sample_source_id, sample_uid};
use bedrock_gi::{Ags3Parser, Diagnostics, Value};

// =============================================================================
// Test Strategies
// =============================================================================

/// Field text without quotes or line breaks.
fn field() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 _.,+-]{0,12}"
}

/// Arbitrary text lines, including ones that look like AGS markers.
fn line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ -~]{0,40}",
        "\"\\*\\*[A-Z]{4}\"",
        "\"\\*[A-Z]{4}_[A-Z]{2,4}\"(,\"\\*[A-Z]{4}_[A-Z]{2,4}\"){0,3}",
        "\"<UNITS>\"(,\"[a-z]{0,2}\"){0,3}",
        "\"<CONT>\"(,\"[a-z]{0,5}\"){0,3}",
        "\"[A-Z0-9]{0,4}\"(,\"[A-Za-z0-9.]{0,5}\"){0,3}",
    ]
}

fn quote(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("\"{}\"", f))
        .collect::<Vec<_>>()
        .join(",")
}

/// A three-column group with well-formed rows and rows of the wrong width.
fn group_text() -> impl Strategy<Value = (String, usize, usize)> {
    prop::collection::vec(
        prop_oneof![
            prop::collection::vec(field(), 3).prop_map(|f| (f, true)),
            prop::collection::vec(field(), 1..=6)
                .prop_filter("wrong width", |f| f.len() != 3)
                .prop_map(|f| (f, false)),
        ],
        0..30,
    )
    .prop_map(|rows| {
        let mut text = String::from("\"**TEST\"\n\"*TEST_A\",\"*TEST_B\",\"*TEST_C\"\n");
        let mut good = 0;
        let mut bad = 0;
        for (fields, well_formed) in rows {
            if well_formed {
                good += 1;
            } else {
                bad += 1;
            }
            text.push_str(&quote(&fields));
            text.push('\n');
        }
        (text, good, bad)
    })
}

// =============================================================================
// Coercion
// =============================================================================

proptest! {
    #[test]
    fn coerce_never_panics(raw in "\\PC{0,30}") {
        let _ = Value::coerce(&raw);
    }

    #[test]
    fn coerce_integers(n in any::<i32>()) {
        prop_assert_eq!(Value::coerce(&n.to_string()), Value::Int(n as i64));
    }

    #[test]
    fn coerce_keeps_fractions(whole in -10_000i32..10_000, frac in 1u32..1000) {
        let text = format!("{}.{:03}", whole, frac);
        let value = Value::coerce(&text);
        prop_assert!(matches!(value, Value::Float(_)));
        prop_assert_eq!(value.as_f64(), text.parse::<f64>().ok());
    }

    #[test]
    fn coerce_is_deterministic(raw in "[ -~]{0,20}") {
        prop_assert_eq!(Value::coerce(&raw), Value::coerce(&raw));
    }
}

// =============================================================================
// Parser
// =============================================================================

proptest! {
    #[test]
    fn parser_never_panics(lines in prop::collection::vec(line(), 0..40)) {
        let text = lines.join("\n");
        let mut diagnostics = Diagnostics::new();
        let _ = Ags3Parser::new().parse(&text, &mut diagnostics);
    }

    #[test]
    fn skipped_rows_never_appear((text, good, bad) in group_text()) {
        let mut diagnostics = Diagnostics::new();
        let groups = Ags3Parser::new().parse(&text, &mut diagnostics).unwrap();
        let group = &groups["TEST"];

        prop_assert_eq!(group.row_count(), good);
        prop_assert_eq!(diagnostics.of_kind(DiagnosticKind::RowSkipped).count(), bad);
        for row in &group.rows {
            prop_assert_eq!(row.len(), group.column_count());
        }
    }

    #[test]
    fn continuation_concatenates(
        // Leading `g` keeps the text from coercing to a bool, null or NaN.
        first in "g[a-z]{0,9}",
        rest in "[a-z]{1,10}",
        id in "[A-Z]{2}[0-9]",
    ) {
        let text = format!(
            "\"**GEOL\"\n\"*HOLE_ID\",\"*GEOL_DESC\"\n\"{}\",\"{}\"\n\"<CONT>\",\"{}\"\n",
            id, first, rest
        );
        let mut diagnostics = Diagnostics::new();
        let groups = Ags3Parser::new().parse(&text, &mut diagnostics).unwrap();
        let geol = &groups["GEOL"];

        prop_assert_eq!(geol.row_count(), 1);
        prop_assert_eq!(
            geol.get(0, "GEOL_DESC"),
            Some(&Value::String(format!("{}{}", first, rest)))
        );
    }

    #[test]
    fn parsing_is_deterministic(lines in prop::collection::vec(line(), 1..30)) {
        let text = format!("\"**TEST\"\n{}", lines.join("\n"));
        let mut first = Diagnostics::new();
        let mut second = Diagnostics::new();
        let a = Ags3Parser::new().parse(&text, &mut first).unwrap();
        let b = Ags3Parser::new().parse(&text, &mut second).unwrap();
        // Debug output, since `nan` fields coerce to NaN.
        prop_assert_eq!(format!("{:?}", a), format!("{:?}", b));
        prop_assert_eq!(first.len(), second.len());
    }
}

// =============================================================================
// Keys
// =============================================================================

proptest! {
    #[test]
    fn sample_uid_ends_with_project(
        reference in "[A-Z][0-9]{1,3}",
        kind in "[UDBW]",
        top in 0u32..100,
        location in "BH[0-9]{1,3}",
        project in "P[0-9]{1,4}",
    ) {
        let source_id = sample_source_id(
            &Value::from(reference.as_str()),
            &Value::from(kind.as_str()),
            &Value::Int(top as i64),
            &Value::from(location.as_str()),
        );
        let uid = sample_uid(&source_id, &project);

        prop_assert_eq!(&uid, &format!("{}_{}_{}_{}_{}", reference, kind, top, location, project));
        let suffix = format!("_{}", project);
        prop_assert!(uid.ends_with(&suffix));
    }
}
