// crates/sdk-test-helpers/src/json.rs
// ============================================================================
// Module: JSON Assertions
// Description: Deep equality and subset assertions for JSON documents.
// Purpose: Report JSON mismatches as precise property paths.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Both assertions parse their inputs with `serde_json` and compare the parsed
//! values, so object key order and insignificant whitespace never matter.
//! On mismatch they describe the difference as specifically as possible by
//! recursing into objects and equal-length arrays, producing one line per
//! differing leaf: `at "a.b[1]": expected = 2, actual = 3`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde_json::Map;
use serde_json::Value;

use crate::error::AssertionFailure;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message header for [`assert_json_eq`] failures.
const EQUALS_HEADER: &str = "JSON strings did not match";
/// Message header for [`assert_json_subset`] failures.
const SUBSET_HEADER: &str = "JSON string did not contain expected properties";
/// Placeholder for a property missing on one side.
const ABSENT: &str = "<absent>";

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Parses both strings as JSON and asserts they are deeply equal.
///
/// # Errors
///
/// Returns [`AssertionFailure`] if either string is not valid JSON or the
/// values differ.
pub fn assert_json_eq(expected: &str, actual: &str) -> Result<(), AssertionFailure> {
    let (expected_json, actual_json) = parse_pair(expected, actual)?;
    if json_eq(&expected_json, &actual_json) {
        return Ok(());
    }
    let diff = describe_difference(&expected_json, &actual_json, "", Mode::Exact);
    Err(failure(EQUALS_HEADER, diff, expected, actual))
}

/// Same as [`assert_json_eq`], except objects in `actual` may carry
/// properties that `expected_subset` does not mention.
///
/// Arrays must still have the same length, with each element a subset of
/// its counterpart.
///
/// # Errors
///
/// Returns [`AssertionFailure`] if either string is not valid JSON or the
/// expected values are not contained in the actual values.
pub fn assert_json_subset(expected_subset: &str, actual: &str) -> Result<(), AssertionFailure> {
    let (expected_json, actual_json) = parse_pair(expected_subset, actual)?;
    if is_subset(&expected_json, &actual_json) {
        return Ok(());
    }
    let diff = describe_difference(&expected_json, &actual_json, "", Mode::Subset);
    Err(failure(SUBSET_HEADER, diff, expected_subset, actual))
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Comparison mode shared by the diff routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Values must be deeply equal.
    Exact,
    /// Actual objects may contain extra properties.
    Subset,
}

impl Mode {
    /// Returns true if `actual` satisfies `expected` under this mode.
    fn matches(self, expected: &Value, actual: &Value) -> bool {
        match self {
            Self::Exact => json_eq(expected, actual),
            Self::Subset => is_subset(expected, actual),
        }
    }
}

/// Parses the expected and actual strings.
fn parse_pair(expected: &str, actual: &str) -> Result<(Value, Value), AssertionFailure> {
    let expected_json: Value = serde_json::from_str(expected).map_err(|err| {
        AssertionFailure::new(format!("expected string is not valid JSON: {err}"))
    })?;
    let actual_json: Value = serde_json::from_str(actual)
        .map_err(|err| AssertionFailure::new(format!("actual string is not valid JSON: {err}")))?;
    Ok((expected_json, actual_json))
}

/// Builds the final failure message.
fn failure(header: &str, diff: Option<String>, expected: &str, actual: &str) -> AssertionFailure {
    let detail = diff.map_or_else(
        || format!("expected: {expected}\nactual: {actual}"),
        |diff| format!("{diff}\nfull actual JSON string: {actual}"),
    );
    AssertionFailure::new(format!("{header}\n{detail}"))
}

/// Returns true if every property of `expected` is present in `actual`.
fn is_subset(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => expected
            .iter()
            .all(|(key, value)| actual.get(key).is_some_and(|found| is_subset(value, found))),
        (Value::Array(expected), Value::Array(actual)) => {
            expected.len() == actual.len()
                && expected.iter().zip(actual).all(|(e, a)| is_subset(e, a))
        }
        _ => json_eq(expected, actual),
    }
}

/// Deep equality where numbers compare by numeric value, so `1` equals `1.0`.
fn json_eq(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(expected), Value::Number(actual)) => {
            expected == actual || expected.as_f64().is_some_and(|e| actual.as_f64() == Some(e))
        }
        (Value::Object(expected), Value::Object(actual)) => {
            expected.len() == actual.len()
                && expected
                    .iter()
                    .all(|(key, value)| actual.get(key).is_some_and(|found| json_eq(value, found)))
        }
        (Value::Array(expected), Value::Array(actual)) => {
            expected.len() == actual.len()
                && expected.iter().zip(actual).all(|(e, a)| json_eq(e, a))
        }
        _ => expected == actual,
    }
}

// ============================================================================
// SECTION: Difference Description
// ============================================================================

/// Describes the difference between two values, if a detailed description
/// is possible.
fn describe_difference(
    expected: &Value,
    actual: &Value,
    prefix: &str,
    mode: Mode,
) -> Option<String> {
    let lines = match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => {
            describe_object_difference(expected, actual, prefix, mode)
        }
        (Value::Array(expected), Value::Array(actual)) if expected.len() == actual.len() => {
            describe_array_difference(expected, actual, prefix, mode)
        }
        _ => return None,
    };
    if lines.is_empty() { None } else { Some(lines.join("\n")) }
}

/// Collects per-property difference lines for two objects.
fn describe_object_difference(
    expected: &Map<String, Value>,
    actual: &Map<String, Value>,
    prefix: &str,
    mode: Mode,
) -> Vec<String> {
    let keys: BTreeSet<&String> = expected.keys().chain(actual.keys()).collect();
    let mut lines = Vec::new();
    for key in keys {
        let path = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
        match (expected.get(key), actual.get(key)) {
            (Some(expected_value), Some(actual_value)) => {
                if !mode.matches(expected_value, actual_value) {
                    lines.push(describe_leaf(expected_value, actual_value, &path, mode));
                }
            }
            (Some(expected_value), None) => {
                lines.push(format_line(&path, &expected_value.to_string(), ABSENT));
            }
            (None, Some(actual_value)) if mode == Mode::Exact => {
                lines.push(format_line(&path, ABSENT, &actual_value.to_string()));
            }
            _ => {}
        }
    }
    lines
}

/// Collects per-index difference lines for two equal-length arrays.
fn describe_array_difference(
    expected: &[Value],
    actual: &[Value],
    prefix: &str,
    mode: Mode,
) -> Vec<String> {
    expected
        .iter()
        .zip(actual)
        .enumerate()
        .filter(|(_, (e, a))| !mode.matches(e, a))
        .map(|(index, (e, a))| describe_leaf(e, a, &format!("{prefix}[{index}]"), mode))
        .collect()
}

/// Describes a single mismatched value, recursing when possible.
fn describe_leaf(expected: &Value, actual: &Value, path: &str, mode: Mode) -> String {
    describe_difference(expected, actual, path, mode)
        .unwrap_or_else(|| format_line(path, &expected.to_string(), &actual.to_string()))
}

/// Formats one difference line.
fn format_line(path: &str, expected: &str, actual: &str) -> String {
    format!("at \"{path}\": expected = {expected}, actual = {actual}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
