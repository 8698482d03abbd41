//! Payload normalizer -- decodes nested, possibly doubly-stringified JSON
//! fields into structured values.
//!
//! Upstream Lambda-style services routinely JSON-encode payload bodies
//! into strings (sometimes twice). Each candidate field is decoded
//! independently: one field's failure never aborts the record or its
//! sibling fields. Failures are replaced with an annotated placeholder
//! and reported back so callers can surface them as diagnostics.

/// Top-level fields that may arrive JSON-encoded as strings.
/// `result.body` is nested and handled separately.
pub const CANDIDATE_FIELDS: &[&str] = &[
    "validation_details",
    "individual_results",
    "aws_resources",
    "validation_result",
];

/// Bound on repeated decoding of stringified-inside-stringified payloads.
const MAX_DECODE_DEPTH: usize = 4;

/// One candidate field that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeIssue {
    pub field: &'static str,
}

/// The explicit "not present" marker used wherever a payload field is
/// absent. Absent never means crash, and never means silently `null`.
pub fn missing_marker() -> serde_json::Value {
    serde_json::json!({ "error": "missing" })
}

/// The placeholder substituted for a string field that failed to decode.
/// Keeps the original text for drill-down display.
pub fn decode_error_marker(original: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "raw": original.clone(), "error": "decode-error" })
}

/// Decode a possibly (doubly-)stringified JSON value.
///
/// Non-strings pass through unchanged. A string is parsed as JSON;
/// if the result is itself a string, parsing is retried up to
/// [`MAX_DECODE_DEPTH`] times. Returns the decoded value and whether
/// decoding failed (in which case the value is the error placeholder).
pub fn decode_value(value: &serde_json::Value) -> (serde_json::Value, bool) {
    let Some(text) = value.as_str() else {
        return (value.clone(), false);
    };
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(mut decoded) => {
            let mut depth = 1;
            while depth < MAX_DECODE_DEPTH {
                let Some(inner) = decoded.as_str() else { break };
                match serde_json::from_str::<serde_json::Value>(inner) {
                    Ok(v) => {
                        decoded = v;
                        depth += 1;
                    }
                    // The outer decode legitimately produced a plain
                    // string; keep it.
                    Err(_) => break,
                }
            }
            (decoded, false)
        }
        Err(_) => (decode_error_marker(value), true),
    }
}

/// Normalize every candidate payload field of one record, in place.
///
/// Applies [`decode_value`] to each of [`CANDIDATE_FIELDS`] plus the
/// nested `result.body`, independently. A decoded `result.body` object
/// gets its own candidate fields normalized in turn (one nesting level
/// is observed upstream; recursion is depth-bounded).
pub fn normalize_record(record: &mut serde_json::Value) -> Vec<DecodeIssue> {
    let mut issues = Vec::new();
    normalize_level(record, 0, &mut issues);
    issues
}

fn normalize_level(record: &mut serde_json::Value, depth: usize, issues: &mut Vec<DecodeIssue>) {
    let Some(obj) = record.as_object_mut() else {
        return;
    };

    for field in CANDIDATE_FIELDS {
        if let Some(value) = obj.get(*field) {
            let (decoded, failed) = decode_value(value);
            if failed {
                issues.push(DecodeIssue { field });
            }
            obj.insert((*field).to_string(), decoded);
        }
    }

    if let Some(body) = record
        .get_mut("result")
        .and_then(|result| result.get_mut("body"))
    {
        let (mut decoded, failed) = decode_value(body);
        if failed {
            issues.push(DecodeIssue {
                field: "result.body",
            });
        }
        if depth < MAX_DECODE_DEPTH {
            normalize_level(&mut decoded, depth + 1, issues);
        }
        *body = decoded;
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
