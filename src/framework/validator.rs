//! Compares what a plugin observed against what a test declared.
//!
//! Success payloads are compared as YAML trees. Under `partial` the expected
//! tree only has to be contained in the actual one, so a newer library adding
//! a field does not break an older expectation. Under `exact` the trees must
//! be equal.

use serde_yaml::Value;

use crate::framework::types::{ApiLog, ApiResult, Output, ResponseType, ValidationStrategy};

/// Structural containment of `expected` in `actual`.
///
/// Mappings: every expected key must exist with a contained value; an
/// expected `null` also matches a missing key. Sequences: compared element by
/// element up to the expected length. Scalars: by value, then textually.
pub fn is_partial_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Mapping(exp), Value::Mapping(act)) => exp.iter().all(|(key, ev)| {
            match act.get(key) {
                Some(av) => is_partial_match(ev, av),
                None => ev.is_null(),
            }
        }),
        (Value::Mapping(_), _) => false,
        (Value::Sequence(exp), Value::Sequence(act)) => {
            exp.len() <= act.len()
                && exp
                    .iter()
                    .zip(act.iter())
                    .all(|(ev, av)| is_partial_match(ev, av))
        }
        (Value::Sequence(_), _) => false,
        (Value::Tagged(exp), Value::Tagged(act)) => {
            exp.tag == act.tag && is_partial_match(&exp.value, &act.value)
        }
        _ => scalars_match(expected, actual),
    }
}

/// Deep equality with the same scalar coercion as [`is_partial_match`].
pub fn is_exact_match(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Mapping(exp), Value::Mapping(act)) => {
            exp.len() == act.len()
                && exp.iter().all(|(key, ev)| {
                    act.get(key)
                        .map_or(false, |av| is_exact_match(ev, av))
                })
        }
        (Value::Sequence(exp), Value::Sequence(act)) => {
            exp.len() == act.len()
                && exp
                    .iter()
                    .zip(act.iter())
                    .all(|(ev, av)| is_exact_match(ev, av))
        }
        (Value::Mapping(_) | Value::Sequence(_), _) | (_, Value::Mapping(_) | Value::Sequence(_)) => {
            false
        }
        (Value::Tagged(exp), Value::Tagged(act)) => {
            exp.tag == act.tag && is_exact_match(&exp.value, &act.value)
        }
        _ => scalars_match(expected, actual),
    }
}

fn scalars_match(expected: &Value, actual: &Value) -> bool {
    if expected == actual {
        return true;
    }
    match (scalar_text(expected), scalar_text(actual)) {
        (Some(e), Some(a)) => e == a,
        _ => false,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn tree_matches(strategy: ValidationStrategy, expected: &Value, actual: &Value) -> bool {
    match strategy {
        ValidationStrategy::Partial => is_partial_match(expected, actual),
        ValidationStrategy::Exact => is_exact_match(expected, actual),
    }
}

/// Message of a failed call, whether it sits in `error` or in an `err` body.
fn observed_error(log: &ApiLog) -> String {
    if !log.error.is_empty() {
        return log.error.clone();
    }
    match &log.api_response {
        Some(response) if response.response_type == ResponseType::Err => {
            scalar_text(&response.response_body).unwrap_or_default()
        }
        _ => String::new(),
    }
}

/// Checks one observed log against its expectation. An API without a
/// declared output always passes.
pub fn validate(output: Option<&Output>, log: &ApiLog) -> Result<(), String> {
    let Some(output) = output else {
        return Ok(());
    };

    let error = observed_error(log);
    if output.result == ApiResult::Failed {
        if error.is_empty() {
            return Err(format!(
                "expected failure '{}' but the call succeeded",
                output.content
            ));
        }
        let matched = match output.validation_strategy {
            ValidationStrategy::Partial => error.contains(&output.content),
            ValidationStrategy::Exact => error == output.content,
        };
        if !matched {
            return Err(format!(
                "expected error '{}' but got '{error}'",
                output.content
            ));
        }
        return Ok(());
    }

    if !error.is_empty() {
        return Err(format!("unexpected error: {error}"));
    }
    let Some(response) = &log.api_response else {
        return Err("log entry carries no response".to_string());
    };

    if output.content.trim().is_empty() {
        let empty = matches!(&response.response_body, Value::String(s) if s.is_empty())
            || response.response_body.is_null();
        if response.response_type != ResponseType::Str || !empty {
            return Err(format!(
                "expected an empty str response, got {}",
                response.response_type
            ));
        }
        return Ok(());
    }

    let expected: Value = serde_yaml::from_str(&output.content)
        .map_err(|e| format!("expected content is not valid YAML: {e}"))?;
    if tree_matches(output.validation_strategy, &expected, &response.response_body) {
        Ok(())
    } else {
        Err(match output.validation_strategy {
            ValidationStrategy::Partial => "expected tree is not contained in the response",
            ValidationStrategy::Exact => "response differs from the expected tree",
        }
        .to_string())
    }
}
