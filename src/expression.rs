//! Expression sub-language: template interpolation and computed expressions
//!
//! Templates are plain strings with placeholders; expressions are CEL programs
//! evaluated against the current extraction scope. The expression string is
//! itself template-interpolated before compilation, so placeholders and
//! bindings compose.

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, LazyLock};

use cel::objects::{Key, Map};
use cel::{Context, Program, Value};
use regex::Regex;

use crate::value::Jsonable;
use crate::{Error, Result};

/// Placeholder for the current scalar value's string form
pub const PLACEHOLDER_VALUE: &str = "{PL}";
/// Placeholder for the zero-based array index
pub const PLACEHOLDER_INDEX: &str = "{INDEX}";
/// Placeholder for the related input value's string form
pub const PLACEHOLDER_INPUT: &str = "{FRES}";
/// Placeholder for the related input value's JSON text
pub const PLACEHOLDER_INPUT_JSON: &str = "{FRESJSON}";
/// Placeholder expanding to a newline
pub const PLACEHOLDER_NEWLINE: &str = "{NL}";

/// Expression binding: parent value as a native value
const RESULT_VAR: &str = "fRes";
/// Expression binding: parent value as JSON text
const RESULT_JSON_VAR: &str = "fResJson";
/// Expression binding: parent value's raw byte form, as text
const RESULT_RAW_VAR: &str = "fResRaw";
/// Expression binding: zero-based array index
const INDEX_VAR: &str = "fIndex";

static ENV_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{env\.([^}]+)\}").expect("valid env placeholder pattern"));

/// Interpolate template placeholders with their runtime values.
///
/// Bindings that are absent leave their placeholder untouched, which keeps
/// interpolation idempotent on inputs that carry no placeholders at all.
/// `{env.VAR}` references expand to the process environment (empty when
/// unset).
pub fn format(
    template: &str,
    parent: Option<&Jsonable>,
    index: Option<u32>,
    input: Option<&Jsonable>,
) -> String {
    let mut out = template.to_string();
    if let Some(parent) = parent {
        out = out.replace(PLACEHOLDER_VALUE, &parent.display_string());
    }
    if let Some(index) = index {
        out = out.replace(PLACEHOLDER_INDEX, &index.to_string());
    }
    if let Some(input) = input {
        out = out.replace(PLACEHOLDER_INPUT, &input.display_string());
        out = out.replace(PLACEHOLDER_INPUT_JSON, &input.to_json());
    }
    out = out.replace(PLACEHOLDER_NEWLINE, "\n");
    ENV_PATTERN
        .replace_all(&out, |caps: &regex::Captures| {
            env::var(&caps[1]).unwrap_or_default()
        })
        .to_string()
}

/// Compile and run an expression with the standard bindings.
///
/// Environment: `fRes` (parent as native value), `fResJson`, `fResRaw`,
/// `fIndex`, `FNull`/`FNil` and `isNull(x)`. Compile and runtime failures are
/// expression errors; callers substitute `Null`.
pub fn evaluate(
    expression: &str,
    parent: Option<&Jsonable>,
    index: Option<u32>,
    input: Option<&Jsonable>,
) -> Result<Jsonable> {
    let interpolated = format(expression, parent, index, input);
    let program =
        Program::compile(&interpolated).map_err(|e| Error::Expression(e.to_string()))?;

    let mut context = Context::default();
    match parent {
        Some(parent) => {
            context.add_variable_from_value(RESULT_VAR, to_cel(&parent.to_native()));
            context.add_variable_from_value(
                RESULT_JSON_VAR,
                Value::String(Arc::new(parent.to_json())),
            );
            context.add_variable_from_value(
                RESULT_RAW_VAR,
                Value::String(Arc::new(String::from_utf8_lossy(&parent.raw()).into_owned())),
            );
        }
        None => {
            context.add_variable_from_value(RESULT_VAR, Value::Null);
            context.add_variable_from_value(RESULT_JSON_VAR, Value::Null);
            context.add_variable_from_value(RESULT_RAW_VAR, Value::Null);
        }
    }
    match index {
        Some(index) => context.add_variable_from_value(INDEX_VAR, Value::Int(i64::from(index))),
        None => context.add_variable_from_value(INDEX_VAR, Value::Null),
    }
    context.add_variable_from_value("FNull", Value::Null);
    context.add_variable_from_value("FNil", Value::Null);
    context.add_function("isNull", |v: Value| matches!(v, Value::Null));

    let out = program
        .execute(&context)
        .map_err(|e| Error::Expression(e.to_string()))?;
    Ok(Jsonable::from_native(&from_cel(&out)))
}

fn to_cel(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map_or_else(|| Value::Float(n.as_f64().unwrap_or(0.0)), Value::Int),
        serde_json::Value::String(s) => Value::String(Arc::new(s.clone())),
        serde_json::Value::Array(items) => {
            Value::List(Arc::new(items.iter().map(to_cel).collect()))
        }
        serde_json::Value::Object(fields) => {
            let map: HashMap<Key, Value> = fields
                .iter()
                .map(|(k, v)| (Key::String(Arc::new(k.clone())), to_cel(v)))
                .collect();
            Value::Map(Map { map: Arc::new(map) })
        }
    }
}

fn from_cel(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::UInt(u) => serde_json::Value::from(*u),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::String(s) => serde_json::Value::String(s.as_ref().clone()),
        Value::Bytes(b) => {
            serde_json::Value::String(String::from_utf8_lossy(b.as_ref()).into_owned())
        }
        Value::List(items) => serde_json::Value::Array(items.iter().map(from_cel).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.map
                .iter()
                .map(|(k, v)| (key_text(k), from_cel(v)))
                .collect(),
        ),
        _ => serde_json::Value::Null,
    }
}

fn key_text(key: &Key) -> String {
    match key {
        Key::String(s) => s.as_ref().clone(),
        Key::Int(i) => i.to_string(),
        Key::Uint(u) => u.to_string(),
        Key::Bool(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_expand() {
        let parent = Jsonable::String("a@x".to_string());
        let out = format("EMAIL: {PL} INDEX: {INDEX}", Some(&parent), Some(0), None);
        assert_eq!(out, "EMAIL: a@x INDEX: 0");
    }

    #[test]
    fn interpolation_is_idempotent_without_placeholders() {
        let parent = Jsonable::Int(5);
        let text = "plain text, no placeholders";
        let once = format(text, Some(&parent), Some(1), None);
        assert_eq!(once, text);
        assert_eq!(format(&once, Some(&parent), Some(1), None), text);
    }

    #[test]
    fn absent_bindings_leave_tokens() {
        assert_eq!(format("{PL}/{INDEX}", None, None, None), "{PL}/{INDEX}");
    }

    #[test]
    fn input_bindings_expand() {
        let input = Jsonable::from_native(&serde_json::json!({"n": 1}));
        assert_eq!(
            format("{FRES} / {FRESJSON}", None, None, Some(&input)),
            r#"{"n":1} / {"n":1}"#
        );
    }

    #[test]
    fn newline_token_expands() {
        assert_eq!(format("a{NL}b", None, None, None), "a\nb");
    }

    #[test]
    fn env_reference_expands() {
        let expected = env::var("PATH").unwrap_or_default();
        assert_eq!(format("{env.PATH}", None, None, None), expected);
    }

    #[test]
    fn arithmetic_expression() {
        let out = evaluate("2 + 2 * fIndex", None, Some(3), None).expect("evaluates");
        assert_eq!(out, Jsonable::Int64(8));
    }

    #[test]
    fn is_null_builtin() {
        let out = evaluate("isNull(FNull)", None, None, None).expect("evaluates");
        assert_eq!(out, Jsonable::Bool(true));

        let parent = Jsonable::Int(1);
        let out = evaluate("isNull(fRes)", Some(&parent), None, None).expect("evaluates");
        assert_eq!(out, Jsonable::Bool(false));
    }

    #[test]
    fn parent_value_traversal() {
        let parent = Jsonable::from_native(&serde_json::json!({"price": {"amount": 7}}));
        let out = evaluate("fRes.price.amount * 2", Some(&parent), None, None).expect("evaluates");
        assert_eq!(out, Jsonable::Int64(14));
    }

    #[test]
    fn compile_failure_is_an_expression_error() {
        let err = evaluate("][ not cel", None, None, None).unwrap_err();
        assert!(matches!(err, Error::Expression(_)));
    }
}
