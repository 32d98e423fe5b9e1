//! The universal value carrier produced by extractions
//!
//! Every field of a model resolves to exactly one [`Jsonable`]. The variant set
//! mirrors the scalar types a model can declare plus arrays and
//! insertion-ordered objects.

use bytes::Bytes;
use indexmap::IndexMap;

use crate::config::FieldType;

/// A JSON-like value with a declared numeric width and a raw-string escape hatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Jsonable {
    /// The null singleton; serializes to `null`
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Int64(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Float64(f64),
    /// String; embedded `"` are escaped as `\"` on serialization
    String(String),
    /// String emitted verbatim - the payload is trusted JSON (or raw HTML)
    RawString(String),
    /// Array of values, order preserved
    Array(Vec<Jsonable>),
    /// Object with insertion-ordered keys
    Object(IndexMap<String, Jsonable>),
}

impl Jsonable {
    /// Canonical JSON text for this value.
    ///
    /// Integers never render with a fractional part. `String` escapes embedded
    /// double quotes (and only those - extracted content passes through
    /// otherwise untouched). `RawString` emits its payload verbatim.
    pub fn to_json(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Int64(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Float64(f) => f.to_string(),
            Self::String(s) => format!("\"{}\"", escape_quotes(s)),
            Self::RawString(s) => s.clone(),
            Self::Array(items) => {
                let parts: Vec<String> = items.iter().map(Jsonable::to_json).collect();
                format!("[{}]", parts.join(","))
            }
            Self::Object(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("\"{}\":{}", escape_quotes(k), v.to_json()))
                    .collect();
                format!("{{{}}}", parts.join(","))
            }
        }
    }

    /// Raw JSON byte form. For `RawString` this is the payload bytes.
    pub fn raw(&self) -> Bytes {
        match self {
            Self::RawString(s) => Bytes::from(s.clone()),
            other => Bytes::from(other.to_json()),
        }
    }

    /// Loosely-typed native view, used as the expression environment binding.
    pub fn to_native(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Int64(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Value::from(f64::from(*f)),
            Self::Float64(f) => serde_json::Value::from(*f),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::RawString(s) => {
                // Trusted payloads round-trip as parsed JSON when they are JSON.
                serde_json::from_str(s).unwrap_or(serde_json::Value::String(s.clone()))
            }
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Jsonable::to_native).collect())
            }
            Self::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_native()))
                    .collect(),
            ),
        }
    }

    /// Emptiness check consulted by `first_of` dispatch.
    ///
    /// Per variant: `Null`, `String("")`, `RawString("")`, `Array([])` and
    /// `Object({})` are empty; booleans and numbers never are.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) | Self::RawString(s) => s.is_empty(),
            Self::Array(items) => items.is_empty(),
            Self::Object(fields) => fields.is_empty(),
            _ => false,
        }
    }

    /// String form used for `{PL}` template interpolation: strings yield their
    /// payload without quotes, everything else its JSON text.
    pub fn display_string(&self) -> String {
        match self {
            Self::String(s) | Self::RawString(s) => s.clone(),
            other => other.to_json(),
        }
    }

    /// Convert a `serde_json` value into the widest matching variant.
    pub fn from_native(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int64(i)
                } else {
                    Self::Float64(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => {
                Self::Array(items.iter().map(Jsonable::from_native).collect())
            }
            serde_json::Value::Object(fields) => Self::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Jsonable::from_native(v)))
                    .collect(),
            ),
        }
    }

    /// Parse raw extracted text into the declared scalar type.
    ///
    /// Coercion failure is silent: the result is `Null`, never an error.
    pub fn coerce(text: &str, field_type: FieldType) -> Self {
        match field_type {
            FieldType::Null => Self::Null,
            FieldType::String => Self::String(text.to_string()),
            FieldType::RawString => Self::RawString(text.to_string()),
            FieldType::Bool => match parse_bool(text) {
                Some(b) => Self::Bool(b),
                None => Self::Null,
            },
            FieldType::Int => text.parse::<i32>().map_or(Self::Null, Self::Int),
            FieldType::Int64 => text.parse::<i64>().map_or(Self::Null, Self::Int64),
            FieldType::Float => text.parse::<f32>().map_or(Self::Null, Self::Float),
            FieldType::Float64 => text.parse::<f64>().map_or(Self::Null, Self::Float64),
        }
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('"', "\\\"")
}

// Accepts the usual spelling variants so `1`/`t`/`TRUE` extracted from
// loosely-typed sources all coerce.
fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

impl From<bool> for Jsonable {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Jsonable {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Jsonable {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<&str> for Jsonable {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Jsonable {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_serializes_to_null() {
        assert_eq!(Jsonable::Null.to_json(), "null");
    }

    #[test]
    fn string_escapes_embedded_quotes() {
        let v = Jsonable::String(r#"say "hi""#.to_string());
        assert_eq!(v.to_json(), r#""say \"hi\"""#);
    }

    #[test]
    fn raw_string_is_verbatim() {
        let v = Jsonable::RawString(r#"{"a":1}"#.to_string());
        assert_eq!(v.to_json(), r#"{"a":1}"#);
        assert_eq!(v.raw(), Bytes::from_static(br#"{"a":1}"#));
    }

    #[test]
    fn integers_never_render_fractional() {
        assert_eq!(Jsonable::Int(1).to_json(), "1");
        assert_eq!(Jsonable::Int64(-7).to_json(), "-7");
        assert_eq!(Jsonable::Float64(1.5).to_json(), "1.5");
    }

    #[test]
    fn object_preserves_insertion_order() {
        let mut fields = IndexMap::new();
        fields.insert("z".to_string(), Jsonable::Int(1));
        fields.insert("a".to_string(), Jsonable::Int(2));
        assert_eq!(Jsonable::Object(fields).to_json(), r#"{"z":1,"a":2}"#);
    }

    #[test]
    fn array_serialization() {
        let v = Jsonable::Array(vec![
            Jsonable::Int(1),
            Jsonable::String("x".to_string()),
            Jsonable::Null,
        ]);
        assert_eq!(v.to_json(), r#"[1,"x",null]"#);
    }

    #[test]
    fn emptiness_per_variant() {
        assert!(Jsonable::Null.is_empty());
        assert!(Jsonable::String(String::new()).is_empty());
        assert!(Jsonable::Array(vec![]).is_empty());
        assert!(Jsonable::Object(IndexMap::new()).is_empty());
        assert!(!Jsonable::Bool(false).is_empty());
        assert!(!Jsonable::Int(0).is_empty());
        assert!(!Jsonable::String(" ".to_string()).is_empty());
    }

    #[test]
    fn coerce_scalars() {
        assert_eq!(Jsonable::coerce("42", FieldType::Int), Jsonable::Int(42));
        assert_eq!(
            Jsonable::coerce("42", FieldType::Int64),
            Jsonable::Int64(42)
        );
        assert_eq!(
            Jsonable::coerce("true", FieldType::Bool),
            Jsonable::Bool(true)
        );
        assert_eq!(Jsonable::coerce("1", FieldType::Bool), Jsonable::Bool(true));
        assert_eq!(
            Jsonable::coerce("1.5", FieldType::Float64),
            Jsonable::Float64(1.5)
        );
    }

    #[test]
    fn coercion_failure_yields_null() {
        assert_eq!(Jsonable::coerce("not a number", FieldType::Int), Jsonable::Null);
        assert_eq!(Jsonable::coerce("1.5", FieldType::Int64), Jsonable::Null);
        assert_eq!(Jsonable::coerce("yes", FieldType::Bool), Jsonable::Null);
    }

    #[test]
    fn string_is_not_trimmed() {
        assert_eq!(
            Jsonable::coerce("  padded  ", FieldType::String),
            Jsonable::String("  padded  ".to_string())
        );
    }

    #[test]
    fn native_round_trip() {
        let v = Jsonable::Object(IndexMap::from([
            ("n".to_string(), Jsonable::Int64(3)),
            (
                "tags".to_string(),
                Jsonable::Array(vec![Jsonable::from("x")]),
            ),
        ]));
        let native = v.to_native();
        assert_eq!(native["n"], 3);
        assert_eq!(native["tags"][0], "x");
        assert_eq!(Jsonable::from_native(&native), v);
    }
}
