//! Dotted-path JSON dialect
//!
//! Paths are dotted key chains with three extensions:
//!
//! - numeric segments index into arrays (`0.address`);
//! - `#` projects the remaining path over every element of an array
//!   (`#.tags` collects each element's `tags`);
//! - `|@modifier` stages transform the value resolved so far; `@flatten`
//!   merges nested arrays one level and may itself be followed by more path
//!   (`#.tags|@flatten.0`).
//!
//! A path into a missing key selects nothing - the caller substitutes `Null`.

use serde_json::Value;

/// Resolve `path` against `doc`. Empty path means the whole document.
pub fn resolve(doc: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(doc.clone());
    }
    let mut current = doc.clone();
    for stage in path.split('|') {
        current = if let Some(rest) = stage.strip_prefix('@') {
            let (name, tail) = match rest.split_once('.') {
                Some((name, tail)) => (name, tail),
                None => (rest, ""),
            };
            let modified = apply_modifier(name, &current)?;
            if tail.is_empty() {
                modified
            } else {
                descend(&modified, &tail.split('.').collect::<Vec<_>>())?
            }
        } else {
            descend(&current, &stage.split('.').collect::<Vec<_>>())?
        };
    }
    Some(current)
}

/// Raw text at `path`: strings yield their payload, scalars their literal
/// form, containers their compact JSON. JSON `null` selects nothing.
pub fn scalar(doc: &Value, path: &str) -> Option<String> {
    match resolve(doc, path)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => serde_json::to_string(&other).ok(),
    }
}

/// Resolve `root_path` to an item sequence.
pub fn items(doc: &Value, root_path: &str) -> Vec<Value> {
    match resolve(doc, root_path) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    }
}

fn descend(value: &Value, segments: &[&str]) -> Option<Value> {
    let Some((head, tail)) = segments.split_first() else {
        return Some(value.clone());
    };
    match *head {
        "" => descend(value, tail),
        "#" => {
            let Value::Array(elements) = value else {
                return None;
            };
            let projected: Vec<Value> = elements
                .iter()
                .filter_map(|element| descend(element, tail))
                .collect();
            Some(Value::Array(projected))
        }
        key => {
            let next = match value {
                Value::Array(elements) => key.parse::<usize>().ok().and_then(|i| elements.get(i)),
                Value::Object(map) => map.get(key),
                _ => None,
            }?;
            descend(next, tail)
        }
    }
}

fn apply_modifier(name: &str, value: &Value) -> Option<Value> {
    match name {
        "flatten" => {
            let Value::Array(elements) = value else {
                return None;
            };
            let mut out = Vec::new();
            for element in elements {
                match element {
                    Value::Array(inner) => out.extend(inner.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Some(Value::Array(out))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_keys_and_indices() {
        let doc = json!([{"address": "A"}, {"address": "B"}]);
        assert_eq!(scalar(&doc, "0.address").as_deref(), Some("A"));
        assert_eq!(scalar(&doc, "1.address").as_deref(), Some("B"));
    }

    #[test]
    fn missing_key_selects_nothing() {
        let doc = json!({"present": "P"});
        assert_eq!(resolve(&doc, "missing"), None);
        assert_eq!(resolve(&doc, "present.deeper"), None);
    }

    #[test]
    fn iterator_projects_elements() {
        let doc = json!([{"tags": ["x", "y"]}, {"tags": ["z"]}]);
        assert_eq!(resolve(&doc, "#.tags"), Some(json!([["x", "y"], ["z"]])));
    }

    #[test]
    fn flatten_merges_one_level() {
        let doc = json!([{"tags": ["x", "y"]}, {"tags": ["z"]}]);
        assert_eq!(
            resolve(&doc, "#.tags|@flatten"),
            Some(json!(["x", "y", "z"]))
        );
    }

    #[test]
    fn chained_iterator_stages() {
        let doc = json!([
            {"friends": [{"meals": [{"price": 1}, {"price": 2}]}]},
            {"friends": [{"meals": [{"price": 3}]}]}
        ]);
        assert_eq!(
            resolve(&doc, "#.friends|@flatten.#.meals|@flatten.#.price"),
            Some(json!([1, 2, 3]))
        );
    }

    #[test]
    fn modifier_stage_with_trailing_path() {
        let doc = json!([{"tags": ["x", "y"]}, {"tags": ["z"]}]);
        assert_eq!(scalar(&doc, "#.tags|@flatten.2").as_deref(), Some("z"));
    }

    #[test]
    fn whole_document_on_empty_path() {
        let doc = json!({"a": 1});
        assert_eq!(resolve(&doc, ""), Some(doc.clone()));
    }

    #[test]
    fn json_null_reads_as_missing() {
        let doc = json!({"a": null});
        assert_eq!(scalar(&doc, "a"), None);
    }

    #[test]
    fn container_scalar_is_compact_json() {
        let doc = json!({"a": {"b": 1}});
        assert_eq!(scalar(&doc, "a").as_deref(), Some(r#"{"b":1}"#));
    }

    #[test]
    fn items_wraps_non_sequences() {
        let doc = json!({"single": {"a": 1}});
        assert_eq!(items(&doc, "single").len(), 1);
        assert_eq!(items(&doc, "missing").len(), 0);
        assert_eq!(items(&json!([1, 2, 3]), "").len(), 3);
    }
}
