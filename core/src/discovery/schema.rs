use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::{
  models::FieldCandidate,
  path::{FieldPath, PathGrammar, ROOT_ARRAY_SEGMENT},
};

/// Sample shown for a column whose first observed value is an object or array.
pub const OBJECT_PLACEHOLDER: &str = "[object]";

/// Discover table/chart columns: one candidate per key of each repeating
/// record shape, rather than one per scalar.
///
/// Array elements contribute the union of their keys. After the columns of
/// an array are emitted, its elements are scanned again under the same
/// `parent`, so nested tables surface too; that re-scan may repeat paths and
/// callers are expected to dedupe.
pub fn extract_candidates(value: &Value, parent: &FieldPath) -> Vec<FieldCandidate> {
  let mut out = Vec::new();
  extract_into(value, parent, &mut out);
  out
}

fn extract_into(value: &Value, parent: &FieldPath, out: &mut Vec<FieldCandidate>) {
  match value {
    Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    Value::Array(items) => {
      let base = if parent.is_empty() {
        FieldPath::root().with_key(ROOT_ARRAY_SEGMENT)
      } else {
        parent.clone()
      };
      let mut seen: HashSet<&str> = HashSet::new();
      for item in items {
        let Value::Object(record) = item else { continue };
        for (key, sample) in record {
          if !key.is_empty() && seen.insert(key.as_str()) {
            push(out, base.with_key(key.as_str()), sample_of(sample));
          }
        }
      }
      for item in items {
        if matches!(item, Value::Object(_) | Value::Array(_)) {
          extract_into(item, parent, out);
        }
      }
    }
    Value::Object(map) => {
      for (key, child) in map {
        if key.is_empty() {
          continue;
        }
        let path = parent.with_key(key.as_str());
        match child {
          Value::Array(_) => extract_into(child, &path, out),
          Value::Object(records) if is_map_of_records(records) => {
            // Keyed by id instead of an array: take the columns of one record
            // and stop here.
            if let Some(Value::Object(first)) = records.values().next() {
              for (k, sample) in first {
                if !k.is_empty() {
                  push(out, path.with_key(k.as_str()), sample_of(sample));
                }
              }
            }
          }
          Value::Object(record) if is_flat_record(record) => {
            for (k, sample) in record {
              if !k.is_empty() {
                push(out, path.with_key(k.as_str()), sample_of(sample));
              }
            }
          }
          Value::Object(_) => extract_into(child, &path, out),
          _ => push(out, path, child.clone()),
        }
      }
    }
  }
}

fn push(out: &mut Vec<FieldCandidate>, path: FieldPath, sample_value: Value) {
  out.push(FieldCandidate {
    path: path.encode(PathGrammar::Column),
    sample_value,
  });
}

fn sample_of(v: &Value) -> Value {
  match v {
    Value::Object(_) | Value::Array(_) => Value::String(OBJECT_PLACEHOLDER.to_string()),
    other => other.clone(),
  }
}

/// More than one entry and every entry a (non-array) object.
fn is_map_of_records(map: &Map<String, Value>) -> bool {
  map.len() > 1 && map.values().all(Value::is_object)
}

/// At least one entry and every entry a scalar or null.
fn is_flat_record(map: &Map<String, Value>) -> bool {
  !map.is_empty() && map.values().all(|v| !v.is_object() && !v.is_array())
}
