use serde_json::Value;

use crate::{
  models::FieldCandidate,
  path::{FieldPath, PathGrammar},
};

/// Emit every leaf scalar of `value` as a card candidate.
///
/// Only string/number/boolean members of a map are leaves. `null` ends the
/// branch, arrays descend element by element as `parent[i]`, and a scalar
/// sitting directly in an array (or at the root) has no key and emits nothing.
pub fn flatten(value: &Value) -> Vec<FieldCandidate> {
  let mut out = Vec::new();
  flatten_into(value, &FieldPath::root(), &mut out);
  out
}

fn flatten_into(value: &Value, parent: &FieldPath, out: &mut Vec<FieldCandidate>) {
  match value {
    Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    Value::Array(items) => {
      for (i, item) in items.iter().enumerate() {
        flatten_into(item, &parent.with_index(i), out);
      }
    }
    Value::Object(map) => {
      for (key, child) in map {
        if key.is_empty() {
          tracing::debug!(parent = %parent, "skipping empty key");
          continue;
        }
        let path = parent.with_key(key.as_str());
        match child {
          Value::Bool(_) | Value::Number(_) | Value::String(_) => out.push(FieldCandidate {
            path: path.encode(PathGrammar::Scalar),
            sample_value: child.clone(),
          }),
          _ => flatten_into(child, &path, out),
        }
      }
    }
  }
}
