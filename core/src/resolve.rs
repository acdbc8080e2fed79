use serde_json::Value;

use crate::{
  models::{FieldValue, PathSegment},
  path::{FieldPath, PathGrammar, ROOT_ARRAY_SEGMENT},
};

/// Outcome of walking a stored path through a live document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
  Value(&'a Value),
  Missing,
}

impl<'a> Resolved<'a> {
  pub fn is_missing(&self) -> bool {
    matches!(self, Resolved::Missing)
  }

  pub fn value(&self) -> Option<&'a Value> {
    match self {
      Resolved::Value(v) => Some(v),
      Resolved::Missing => None,
    }
  }

  pub fn to_field_value(&self) -> FieldValue {
    match self {
      Resolved::Value(v) => FieldValue::Present((*v).clone()),
      Resolved::Missing => FieldValue::Missing,
    }
  }
}

/// Walk `document` along `path`. Total: any shape mismatch yields `Missing`.
///
/// A leading `array` key against a root array addresses the root itself, which
/// is how column paths of a top-level array are written.
pub fn resolve<'a>(document: &'a Value, path: &FieldPath) -> Resolved<'a> {
  let mut segments = path.segments();
  if let (Value::Array(_), Some(PathSegment::Key(first))) = (document, segments.first()) {
    if first == ROOT_ARRAY_SEGMENT {
      segments = &segments[1..];
    }
  }

  let mut current = document;
  for seg in segments {
    let next = match (current, seg) {
      (Value::Object(map), PathSegment::Key(k)) => map.get(k),
      (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
      _ => None,
    };
    match next {
      Some(v) => current = v,
      None => return Resolved::Missing,
    }
  }
  Resolved::Value(current)
}

/// Decode and resolve in one step; an undecodable path is `Missing`.
pub fn resolve_str<'a>(document: &'a Value, path: &str, grammar: PathGrammar) -> Resolved<'a> {
  match FieldPath::decode(path, grammar) {
    Ok(p) => resolve(document, &p),
    Err(e) => {
      tracing::debug!(path, error = %e, "undecodable field path");
      Resolved::Missing
    }
  }
}
