use std::fmt::{self, Write as _};

use thiserror::Error;

use crate::models::{DisplayKind, PathSegment};

/// Separator between field segments in an encoded path.
pub const SEPARATOR: &str = " -> ";

/// Leading segment used for columns of a root-level array (`array -> key`).
pub const ROOT_ARRAY_SEGMENT: &str = "array";

/// Which of the two path encodings a string was produced with.
///
/// `Scalar` paths come from card discovery and address one element
/// (`items[0] -> name`). `Column` paths come from schema discovery and
/// describe a column across all elements (`items -> name`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathGrammar {
  Scalar,
  Column,
}

impl PathGrammar {
  pub fn for_kind(kind: DisplayKind) -> Self {
    match kind {
      DisplayKind::Card => PathGrammar::Scalar,
      DisplayKind::Table | DisplayKind::Chart => PathGrammar::Column,
    }
  }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
  #[error("empty segment at position {0}")]
  EmptySegment(usize),
  #[error("index-only segment `{0}` is only allowed at the root")]
  DetachedIndex(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
  segments: Vec<PathSegment>,
}

impl FieldPath {
  pub fn new(segments: Vec<PathSegment>) -> Self {
    Self { segments }
  }

  pub fn root() -> Self {
    Self::default()
  }

  pub fn segments(&self) -> &[PathSegment] {
    &self.segments
  }

  pub fn is_empty(&self) -> bool {
    self.segments.is_empty()
  }

  pub fn len(&self) -> usize {
    self.segments.len()
  }

  pub fn with_key(&self, key: impl Into<String>) -> Self {
    let mut segments = self.segments.clone();
    segments.push(PathSegment::Key(key.into()));
    Self { segments }
  }

  pub fn with_index(&self, index: usize) -> Self {
    let mut segments = self.segments.clone();
    segments.push(PathSegment::Index(index));
    Self { segments }
  }

  /// The path with its final segment removed (the root stays the root).
  pub fn parent(&self) -> Self {
    let mut segments = self.segments.clone();
    segments.pop();
    Self { segments }
  }

  /// The final segment if it is a map key.
  pub fn last_key(&self) -> Option<&str> {
    match self.segments.last() {
      Some(PathSegment::Key(k)) => Some(k.as_str()),
      _ => None,
    }
  }

  pub fn encode(&self, grammar: PathGrammar) -> String {
    let mut out = String::new();
    for seg in &self.segments {
      match seg {
        PathSegment::Key(k) => {
          if !out.is_empty() {
            out.push_str(SEPARATOR);
          }
          out.push_str(k);
        }
        PathSegment::Index(i) => {
          if grammar == PathGrammar::Scalar {
            let _ = write!(out, "[{i}]");
          }
        }
      }
    }
    out
  }

  /// Parse an encoded path. The caller must know which grammar produced it.
  ///
  /// A key that itself contains `" -> "` cannot be told apart from two
  /// segments, and neither can one ending in `" ->"` or starting with `"-> "`
  /// once a neighbouring separator is attached (`x ->` then `y` encodes as
  /// `x -> -> y`, which splits as `x` and `-> y`). In the Scalar grammar a key
  /// ending in `[digits]` reads back as an indexed key. Such paths do not
  /// round-trip and resolve as missing.
  pub fn decode(s: &str, grammar: PathGrammar) -> Result<Self, PathError> {
    if s.is_empty() {
      return Ok(Self::root());
    }
    let mut segments = Vec::new();
    for (pos, part) in s.split(SEPARATOR).enumerate() {
      if part.is_empty() {
        return Err(PathError::EmptySegment(pos));
      }
      match grammar {
        PathGrammar::Column => segments.push(PathSegment::Key(part.to_string())),
        PathGrammar::Scalar => {
          let (base, indices) = split_trailing_indices(part);
          if base.is_empty() {
            if pos != 0 {
              return Err(PathError::DetachedIndex(part.to_string()));
            }
          } else {
            segments.push(PathSegment::Key(base.to_string()));
          }
          segments.extend(indices.into_iter().map(PathSegment::Index));
        }
      }
    }
    Ok(Self { segments })
  }
}

impl fmt::Display for FieldPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.encode(PathGrammar::Scalar))
  }
}

/// Split `name[1][2]` into `("name", [1, 2])`. Brackets that do not hold a
/// plain decimal index stay part of the key.
fn split_trailing_indices(part: &str) -> (&str, Vec<usize>) {
  let mut base = part;
  let mut indices = Vec::new();
  while base.ends_with(']') {
    let Some(open) = base.rfind('[') else { break };
    let digits = &base[open + 1..base.len() - 1];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
      break;
    }
    let Ok(idx) = digits.parse::<usize>() else { break };
    indices.push(idx);
    base = &base[..open];
  }
  indices.reverse();
  (base, indices)
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn key(k: &str) -> PathSegment {
    PathSegment::Key(k.to_string())
  }

  #[test]
  fn scalar_encoding_attaches_indices() {
    let p = FieldPath::new(vec![key("data"), key("items"), PathSegment::Index(0), key("name")]);
    assert_eq!(p.encode(PathGrammar::Scalar), "data -> items[0] -> name");
    assert_eq!(p.encode(PathGrammar::Column), "data -> items -> name");
  }

  #[test]
  fn root_array_index_has_no_separator() {
    let p = FieldPath::new(vec![PathSegment::Index(2), PathSegment::Index(1), key("id")]);
    assert_eq!(p.encode(PathGrammar::Scalar), "[2][1] -> id");
    assert_eq!(FieldPath::decode("[2][1] -> id", PathGrammar::Scalar).unwrap(), p);
  }

  #[test]
  fn decode_column_keeps_brackets_in_keys() {
    let p = FieldPath::decode("a[0] -> b", PathGrammar::Column).unwrap();
    assert_eq!(p.segments(), &[key("a[0]"), key("b")]);
  }

  #[test]
  fn decode_rejects_empty_and_detached_segments() {
    assert_eq!(
      FieldPath::decode("a ->  -> b", PathGrammar::Column),
      Err(PathError::EmptySegment(1))
    );
    assert_eq!(
      FieldPath::decode("a -> [0]", PathGrammar::Scalar),
      Err(PathError::DetachedIndex("[0]".into()))
    );
  }

  #[test]
  fn non_numeric_brackets_stay_in_key() {
    let p = FieldPath::decode("tags[x] -> v[]", PathGrammar::Scalar).unwrap();
    assert_eq!(p.segments(), &[key("tags[x]"), key("v[]")]);
  }

  #[test]
  fn grammar_lookalike_keys_do_not_round_trip() {
    let indexed = FieldPath::new(vec![key("tags[0]")]);
    let decoded = FieldPath::decode(&indexed.encode(PathGrammar::Scalar), PathGrammar::Scalar).unwrap();
    assert_eq!(decoded.segments(), &[key("tags"), PathSegment::Index(0)]);

    let arrow = FieldPath::new(vec![key("x ->"), key("y")]);
    assert_eq!(arrow.encode(PathGrammar::Scalar), "x -> -> y");
    for grammar in [PathGrammar::Scalar, PathGrammar::Column] {
      let decoded = FieldPath::decode(&arrow.encode(grammar), grammar).unwrap();
      assert_eq!(decoded.segments(), &[key("x"), key("-> y")]);
    }
  }

  #[test]
  fn parent_and_last_key() {
    let p = FieldPath::decode("items -> price", PathGrammar::Column).unwrap();
    assert_eq!(p.parent().encode(PathGrammar::Column), "items");
    assert_eq!(p.last_key(), Some("price"));
    assert_eq!(FieldPath::root().parent(), FieldPath::root());
    assert!(FieldPath::decode("", PathGrammar::Column).unwrap().is_empty());
  }

  fn arb_key() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_ .]{0,8}"
  }

  fn arb_scalar_segment() -> impl Strategy<Value = PathSegment> {
    prop_oneof![
      arb_key().prop_map(PathSegment::Key),
      (0usize..50).prop_map(PathSegment::Index),
    ]
  }

  proptest! {
    #[test]
    fn column_paths_round_trip(keys in prop::collection::vec(arb_key(), 0..6)) {
      let p = FieldPath::new(keys.into_iter().map(PathSegment::Key).collect());
      let decoded = FieldPath::decode(&p.encode(PathGrammar::Column), PathGrammar::Column).unwrap();
      prop_assert_eq!(decoded, p);
    }

    #[test]
    fn scalar_paths_round_trip(segs in prop::collection::vec(arb_scalar_segment(), 0..6)) {
      let p = FieldPath::new(segs);
      let decoded = FieldPath::decode(&p.encode(PathGrammar::Scalar), PathGrammar::Scalar).unwrap();
      prop_assert_eq!(decoded, p);
    }
  }
}
