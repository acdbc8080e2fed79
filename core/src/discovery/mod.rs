use std::collections::HashSet;

use serde_json::Value;

use crate::{
  models::{DisplayKind, FieldCandidate},
  path::FieldPath,
};

mod scalar;
mod schema;

pub use scalar::flatten;
pub use schema::{extract_candidates, OBJECT_PLACEHOLDER};

/// Run the discovery pass matching `kind` and drop repeated paths.
///
/// Cards get one candidate per scalar leaf; tables and charts get one
/// candidate per column of each repeating structure.
pub fn discover(document: &Value, kind: DisplayKind) -> Vec<FieldCandidate> {
  let raw = match kind {
    DisplayKind::Card => flatten(document),
    DisplayKind::Table | DisplayKind::Chart => extract_candidates(document, &FieldPath::root()),
  };
  let raw_len = raw.len();
  let out = dedupe_candidates(raw);
  tracing::debug!(?kind, raw = raw_len, unique = out.len(), "discovered candidates");
  out
}

/// Keep the first candidate for each path, preserving order.
pub fn dedupe_candidates(candidates: Vec<FieldCandidate>) -> Vec<FieldCandidate> {
  let mut seen = HashSet::new();
  candidates
    .into_iter()
    .filter(|c| seen.insert(c.path.clone()))
    .collect()
}
