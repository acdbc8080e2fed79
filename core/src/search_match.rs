use std::ops::Range;

use crate::models::FieldCandidate;

/// Search box over discovered field paths.
///
/// The text is split on whitespace into lowercase words; a path matches when
/// it contains every word, ignoring case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
  words: Vec<String>,
}

impl FieldFilter {
  /// `None` when the text holds no words (nothing to filter).
  pub fn new(text: &str) -> Option<Self> {
    let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
      return None;
    }
    Some(Self { words })
  }

  pub fn words(&self) -> &[String] {
    &self.words
  }

  pub fn matches(&self, path: &str) -> bool {
    let hay = path.to_lowercase();
    self.words.iter().all(|w| hay.contains(w.as_str()))
  }

  /// Byte ranges of `path` covered by any word, sorted and merged.
  ///
  /// Case folding here is ASCII-only so offsets stay valid for `path`.
  pub fn highlight(&self, path: &str) -> Vec<Range<usize>> {
    let hay = path.to_ascii_lowercase();
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for w in &self.words {
      for (start, m) in hay.match_indices(w.as_str()) {
        ranges.push(start..start + m.len());
      }
    }
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for r in ranges {
      match merged.last_mut() {
        Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
        _ => merged.push(r),
      }
    }
    merged
  }
}

/// Keep candidates whose path matches `text`; blank text keeps everything.
pub fn filter_candidates(candidates: Vec<FieldCandidate>, text: &str) -> Vec<FieldCandidate> {
  match FieldFilter::new(text) {
    None => candidates,
    Some(f) => candidates.into_iter().filter(|c| f.matches(&c.path)).collect(),
  }
}
