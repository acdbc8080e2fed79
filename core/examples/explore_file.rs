use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use apidash_core::{
  format_value, DashboardEngine, DisplayKind, EngineOptions, FetchError, FieldValue,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn parse_kind(s: &str) -> Result<DisplayKind, String> {
  match s {
    "card" => Ok(DisplayKind::Card),
    "table" => Ok(DisplayKind::Table),
    "chart" => Ok(DisplayKind::Chart),
    other => Err(format!("unknown display kind `{other}` (card|table|chart)")),
  }
}

fn main() -> Result<(), String> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let mut args = std::env::args().skip(1);
  let usage = "usage: cargo run -p apidash_core --example explore_file -- <file.json> [card|table|chart] [search words]";
  let path = PathBuf::from(args.next().ok_or_else(|| usage.to_string())?);
  let kind = parse_kind(args.next().as_deref().unwrap_or("card"))?;
  let filter: Vec<String> = args.collect();

  // Treat the endpoint as a local file path.
  let fetcher = |endpoint: &str, _headers: &BTreeMap<String, String>| -> Result<Value, FetchError> {
    let text = std::fs::read_to_string(endpoint).map_err(|e| FetchError::Transport(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))
  };

  let eng = DashboardEngine::new(
    EngineOptions {
      persist: false,
      ..EngineOptions::default()
    },
    Arc::new(fetcher),
  )
  .map_err(|e| e.to_string())?;

  let filter = filter.join(" ");
  let candidates = eng
    .explore(
      &path.to_string_lossy(),
      &BTreeMap::new(),
      kind,
      Some(filter.as_str()),
    )
    .map_err(|e| e.to_string())?;

  println!("kind={kind:?} candidates={}", candidates.len());
  for c in candidates {
    println!("{} = {}", c.path, format_value(&FieldValue::Present(c.sample_value)));
  }
  Ok(())
}
