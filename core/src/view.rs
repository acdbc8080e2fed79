use num_format::{Locale, ToFormattedString};
use serde_json::{Number, Value};

use crate::{
  chart::{project_fields, BindingError},
  models::{BoundField, CardEntry, DisplayKind, FieldValue, WidgetConfig, WidgetView},
  path::PathGrammar,
  resolve::resolve_str,
  table::resolve_tables,
};

/// Placeholder shown for a value that is absent or null.
pub const NO_VALUE: &str = "N/A";

/// Resolve card fields one by one; the label falls back to the path.
pub fn resolve_card(document: &Value, fields: &[BoundField]) -> Vec<CardEntry> {
  fields
    .iter()
    .map(|f| CardEntry {
      label: f.label().unwrap_or(&f.path).to_string(),
      path: f.path.clone(),
      value: resolve_str(document, &f.path, PathGrammar::Scalar).to_field_value(),
    })
    .collect()
}

/// Project one fetched document through a widget's bindings.
pub fn render_widget(widget: &WidgetConfig, document: &Value) -> Result<WidgetView, BindingError> {
  Ok(match widget.kind {
    DisplayKind::Card => WidgetView::Card {
      entries: resolve_card(document, &widget.fields),
    },
    DisplayKind::Table => WidgetView::Table {
      tables: resolve_tables(document, &widget.fields),
    },
    DisplayKind::Chart => WidgetView::Chart {
      style: widget.chart_style,
      points: project_fields(document, &widget.fields)?,
    },
  })
}

/// Text for a card or table cell.
pub fn format_value(value: &FieldValue) -> String {
  match value {
    FieldValue::Missing | FieldValue::Present(Value::Null) => NO_VALUE.to_string(),
    FieldValue::Present(Value::Bool(b)) => (if *b { "Yes" } else { "No" }).to_string(),
    FieldValue::Present(Value::Number(n)) => format_number(n),
    FieldValue::Present(Value::String(s)) => s.clone(),
    FieldValue::Present(other) => other.to_string(),
  }
}

/// Thousands separators, at most three fraction digits.
fn format_number(n: &Number) -> String {
  if let Some(i) = n.as_i64() {
    return i.to_formatted_string(&Locale::en);
  }
  if let Some(u) = n.as_u64() {
    return u.to_formatted_string(&Locale::en);
  }
  let Some(f) = n.as_f64() else {
    return n.to_string();
  };
  let sign = if f < 0.0 { "-" } else { "" };
  let abs = f.abs();
  // Past 2^53 there are no fraction digits left, and scaling by 1000 would
  // corrupt the integer digits.
  if abs >= 9.0e15 {
    if abs < u128::MAX as f64 {
      return format!("{sign}{}", (abs as u128).to_formatted_string(&Locale::en));
    }
    return format!("{f:e}");
  }
  let rounded = (abs * 1000.0).round() / 1000.0;
  let whole = rounded.trunc() as i64;
  let frac = format!("{:.3}", rounded.fract());
  let frac = frac.trim_start_matches('0').trim_end_matches('0').trim_end_matches('.');
  let sign = if rounded == 0.0 { "" } else { sign };
  format!("{sign}{}{frac}", whole.to_formatted_string(&Locale::en))
}
