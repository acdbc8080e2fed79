use serde_json::Value;
use thiserror::Error;

use crate::{
  models::{Axis, BoundField, ChartPoint},
  path::{FieldPath, PathError, PathGrammar},
  resolve::resolve,
};

/// Chart preconditions that abort a whole projection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindingError {
  #[error("no x-axis field bound")]
  MissingXAxis,
  #[error("expected exactly one x-axis field, found {0}")]
  MultipleXAxes(usize),
  #[error("no y-axis field bound")]
  MissingYAxis,
  #[error("expected an array at `{0}`")]
  NotAnArray(String),
  #[error("field path `{0}` does not end in a key")]
  NoFieldKey(String),
  #[error("invalid field path `{path}`: {source}")]
  InvalidPath {
    path: String,
    #[source]
    source: PathError,
  },
}

/// Split chart fields by axis role and project them.
pub fn project_fields(document: &Value, fields: &[BoundField]) -> Result<Vec<ChartPoint>, BindingError> {
  let xs: Vec<&BoundField> = fields.iter().filter(|f| f.axis_role() == Some(Axis::X)).collect();
  let x = match xs.as_slice() {
    [] => return Err(BindingError::MissingXAxis),
    [x] => *x,
    many => return Err(BindingError::MultipleXAxes(many.len())),
  };
  let ys: Vec<&BoundField> = fields.iter().filter(|f| f.axis_role() == Some(Axis::Y)).collect();
  project(document, x, &ys)
}

/// One point per element of the x field's array ancestor.
///
/// The x value is copied as-is under its key; each y value is coerced to a
/// number under its own key, with 0 standing in for anything non-numeric.
/// Integral y values are stored as JSON integers.
pub fn project(document: &Value, x: &BoundField, ys: &[&BoundField]) -> Result<Vec<ChartPoint>, BindingError> {
  if ys.is_empty() {
    return Err(BindingError::MissingYAxis);
  }
  let x_path = decode(&x.path)?;
  let x_key = final_key(&x_path, &x.path)?;
  let y_keys = ys
    .iter()
    .map(|y| {
      let p = decode(&y.path)?;
      final_key(&p, &y.path)
    })
    .collect::<Result<Vec<String>, BindingError>>()?;

  let base = x_path.parent();
  let Some(Value::Array(items)) = resolve(document, &base).value() else {
    return Err(BindingError::NotAnArray(base.encode(PathGrammar::Column)));
  };

  let points = items
    .iter()
    .map(|item| {
      let mut point = ChartPoint::new();
      point.insert(x_key.clone(), lookup(item, &x_key).cloned().unwrap_or(Value::Null));
      for key in &y_keys {
        point.insert(key.clone(), number_value(coerce_number(lookup(item, key))));
      }
      point
    })
    .collect();
  Ok(points)
}

/// Numeric reading of a chart value; 0 when there is none.
///
/// Numbers pass through, booleans are 1/0, strings are trimmed and parsed
/// (blank is 0, `0x`/`0o`/`0b` prefixes allowed). Non-finite results are 0.
pub fn coerce_number(value: Option<&Value>) -> f64 {
  let n = match value {
    Some(Value::Number(n)) => n.as_f64(),
    Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
    Some(Value::String(s)) => parse_numeric(s),
    _ => None,
  };
  match n {
    Some(n) if n.is_finite() => n,
    _ => {
      tracing::trace!(?value, "chart value coerced to 0");
      0.0
    }
  }
}

fn parse_numeric(s: &str) -> Option<f64> {
  let t = s.trim();
  if t.is_empty() {
    return Some(0.0);
  }
  let radix = match t.get(..2) {
    Some("0x" | "0X") => Some(16),
    Some("0o" | "0O") => Some(8),
    Some("0b" | "0B") => Some(2),
    _ => None,
  };
  if let Some(radix) = radix {
    return u64::from_str_radix(&t[2..], radix).ok().map(|v| v as f64);
  }
  // f64::from_str also takes "inf"/"nan" spellings; those are not numbers here.
  if t.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
    return None;
  }
  t.parse::<f64>().ok()
}

fn number_value(n: f64) -> Value {
  if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
    Value::from(n as i64)
  } else {
    Value::from(n)
  }
}

fn decode(path: &str) -> Result<FieldPath, BindingError> {
  FieldPath::decode(path, PathGrammar::Column).map_err(|source| BindingError::InvalidPath {
    path: path.to_string(),
    source,
  })
}

fn final_key(path: &FieldPath, raw: &str) -> Result<String, BindingError> {
  path
    .last_key()
    .map(str::to_string)
    .ok_or_else(|| BindingError::NoFieldKey(raw.to_string()))
}

fn lookup<'a>(item: &'a Value, key: &str) -> Option<&'a Value> {
  match item {
    Value::Object(map) => map.get(key),
    _ => None,
  }
}
