use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step in a field path: a map key or an array index.
///
/// Untagged so a path can travel as a plain array like `["items", 0, "name"]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum PathSegment {
  Key(String),
  Index(usize),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DisplayKind {
  Card,
  Table,
  Chart,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChartStyle {
  #[default]
  Line,
  Bar,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
  X,
  Y,
}

/// A discovery-time suggestion. `sample_value` is illustrative only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldCandidate {
  pub path: String,
  pub sample_value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum FieldRole {
  /// Card and table columns.
  Label(String),
  /// Chart series.
  Axis(Axis),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundField {
  pub path: String,
  pub role: FieldRole,
  #[serde(default)]
  pub sample_value: Value,
}

impl BoundField {
  pub fn labeled(path: impl Into<String>, label: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      role: FieldRole::Label(label.into()),
      sample_value: Value::Null,
    }
  }

  pub fn axis(path: impl Into<String>, axis: Axis) -> Self {
    Self {
      path: path.into(),
      role: FieldRole::Axis(axis),
      sample_value: Value::Null,
    }
  }

  pub fn from_candidate(candidate: FieldCandidate, role: FieldRole) -> Self {
    Self {
      path: candidate.path,
      role,
      sample_value: candidate.sample_value,
    }
  }

  /// The plain label, if this field carries one and it is not blank.
  pub fn label(&self) -> Option<&str> {
    match &self.role {
      FieldRole::Label(l) if !l.trim().is_empty() => Some(l.as_str()),
      _ => None,
    }
  }

  pub fn axis_role(&self) -> Option<Axis> {
    match self.role {
      FieldRole::Axis(a) => Some(a),
      FieldRole::Label(_) => None,
    }
  }
}

/// A bound display as persisted by the widget store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WidgetConfig {
  pub id: String,
  pub name: String,
  pub endpoint: String,
  pub refresh_interval_secs: u32,
  pub kind: DisplayKind,
  pub fields: Vec<BoundField>,
  #[serde(default)]
  pub headers: BTreeMap<String, String>,
  #[serde(default)]
  pub chart_style: ChartStyle,
}

impl WidgetConfig {
  /// A config with a fresh id and the default 30s refresh.
  pub fn new(name: impl Into<String>, endpoint: impl Into<String>, kind: DisplayKind) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      name: name.into(),
      endpoint: endpoint.into(),
      refresh_interval_secs: 30,
      kind,
      fields: Vec::new(),
      headers: BTreeMap::new(),
      chart_style: ChartStyle::default(),
    }
  }
}

/// Result of re-resolving a bound path against a live document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum FieldValue {
  Present(Value),
  Missing,
}

impl FieldValue {
  pub fn is_missing(&self) -> bool {
    matches!(self, FieldValue::Missing)
  }

  pub fn as_value(&self) -> Option<&Value> {
    match self {
      FieldValue::Present(v) => Some(v),
      FieldValue::Missing => None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableColumn {
  pub label: String,
  pub key: String,
}

/// One logical table derived from the bound fields sharing an array ancestor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSpec {
  pub array_path: String,
  pub columns: Vec<TableColumn>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableData {
  pub array_path: String,
  pub columns: Vec<TableColumn>,
  /// One entry per array element, one cell per column.
  pub rows: Vec<Vec<FieldValue>>,
}

/// One row of chart data: the x key first, then one numeric entry per y field.
pub type ChartPoint = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardEntry {
  pub label: String,
  pub path: String,
  pub value: FieldValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WidgetView {
  Card { entries: Vec<CardEntry> },
  Table { tables: Vec<TableData> },
  Chart { style: ChartStyle, points: Vec<ChartPoint> },
}

/// Last known state of a widget after a poll cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WidgetSnapshot {
  pub widget_id: String,
  pub updated_at_ms: i64,
  /// Last successfully rendered view; kept when a later cycle fails.
  pub view: Option<WidgetView>,
  pub error: Option<String>,
}
