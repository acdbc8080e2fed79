use serde_json::Value;

use crate::{
  models::{BoundField, FieldValue, TableColumn, TableData, TableSpec},
  path::{FieldPath, PathGrammar},
  resolve::resolve,
};

/// Partition bound fields by array ancestor (path minus its last segment).
///
/// Groups appear in the order their first field was bound; columns keep
/// binding order. Fields whose path cannot be decoded are skipped.
pub fn group(fields: &[BoundField]) -> Vec<TableSpec> {
  let mut specs: Vec<TableSpec> = Vec::new();
  for field in fields {
    let path = match FieldPath::decode(&field.path, PathGrammar::Column) {
      Ok(p) => p,
      Err(e) => {
        tracing::warn!(path = %field.path, error = %e, "skipping table field");
        continue;
      }
    };
    let Some(key) = path.last_key() else { continue };
    let array_path = path.parent().encode(PathGrammar::Column);
    let column = TableColumn {
      label: field.label().unwrap_or(key).to_string(),
      key: key.to_string(),
    };
    match specs.iter_mut().find(|s| s.array_path == array_path) {
      Some(spec) => spec.columns.push(column),
      None => specs.push(TableSpec {
        array_path,
        columns: vec![column],
      }),
    }
  }
  specs
}

/// Resolve every table group against a fresh document.
///
/// Each group's array is resolved once; a group whose ancestor is no longer
/// an array is left out. Cells read the column key directly on each element.
pub fn resolve_tables(document: &Value, fields: &[BoundField]) -> Vec<TableData> {
  group(fields)
    .into_iter()
    .filter_map(|spec| resolve_table(document, spec))
    .collect()
}

fn resolve_table(document: &Value, spec: TableSpec) -> Option<TableData> {
  let path = FieldPath::decode(&spec.array_path, PathGrammar::Column).ok()?;
  let Some(Value::Array(items)) = resolve(document, &path).value() else {
    tracing::debug!(array_path = %spec.array_path, "table ancestor is not an array");
    return None;
  };
  let rows = items
    .iter()
    .map(|item| spec.columns.iter().map(|col| cell(item, &col.key)).collect())
    .collect();
  Some(TableData {
    array_path: spec.array_path,
    columns: spec.columns,
    rows,
  })
}

fn cell(item: &Value, key: &str) -> FieldValue {
  match item {
    Value::Object(map) => map
      .get(key)
      .map(|v| FieldValue::Present(v.clone()))
      .unwrap_or(FieldValue::Missing),
    _ => FieldValue::Missing,
  }
}
