use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  chart::BindingError,
  engine::CoreError,
  models::{Axis, DisplayKind, FieldRole, WidgetConfig},
  path::{FieldPath, PathGrammar},
  storage::{Storage, StorageOptions},
  tasks::{MAX_REFRESH_SECS, MIN_REFRESH_SECS},
};

/// The ordered list of bound widgets.
///
/// Built empty with `in_memory`, or loaded from SQLite with `open`; in the
/// latter case every mutation is written through before it becomes visible.
#[derive(Clone)]
pub struct WidgetStore {
  widgets: Arc<Mutex<Vec<WidgetConfig>>>,
  storage: Option<Storage>,
}

impl WidgetStore {
  pub fn in_memory() -> Self {
    Self {
      widgets: Arc::new(Mutex::new(Vec::new())),
      storage: None,
    }
  }

  pub fn open(opts: StorageOptions) -> Result<Self, CoreError> {
    let storage = Storage::new(opts).map_err(CoreError::Storage)?;
    let widgets = storage.load_widgets().map_err(CoreError::Storage)?;
    tracing::info!(count = widgets.len(), path = %storage.path().display(), "loaded widgets");
    Ok(Self {
      widgets: Arc::new(Mutex::new(widgets)),
      storage: Some(storage),
    })
  }

  pub fn is_persistent(&self) -> bool {
    self.storage.is_some()
  }

  pub fn list(&self) -> Vec<WidgetConfig> {
    self.widgets.lock().clone()
  }

  pub fn get(&self, id: &str) -> Option<WidgetConfig> {
    self.widgets.lock().iter().find(|w| w.id == id).cloned()
  }

  pub fn len(&self) -> usize {
    self.widgets.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn add(&self, widget: WidgetConfig) -> Result<(), CoreError> {
    validate_widget(&widget)?;
    self.mutate(|list| {
      if list.iter().any(|w| w.id == widget.id) {
        return Err(CoreError::InvalidWidget(format!("duplicate widget id {}", widget.id)));
      }
      list.push(widget);
      Ok(())
    })
  }

  /// Replace the widget stored under `id`, keeping that id.
  pub fn update(&self, id: &str, mut widget: WidgetConfig) -> Result<WidgetConfig, CoreError> {
    widget.id = id.to_string();
    validate_widget(&widget)?;
    self.mutate(|list| {
      let slot = list
        .iter_mut()
        .find(|w| w.id == id)
        .ok_or_else(|| CoreError::UnknownWidget(id.to_string()))?;
      *slot = widget.clone();
      Ok(widget)
    })
  }

  pub fn remove(&self, id: &str) -> Result<WidgetConfig, CoreError> {
    self.mutate(|list| {
      let pos = list
        .iter()
        .position(|w| w.id == id)
        .ok_or_else(|| CoreError::UnknownWidget(id.to_string()))?;
      Ok(list.remove(pos))
    })
  }

  pub fn clear(&self) -> Result<(), CoreError> {
    self.mutate(|list| {
      list.clear();
      Ok(())
    })
  }

  /// Reorder to match `ids`, which must name every widget exactly once.
  pub fn reorder(&self, ids: &[String]) -> Result<(), CoreError> {
    self.mutate(|list| {
      if ids.len() != list.len() {
        return Err(CoreError::InvalidArg(format!(
          "reorder expects {} ids, got {}",
          list.len(),
          ids.len()
        )));
      }
      let mut next = Vec::with_capacity(list.len());
      for id in ids {
        let pos = list
          .iter()
          .position(|w| &w.id == id)
          .ok_or_else(|| CoreError::UnknownWidget(id.clone()))?;
        next.push(list.swap_remove(pos));
      }
      *list = next;
      Ok(())
    })
  }

  /// Move the widget at `from` to index `to`, shifting the ones in between.
  pub fn move_widget(&self, from: usize, to: usize) -> Result<(), CoreError> {
    self.mutate(|list| {
      if from >= list.len() || to >= list.len() {
        return Err(CoreError::InvalidArg(format!(
          "move {from} -> {to} out of range for {} widgets",
          list.len()
        )));
      }
      let w = list.remove(from);
      list.insert(to, w);
      Ok(())
    })
  }

  /// Apply `f` to a copy, persist the copy, then publish it.
  fn mutate<T>(&self, f: impl FnOnce(&mut Vec<WidgetConfig>) -> Result<T, CoreError>) -> Result<T, CoreError> {
    let mut guard = self.widgets.lock();
    let mut next = guard.clone();
    let out = f(&mut next)?;
    if let Some(storage) = &self.storage {
      storage.save_widgets(&next).map_err(CoreError::Storage)?;
    }
    *guard = next;
    Ok(out)
  }
}

/// Check a widget before it is stored.
pub fn validate_widget(widget: &WidgetConfig) -> Result<(), CoreError> {
  let invalid = |msg: &str| Err(CoreError::InvalidWidget(msg.to_string()));

  if widget.name.trim().is_empty() {
    return invalid("widget name is mandatory");
  }
  if widget.endpoint.trim().is_empty() {
    return invalid("endpoint is mandatory");
  }
  if widget.fields.is_empty() {
    return invalid("select at least one field");
  }
  if !(MIN_REFRESH_SECS..=MAX_REFRESH_SECS).contains(&widget.refresh_interval_secs) {
    return Err(CoreError::InvalidWidget(format!(
      "refresh interval must be within {MIN_REFRESH_SECS}..={MAX_REFRESH_SECS} seconds"
    )));
  }

  let grammar = PathGrammar::for_kind(widget.kind);
  for f in &widget.fields {
    FieldPath::decode(&f.path, grammar)?;
  }

  match widget.kind {
    DisplayKind::Card | DisplayKind::Table => {
      for f in &widget.fields {
        match &f.role {
          FieldRole::Label(l) if !l.trim().is_empty() => {}
          FieldRole::Label(_) => {
            return Err(CoreError::InvalidWidget(format!("field `{}` needs a label", f.path)))
          }
          FieldRole::Axis(_) => {
            return Err(CoreError::InvalidWidget(format!(
              "field `{}` has an axis role outside a chart",
              f.path
            )))
          }
        }
      }
    }
    DisplayKind::Chart => {
      if let Some(f) = widget.fields.iter().find(|f| f.axis_role().is_none()) {
        return Err(CoreError::InvalidWidget(format!("chart field `{}` needs an axis", f.path)));
      }
      let xs = widget.fields.iter().filter(|f| f.axis_role() == Some(Axis::X)).count();
      let ys = widget.fields.len() - xs;
      match xs {
        0 => return Err(BindingError::MissingXAxis.into()),
        1 => {}
        n => return Err(BindingError::MultipleXAxes(n).into()),
      }
      if ys == 0 {
        return Err(BindingError::MissingYAxis.into());
      }
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::BoundField;

  fn card(name: &str) -> WidgetConfig {
    let mut w = WidgetConfig::new(name, "http://api/x", DisplayKind::Card);
    w.fields.push(BoundField::labeled("price", "Price"));
    w
  }

  fn ids(store: &WidgetStore) -> Vec<String> {
    store.list().into_iter().map(|w| w.name).collect()
  }

  #[test]
  fn starts_empty_and_tracks_mutations() {
    let store = WidgetStore::in_memory();
    assert!(store.is_empty());
    let a = card("a");
    let b = card("b");
    store.add(a.clone()).unwrap();
    store.add(b.clone()).unwrap();
    assert!(matches!(store.add(a.clone()), Err(CoreError::InvalidWidget(_))));

    let mut renamed = card("a2");
    renamed.id = "ignored".into();
    let updated = store.update(&a.id, renamed).unwrap();
    assert_eq!(updated.id, a.id);
    assert_eq!(ids(&store), vec!["a2", "b"]);

    store.remove(&b.id).unwrap();
    assert!(matches!(store.remove(&b.id), Err(CoreError::UnknownWidget(_))));
    store.clear().unwrap();
    assert!(store.is_empty());
  }

  #[test]
  fn reorder_requires_a_permutation() {
    let store = WidgetStore::in_memory();
    let (a, b, c) = (card("a"), card("b"), card("c"));
    for w in [&a, &b, &c] {
      store.add(w.clone()).unwrap();
    }
    store.reorder(&[c.id.clone(), a.id.clone(), b.id.clone()]).unwrap();
    assert_eq!(ids(&store), vec!["c", "a", "b"]);

    assert!(store.reorder(&[a.id.clone()]).is_err());
    assert!(store.reorder(&[a.id.clone(), a.id.clone(), b.id.clone()]).is_err());
    assert_eq!(ids(&store), vec!["c", "a", "b"]);

    store.move_widget(0, 2).unwrap();
    assert_eq!(ids(&store), vec!["a", "b", "c"]);
    assert!(store.move_widget(3, 0).is_err());
  }

  #[test]
  fn persistent_store_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let opts = StorageOptions {
      sqlite_path: Some(dir.path().join("w.sqlite")),
    };
    let store = WidgetStore::open(opts.clone()).unwrap();
    assert!(store.is_persistent());
    store.add(card("a")).unwrap();
    store.add(card("b")).unwrap();
    store.move_widget(1, 0).unwrap();

    let reopened = WidgetStore::open(opts).unwrap();
    assert_eq!(ids(&reopened), vec!["b", "a"]);
  }

  #[test]
  fn validation_rules() {
    let mut w = card("a");
    w.refresh_interval_secs = 0;
    assert!(validate_widget(&w).is_err());
    w.refresh_interval_secs = 3601;
    assert!(validate_widget(&w).is_err());
    w.refresh_interval_secs = 3600;
    assert!(validate_widget(&w).is_ok());

    w.fields = vec![BoundField::labeled("price", "  ")];
    assert!(validate_widget(&w).is_err());

    w.fields = vec![BoundField::labeled("a ->  -> b", "x")];
    assert!(matches!(validate_widget(&w), Err(CoreError::Path(_))));

    let mut chart = WidgetConfig::new("c", "http://api", DisplayKind::Chart);
    chart.fields = vec![BoundField::axis("p -> t", Axis::X)];
    assert!(matches!(
      validate_widget(&chart),
      Err(CoreError::Binding(BindingError::MissingYAxis))
    ));
    chart.fields.push(BoundField::axis("p -> v", Axis::Y));
    assert!(validate_widget(&chart).is_ok());
    chart.fields.push(BoundField::labeled("p -> w", "W"));
    assert!(validate_widget(&chart).is_err());
  }
}
