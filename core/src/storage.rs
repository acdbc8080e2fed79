use std::{
  fs,
  path::PathBuf,
  time::{SystemTime, UNIX_EPOCH},
};

use rusqlite::{params, Connection};

use crate::models::WidgetConfig;

#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
  /// Path to SQLite file. If None, defaults to ~/.apidash/widgets.sqlite (or %USERPROFILE% on Windows).
  pub sqlite_path: Option<PathBuf>,
}

/// SQLite persistence for the widget list.
#[derive(Debug, Clone)]
pub struct Storage {
  path: PathBuf,
}

impl Storage {
  pub fn new(opts: StorageOptions) -> Result<Self, String> {
    let path = opts.sqlite_path.unwrap_or_else(default_sqlite_path);

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    let conn = Connection::open(&path).map_err(|e| e.to_string())?;
    migrate(&conn).map_err(|e| e.to_string())?;
    Ok(Self { path })
  }

  pub fn path(&self) -> &PathBuf {
    &self.path
  }

  fn open(&self) -> Result<Connection, String> {
    Connection::open(&self.path).map_err(|e| e.to_string())
  }

  /// Widgets in their stored order. Rows that no longer deserialize are skipped.
  pub fn load_widgets(&self) -> Result<Vec<WidgetConfig>, String> {
    let conn = self.open()?;
    let mut stmt = conn
      .prepare("SELECT id, config_json FROM widgets ORDER BY position ASC")
      .map_err(|e| e.to_string())?;

    let rows = stmt
      .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
      .map_err(|e| e.to_string())?;

    let mut out = Vec::new();
    for r in rows {
      let (id, json) = r.map_err(|e| e.to_string())?;
      match serde_json::from_str::<WidgetConfig>(&json) {
        Ok(w) => out.push(w),
        Err(e) => tracing::warn!(widget_id = %id, error = %e, "skipping unreadable widget row"),
      }
    }
    Ok(out)
  }

  /// Replace the stored list with `widgets`, in order, in one transaction.
  pub fn save_widgets(&self, widgets: &[WidgetConfig]) -> Result<(), String> {
    let mut conn = self.open()?;
    let tx = conn.transaction().map_err(|e| e.to_string())?;
    tx.execute("DELETE FROM widgets", []).map_err(|e| e.to_string())?;
    let now = now_ms();
    for (position, w) in widgets.iter().enumerate() {
      let json = serde_json::to_string(w).map_err(|e| e.to_string())?;
      tx.execute(
        r#"
INSERT INTO widgets(id, position, config_json, updated_at)
VALUES(?1, ?2, ?3, ?4)
        "#,
        params![w.id, position as i64, json, now],
      )
      .map_err(|e| e.to_string())?;
    }
    tx.commit().map_err(|e| e.to_string())?;
    Ok(())
  }
}

fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
  conn.execute_batch(
    r#"
CREATE TABLE IF NOT EXISTS widgets(
  id TEXT PRIMARY KEY,
  position INTEGER NOT NULL,
  config_json TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);
    "#,
  )?;
  Ok(())
}

fn default_sqlite_path() -> PathBuf {
  // - macOS/Linux: $HOME/.apidash/widgets.sqlite
  // - Windows: %USERPROFILE%\.apidash\widgets.sqlite
  let base = std::env::var_os("HOME")
    .or_else(|| std::env::var_os("USERPROFILE"))
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("."));
  base.join(".apidash").join("widgets.sqlite")
}

pub(crate) fn now_ms() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as i64
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::{BoundField, DisplayKind};

  #[test]
  fn widgets_survive_reopen_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let opts = StorageOptions {
      sqlite_path: Some(dir.path().join("nested").join("w.sqlite")),
    };
    let storage = Storage::new(opts.clone()).unwrap();

    let mut a = WidgetConfig::new("a", "http://a", DisplayKind::Card);
    a.fields.push(BoundField::labeled("price", "Price"));
    let b = WidgetConfig::new("b", "http://b", DisplayKind::Table);
    storage.save_widgets(&[b.clone(), a.clone()]).unwrap();

    let reopened = Storage::new(opts).unwrap();
    assert_eq!(reopened.load_widgets().unwrap(), vec![b, a]);

    reopened.save_widgets(&[]).unwrap();
    assert!(reopened.load_widgets().unwrap().is_empty());
  }

  #[test]
  fn unreadable_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("w.sqlite");
    let storage = Storage::new(StorageOptions {
      sqlite_path: Some(path.clone()),
    })
    .unwrap();
    let ok = WidgetConfig::new("ok", "http://ok", DisplayKind::Card);
    storage.save_widgets(&[ok.clone()]).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn
      .execute(
        "INSERT INTO widgets(id, position, config_json, updated_at) VALUES('bad', 5, '{', 0)",
        [],
      )
      .unwrap();
    assert_eq!(storage.load_widgets().unwrap(), vec![ok]);
  }
}
