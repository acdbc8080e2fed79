use std::{
  collections::{BTreeMap, HashMap},
  sync::Arc,
  thread,
  time::{Duration, Instant},
};

use parking_lot::Mutex;
use thiserror::Error;

use crate::{
  chart::BindingError,
  discovery,
  fetch::{FetchError, Fetcher},
  models::{DisplayKind, FieldCandidate, WidgetConfig, WidgetSnapshot},
  path::PathError,
  search_match::filter_candidates,
  storage::{now_ms, StorageOptions},
  store::WidgetStore,
  tasks::{CancelToken, PollScheduler},
  view::render_widget,
};

#[derive(Debug, Error)]
pub enum CoreError {
  #[error("storage error: {0}")]
  Storage(String),
  #[error("fetch failed: {0}")]
  Fetch(#[from] FetchError),
  #[error("binding error: {0}")]
  Binding(#[from] BindingError),
  #[error("invalid path: {0}")]
  Path(#[from] PathError),
  #[error("invalid widget: {0}")]
  InvalidWidget(String),
  #[error("unknown widget: {0}")]
  UnknownWidget(String),
  #[error("invalid argument: {0}")]
  InvalidArg(String),
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
  /// Refresh interval given to widgets created through `new_widget`.
  pub default_refresh_secs: u32,
  /// Keep widgets in SQLite; when false the store lives in memory only.
  pub persist: bool,
  pub storage: StorageOptions,
}

impl Default for EngineOptions {
  fn default() -> Self {
    Self {
      default_refresh_secs: 30,
      persist: true,
      storage: StorageOptions::default(),
    }
  }
}

#[derive(Clone)]
pub struct DashboardEngine {
  options: EngineOptions,
  fetcher: Arc<dyn Fetcher>,
  store: WidgetStore,
  scheduler: PollScheduler,
  snapshots: Arc<Mutex<HashMap<String, WidgetSnapshot>>>,
}

impl DashboardEngine {
  /// Open the widget store and schedule every stored widget.
  pub fn new(options: EngineOptions, fetcher: Arc<dyn Fetcher>) -> Result<Self, CoreError> {
    let store = if options.persist {
      WidgetStore::open(options.storage.clone())?
    } else {
      WidgetStore::in_memory()
    };
    let scheduler = PollScheduler::new();
    let now = Instant::now();
    for w in store.list() {
      scheduler.schedule(&w.id, w.refresh_interval_secs, now);
    }
    Ok(Self {
      options,
      fetcher,
      store,
      scheduler,
      snapshots: Arc::new(Mutex::new(HashMap::new())),
    })
  }

  pub fn store(&self) -> &WidgetStore {
    &self.store
  }

  pub fn scheduler(&self) -> &PollScheduler {
    &self.scheduler
  }

  /// Fetch an endpoint once and list the fields a `kind` display could bind.
  ///
  /// Candidates are deduplicated by path and, when `filter` has words,
  /// narrowed to paths containing all of them.
  pub fn explore(
    &self,
    endpoint: &str,
    headers: &BTreeMap<String, String>,
    kind: DisplayKind,
    filter: Option<&str>,
  ) -> Result<Vec<FieldCandidate>, CoreError> {
    let document = self.fetcher.fetch(endpoint, headers)?;
    let candidates = discovery::discover(&document, kind);
    Ok(match filter {
      Some(text) => filter_candidates(candidates, text),
      None => candidates,
    })
  }

  /// A blank widget using the configured default refresh interval.
  pub fn new_widget(&self, name: &str, endpoint: &str, kind: DisplayKind) -> WidgetConfig {
    let mut w = WidgetConfig::new(name, endpoint, kind);
    w.refresh_interval_secs = self.options.default_refresh_secs;
    w
  }

  pub fn add_widget(&self, widget: WidgetConfig) -> Result<String, CoreError> {
    let id = widget.id.clone();
    let interval = widget.refresh_interval_secs;
    self.store.add(widget)?;
    self.scheduler.schedule(&id, interval, Instant::now());
    tracing::info!(widget_id = %id, interval, "widget added");
    Ok(id)
  }

  pub fn update_widget(&self, id: &str, widget: WidgetConfig) -> Result<(), CoreError> {
    let updated = self.store.update(id, widget)?;
    self
      .scheduler
      .schedule(id, updated.refresh_interval_secs, Instant::now());
    tracing::info!(widget_id = %id, "widget updated");
    Ok(())
  }

  pub fn remove_widget(&self, id: &str) -> Result<(), CoreError> {
    self.store.remove(id)?;
    self.scheduler.cancel(id);
    self.snapshots.lock().remove(id);
    tracing::info!(widget_id = %id, "widget removed");
    Ok(())
  }

  pub fn snapshot(&self, id: &str) -> Option<WidgetSnapshot> {
    self.snapshots.lock().get(id).cloned()
  }

  /// One fetch-then-resolve cycle for a widget.
  ///
  /// Fetch and binding failures do not fail the call: they are recorded in
  /// the snapshot, which keeps the last successfully rendered view.
  pub fn run_cycle(&self, id: &str) -> Result<WidgetSnapshot, CoreError> {
    let widget = self
      .store
      .get(id)
      .ok_or_else(|| CoreError::UnknownWidget(id.to_string()))?;

    let outcome = self
      .fetcher
      .fetch(&widget.endpoint, &widget.headers)
      .map_err(CoreError::from)
      .and_then(|document| render_widget(&widget, &document).map_err(CoreError::from));

    let mut snapshots = self.snapshots.lock();
    let previous = snapshots.get(id).and_then(|s| s.view.clone());
    let snapshot = match outcome {
      Ok(view) => WidgetSnapshot {
        widget_id: id.to_string(),
        updated_at_ms: now_ms(),
        view: Some(view),
        error: None,
      },
      Err(e) => {
        tracing::warn!(widget_id = %id, error = %e, "poll cycle failed");
        WidgetSnapshot {
          widget_id: id.to_string(),
          updated_at_ms: now_ms(),
          view: previous,
          error: Some(e.to_string()),
        }
      }
    };
    // The widget may have been removed while the fetch was in flight.
    if self.store.get(id).is_some() {
      snapshots.insert(id.to_string(), snapshot.clone());
    }
    Ok(snapshot)
  }

  /// Run every cycle due at `now`.
  pub fn tick(&self, now: Instant) -> Vec<WidgetSnapshot> {
    self
      .scheduler
      .due(now)
      .into_iter()
      .filter_map(|id| match self.run_cycle(&id) {
        Ok(s) => Some(s),
        Err(e) => {
          tracing::warn!(widget_id = %id, error = %e, "dropping schedule for missing widget");
          self.scheduler.cancel(&id);
          None
        }
      })
      .collect()
  }

  /// Drive `tick` from a background thread every `granularity` until stopped.
  pub fn spawn_poller(&self, granularity: Duration) -> PollerHandle {
    let token = CancelToken::new();
    let engine = self.clone();
    let stop = token.clone();
    let join = thread::spawn(move || {
      while !stop.is_cancelled() {
        engine.tick(Instant::now());
        thread::sleep(granularity);
      }
    });
    PollerHandle {
      token,
      join: Some(join),
    }
  }
}

/// Owns the background poller thread; dropping it signals the thread to stop.
pub struct PollerHandle {
  token: CancelToken,
  join: Option<thread::JoinHandle<()>>,
}

impl PollerHandle {
  pub fn token(&self) -> &CancelToken {
    &self.token
  }

  /// Signal the thread and wait for its current tick to finish.
  pub fn stop(mut self) {
    self.token.cancel();
    if let Some(join) = self.join.take() {
      let _ = join.join();
    }
  }
}

impl Drop for PollerHandle {
  fn drop(&mut self) {
    self.token.cancel();
  }
}
