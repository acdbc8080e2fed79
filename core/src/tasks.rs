use std::{
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
  time::{Duration, Instant},
};

use parking_lot::Mutex;

pub const MIN_REFRESH_SECS: u32 = 1;
pub const MAX_REFRESH_SECS: u32 = 3600;

/// Shared cancellation flag handed out per scheduled widget (and per poller).
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}

#[derive(Debug)]
struct PollEntry {
  widget_id: String,
  interval: Duration,
  next_due: Instant,
  token: CancelToken,
}

/// Per-widget periodic timers, evaluated against caller-supplied instants.
///
/// Nothing here sleeps: `due(now)` reports which widgets should run a cycle,
/// so tests can step time explicitly.
#[derive(Clone, Default)]
pub struct PollScheduler {
  entries: Arc<Mutex<Vec<PollEntry>>>,
}

impl PollScheduler {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start (or restart) the timer for `widget_id`. The first cycle is due at `now`.
  pub fn schedule(&self, widget_id: &str, interval_secs: u32, now: Instant) -> CancelToken {
    let token = CancelToken::new();
    let entry = PollEntry {
      widget_id: widget_id.to_string(),
      interval: clamp_interval(interval_secs),
      next_due: now,
      token: token.clone(),
    };
    let mut entries = self.entries.lock();
    if let Some(existing) = entries.iter_mut().find(|e| e.widget_id == widget_id) {
      existing.token.cancel();
      *existing = entry;
    } else {
      entries.push(entry);
    }
    token
  }

  pub fn cancel(&self, widget_id: &str) -> bool {
    let mut entries = self.entries.lock();
    let Some(pos) = entries.iter().position(|e| e.widget_id == widget_id) else {
      return false;
    };
    entries.remove(pos).token.cancel();
    true
  }

  pub fn cancel_all(&self) {
    for e in self.entries.lock().drain(..) {
      e.token.cancel();
    }
  }

  pub fn is_scheduled(&self, widget_id: &str) -> bool {
    self
      .entries
      .lock()
      .iter()
      .any(|e| e.widget_id == widget_id && !e.token.is_cancelled())
  }

  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Widgets due at `now`, in scheduling order.
  ///
  /// Each returned entry moves to its next period boundary after `now`, so a
  /// caller that fell several periods behind runs the widget once.
  pub fn due(&self, now: Instant) -> Vec<String> {
    let mut entries = self.entries.lock();
    entries.retain(|e| !e.token.is_cancelled());

    let mut out = Vec::new();
    for e in entries.iter_mut() {
      if e.next_due > now {
        continue;
      }
      out.push(e.widget_id.clone());
      let interval_ns = e.interval.as_nanos();
      let behind_ns = now.duration_since(e.next_due).as_nanos();
      let until_next = interval_ns - behind_ns % interval_ns;
      e.next_due = now + Duration::from_nanos(until_next as u64);
    }
    out
  }

  pub fn next_deadline(&self) -> Option<Instant> {
    self
      .entries
      .lock()
      .iter()
      .filter(|e| !e.token.is_cancelled())
      .map(|e| e.next_due)
      .min()
  }
}

pub fn clamp_interval(secs: u32) -> Duration {
  Duration::from_secs(u64::from(secs.clamp(MIN_REFRESH_SECS, MAX_REFRESH_SECS)))
}
