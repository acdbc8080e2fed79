mod chart;
mod discovery;
mod engine;
mod fetch;
mod models;
mod path;
mod resolve;
mod search_match;
mod storage;
mod store;
#[cfg(test)]
mod strategies;
mod table;
mod tasks;
mod view;

pub use crate::chart::{coerce_number, project, project_fields, BindingError};
pub use crate::discovery::{
  dedupe_candidates, discover, extract_candidates, flatten, OBJECT_PLACEHOLDER,
};
pub use crate::engine::{CoreError, DashboardEngine, EngineOptions, PollerHandle};
#[cfg(feature = "http")]
pub use crate::fetch::HttpFetcher;
pub use crate::fetch::{FetchError, Fetcher};
pub use crate::models::{
  Axis, BoundField, CardEntry, ChartPoint, ChartStyle, DisplayKind, FieldCandidate, FieldRole,
  FieldValue, PathSegment, TableColumn, TableData, TableSpec, WidgetConfig, WidgetSnapshot,
  WidgetView,
};
pub use crate::path::{FieldPath, PathError, PathGrammar, ROOT_ARRAY_SEGMENT, SEPARATOR};
pub use crate::resolve::{resolve, resolve_str, Resolved};
pub use crate::search_match::{filter_candidates, FieldFilter};
pub use crate::storage::{Storage, StorageOptions};
pub use crate::store::{validate_widget, WidgetStore};
pub use crate::table::{group, resolve_tables};
pub use crate::tasks::{clamp_interval, CancelToken, PollScheduler, MAX_REFRESH_SECS, MIN_REFRESH_SECS};
pub use crate::view::{format_value, render_widget, resolve_card, NO_VALUE};
