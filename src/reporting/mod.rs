pub mod models;
pub mod service;
pub mod store;

pub use models::{ChatMessageRecord, ChatThreadRecord, WeeklySummary};
pub use service::{ReportingError, ReportingService, DEFAULT_WEEKS_BACK};
pub use store::{FileThreadStore, StoreError, ThreadStore};
