//! Catalog synchronization
//!
//! The engine is invoked by an external trigger (the service binary's
//! interval scheduler, or anything else); it never schedules itself. Each
//! run reads its scope from the preferences store, fans out per-category
//! fetches against the provider, reconciles the results into the local
//! store, and publishes a monotonic progress signal.

pub mod engine;
pub mod guide;
pub mod login;
pub mod progress;

pub use engine::SyncEngine;
pub use guide::GuideSync;
pub use login::{LoginOutcome, LoginService};
pub use progress::{SyncFailure, SyncProgress, SyncStatus};
