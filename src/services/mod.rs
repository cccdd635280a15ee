pub mod project_locks;
pub mod recorder;
pub mod sync_engine;
pub mod webhooks;

pub use project_locks::ProjectLocks;
pub use recorder::{FileRecorder, PayloadRecorder};
pub use sync_engine::{ItemSync, ReconcileSummary, SyncEngine, Transition};
pub use webhooks::{callback_url, WebhookManager};
