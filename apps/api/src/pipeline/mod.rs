// Session pipeline: upload → extract → structure → [template] → generate → edit.
// One run per session on a spawned task; stale results are dropped by run id.

pub mod handlers;
pub mod orchestrator;
pub mod run;
pub mod stage;

pub use orchestrator::{Orchestrator, SessionSnapshot};
