// Resume structuring: raw resume text → StructuredResume.
// AI first, heuristic parser on any failure. All model calls go through llm_client.

pub mod handlers;
pub mod heuristic;
pub mod prompts;
pub mod structurer;

pub use structurer::{ResumeStructurer, StructuringOutcome};
