// Portfolio generation: StructuredResume + template → html/css/js.
// All model calls go through llm_client. Failures degrade to a fixed document.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod templates;

pub use generator::{fallback_portfolio, GenerationOutcome, PortfolioGenerator};
