//! Resume Structurer: raw text → `StructuredResume`.
//!
//! Flow: build prompt → model call (bounded by the stage timeout) →
//!       extract JSON object → coerce into the resume schema.
//!
//! `try_structure` exposes the failure; `structure` absorbs it with the
//! heuristic parser and reports out of band that the fallback was used.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::{FailureKind, FailureReport};
use crate::llm_client::{extract_json_object, JsonExtractError, LlmError, TextGenerator};
use crate::models::document::ExtractedText;
use crate::models::resume::{ShapeError, StructuredResume};
use crate::structuring::heuristic::parse_resume;
use crate::structuring::prompts::{structuring_system, STRUCTURING_PROMPT_TEMPLATE};

#[derive(Debug, Error)]
pub enum StructuringFailure {
    #[error("generative model is not configured (missing API key)")]
    Configuration,

    #[error("model call failed: {0}")]
    Llm(LlmError),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("unparsable model output: {0}")]
    Unparsable(#[from] JsonExtractError),

    #[error("model output is not a resume: {0}")]
    Shape(#[from] ShapeError),
}

impl From<LlmError> for StructuringFailure {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingApiKey => StructuringFailure::Configuration,
            other => StructuringFailure::Llm(other),
        }
    }
}

impl StructuringFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            StructuringFailure::Configuration => FailureKind::ConfigurationError,
            _ => FailureKind::StructuringFailure,
        }
    }

    pub fn report(&self) -> FailureReport {
        FailureReport::new(self.kind(), self.to_string())
    }
}

/// Result of `structure`: always a resume, plus how it was obtained.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuringOutcome {
    pub resume: StructuredResume,
    pub used_fallback: bool,
    pub fallback_reason: Option<FailureReport>,
}

#[derive(Clone)]
pub struct ResumeStructurer {
    llm: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl ResumeStructurer {
    pub fn new(llm: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// One AI structuring attempt. No fallback.
    pub async fn try_structure(
        &self,
        text: &ExtractedText,
    ) -> Result<StructuredResume, StructuringFailure> {
        let prompt = STRUCTURING_PROMPT_TEMPLATE.replace("{resume_text}", &text.text);
        let system = structuring_system();

        let response = tokio::time::timeout(self.timeout, self.llm.generate(&prompt, &system))
            .await
            .map_err(|_| StructuringFailure::Timeout(self.timeout))??;

        let value = extract_json_object(&response)?;
        Ok(StructuredResume::from_model_output(value)?)
    }

    /// Never fails: falls back to the heuristic parser on any structuring failure.
    pub async fn structure(&self, text: &ExtractedText) -> StructuringOutcome {
        match self.try_structure(text).await {
            Ok(resume) => {
                info!(
                    "AI structuring succeeded: {} experience, {} education, {} projects",
                    resume.experience.len(),
                    resume.education.len(),
                    resume.projects.len()
                );
                StructuringOutcome {
                    resume,
                    used_fallback: false,
                    fallback_reason: None,
                }
            }
            Err(failure) => {
                warn!("AI structuring failed ({failure}), using heuristic parser");
                StructuringOutcome {
                    resume: parse_resume(&text.text),
                    used_fallback: true,
                    fallback_reason: Some(failure.report()),
                }
            }
        }
    }
}
