//! Per-session pipeline record and its transitions.
//!
//! Transitions are plain methods; the orchestrator calls them under the
//! session lock after checking that the result belongs to the current run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::errors::FailureReport;
use crate::generation::GenerationOutcome;
use crate::models::document::{ExtractedText, TextSource};
use crate::models::portfolio::GeneratedPortfolio;
use crate::models::resume::StructuredResume;
use crate::pipeline::stage::Stage;
use crate::structuring::StructuringOutcome;

/// Run ids start at 1 on the first upload; 0 means no run has started.
pub type RunId = u64;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub run_id: RunId,
    pub stage: Stage,
    pub progress: u8,
    pub template_id: Option<String>,
    pub file_name: Option<String>,
    pub text_source: Option<TextSource>,
    pub text_chars: Option<usize>,
    pub resume: Option<StructuredResume>,
    pub portfolio: Option<GeneratedPortfolio>,
    pub used_structuring_fallback: bool,
    pub used_generation_fallback: bool,
    /// Non-blocking failures absorbed by a fallback.
    pub warnings: Vec<FailureReport>,
    /// Blocking failure; set only in `Stage::Error`.
    pub error: Option<FailureReport>,
    pub edited: bool,
    pub downloaded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self {
            run_id: 0,
            stage: Stage::Idle,
            progress: 0,
            template_id: None,
            file_name: None,
            text_source: None,
            text_chars: None,
            resume: None,
            portfolio: None,
            used_structuring_fallback: false,
            used_generation_fallback: false,
            warnings: Vec::new(),
            error: None,
            edited: false,
            downloaded_at: None,
            updated_at: Utc::now(),
        }
    }
}

impl PipelineRun {
    /// Back to idle. The run id moves on so late results of the old run are dropped.
    pub fn reset(&mut self) {
        let next_id = self.run_id + 1;
        *self = PipelineRun {
            run_id: next_id,
            ..Default::default()
        };
    }

    /// Starts a new run for an upload. A template already chosen is kept.
    pub fn begin(&mut self, file_name: Option<String>) -> RunId {
        let template_id = self.template_id.take();
        self.reset();
        self.template_id = template_id;
        self.file_name = file_name;
        self.enter(Stage::Parsing);
        self.run_id
    }

    pub fn text_ready(&mut self, text: &ExtractedText) {
        self.text_source = Some(text.source);
        self.text_chars = Some(text.char_len());
        self.enter(Stage::Structuring);
    }

    /// Stores the resume. Returns the template to generate with, if one
    /// was already chosen; otherwise the run holds at `Structured`.
    pub fn structured(&mut self, outcome: StructuringOutcome) -> Option<String> {
        self.resume = Some(outcome.resume);
        self.used_structuring_fallback = outcome.used_fallback;
        self.warnings.extend(outcome.fallback_reason);
        self.enter(Stage::Structured);

        let template_id = self.template_id.clone()?;
        self.enter(Stage::Generating);
        Some(template_id)
    }

    /// Template chosen while holding at `Structured`.
    pub fn start_generation(&mut self, template_id: String) {
        self.template_id = Some(template_id);
        self.enter(Stage::Generating);
    }

    pub fn generated(&mut self, outcome: GenerationOutcome) {
        self.portfolio = Some(outcome.portfolio);
        self.used_generation_fallback = outcome.used_fallback;
        self.warnings.extend(outcome.fallback_reason);
        self.enter(Stage::Complete);
    }

    pub fn fail(&mut self, report: FailureReport) {
        self.error = Some(report);
        self.enter(Stage::Error);
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn enter(&mut self, stage: Stage) {
        info!("Run {} stage {:?} → {:?}", self.run_id, self.stage, stage);
        self.stage = stage;
        if let Some(progress) = stage.progress() {
            // Idle is the only way down, and only through reset().
            self.progress = self.progress.max(progress);
        }
        self.touch();
    }
}
