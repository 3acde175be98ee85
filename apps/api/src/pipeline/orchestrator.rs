//! Pipeline Orchestrator: one resume → portfolio run per session.
//!
//! Flow: upload → parsing (extract) → structuring → structured
//!       → [template chosen] → generating → complete.
//!
//! Each run executes on a spawned task. Every stage result is written back
//! through `commit`, which drops it when the session has moved on to a newer
//! run. A new upload, reset or discard also aborts the in-flight task.
//!
//! Sessions idle for longer than the session TTL are evicted by a background
//! sweeper (`spawn_session_sweeper`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::editor::{apply_edit, download_filename, standalone_document};
use crate::errors::{AppError, FailureReport};
use crate::extraction::{validate_document, TextExtractor};
use crate::generation::templates::template_by_id;
use crate::generation::PortfolioGenerator;
use crate::models::document::RawDocument;
use crate::models::portfolio::{GeneratedPortfolio, PortfolioEdit};
use crate::models::resume::StructuredResume;
use crate::pipeline::run::{PipelineRun, RunId};
use crate::pipeline::stage::Stage;
use crate::structuring::ResumeStructurer;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub run: PipelineRun,
}

/// A rendered standalone document ready to be served.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub file_name: String,
    pub html: String,
}

/// Upper bound on how often idle sessions are looked for.
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

struct SessionSlot {
    run: PipelineRun,
    task: Option<AbortHandle>,
    last_active: Instant,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            run: PipelineRun::default(),
            task: None,
            last_active: Instant::now(),
        }
    }

    fn mark_active(&mut self) {
        self.last_active = Instant::now();
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub struct Orchestrator {
    sessions: RwLock<HashMap<Uuid, SessionSlot>>,
    extractor: TextExtractor,
    structurer: ResumeStructurer,
    generator: PortfolioGenerator,
}

impl Orchestrator {
    pub fn new(
        extractor: TextExtractor,
        structurer: ResumeStructurer,
        generator: PortfolioGenerator,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            extractor,
            structurer,
            generator,
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ────────────────────────────────────────────────────────────────────────

    pub async fn create_session(&self) -> SessionSnapshot {
        let session_id = Uuid::new_v4();
        let slot = SessionSlot::new();
        let snapshot = SessionSnapshot {
            session_id,
            run: slot.run.clone(),
        };
        self.sessions.write().await.insert(session_id, slot);
        info!("Created session {session_id}");
        snapshot
    }

    pub async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot, AppError> {
        let sessions = self.sessions.read().await;
        let slot = sessions.get(&session_id).ok_or_else(|| not_found(session_id))?;
        Ok(SessionSnapshot {
            session_id,
            run: slot.run.clone(),
        })
    }

    pub async fn reset(&self, session_id: Uuid) -> Result<SessionSnapshot, AppError> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&session_id)
            .ok_or_else(|| not_found(session_id))?;
        if slot.run.stage.is_busy() {
            info!("Session {session_id}: aborting run {} on reset", slot.run.run_id);
        }
        slot.abort_task();
        slot.run.reset();
        slot.mark_active();
        Ok(SessionSnapshot {
            session_id,
            run: slot.run.clone(),
        })
    }

    pub async fn discard(&self, session_id: Uuid) -> Result<(), AppError> {
        let mut slot = self
            .sessions
            .write()
            .await
            .remove(&session_id)
            .ok_or_else(|| not_found(session_id))?;
        slot.abort_task();
        info!("Discarded session {session_id}");
        Ok(())
    }

    /// Removes sessions with no activity for at least `ttl`, aborting any
    /// task they still own. Returns how many were evicted.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|session_id, slot| {
            if slot.last_active.elapsed() < ttl {
                return true;
            }
            slot.abort_task();
            debug!("Evicting session {session_id} ({:?})", slot.run.stage);
            false
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle sessions, {} remain", sessions.len());
        }
        evicted
    }

    /// Runs `evict_idle` periodically for the life of the process.
    pub fn spawn_session_sweeper(self: &Arc<Self>, ttl: Duration) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let period = ttl.min(MAX_SWEEP_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                this.evict_idle(ttl).await;
            }
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Pipeline
    // ────────────────────────────────────────────────────────────────────────

    /// Starts a new run for `document`, superseding any run in flight.
    ///
    /// Documents that are empty or not PDFs are rejected up front and leave
    /// the session untouched.
    pub async fn start_upload(
        self: &Arc<Self>,
        session_id: Uuid,
        document: RawDocument,
    ) -> Result<SessionSnapshot, AppError> {
        validate_document(&document)?;

        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&session_id)
            .ok_or_else(|| not_found(session_id))?;

        slot.abort_task();
        slot.mark_active();
        let run_id = slot.run.begin(document.file_name.clone());
        info!(
            "Session {session_id} run {run_id}: parsing {:?} ({} bytes)",
            document.file_name,
            document.byte_size()
        );

        // The task blocks on the session lock until this guard is released.
        let this = Arc::clone(self);
        let task = tokio::spawn(async move { this.run_pipeline(session_id, run_id, document).await });
        slot.task = Some(task.abort_handle());

        Ok(SessionSnapshot {
            session_id,
            run: slot.run.clone(),
        })
    }

    /// Records the template, or starts generation when the run is holding
    /// at `Structured`.
    pub async fn select_template(
        self: &Arc<Self>,
        session_id: Uuid,
        template_id: &str,
    ) -> Result<SessionSnapshot, AppError> {
        if template_by_id(template_id).is_none() {
            return Err(AppError::Validation(format!(
                "Unknown template {template_id}"
            )));
        }

        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&session_id)
            .ok_or_else(|| not_found(session_id))?;
        let stage = slot.run.stage;
        slot.mark_active();

        if stage.accepts_early_template() {
            slot.run.template_id = Some(template_id.to_string());
            slot.run.touch();
            debug!("Session {session_id}: recorded template {template_id} while {stage:?}");
        } else if stage == Stage::Structured {
            let resume = slot
                .run
                .resume
                .clone()
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("structured run without resume")))?;
            let run_id = slot.run.run_id;
            slot.run.start_generation(template_id.to_string());

            let this = Arc::clone(self);
            let template_id = template_id.to_string();
            let task = tokio::spawn(async move {
                this.run_generation(session_id, run_id, resume, template_id).await
            });
            slot.task = Some(task.abort_handle());
        } else {
            return Err(AppError::Conflict(format!(
                "Cannot select a template while the session is {stage:?}; reset first"
            )));
        }

        Ok(SessionSnapshot {
            session_id,
            run: slot.run.clone(),
        })
    }

    async fn run_pipeline(self: Arc<Self>, session_id: Uuid, run_id: RunId, document: RawDocument) {
        let extracted = match self.extractor.extract_for_structuring(&document).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Session {session_id} run {run_id}: extraction failed: {e}");
                let report = FailureReport::from(&e);
                self.commit(session_id, run_id, |run| run.fail(report)).await;
                return;
            }
        };
        drop(document);

        if self
            .commit(session_id, run_id, |run| run.text_ready(&extracted))
            .await
            .is_none()
        {
            return;
        }

        let outcome = self.structurer.structure(&extracted).await;
        let resume = outcome.resume.clone();
        let template_id = match self
            .commit(session_id, run_id, |run| run.structured(outcome))
            .await
        {
            Some(Some(template_id)) => template_id,
            // Stale, or holding for a template.
            _ => return,
        };

        self.run_generation(session_id, run_id, resume, template_id)
            .await;
    }

    async fn run_generation(
        &self,
        session_id: Uuid,
        run_id: RunId,
        resume: StructuredResume,
        template_id: String,
    ) {
        let outcome = self.generator.generate(&resume, &template_id).await;
        self.commit(session_id, run_id, |run| run.generated(outcome))
            .await;
    }

    /// Applies `update` only if `run_id` is still the session's current run.
    async fn commit<R>(
        &self,
        session_id: Uuid,
        run_id: RunId,
        update: impl FnOnce(&mut PipelineRun) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session_id) {
            Some(slot) if slot.run.run_id == run_id => {
                slot.mark_active();
                Some(update(&mut slot.run))
            }
            Some(slot) => {
                debug!(
                    "Session {session_id}: dropping result of stale run {run_id} (current {})",
                    slot.run.run_id
                );
                None
            }
            None => {
                debug!("Session {session_id} discarded; dropping result of run {run_id}");
                None
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Editor
    // ────────────────────────────────────────────────────────────────────────

    pub async fn edit_portfolio(
        &self,
        session_id: Uuid,
        edit: PortfolioEdit,
    ) -> Result<SessionSnapshot, AppError> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&session_id)
            .ok_or_else(|| not_found(session_id))?;
        let portfolio = completed_portfolio_mut(&mut slot.run)?;

        if !apply_edit(portfolio, edit) {
            return Err(AppError::Validation(
                "Provide at least one of html, css or js".to_string(),
            ));
        }
        slot.run.edited = true;
        slot.run.touch();
        slot.mark_active();

        Ok(SessionSnapshot {
            session_id,
            run: slot.run.clone(),
        })
    }

    pub async fn preview(&self, session_id: Uuid) -> Result<String, AppError> {
        let sessions = self.sessions.read().await;
        let slot = sessions.get(&session_id).ok_or_else(|| not_found(session_id))?;
        Ok(standalone_document(completed_portfolio(&slot.run)?))
    }

    /// Renders the download and records when it happened.
    pub async fn download(&self, session_id: Uuid) -> Result<RenderedDocument, AppError> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&session_id)
            .ok_or_else(|| not_found(session_id))?;

        let html = standalone_document(completed_portfolio(&slot.run)?);
        let file_name = download_filename(
            slot.run
                .resume
                .as_ref()
                .and_then(StructuredResume::display_name),
        );
        slot.run.downloaded_at = Some(Utc::now());
        slot.mark_active();
        info!("Session {session_id}: downloading {file_name}");

        Ok(RenderedDocument { file_name, html })
    }
}

fn not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {session_id} not found"))
}

fn completed_portfolio(run: &PipelineRun) -> Result<&GeneratedPortfolio, AppError> {
    match (&run.stage, &run.portfolio) {
        (Stage::Complete, Some(portfolio)) => Ok(portfolio),
        (stage, _) => Err(not_complete(*stage)),
    }
}

fn completed_portfolio_mut(run: &mut PipelineRun) -> Result<&mut GeneratedPortfolio, AppError> {
    match (run.stage, run.portfolio.as_mut()) {
        (Stage::Complete, Some(portfolio)) => Ok(portfolio),
        (stage, _) => Err(not_complete(stage)),
    }
}

fn not_complete(stage: Stage) -> AppError {
    AppError::Conflict(format!(
        "Portfolio is not ready yet (session is {stage:?})"
    ))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::errors::FailureKind;
    use crate::extraction::testing::{extractor_returning, pdf};
    use crate::llm_client::testing::ScriptedGenerator;
    use crate::llm_client::TextGenerator;

    const RESUME_TEXT: &str = "Jane Doe\njane@x.com\nSoftware Engineer at Acme 2022\n\
                               Skills: Rust, Python, Leadership";
    const PORTFOLIO_REPLY: &str = r#"{"html": "<html><head></head><body><h1>Jane</h1></body></html>",
                                     "css": "h1 { color: teal; }", "js": "init();"}"#;

    fn orchestrator(text: &str, llm: Arc<dyn TextGenerator>) -> Arc<Orchestrator> {
        let timeout = Duration::from_secs(5);
        Arc::new(Orchestrator::new(
            extractor_returning(text),
            ResumeStructurer::new(llm.clone(), timeout),
            PortfolioGenerator::new(llm, timeout),
        ))
    }

    /// Structuring gets no JSON and falls back; generation gets the portfolio.
    fn llm() -> Arc<ScriptedGenerator> {
        Arc::new(ScriptedGenerator::from_script(vec![
            Ok("not json".to_string()),
            Ok(PORTFOLIO_REPLY.to_string()),
        ]))
    }

    async fn wait_for(orch: &Orchestrator, id: Uuid, stage: Stage) -> SessionSnapshot {
        for _ in 0..200 {
            let snapshot = orch.snapshot(id).await.unwrap();
            if snapshot.run.stage == stage {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session never reached {stage:?}");
    }

    #[tokio::test]
    async fn test_short_text_errors_without_structuring() {
        let llm = llm();
        let orch = orchestrator("Hi", llm.clone());
        let id = orch.create_session().await.session_id;

        orch.start_upload(id, pdf(b"%PDF-1.4 tiny")).await.unwrap();
        let snapshot = wait_for(&orch, id, Stage::Error).await;

        let error = snapshot.run.error.unwrap();
        assert_eq!(error.kind, FailureKind::ExtractionFailure);
        assert!(snapshot.run.resume.is_none());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_run_holds_at_structured_until_template_selected() {
        let llm = llm();
        let orch = orchestrator(RESUME_TEXT, llm.clone());
        let id = orch.create_session().await.session_id;

        orch.start_upload(id, pdf(b"%PDF-1.4 resume")).await.unwrap();
        let held = wait_for(&orch, id, Stage::Structured).await;
        assert_eq!(held.run.progress, 66);
        assert!(held.run.used_structuring_fallback);
        assert_eq!(
            held.run.resume.unwrap().personal_info.email,
            "jane@x.com"
        );

        let generating = orch.select_template(id, "modern-developer").await.unwrap();
        assert_eq!(generating.run.stage, Stage::Generating);

        let done = wait_for(&orch, id, Stage::Complete).await;
        assert_eq!(done.run.progress, 100);
        assert_eq!(done.run.template_id.as_deref(), Some("modern-developer"));
        assert!(!done.run.used_generation_fallback);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_template_chosen_early_generates_automatically() {
        let orch = orchestrator(RESUME_TEXT, llm());
        let id = orch.create_session().await.session_id;

        orch.select_template(id, "creative-designer").await.unwrap();
        orch.start_upload(id, pdf(b"%PDF-1.4 resume")).await.unwrap();

        let done = wait_for(&orch, id, Stage::Complete).await;
        assert!(done.run.portfolio.unwrap().html.contains("<h1>Jane</h1>"));
        assert_eq!(done.run.template_id.as_deref(), Some("creative-designer"));
    }

    #[tokio::test]
    async fn test_stale_run_never_overwrites_newer_run() {
        let slow = Arc::new(
            ScriptedGenerator::replying(r#"{"personalInfo": {"name": "Jane Model"}}"#)
                .with_delay(Duration::from_millis(200)),
        );
        let orch = orchestrator(RESUME_TEXT, slow);
        let id = orch.create_session().await.session_id;

        let first = orch.start_upload(id, pdf(b"%PDF-1.4 first")).await.unwrap();
        wait_for(&orch, id, Stage::Structuring).await;

        // Write a result for the first run after a second upload supersedes it.
        let second = orch.start_upload(id, pdf(b"%PDF-1.4 second")).await.unwrap();
        assert!(second.run.run_id > first.run.run_id);
        let late = FailureReport::new(FailureKind::ExtractionFailure, "late failure");
        let stale = orch
            .commit(id, first.run.run_id, |run| run.fail(late))
            .await;
        assert!(stale.is_none());

        let held = wait_for(&orch, id, Stage::Structured).await;
        assert_eq!(held.run.run_id, second.run.run_id);
        assert!(held.run.error.is_none());
        assert_eq!(held.run.resume.unwrap().personal_info.name, "Jane Model");
    }

    #[tokio::test]
    async fn test_reset_cancels_in_flight_structuring() {
        let slow = Arc::new(
            ScriptedGenerator::replying(r#"{"personalInfo": {"name": "Jane Model"}}"#)
                .with_delay(Duration::from_millis(200)),
        );
        let orch = orchestrator(RESUME_TEXT, slow.clone());
        let id = orch.create_session().await.session_id;

        orch.start_upload(id, pdf(b"%PDF-1.4 resume")).await.unwrap();
        wait_for(&orch, id, Stage::Structuring).await;
        orch.reset(id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = orch.snapshot(id).await.unwrap();
        assert_eq!(snapshot.run.stage, Stage::Idle);
        assert!(snapshot.run.resume.is_none());
        assert_eq!(slow.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_evicted_after_ttl() {
        let orch = orchestrator(RESUME_TEXT, llm());
        let ttl = Duration::from_secs(30 * 60);
        orch.spawn_session_sweeper(ttl);

        let idle = orch.create_session().await.session_id;
        tokio::time::sleep(ttl / 2).await;
        let active = orch.create_session().await.session_id;
        tokio::time::sleep(ttl / 2 + Duration::from_secs(90)).await;

        assert!(matches!(orch.snapshot(idle).await, Err(AppError::NotFound(_))));
        assert!(orch.snapshot(active).await.is_ok());

        orch.select_template(active, "modern-developer").await.unwrap();
        tokio::time::sleep(ttl / 2).await;
        assert!(orch.snapshot(active).await.is_ok());

        tokio::time::sleep(ttl).await;
        assert!(matches!(orch.snapshot(active).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_idle_keeps_recent_sessions() {
        let orch = orchestrator(RESUME_TEXT, llm());
        let ttl = Duration::from_secs(60);
        for _ in 0..3 {
            orch.create_session().await;
        }
        assert_eq!(orch.evict_idle(ttl).await, 0);

        tokio::time::advance(ttl).await;
        let fresh = orch.create_session().await.session_id;
        assert_eq!(orch.evict_idle(ttl).await, 3);
        assert!(orch.snapshot(fresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_non_pdf_upload_is_rejected_and_session_untouched() {
        let orch = orchestrator(RESUME_TEXT, llm());
        let id = orch.create_session().await.session_id;
        let doc = RawDocument::new(bytes::Bytes::from_static(b"hello"), "text/plain", None);

        let result = orch.start_upload(id, doc).await;
        assert!(matches!(result, Err(AppError::Extraction(_))));
        assert_eq!(orch.snapshot(id).await.unwrap().run.stage, Stage::Idle);
    }

    #[tokio::test]
    async fn test_editing_before_complete_is_a_conflict() {
        let orch = orchestrator(RESUME_TEXT, llm());
        let id = orch.create_session().await.session_id;
        let edit = PortfolioEdit {
            css: Some("body {}".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            orch.edit_portfolio(id, edit).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(orch.preview(id).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_edit_preview_and_download_after_complete() {
        let orch = orchestrator(RESUME_TEXT, llm());
        let id = orch.create_session().await.session_id;
        orch.select_template(id, "modern-developer").await.unwrap();
        orch.start_upload(id, pdf(b"%PDF-1.4 resume")).await.unwrap();
        wait_for(&orch, id, Stage::Complete).await;

        let edited = orch
            .edit_portfolio(
                id,
                PortfolioEdit {
                    css: Some("h1 { color: navy; }".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(edited.run.edited);

        let preview = orch.preview(id).await.unwrap();
        assert!(preview.contains("<style>\nh1 { color: navy; }\n</style>"));
        assert!(preview.contains("<script>\ninit();\n</script>"));

        let download = orch.download(id).await.unwrap();
        assert_eq!(download.file_name, "jane-doe.html");
        assert_eq!(download.html, preview);
        assert!(orch.snapshot(id).await.unwrap().run.downloaded_at.is_some());
    }

    #[tokio::test]
    async fn test_download_name_is_ascii_for_accented_names() {
        let llm = Arc::new(ScriptedGenerator::from_script(vec![
            Ok(r#"{"personalInfo": {"name": "José O'Brien"}}"#.to_string()),
            Ok(PORTFOLIO_REPLY.to_string()),
        ]));
        let orch = orchestrator(RESUME_TEXT, llm);
        let id = orch.create_session().await.session_id;
        orch.select_template(id, "minimalist-writer").await.unwrap();
        orch.start_upload(id, pdf(b"%PDF-1.4 resume")).await.unwrap();
        wait_for(&orch, id, Stage::Complete).await;

        let download = orch.download(id).await.unwrap();
        assert_eq!(download.file_name, "jos-o-brien.html");
        assert!(download.file_name.is_ascii());
    }

    #[tokio::test]
    async fn test_selecting_unknown_template_is_rejected() {
        let orch = orchestrator(RESUME_TEXT, llm());
        let id = orch.create_session().await.session_id;
        assert!(matches!(
            orch.select_template(id, "retro-terminal").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_and_discard() {
        let orch = orchestrator(RESUME_TEXT, llm());
        let id = orch.create_session().await.session_id;
        orch.start_upload(id, pdf(b"%PDF-1.4 resume")).await.unwrap();

        let reset = orch.reset(id).await.unwrap();
        assert_eq!(reset.run.stage, Stage::Idle);
        assert_eq!(reset.run.progress, 0);

        orch.discard(id).await.unwrap();
        assert!(matches!(orch.snapshot(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(orch.discard(id).await, Err(AppError::NotFound(_))));
    }
}
