//! Portfolio Generator: `StructuredResume` + template → html/css/js.
//!
//! Flow: serialize resume → build prompt with template style guidance →
//!       model call (bounded by the stage timeout) → extract JSON object →
//!       validate `html` → make sure it is a full document.
//!
//! `generate` never fails. Any generation failure yields the fixed fallback
//! document and is reported out of band.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::{FailureKind, FailureReport};
use crate::generation::prompts::{generation_system, GENERATION_PROMPT_TEMPLATE};
use crate::generation::templates::style_for;
use crate::llm_client::{extract_json_object, JsonExtractError, LlmError, TextGenerator};
use crate::models::portfolio::GeneratedPortfolio;
use crate::models::resume::StructuredResume;

const FALLBACK_HTML: &str = "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"UTF-8\">
<title>My Portfolio</title>
</head>
<body>
<h1>Hello, World!</h1>
<p>Could not generate portfolio. This is fallback content.</p>
</body>
</html>";
const FALLBACK_CSS: &str = "body { font-family: sans-serif; text-align: center; color: #333; }";
const FALLBACK_JS: &str = "console.log(\"Portfolio generation failed.\");";

#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error("generative model is not configured (missing API key)")]
    Configuration,

    #[error("model call failed: {0}")]
    Llm(LlmError),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("unparsable model output: {0}")]
    Unparsable(#[from] JsonExtractError),

    #[error("model output has no usable \"html\" field")]
    MissingHtml,

    #[error("failed to serialize resume for the prompt: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<LlmError> for GenerationFailure {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingApiKey => GenerationFailure::Configuration,
            other => GenerationFailure::Llm(other),
        }
    }
}

impl GenerationFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationFailure::Configuration => FailureKind::ConfigurationError,
            _ => FailureKind::GenerationFailure,
        }
    }

    pub fn report(&self) -> FailureReport {
        FailureReport::new(self.kind(), self.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub portfolio: GeneratedPortfolio,
    pub used_fallback: bool,
    pub fallback_reason: Option<FailureReport>,
}

/// The fixed document returned whenever generation fails.
pub fn fallback_portfolio() -> GeneratedPortfolio {
    GeneratedPortfolio {
        html: FALLBACK_HTML.to_string(),
        css: FALLBACK_CSS.to_string(),
        js: FALLBACK_JS.to_string(),
    }
}

#[derive(Clone)]
pub struct PortfolioGenerator {
    llm: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl PortfolioGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// One AI generation attempt. No fallback.
    pub async fn try_generate(
        &self,
        resume: &StructuredResume,
        template_id: &str,
    ) -> Result<GeneratedPortfolio, GenerationFailure> {
        let (template_name, style_guidance) = style_for(template_id);
        let resume_json = serde_json::to_string_pretty(resume)?;

        let prompt = GENERATION_PROMPT_TEMPLATE
            .replace("{resume_json}", &resume_json)
            .replace("{template_name}", template_name)
            .replace("{style_guidance}", style_guidance);
        let system = generation_system();

        let response = tokio::time::timeout(self.timeout, self.llm.generate(&prompt, &system))
            .await
            .map_err(|_| GenerationFailure::Timeout(self.timeout))??;

        let value = extract_json_object(&response)?;
        portfolio_from_model_output(&value)
    }

    pub async fn generate(&self, resume: &StructuredResume, template_id: &str) -> GenerationOutcome {
        match self.try_generate(resume, template_id).await {
            Ok(portfolio) => {
                info!(
                    "Generated portfolio for template {template_id}: {} bytes html, {} bytes css, {} bytes js",
                    portfolio.html.len(),
                    portfolio.css.len(),
                    portfolio.js.len()
                );
                GenerationOutcome {
                    portfolio,
                    used_fallback: false,
                    fallback_reason: None,
                }
            }
            Err(failure) => {
                warn!("Portfolio generation failed ({failure}), using fallback document");
                GenerationOutcome {
                    portfolio: fallback_portfolio(),
                    used_fallback: true,
                    fallback_reason: Some(failure.report()),
                }
            }
        }
    }
}

/// `html` must be a non-empty string; `css` and `js` default to empty.
fn portfolio_from_model_output(value: &Value) -> Result<GeneratedPortfolio, GenerationFailure> {
    let html = value
        .get("html")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|html| !html.is_empty())
        .ok_or(GenerationFailure::MissingHtml)?;

    let text_field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(GeneratedPortfolio {
        html: ensure_full_document(html),
        css: text_field("css"),
        js: text_field("js"),
    })
}

/// Wraps a bare HTML fragment in a minimal HTML5 shell.
fn ensure_full_document(html: &str) -> String {
    if html.to_ascii_lowercase().contains("<html") {
        return html.to_string();
    }
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Portfolio</title>\n</head>\n<body>\n{html}\n</body>\n</html>"
    )
}
