//! Field extraction — turns a transcribed utterance into a structured
//! profile update via the external text-generation oracle.
//!
//! The extractor is a pure request/response call: no retained state, no
//! caching, one outbound oracle request per utterance. Every failure path
//! (missing credentials, malformed reply, upstream error, timeout) converges
//! to the no-update default so the interview can stall but never break.

pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{InterviewQuestion, StepKey};
use crate::config::IntakeConfig;
use crate::error::ExtractError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Validated result of one extraction call.
///
/// Invariant: `update_needed` implies both `field` and a non-empty `value`
/// are present; anything else was already downgraded to no-update during
/// parsing. `field` is advisory — the session confirms it matches the step
/// that was asked before committing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub update_needed: bool,
    pub field: Option<StepKey>,
    pub value: Option<String>,
}

impl ExtractionResult {
    /// The safe default every failure path returns.
    pub fn no_update() -> Self {
        Self {
            update_needed: false,
            field: None,
            value: None,
        }
    }
}

/// Extracts structured profile fields from free-form utterances.
pub struct FieldExtractor {
    /// `None` when no oracle credentials were configured; every call then
    /// degrades to no-update and the interview never advances automatically.
    llm: Option<Arc<dyn LlmProvider>>,
    oracle_timeout: Duration,
    max_tokens: u64,
}

impl FieldExtractor {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, config: &IntakeConfig) -> Self {
        Self {
            llm,
            oracle_timeout: config.oracle_timeout,
            max_tokens: config.extraction_max_tokens,
        }
    }

    /// Whether an oracle is configured at all.
    pub fn has_oracle(&self) -> bool {
        self.llm.is_some()
    }

    /// Analyze `utterance` against the step that was asked, using the
    /// catalog's question text as prompt context.
    ///
    /// Empty-after-trim utterances short-circuit without an oracle call.
    /// Never returns an error: failures are logged and collapsed into
    /// `ExtractionResult::no_update()`.
    pub async fn extract(
        &self,
        utterance: &str,
        question: &InterviewQuestion,
    ) -> ExtractionResult {
        self.extract_with_context(utterance, question, question.question)
            .await
    }

    /// Like [`extract`](Self::extract), but with the question phrased as the
    /// caller actually asked it (the HTTP endpoint forwards client wording).
    pub async fn extract_with_context(
        &self,
        utterance: &str,
        question: &InterviewQuestion,
        asked: &str,
    ) -> ExtractionResult {
        if utterance.trim().is_empty() {
            tracing::debug!(step = %question.key, "skipping empty utterance");
            return ExtractionResult::no_update();
        }

        match self.extract_inner(utterance, question, asked).await {
            Ok(result) => result,
            Err(ExtractError::MissingCredentials) => {
                tracing::debug!(step = %question.key, "no oracle configured, skipping extraction");
                ExtractionResult::no_update()
            }
            Err(ExtractError::InvalidResponse { reason, raw }) => {
                tracing::warn!(step = %question.key, %reason, %raw, "unusable oracle response");
                ExtractionResult::no_update()
            }
            Err(e) => {
                tracing::warn!(step = %question.key, error = %e, "extraction failed");
                ExtractionResult::no_update()
            }
        }
    }

    async fn extract_inner(
        &self,
        utterance: &str,
        question: &InterviewQuestion,
        asked: &str,
    ) -> Result<ExtractionResult, ExtractError> {
        let llm = self.llm.as_ref().ok_or(ExtractError::MissingCredentials)?;

        let request = CompletionRequest::new(vec![
            ChatMessage::system(
                "You are a data extraction assistant. Output only valid JSON.",
            ),
            ChatMessage::user(prompts::build_prompt(question, asked, utterance)),
        ])
        .with_max_tokens(self.max_tokens)
        .with_temperature(0.0);

        let response = tokio::time::timeout(self.oracle_timeout, llm.complete(request))
            .await
            .map_err(|_| ExtractError::Timeout(self.oracle_timeout))??;

        prompts::parse_extraction(&response.content)
    }
}
