//! Extraction prompt assembly and oracle-response parsing.
//!
//! Each catalog step owns a task template built from its data record (field
//! key + value-domain hint) rather than a per-step branch, so adding or
//! reordering steps never touches this module.

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::InterviewQuestion;
use crate::error::ExtractError;
use crate::extractor::ExtractionResult;

/// The task instruction for one step: what to look for and the mandated
/// output shape.
pub fn task_prompt(question: &InterviewQuestion) -> String {
    format!(
        "Analyze the following user message. Does it clearly state {hint}? \
         If yes, extract the value. Respond ONLY with JSON in the format: \
         {{\"updateNeeded\": boolean, \"profileField\": \"{field}\", \
         \"extractedValue\": string | null}}. \
         If it is not clearly stated, respond with {{\"updateNeeded\": false}}.",
        hint = question.hint,
        field = question.key.token(),
    )
}

/// The full prompt sent to the oracle: task instruction, the question that
/// was actually asked as context, and the utterance under analysis.
///
/// `asked` is the question text as the caller phrased it; the HTTP endpoint
/// lets clients pass their own wording, sessions pass the catalog text.
pub fn build_prompt(question: &InterviewQuestion, asked: &str, utterance: &str) -> String {
    format!(
        "{task}\n\n\
         The user was just asked: \"{asked}\"\n\
         User Message: \"{utterance}\"\n\n\
         Respond strictly with the JSON structure specified in the initial instruction.",
        task = task_prompt(question),
        asked = asked,
        utterance = utterance,
    )
}

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\n?").expect("static regex"));

/// Strip markdown code fencing some models wrap around JSON output.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Parse and validate a raw oracle reply against the extraction contract.
///
/// The reply must be a JSON object with a boolean `updateNeeded`. A result
/// claiming an update without a usable field and non-empty value is
/// downgraded to no-update; the advisory `profileField` is carried through
/// for the caller's step-match check, never enforced here.
pub fn parse_extraction(raw: &str) -> Result<ExtractionResult, ExtractError> {
    let cleaned = strip_code_fences(raw);

    let value: serde_json::Value =
        serde_json::from_str(&cleaned).map_err(|e| ExtractError::InvalidResponse {
            reason: format!("not valid JSON: {}", e),
            raw: raw.to_string(),
        })?;

    let update_needed = match value.get("updateNeeded") {
        Some(serde_json::Value::Bool(b)) => *b,
        _ => {
            return Err(ExtractError::InvalidResponse {
                reason: "missing or non-boolean updateNeeded".to_string(),
                raw: raw.to_string(),
            });
        }
    };

    if !update_needed {
        return Ok(ExtractionResult::no_update());
    }

    let field = value
        .get("profileField")
        .and_then(|v| v.as_str())
        .and_then(crate::catalog::StepKey::from_token);
    let extracted = value
        .get("extractedValue")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from);

    match (field, extracted) {
        (Some(field), Some(value)) => Ok(ExtractionResult {
            update_needed: true,
            field: Some(field),
            value: Some(value),
        }),
        // updateNeeded=true without a usable field+value is no update at all.
        _ => Ok(ExtractionResult::no_update()),
    }
}
