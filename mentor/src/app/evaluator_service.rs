//! Evaluator service
//!
//! Scores one criterion by sending its summary to the LLM and parsing the
//! structured reply.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Deserialize;

use crate::app::extractor::ExtractedSummary;
use crate::app::prompts::{strict_user_prompt, system_prompt, user_prompt};
use crate::domain::entities::{
    Criterion, CriterionScore, FailureKind, CONFIDENCE_MAX, CONFIDENCE_MIN, DEFAULT_CONFIDENCE,
    SCORE_MAX, SCORE_MIN,
};
use crate::domain::ports::{CompletionRequest, LlmClient};
use crate::error::{LlmError, ParseError};

/// Raw reply shape; `justification` is accepted for `summary`
#[derive(Deserialize)]
struct RawScore {
    score: i64,
    #[serde(alias = "justification")]
    summary: String,
    confidence: Option<i64>,
}

/// Service for scoring criteria with an LLM
pub struct EvaluatorService<L>
where
    L: LlmClient,
{
    llm: Arc<L>,
}

impl<L> EvaluatorService<L>
where
    L: LlmClient,
{
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm }
    }

    /// Score a criterion from its summary.
    ///
    /// Empty summaries score lowest without calling the LLM. An unparseable
    /// reply gets exactly one stricter retry before falling back to the lowest
    /// score. Endpoint failures are returned to the caller.
    pub async fn evaluate(&self, summary: &ExtractedSummary) -> Result<CriterionScore, LlmError> {
        let criterion = summary.criterion;

        if summary.is_empty() {
            tracing::info!(%criterion, "No relevant files, skipping LLM call");
            return Ok(CriterionScore::lowest(
                criterion,
                FailureKind::MissingData,
                missing_data_note(criterion),
            ));
        }

        let system = system_prompt(criterion, &summary.text);
        let request = CompletionRequest::new(system.clone(), user_prompt(criterion));
        let reply = self.llm.complete(&request).await?;

        let problem = match parse_criterion_response(criterion, &reply) {
            Ok(score) => return Ok(score),
            Err(e) => e,
        };

        tracing::warn!(
            %criterion,
            model = self.llm.model(),
            error = %problem,
            "Unparseable evaluator reply, retrying with stricter prompt"
        );

        let retry =
            CompletionRequest::new(system, strict_user_prompt(criterion, &problem.to_string()));
        let reply = self.llm.complete(&retry).await?;

        match parse_criterion_response(criterion, &reply) {
            Ok(score) => Ok(score),
            Err(e) => {
                tracing::warn!(%criterion, error = %e, "Evaluator reply still unparseable");
                Ok(CriterionScore::lowest(
                    criterion,
                    FailureKind::Parse,
                    format!("Evaluator reply could not be parsed after a retry: {}", e),
                ))
            }
        }
    }
}

fn missing_data_note(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::CodeQuality => "No Python source files found in the repository",
        Criterion::UnitTesting => "No test files found in the repository",
        Criterion::CiCd => "No CI/CD configuration found in the repository",
    }
}

fn fenced_json() -> Option<&'static Regex> {
    static FENCED: OnceLock<Option<Regex>> = OnceLock::new();
    FENCED
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").ok())
        .as_ref()
}

/// Decode the score object in a reply.
///
/// A fenced block wins. Otherwise each `{` is tried in turn and the first
/// one that starts a score object is used, so braces in surrounding prose
/// don't hide it.
fn find_raw_score(reply: &str) -> Result<RawScore, ParseError> {
    let fenced = fenced_json()
        .and_then(|re| re.captures(reply))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str());
    let candidates = fenced
        .into_iter()
        .chain(reply.match_indices('{').map(|(i, _)| &reply[i..]));

    let mut first_error = None;
    for candidate in candidates {
        match serde_json::Deserializer::from_str(candidate)
            .into_iter::<RawScore>()
            .next()
        {
            Some(Ok(raw)) => return Ok(raw),
            Some(Err(e)) => {
                first_error.get_or_insert(e);
            }
            None => {}
        }
    }

    Err(first_error.map_or(ParseError::NoJsonObject, ParseError::InvalidJson))
}

/// Parse an LLM reply into a validated score
pub fn parse_criterion_response(
    criterion: Criterion,
    reply: &str,
) -> Result<CriterionScore, ParseError> {
    let raw = find_raw_score(reply)?;

    if raw.score < SCORE_MIN as i64 || raw.score > SCORE_MAX as i64 {
        return Err(ParseError::ScoreOutOfRange {
            value: raw.score,
            min: SCORE_MIN,
            max: SCORE_MAX,
        });
    }

    let confidence = raw.confidence.unwrap_or(DEFAULT_CONFIDENCE as i64);
    if confidence < CONFIDENCE_MIN as i64 || confidence > CONFIDENCE_MAX as i64 {
        return Err(ParseError::ConfidenceOutOfRange {
            value: confidence,
            min: CONFIDENCE_MIN,
            max: CONFIDENCE_MAX,
        });
    }

    let summary = raw.summary.trim();
    if summary.is_empty() {
        return Err(ParseError::EmptyJustification);
    }

    Ok(CriterionScore::evaluated(
        criterion,
        raw.score as i32,
        confidence as i32,
        summary,
    ))
}
