//! Criterion score domain entity
//!
//! One rubric dimension's result for a group.

use serde::{Deserialize, Serialize};

/// Lowest score a criterion can receive
pub const SCORE_MIN: i32 = 1;

/// Highest score a criterion can receive
pub const SCORE_MAX: i32 = 5;

/// Lowest confidence the evaluator can report
pub const CONFIDENCE_MIN: i32 = 1;

/// Highest confidence the evaluator can report
pub const CONFIDENCE_MAX: i32 = 10;

/// Confidence assumed when a reply omits it
pub const DEFAULT_CONFIDENCE: i32 = 5;

/// Rubric dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    CodeQuality,
    UnitTesting,
    CiCd,
}

impl Criterion {
    /// All criteria in evaluation order
    pub const ALL: [Criterion; 3] = [
        Criterion::CodeQuality,
        Criterion::UnitTesting,
        Criterion::CiCd,
    ];

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Criterion::CodeQuality => "Code Quality",
            Criterion::UnitTesting => "Unit Testing",
            Criterion::CiCd => "CI/CD",
        }
    }

    /// Weight of this criterion in the overall score
    pub fn weight(&self) -> f64 {
        match self {
            Criterion::CodeQuality => 2.0,
            Criterion::UnitTesting => 2.0,
            Criterion::CiCd => 1.5,
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Criterion::CodeQuality => write!(f, "code_quality"),
            Criterion::UnitTesting => write!(f, "unit_testing"),
            Criterion::CiCd => write!(f, "ci_cd"),
        }
    }
}

impl std::str::FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "code_quality" => Ok(Criterion::CodeQuality),
            "unit_testing" => Ok(Criterion::UnitTesting),
            "ci_cd" => Ok(Criterion::CiCd),
            _ => Err(format!("Unknown criterion: {}", s)),
        }
    }
}

/// Why a criterion got a fallback score instead of an evaluated one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Repository missing or URL unusable
    NotFound,
    /// Hosting API kept throttling after all retries
    RateLimited,
    /// LLM reply unparseable even after the stricter retry
    Parse,
    /// LLM or hosting endpoint failed
    Endpoint,
    /// Nothing relevant in the repository for this criterion
    MissingData,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "not_found"),
            FailureKind::RateLimited => write!(f, "rate_limited"),
            FailureKind::Parse => write!(f, "parse"),
            FailureKind::Endpoint => write!(f, "endpoint"),
            FailureKind::MissingData => write!(f, "missing_data"),
        }
    }
}

impl std::str::FromStr for FailureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_found" => Ok(FailureKind::NotFound),
            "rate_limited" => Ok(FailureKind::RateLimited),
            "parse" => Ok(FailureKind::Parse),
            "endpoint" => Ok(FailureKind::Endpoint),
            "missing_data" => Ok(FailureKind::MissingData),
            _ => Err(format!("Unknown failure kind: {}", s)),
        }
    }
}

/// Score for one criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion: Criterion,
    pub score: i32,
    pub confidence: i32,
    pub justification: String,
    /// Set when the score is a fallback rather than an LLM judgement
    pub failure: Option<FailureKind>,
}

impl CriterionScore {
    /// An evaluated score, clamped into bounds
    pub fn evaluated(
        criterion: Criterion,
        score: i32,
        confidence: i32,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            criterion,
            score: score.clamp(SCORE_MIN, SCORE_MAX),
            confidence: confidence.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX),
            justification: justification.into(),
            failure: None,
        }
    }

    /// Lowest score with a note explaining why
    pub fn lowest(criterion: Criterion, failure: FailureKind, note: impl Into<String>) -> Self {
        let note = note.into();
        let justification = if note.trim().is_empty() {
            format!("No score: {}", failure)
        } else {
            note
        };

        Self {
            criterion,
            score: SCORE_MIN,
            confidence: CONFIDENCE_MIN,
            justification,
            failure: Some(failure),
        }
    }

    /// Whether this is a fallback score
    pub fn is_fallback(&self) -> bool {
        self.failure.is_some()
    }
}
