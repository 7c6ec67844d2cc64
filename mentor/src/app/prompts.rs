//! Rubric prompts for the evaluator
//!
//! One fixed rubric per criterion. The repository summary is appended to the
//! system prompt as a labelled context block.

use crate::domain::entities::{
    Criterion, CONFIDENCE_MAX, CONFIDENCE_MIN, SCORE_MAX, SCORE_MIN,
};

const CODE_QUALITY_RUBRIC: &str = "\
You are a teaching assistant evaluating code quality for a university MLOps course.

Evaluate the code based on:
- Code structure and organization
- Adherence to Python best practices (PEP 8, type hints, docstrings)
- Readability and maintainability
- Proper use of design patterns
- Configuration management
- Documentation quality

SCORE (1-5):
1: Poor - Major violations, unreadable code
2: Below Average - Significant issues with readability/maintainability
3: Average - Meets basic standards, room for improvement
4: Good - Follows most best practices, minor issues only
5: Excellent - Clean, maintainable, follows all best practices

SUMMARY: 1-2 paragraphs (max 200 words) on code quality findings and suggestions.
CONFIDENCE (1-10): Your confidence in the assessment.
";

const UNIT_TESTING_RUBRIC: &str = "\
You are a teaching assistant evaluating unit testing for a university MLOps course.

Evaluate testing based on:
- Test coverage (unit, integration, E2E tests)
- Test quality and assertions
- Use of testing frameworks (pytest, unittest, etc.)
- Mock usage and test isolation
- Test organization and naming conventions
- Edge case coverage

SCORE (1-5):
1: Poor - No or minimal tests, negligible coverage
2: Below Average - Tests exist but inadequate coverage
3: Average - Adequate coverage with noticeable gaps
4: Good - Good coverage of critical functionality
5: Excellent - Comprehensive test coverage

SUMMARY: 1-2 paragraphs (max 200 words) on testing findings and suggestions.
CONFIDENCE (1-10): Your confidence in the assessment.
";

const CI_CD_RUBRIC: &str = "\
You are a teaching assistant evaluating CI/CD for a university MLOps course.

Evaluate CI/CD based on:
- GitHub Actions/workflow configuration
- Automated testing in pipelines
- Build and deployment automation
- Proper use of secrets and environment variables
- Pipeline efficiency and reliability
- Deployment strategies

SCORE (1-5):
1: Poor - No pipeline or completely broken
2: Below Average - Exists but unreliable or manual
3: Average - Functional but missing best practices
4: Good - Reliable and mostly automated
5: Excellent - Robust, fully automated, follows best practices

SUMMARY: 1-2 paragraphs (max 200 words) on CI/CD findings and suggestions.
CONFIDENCE (1-10): Your confidence in the assessment.
";

/// Rubric text for a criterion
pub fn rubric(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::CodeQuality => CODE_QUALITY_RUBRIC,
        Criterion::UnitTesting => UNIT_TESTING_RUBRIC,
        Criterion::CiCd => CI_CD_RUBRIC,
    }
}

/// Label of the context block appended to the rubric
pub fn context_label(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::CodeQuality => "code",
        Criterion::UnitTesting => "tests",
        Criterion::CiCd => "CI/CD configuration",
    }
}

/// Shape of the reply the parser accepts
pub fn response_format() -> String {
    format!(
        "Reply with a single JSON object: \
         {{\"score\": <integer {}-{}>, \"summary\": \"<max 200 words>\", \"confidence\": <integer {}-{}>}}",
        SCORE_MIN, SCORE_MAX, CONFIDENCE_MIN, CONFIDENCE_MAX
    )
}

/// System prompt: rubric, reply format, then the repository context
pub fn system_prompt(criterion: Criterion, summary: &str) -> String {
    format!(
        "{}\n{}\n\n{}:\n\n{}",
        rubric(criterion),
        response_format(),
        context_label(criterion),
        summary
    )
}

/// The instruction sent as the user message
pub fn user_prompt(criterion: Criterion) -> &'static str {
    match criterion {
        Criterion::CodeQuality => "Evaluate the code quality of this repository.",
        Criterion::UnitTesting => "Evaluate the unit testing in this repository.",
        Criterion::CiCd => "Evaluate the CI/CD setup in this repository.",
    }
}

/// User message for the single retry after an unparseable reply
pub fn strict_user_prompt(criterion: Criterion, problem: &str) -> String {
    format!(
        "{}\n\nYour previous reply could not be used ({}). \
         Respond with ONLY the JSON object, no code fences and no other text. {}",
        user_prompt(criterion),
        problem,
        response_format()
    )
}
