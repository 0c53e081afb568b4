//! Match Analyzer: one scoring call per document, followed by defensive
//! decoding of the model's output.
//!
//! The model is instructed to return bare JSON, but replies routinely arrive
//! wrapped in prose or code fences. The analyzer locates the first balanced
//! JSON object in the raw text and decodes it strictly; a missing or mistyped
//! key is a parse failure, while an out-of-range score is clamped.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::llm_client::{LlmError, ScoringModel};
use crate::screening::prompts::{SCREENING_PROMPT_TEMPLATE, SCREENING_SYSTEM};

/// Upper bound on resume text forwarded to the model. Extraction output is
/// unbounded; the prompt is not.
const MAX_RESUME_CHARS: usize = 50_000;

/// How much of a malformed response to carry in the parse error.
const SNIPPET_CHARS: usize = 240;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("scoring request failed: {0}")]
    Request(#[from] LlmError),

    #[error("could not parse model response: {reason} (snippet: {snippet:?})")]
    Parse { reason: String, snippet: String },
}

/// Structured assessment of one candidate against one job description.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAssessment {
    /// 0-100, clamped.
    pub match_score: u8,
    pub key_skills_matched: Vec<String>,
    pub missing_skills: Vec<String>,
    pub summary: String,
}

/// Wire shape of the model's reply. Strict: every key must be present and
/// correctly typed; the score range alone is forgiven.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAssessment {
    match_score: i64,
    key_skills_matched: Vec<String>,
    missing_skills: Vec<String>,
    summary: String,
}

/// Scores one candidate. Exactly one `score` call per invocation; retry
/// policy, if any, belongs to the transport client underneath.
pub async fn analyze_match(
    model: &dyn ScoringModel,
    job_description: &str,
    resume_text: &str,
    candidate_name: &str,
) -> Result<MatchAssessment, AnalyzeError> {
    let prompt = build_screening_prompt(job_description, resume_text, candidate_name);
    let raw = model.score(&prompt, SCREENING_SYSTEM).await?;
    debug!(candidate_name, response_len = raw.len(), "scored candidate");
    parse_assessment(&raw)
}

fn build_screening_prompt(
    job_description: &str,
    resume_text: &str,
    candidate_name: &str,
) -> String {
    SCREENING_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{candidate_name}", candidate_name)
        .replace("{resume_text}", truncate_chars(resume_text, MAX_RESUME_CHARS))
}

fn parse_assessment(raw: &str) -> Result<MatchAssessment, AnalyzeError> {
    let object =
        first_json_object(raw).ok_or_else(|| parse_error("no JSON object in response", raw))?;

    let parsed: RawAssessment =
        serde_json::from_str(object).map_err(|e| parse_error(&e.to_string(), raw))?;

    Ok(MatchAssessment {
        // Scoring is approximate by nature; out-of-range values are clamped
        // rather than rejected.
        match_score: parsed.match_score.clamp(0, 100) as u8,
        key_skills_matched: parsed.key_skills_matched,
        missing_skills: parsed.missing_skills,
        summary: parsed.summary,
    })
}

fn parse_error(reason: &str, raw: &str) -> AnalyzeError {
    AnalyzeError::Parse {
        reason: reason.to_string(),
        snippet: truncate_chars(raw.trim(), SNIPPET_CHARS).to_string(),
    }
}

/// Locates the first balanced top-level JSON object in `text`.
///
/// Brace depth is tracked outside of string literals only, so braces inside
/// quoted values (and escaped quotes) do not end the object early. A naive
/// first-`{`-to-last-`}` slice would break on prose containing braces after
/// the payload.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Char-boundary-safe prefix of at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedModel(String);

    #[async_trait]
    impl ScoringModel for CannedModel {
        async fn score(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ScoringModel for FailingModel {
        async fn score(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 529,
                message: "overloaded".to_string(),
            })
        }
    }

    const GOOD_REPLY: &str = r#"{
        "matchScore": 82,
        "keySkillsMatched": ["Rust", "Kubernetes"],
        "missingSkills": ["Kafka"],
        "summary": "Strong systems background."
    }"#;

    #[test]
    fn test_first_json_object_ignores_surrounding_prose() {
        let text = "Sure! Here is the assessment:\n{\"a\": 1}\nHope this helps {not json}";
        assert_eq!(first_json_object(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_first_json_object_handles_nested_objects() {
        let text = r#"{"outer": {"inner": 1}} trailing"#;
        assert_eq!(first_json_object(text), Some(r#"{"outer": {"inner": 1}}"#));
    }

    #[test]
    fn test_first_json_object_ignores_braces_inside_strings() {
        let text = r#"{"summary": "uses {braces} and \"quotes\" freely"}"#;
        assert_eq!(first_json_object(text), Some(text));
    }

    #[test]
    fn test_first_json_object_none_without_object() {
        assert_eq!(first_json_object("no json here"), None);
        // Truncated reply never balances.
        assert_eq!(first_json_object(r#"{"matchScore": 8"#), None);
    }

    #[test]
    fn test_parse_good_reply() {
        let assessment = parse_assessment(GOOD_REPLY).unwrap();
        assert_eq!(assessment.match_score, 82);
        assert_eq!(assessment.key_skills_matched, vec!["Rust", "Kubernetes"]);
        assert_eq!(assessment.missing_skills, vec!["Kafka"]);
    }

    #[test]
    fn test_parse_tolerates_code_fences_and_prose() {
        let raw = format!("```json\n{GOOD_REPLY}\n```\nLet me know if you need more detail.");
        let assessment = parse_assessment(&raw).unwrap();
        assert_eq!(assessment.match_score, 82);
    }

    #[test]
    fn test_overshooting_score_is_clamped_not_rejected() {
        let raw = r#"{"matchScore": 150, "keySkillsMatched": [], "missingSkills": [], "summary": "s"}"#;
        assert_eq!(parse_assessment(raw).unwrap().match_score, 100);

        let raw = r#"{"matchScore": -5, "keySkillsMatched": [], "missingSkills": [], "summary": "s"}"#;
        assert_eq!(parse_assessment(raw).unwrap().match_score, 0);
    }

    #[test]
    fn test_missing_score_key_is_a_parse_failure() {
        let raw = r#"{"keySkillsMatched": [], "missingSkills": [], "summary": "s"}"#;
        let err = parse_assessment(raw).unwrap_err();
        assert!(matches!(err, AnalyzeError::Parse { .. }));
    }

    #[test]
    fn test_mistyped_score_is_a_parse_failure() {
        let raw = r#"{"matchScore": "high", "keySkillsMatched": [], "missingSkills": [], "summary": "s"}"#;
        assert!(matches!(
            parse_assessment(raw).unwrap_err(),
            AnalyzeError::Parse { .. }
        ));
    }

    #[test]
    fn test_parse_failure_carries_bounded_snippet() {
        let raw = format!("prose only, no json. {}", "x".repeat(1000));
        let AnalyzeError::Parse { snippet, .. } = parse_assessment(&raw).unwrap_err() else {
            panic!("expected parse failure");
        };
        assert!(snippet.chars().count() <= SNIPPET_CHARS);
        assert!(snippet.starts_with("prose only"));
    }

    #[test]
    fn test_prompt_carries_all_three_inputs() {
        let prompt = build_screening_prompt("Need Rust.", "Did Rust for years.", "Jane Doe");
        assert!(prompt.contains("Need Rust."));
        assert!(prompt.contains("Did Rust for years."));
        assert!(prompt.contains("candidate: Jane Doe"));
    }

    #[test]
    fn test_prompt_truncates_resume_text() {
        let resume = "r".repeat(MAX_RESUME_CHARS + 500);
        let prompt = build_screening_prompt("jd", &resume, "n");
        assert!(prompt.len() < resume.len() + SCREENING_PROMPT_TEMPLATE.len());
    }

    #[tokio::test]
    async fn test_analyze_match_happy_path() {
        let model = CannedModel(GOOD_REPLY.to_string());
        let assessment = analyze_match(&model, "jd", "resume", "Jane")
            .await
            .unwrap();
        assert_eq!(assessment.match_score, 82);
    }

    #[tokio::test]
    async fn test_service_failure_maps_to_request_error() {
        let err = analyze_match(&FailingModel, "jd", "resume", "Jane")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::Request(_)));
    }
}
