//! Quality judge
//!
//! Scores generated output against the user query with a second model.
//! The judge is constrained to a declared schema and every reply is
//! validated before a verdict is built from it.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::{Arc, OnceLock};

use crate::error::{EaselError, Result};
use crate::llm::{LLMProvider, LLMRequest, StructuredOutput};

/// Feedback key attached to every quality verdict
pub const QUALITY_KEY: &str = "quality";

/// Name the judge structure is declared under
pub const JUDGE_SCHEMA_NAME: &str = "judge";

/// Advisory scale the rubric asks for
pub const SCORE_SCALE: std::ops::RangeInclusive<f64> = 1.0..=10.0;

/// Structure every judge reply must conform to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeSchema {
    /// Reasoning for the assigned score
    pub justification: String,

    /// Quality score for how well the output answers the query
    pub quality_score: f64,
}

impl JudgeSchema {
    /// JSON schema sent to the provider and used for validation
    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "justification": {
                    "type": "string",
                    "description": "reasoning for why you are assigning a given quality score"
                },
                "quality_score": {
                    "type": "number",
                    "description": "quality score for how well the generated code answers the query."
                }
            },
            "required": ["justification", "quality_score"],
            "additionalProperties": false
        })
    }

    /// Schema descriptor for a structured invocation
    pub fn structured_output() -> StructuredOutput {
        StructuredOutput::new(JUDGE_SCHEMA_NAME, Self::json_schema())
    }

    /// Validate a raw judge reply.
    ///
    /// # Errors
    ///
    /// Returns [`EaselError::SchemaValidation`] listing the violations when
    /// the reply does not conform.
    pub fn validate(raw: &Value) -> Result<Self> {
        let validator = validator()?;
        if !validator.is_valid(raw) {
            const MAX_ERRORS: usize = 5;
            let errors: Vec<String> = validator
                .iter_errors(raw)
                .take(MAX_ERRORS)
                .map(|e| e.to_string())
                .collect();
            return Err(EaselError::SchemaValidation(format!(
                "judge reply does not match schema: {}",
                errors.join("; ")
            )));
        }

        serde_json::from_value(raw.clone())
            .map_err(|e| EaselError::SchemaValidation(format!("judge reply: {}", e)))
    }
}

fn validator() -> Result<&'static jsonschema::Validator> {
    static VALIDATOR: OnceLock<std::result::Result<jsonschema::Validator, String>> =
        OnceLock::new();

    VALIDATOR
        .get_or_init(|| {
            jsonschema::options()
                .build(&JudgeSchema::json_schema())
                .map_err(|e| format!("failed to compile judge schema: {}", e))
        })
        .as_ref()
        .map_err(|e| EaselError::Configuration(e.clone()))
}

/// A judge-assigned quality score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityVerdict {
    /// Always [`QUALITY_KEY`]
    pub key: String,

    /// Judge-assigned score; the scale is advisory
    pub score: f64,

    /// The judge's justification, verbatim
    pub comment: String,
}

impl From<JudgeSchema> for QualityVerdict {
    fn from(reply: JudgeSchema) -> Self {
        Self {
            key: QUALITY_KEY.to_string(),
            score: reply.quality_score,
            comment: reply.justification,
        }
    }
}

const RUBRIC: [&str; 5] = [
    "Given the following user query and generated code, judge whether the",
    "code satisfies the user's query. Return a quality score between 1 and 10,",
    "where a 1 would be completely irrelevant to the user's input, and 10 would be a perfectly accurate code sample.",
    "A 5 would be a code sample that is partially on target, but is missing some aspect of a user's request.",
    "Justify your answer.\n",
];

/// Build the rubric prompt for a query/output pair.
///
/// Both values are embedded verbatim inside tagged blocks.
pub fn build_quality_prompt(query: &str, generated_output: &str) -> String {
    format!(
        "{} <query>\n{}\n</query>\n <generated_code>\n{}\n</generated_code>",
        RUBRIC.join(" "),
        query,
        generated_output
    )
}

/// LLM-as-judge quality scorer
#[derive(Clone)]
pub struct QualityJudge {
    provider: Arc<dyn LLMProvider>,
    temperature: Option<f32>,
}

impl QualityJudge {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            temperature: None,
        }
    }

    /// Builder: set the judge sampling temperature
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Score `generated_output` against `query`.
    ///
    /// One provider call per invocation, no retries. Provider failures
    /// propagate unchanged.
    pub async fn judge(&self, query: &str, generated_output: &str) -> Result<QualityVerdict> {
        let prompt = build_quality_prompt(query, generated_output);
        let request = LLMRequest::from_prompt(prompt).with_temperature(self.temperature);

        let raw = self
            .provider
            .generate_structured(&request, &JudgeSchema::structured_output())
            .await?;

        let reply = JudgeSchema::validate(&raw)?;
        if !SCORE_SCALE.contains(&reply.quality_score) {
            tracing::warn!(
                score = reply.quality_score,
                "judge score outside the advisory 1-10 scale"
            );
        }

        let verdict = QualityVerdict::from(reply);
        tracing::info!(key = %verdict.key, score = verdict.score, comment = %verdict.comment, "quality verdict");
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{StubLLMProvider, StubReply};

    #[test]
    fn prompt_embeds_inputs_in_tagged_blocks() {
        let prompt = build_quality_prompt("Write a fizzbuzz in Rust", "fn main() {}");

        assert!(prompt.starts_with("Given the following user query and generated code"));
        assert!(prompt.contains("between 1 and 10"));
        assert!(prompt.contains("A 5 would be"));
        assert!(prompt.contains("<query>\nWrite a fizzbuzz in Rust\n</query>\n"));
        assert!(prompt.ends_with("<generated_code>\nfn main() {}\n</generated_code>"));
    }

    #[test]
    fn prompt_keeps_inputs_verbatim() {
        let code = "  <tag> & \"quotes\"\n\ttabs  ";
        let prompt = build_quality_prompt("q", code);
        assert!(prompt.contains(code));
    }

    #[test]
    fn validate_accepts_conforming_reply() {
        let reply = JudgeSchema::validate(&json!({"justification": "good", "quality_score": 8}))
            .unwrap();
        assert_eq!(reply.quality_score, 8.0);
        assert_eq!(reply.justification, "good");
    }

    #[test]
    fn validate_rejects_missing_score() {
        let err = JudgeSchema::validate(&json!({"justification": "good"})).unwrap_err();
        assert!(matches!(err, EaselError::SchemaValidation(_)));
    }

    #[test]
    fn validate_rejects_missing_justification() {
        let err = JudgeSchema::validate(&json!({"quality_score": 3})).unwrap_err();
        assert!(matches!(err, EaselError::SchemaValidation(_)));
    }

    #[test]
    fn validate_rejects_wrong_types() {
        let err = JudgeSchema::validate(&json!({"justification": 1, "quality_score": "9"}))
            .unwrap_err();
        assert!(matches!(err, EaselError::SchemaValidation(_)));
    }

    #[tokio::test]
    async fn judge_maps_reply_to_verdict() {
        let justification = "Handles every case in the request.\n\nMinor: no tests.";
        let provider = Arc::new(StubLLMProvider::new(vec![StubReply::structured(json!({
            "justification": justification,
            "quality_score": 9
        }))]));
        let judge = QualityJudge::new(provider.clone());

        let verdict = judge.judge("query", "code").await.unwrap();

        assert_eq!(verdict.key, "quality");
        assert_eq!(verdict.score, 9.0);
        assert_eq!(verdict.comment, justification);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.schemas()[0].name, "judge");
        assert_eq!(provider.schemas()[0].schema, JudgeSchema::json_schema());
    }

    #[tokio::test]
    async fn judge_never_defaults_a_score() {
        let provider = Arc::new(StubLLMProvider::new(vec![StubReply::structured(json!({
            "justification": "looks fine"
        }))]));
        let result = QualityJudge::new(provider).judge("q", "c").await;
        assert!(matches!(result, Err(EaselError::SchemaValidation(_))));
    }

    #[tokio::test]
    async fn judge_propagates_model_errors() {
        let provider = Arc::new(StubLLMProvider::new(vec![StubReply::error("connection reset")]));
        let result = QualityJudge::new(provider.clone()).judge("q", "c").await;
        assert!(matches!(result, Err(EaselError::Model(_))));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn out_of_scale_scores_are_kept() {
        let provider = Arc::new(StubLLMProvider::new(vec![StubReply::structured(json!({
            "justification": "off the charts",
            "quality_score": 42
        }))]));
        let verdict = QualityJudge::new(provider).judge("q", "c").await.unwrap();
        assert_eq!(verdict.score, 42.0);
    }

    #[tokio::test]
    async fn temperature_is_forwarded() {
        let provider = Arc::new(StubLLMProvider::new(vec![StubReply::structured(json!({
            "justification": "ok",
            "quality_score": 5
        }))]));
        QualityJudge::new(provider.clone())
            .with_temperature(Some(0.0))
            .judge("q", "c")
            .await
            .unwrap();
        assert_eq!(provider.requests()[0].temperature, Some(0.0));
    }
}
