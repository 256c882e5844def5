//! Ticket classification over the shared retrieval and generation components.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;

use crate::language::SUPPORTED_LANGUAGES;
use crate::llm::GenerationOptions;
use crate::prompt::build_classification_prompt;

use super::{EngineError, qa::SupportEngine};

const CLASSIFY_DEADLINE: Duration = Duration::from_secs(60);

/// Routing decision produced for one support ticket.
///
/// Enum-ish fields are plain strings: unknown values pass through unchanged
/// and routing stays the caller's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Language code of the ticket text.
    pub detected_language: String,
    /// Dialect or variant, `"standard"` when not identifiable.
    pub detected_dialect: String,
    /// Main topic of the ticket.
    pub category: String,
    /// Machine-friendly issue label.
    pub issue_type: String,
    /// Department that should own the ticket.
    pub routing_department: String,
    /// Knowledge-base articles recommended to the handling agent.
    pub recommended_article_ids: Vec<String>,
    /// Customer sentiment.
    pub sentiment: String,
    /// One-line ticket summary per supported language.
    pub summaries: BTreeMap<String, String>,
}

impl SupportEngine {
    /// Classify a support ticket into a routing decision.
    ///
    /// Retrieval degrades to the empty-context path like Q&A does; the model
    /// output is validated against the result schema with one retry before
    /// failing closed.
    pub async fn classify(&self, text: &str) -> Result<ClassificationResult, EngineError> {
        match timeout(CLASSIFY_DEADLINE, self.classify_pipeline(text)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout {
                operation: "classification",
            }),
        }
    }

    async fn classify_pipeline(&self, text: &str) -> Result<ClassificationResult, EngineError> {
        let (hits, context) = self.retrieve_context(text, None).await;
        let prompt = build_classification_prompt(&context, text);
        let options = GenerationOptions::classification();

        let mut last_error = String::new();
        for attempt in 0..2 {
            let value = self.llm.generate_json(&prompt, &options).await?;
            match validate_classification(&value) {
                Ok(result) => {
                    tracing::info!(
                        category = %result.category,
                        department = %result.routing_department,
                        retrieved = hits.len(),
                        "Ticket classified"
                    );
                    return Ok(result);
                }
                Err(error) => {
                    tracing::warn!(attempt, error = %error, "Classifier output failed validation");
                    last_error = error;
                }
            }
        }

        Err(EngineError::Validation(last_error))
    }
}

/// Validate a model response against the classification schema.
///
/// Required: every top-level key, `recommended_article_ids` as a list of
/// strings, and one summary per supported language. Extra summary keys are
/// dropped rather than rejected.
pub fn validate_classification(value: &Value) -> Result<ClassificationResult, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "response is not a JSON object".to_string())?;

    let required_string = |key: &str| -> Result<String, String> {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| format!("missing or non-string key `{key}`"))
    };

    let recommended_article_ids = object
        .get("recommended_article_ids")
        .and_then(Value::as_array)
        .ok_or_else(|| "missing or non-array key `recommended_article_ids`".to_string())?
        .iter()
        .map(|entry| match entry {
            Value::String(id) => Ok(id.clone()),
            Value::Number(id) => Ok(id.to_string()),
            other => Err(format!("non-string article id: {other}")),
        })
        .collect::<Result<Vec<String>, String>>()?;

    let raw_summaries = object
        .get("summaries")
        .and_then(Value::as_object)
        .ok_or_else(|| "missing or non-object key `summaries`".to_string())?;

    let mut summaries = BTreeMap::new();
    for language in SUPPORTED_LANGUAGES {
        let summary = raw_summaries
            .get(language)
            .and_then(Value::as_str)
            .ok_or_else(|| format!("summaries missing language `{language}`"))?;
        summaries.insert(language.to_string(), summary.to_string());
    }

    Ok(ClassificationResult {
        detected_language: required_string("detected_language")?,
        detected_dialect: required_string("detected_dialect")?,
        category: required_string("category")?,
        issue_type: required_string("issue_type")?,
        routing_department: required_string("routing_department")?,
        recommended_article_ids,
        sentiment: required_string("sentiment")?,
        summaries,
    })
}
