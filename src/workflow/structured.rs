//! Schema-validated JSON out of a plain text completion.
//!
//! Providers differ in whether they offer tool calling or a JSON response
//! mode, so none of that is used: the schema goes into the system prompt,
//! the reply is mined for a JSON object, and the object is validated here.

use crate::error::{DecodeError, StageError};
use crate::provider::{ChatMessage, Model};
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// How much of a bad reply is quoted back in the error
const SNIPPET_CHARS: usize = 200;

/// One completion, decoded into `T`. Any failure is final: there is no retry.
pub async fn generate<T>(
    model: &dyn Model,
    system: &str,
    messages: &[ChatMessage],
) -> Result<T, StageError>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = schema_value::<T>()?;
    let schema_desc =
        serde_json::to_string_pretty(&schema).map_err(|e| DecodeError::Schema(e.to_string()))?;

    let augmented_system = format!(
        "{}\n\n\
        IMPORTANT: You MUST respond with ONLY a valid JSON object matching this schema. \
        No markdown, no explanation, no code blocks, just the raw JSON object.\n\n\
        JSON Schema:\n{}",
        system, schema_desc
    );

    let raw = model.generate_text(&augmented_system, messages).await?;
    debug!("{} returned {} chars", model.name(), raw.len());

    Ok(decode(&raw, &schema)?)
}

/// JSON Schema for `T` as a plain value
pub fn schema_value<T: JsonSchema>() -> Result<Value, DecodeError> {
    serde_json::to_value(schema_for!(T)).map_err(|e| DecodeError::Schema(e.to_string()))
}

/// Extract, parse and validate a reply against `schema`
pub fn decode<T: DeserializeOwned>(raw: &str, schema: &Value) -> Result<T, DecodeError> {
    let candidate = extract_json(raw);

    let value: Value =
        serde_json::from_str(candidate).map_err(|source| DecodeError::InvalidJson {
            snippet: raw.chars().take(SNIPPET_CHARS).collect(),
            source,
        })?;

    let validator =
        jsonschema::validator_for(schema).map_err(|e| DecodeError::Schema(e.to_string()))?;
    let violations: Vec<String> = validator
        .iter_errors(&value)
        .map(|e| e.to_string())
        .collect();
    if !violations.is_empty() {
        return Err(DecodeError::SchemaViolation(violations.join("; ")));
    }

    serde_json::from_value(value).map_err(DecodeError::Shape)
}

/// Pick the JSON candidate: first fenced block, else first `{` to last `}`,
/// else the whole trimmed reply
fn extract_json(text: &str) -> &str {
    if let Some(block) = fenced_block(text) {
        return block;
    }

    if let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) {
        if last > first {
            return &text[first..=last];
        }
    }

    text.trim()
}

fn fenced_block(text: &str) -> Option<&str> {
    let re = regex::Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)```").ok()?;
    let cap = re.captures(text)?;
    Some(cap.get(1)?.as_str().trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::EchoModel;
    use crate::workflow::QualityReport;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_extract_prefers_fenced_block() {
        let text = "Sure! {ignored}\n```json\n{\"name\": \"a\"}\n```\ntrailing }";
        assert_eq!(extract_json(text), "{\"name\": \"a\"}");
    }

    #[test]
    fn test_extract_unlabelled_fence() {
        assert_eq!(extract_json("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_extract_brace_span() {
        let text = "Here you go: {\"a\": {\"b\": 1}} hope that helps";
        assert_eq!(extract_json(text), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn test_extract_falls_back_to_trimmed_text() {
        assert_eq!(extract_json("  no json here \n"), "no json here");
        assert_eq!(extract_json("} backwards {"), "} backwards {");
    }

    #[test]
    fn test_decode_valid_object() {
        let schema = schema_value::<Sample>().unwrap();
        let sample: Sample = decode("{\"name\":\"x\",\"count\":3}", &schema).unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "x".into(),
                count: 3
            }
        );
    }

    #[test]
    fn test_unparsable_reply_quotes_snippet() {
        let schema = schema_value::<Sample>().unwrap();
        let raw = format!("I cannot do that. {}", "x".repeat(500));
        let err = decode::<Sample>(&raw, &schema).unwrap_err();
        match err {
            DecodeError::InvalidJson { snippet, .. } => {
                assert!(snippet.starts_with("I cannot do that."));
                assert_eq!(snippet.chars().count(), SNIPPET_CHARS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_schema_violation_is_reported() {
        let schema = schema_value::<Sample>().unwrap();
        let err = decode::<Sample>("{\"name\": \"x\"}", &schema).unwrap_err();
        match err {
            DecodeError::SchemaViolation(msg) => assert!(msg.contains("count")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_score_range_is_enforced() {
        let schema = schema_value::<QualityReport>().unwrap();
        let raw = r#"{"overallScore": 11, "passesThreshold": true,
            "pageReviews": [{"pageId": "a", "score": 11, "issues": [], "suggestions": []}]}"#;
        assert!(matches!(
            decode::<QualityReport>(raw, &schema),
            Err(DecodeError::SchemaViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_appends_schema_to_system_prompt() {
        let model = EchoModel::new("```json\n{\"name\":\"x\",\"count\":1}\n```");
        let sample: Sample = generate(&model, "Base prompt", &[ChatMessage::user("go")])
            .await
            .unwrap();
        assert_eq!(sample.count, 1);

        let systems = model.systems();
        assert_eq!(systems.len(), 1);
        assert!(systems[0].starts_with("Base prompt\n\nIMPORTANT"));
        assert!(systems[0].contains("\"count\""));
    }

    #[tokio::test]
    async fn test_generate_makes_a_single_call_on_failure() {
        let model = EchoModel::new("not json");
        let result: Result<Sample, _> = generate(&model, "p", &[ChatMessage::user("go")]).await;
        assert!(matches!(
            result,
            Err(StageError::Decode(DecodeError::InvalidJson { .. }))
        ));
        assert_eq!(model.systems().len(), 1);
    }
}
