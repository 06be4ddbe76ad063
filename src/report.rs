use crate::error::AssessmentError;
use crate::openai::ChatClient;
use crate::session::{Message, ResponseMap};

/// Builds the composite report instruction embedding every recorded
/// question/answer pair as pretty-printed JSON. The dump is passed through
/// in full; very long sessions can exceed the API's request limits, which
/// surfaces as a remote failure at the boundary.
pub fn report_prompt(responses: &ResponseMap) -> Result<String, AssessmentError> {
    let dump = serde_json::to_string_pretty(responses)?;
    Ok(format!(
        "Based on the following assessment responses, provide a comprehensive readiness report with specific \
recommendations. Include strengths, areas for improvement, and next steps. Responses: {}",
        dump
    ))
}

/// Submits the report instruction as a single user message, non-streaming,
/// and returns the narrative report text. Callers enforce the completion
/// flag; re-invocation re-queries the API with no caching.
pub async fn generate(
    client: &ChatClient,
    responses: &ResponseMap,
) -> Result<String, AssessmentError> {
    let prompt = report_prompt(responses)?;
    tracing::info!(prompt_len = prompt.len(), "generating assessment report");
    client.complete(&[Message::user(prompt)]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ResponsePair;

    #[test]
    fn test_report_prompt_embeds_all_pairs() {
        let mut responses = ResponseMap::new();
        responses.insert(
            "data_readiness".to_string(),
            vec![ResponsePair {
                question: "Q1".to_string(),
                response: "A1".to_string(),
            }],
        );

        let prompt = report_prompt(&responses).unwrap();
        assert!(prompt.contains("data_readiness"));
        assert!(prompt.contains("Q1"));
        assert!(prompt.contains("A1"));
        assert!(prompt.starts_with("Based on the following assessment responses"));
    }

    #[test]
    fn test_report_prompt_with_empty_responses() {
        let prompt = report_prompt(&ResponseMap::new()).unwrap();
        assert!(prompt.contains("Responses: {}"));
    }
}
