use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config;
use crate::error::AssessmentError;
use crate::session::Message;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

// Non-streaming responses are {choices: [{message: {content}}]}
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Streaming responses are SSE lines of {choices: [{delta: {content}}]}
#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Events surfaced to the UI while a streaming completion is in flight.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Start,
    Text { text: String },
    End,
    Error { error: String },
}

/// Client for an OpenAI-compatible chat completion API. Construction fails
/// up front on an empty credential so no remote call is ever attempted
/// without one.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(api_key: &str) -> Result<Self, AssessmentError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AssessmentError::MissingCredential);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config::OPENAI_BASE_URL.clone(),
            api_key: api_key.to_string(),
            model: config::CHAT_MODEL.clone(),
        })
    }

    /// Point the client at a different API root (used by tests to target a
    /// local mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Non-streaming completion: replays the transcript and returns the full
    /// assistant message text.
    pub async fn complete(&self, messages: &[Message]) -> Result<String, AssessmentError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "chat completion request failed");
            return Err(AssessmentError::RemoteStatus { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AssessmentError::Malformed("response contained no choices".to_string()))
    }

    /// Streaming completion: forwards each token fragment over `tx` as it
    /// arrives and returns the concatenated text once the stream ends. The
    /// channel is a lazy, forward-only sequence; consumers concatenate.
    pub async fn complete_stream(
        &self,
        messages: &[Message],
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<String, AssessmentError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "streaming chat completion request failed");
            let _ = tx.send(StreamEvent::Error { error: body.clone() }).await;
            return Err(AssessmentError::RemoteStatus { status, body });
        }

        let _ = tx.send(StreamEvent::Start).await;

        let mut stream = response.bytes_stream();
        // SSE chunks can split mid-line, so buffer until a full line arrives.
        let mut buffer = String::new();
        let mut accumulated = String::new();

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!("stream error: {}", e);
                    let _ = tx
                        .send(StreamEvent::Error {
                            error: e.to_string(),
                        })
                        .await;
                    return Err(AssessmentError::Transport(e));
                }
            };
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);
                if line.is_empty() {
                    continue;
                }
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();

                if data == "[DONE]" {
                    let _ = tx.send(StreamEvent::End).await;
                    return Ok(accumulated);
                }

                match serde_json::from_str::<StreamChunk>(data) {
                    Ok(chunk) => {
                        let fragment = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.delta.content);
                        if let Some(text) = fragment {
                            accumulated.push_str(&text);
                            let _ = tx.send(StreamEvent::Text { text }).await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("failed to parse SSE data line: {} - Error: {}", data, e);
                    }
                }
            }
        }

        // Stream ended without the [DONE] sentinel; treat what we have as the
        // complete message.
        let _ = tx.send(StreamEvent::End).await;
        Ok(accumulated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Message;

    #[test]
    fn test_empty_credential_is_rejected_before_any_call() {
        let err = ChatClient::new("").unwrap_err();
        assert!(err.is_missing_credential());

        let err = ChatClient::new("   ").unwrap_err();
        assert!(err.is_missing_credential());
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![Message::system("persona"), Message::user("hello")];
        let request = ChatRequest {
            model: "gpt-4",
            messages: &messages,
            stream: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_parse_completion_response() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Report text"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Report text");
    }

    #[test]
    fn test_parse_stream_chunk() {
        let json = r#"{"id":"c1","choices":[{"index":0,"delta":{"content":"Hel"}}]}"#;
        let parsed: StreamChunk = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].delta.content.as_deref(), Some("Hel"));

        // Role-only first chunk carries no content.
        let json = r#"{"id":"c1","choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        let parsed: StreamChunk = serde_json::from_str(json).unwrap();
        assert!(parsed.choices[0].delta.content.is_none());
    }

    #[test]
    fn test_completions_url_handles_trailing_slash() {
        let client = ChatClient::new("key")
            .unwrap()
            .with_base_url("http://localhost:9/v1/");
        assert_eq!(client.completions_url(), "http://localhost:9/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_stream_event_channel() {
        let (tx, mut rx) = mpsc::channel(10);

        tx.send(StreamEvent::Start).await.unwrap();
        tx.send(StreamEvent::Text {
            text: "Test".to_string(),
        })
        .await
        .unwrap();

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, StreamEvent::Start));

        match rx.recv().await.unwrap() {
            StreamEvent::Text { text } => assert_eq!(text, "Test"),
            other => panic!("expected Text, got {:?}", other),
        }
    }
}
