use tokio::sync::mpsc;

use crate::catalog;
use crate::error::AssessmentError;
use crate::openai::{ChatClient, StreamEvent};
use crate::session::{Message, Session};

/// Persona instruction seeded as the first transcript message.
pub const SYSTEM_PROMPT: &str = "You are an AI Readiness Assessment expert. Guide the user through evaluating their organization's readiness \
for implementing Generative AI. Ask questions one at a time, listen carefully to responses, and provide thoughtful \
insights. Be professional but conversational. Focus on understanding their current state and providing actionable \
recommendations. If you detect potential risks or gaps, address them constructively.";

/// Opening assistant message, built from the catalog's first topic area so
/// greeting and catalog cannot drift apart.
pub fn opening_question() -> String {
    let area = catalog::first_area();
    format!(
        "Hello! I'll be guiding you through assessing your organization's GenAI readiness. \
Let's start with understanding your current data infrastructure. {}",
        area.questions[0]
    )
}

/// Seeds an empty transcript with the persona instruction and the opening
/// question. A no-op once the transcript is non-empty, so repeated calls are
/// safe.
pub fn start_session(session: &mut Session) {
    if !session.messages.is_empty() {
        return;
    }
    session.append(Message::system(SYSTEM_PROMPT));
    session.append(Message::assistant(opening_question()));
}

/// Runs one user turn: appends the user message, replays the full transcript
/// to the chat completion API in streaming mode, forwards each fragment over
/// `tx`, and appends the concatenated reply as one assistant message.
///
/// On remote failure the user message stays in the transcript, no partial
/// assistant message is recorded, and the error propagates to the caller.
/// The active topic area is never advanced here; that is the front end's
/// concern.
pub async fn submit_user_turn(
    client: &ChatClient,
    session: &mut Session,
    text: &str,
    tx: mpsc::Sender<StreamEvent>,
) -> Result<String, AssessmentError> {
    if text.trim().is_empty() {
        return Err(AssessmentError::EmptyUserTurn);
    }

    session.append(Message::user(text));
    tracing::debug!(
        transcript_len = session.messages.len(),
        area = %session.current_area,
        "submitting user turn"
    );

    let reply = client.complete_stream(&session.messages, tx).await?;
    session.append(Message::assistant(reply.clone()));

    // File the answer under the active area when it is a known catalog id.
    // The pairing is positional: second-to-last transcript message as
    // question, the submitted text as answer.
    if catalog::is_known_area(&session.current_area) {
        let question = session.messages[session.messages.len() - 2].content.clone();
        let area = session.current_area.clone();
        session.record_response(&area, question, text.to_string());
    }

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    #[test]
    fn test_start_session_seeds_empty_transcript() {
        let mut session = Session::new();
        start_session(&mut session);

        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, Role::System);
        assert_eq!(session.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert!(session.messages[1]
            .content
            .contains("How would you rate the quality and organization of your company's data?"));
    }

    #[test]
    fn test_start_session_is_noop_once_seeded() {
        let mut session = Session::new();
        start_session(&mut session);
        start_session(&mut session);
        start_session(&mut session);
        assert_eq!(session.messages.len(), 2);
    }

    #[test]
    fn test_start_session_skips_partially_filled_transcript() {
        let mut session = Session::new();
        session.append(Message::user("already talking"));
        start_session(&mut session);
        assert_eq!(session.messages.len(), 1);
    }

    #[test]
    fn test_opening_question_comes_from_catalog() {
        let opening = opening_question();
        assert!(opening.contains(catalog::first_area().questions[0]));
    }

    #[tokio::test]
    async fn test_empty_turn_rejected_without_touching_transcript() {
        let client = ChatClient::new("test-key").unwrap();
        let mut session = Session::new();
        start_session(&mut session);
        let (tx, _rx) = mpsc::channel(8);

        let err = submit_user_turn(&client, &mut session, "   ", tx)
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::EmptyUserTurn));
        assert_eq!(session.messages.len(), 2);
    }
}
