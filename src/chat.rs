// Terminal front end: a line-oriented REPL over the same session, driver and
// report modules the web UI uses.

use std::io::Write;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use crate::catalog;
use crate::config;
use crate::driver;
use crate::error::AssessmentError;
use crate::openai::{ChatClient, StreamEvent};
use crate::report;
use crate::session::Session;

fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Ok(None); // EOF
    }
    Ok(Some(line.trim().to_string()))
}

fn resolve_api_key() -> Result<Option<String>> {
    if !config::OPENAI_API_KEY.is_empty() {
        return Ok(Some(config::OPENAI_API_KEY.clone()));
    }
    let entered = read_line("OpenAI API key: ")?.unwrap_or_default();
    if entered.is_empty() {
        return Ok(None);
    }
    Ok(Some(entered))
}

/// Runs the interactive assessment in the terminal. Commands: `/area <id>`
/// switches the active topic area, `/finish` marks the assessment complete
/// and prints the generated report, `/quit` exits.
pub async fn run_assessment_chat() -> Result<()> {
    info!("Starting assessment chat session");

    let Some(api_key) = resolve_api_key()? else {
        println!("{}", AssessmentError::MissingCredential);
        return Ok(());
    };
    let client = match ChatClient::new(&api_key) {
        Ok(client) => client,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let mut session = Session::new();
    driver::start_session(&mut session);
    // The opening question is the last seeded message.
    if let Some(opening) = session.messages.last() {
        println!("\n{}\n", opening.content);
    }

    loop {
        let Some(line) = read_line("> ")? else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        if let Some(area_id) = line.strip_prefix("/area ") {
            let area_id = area_id.trim();
            session.set_current_area(area_id);
            match catalog::find_area(area_id) {
                Some(area) => println!("Now covering: {}", area.title),
                None => println!("Unknown area '{}'; answers will still be recorded.", area_id),
            }
            continue;
        }

        match line.as_str() {
            "/quit" => break,
            "/finish" => {
                session.mark_complete();
                println!("\nGenerating assessment report...\n");
                match report::generate(&client, session.responses()).await {
                    Ok(text) => println!("{}\n", text),
                    Err(e) => println!("Report generation failed: {}\n", e),
                }
                continue;
            }
            _ => {}
        }

        match stream_turn(&client, &mut session, &line).await {
            Ok(()) => {}
            Err(e) => println!("Turn failed: {}\n", e),
        }
    }

    info!("Assessment chat session finished");
    Ok(())
}

// Prints tokens as they arrive, then a trailing newline once the turn ends.
async fn stream_turn(
    client: &ChatClient,
    session: &mut Session,
    text: &str,
) -> Result<(), AssessmentError> {
    let (tx, mut rx) = mpsc::channel::<StreamEvent>(64);
    let mut drive = Box::pin(driver::submit_user_turn(client, session, text, tx));

    println!();
    let result = loop {
        tokio::select! {
            res = &mut drive => break res,
            Some(event) = rx.recv() => print_event(event),
        }
    };
    while let Ok(event) = rx.try_recv() {
        print_event(event);
    }
    println!("\n");

    result.map(|_| ())
}

fn print_event(event: StreamEvent) {
    if let StreamEvent::Text { text } = event {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }
}
