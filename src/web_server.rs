use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    serve, Router,
};
use minijinja::{context, path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::mpsc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::config;
use crate::driver;
use crate::openai::{ChatClient, StreamEvent};
use crate::report;
use crate::session::{Role, Session};
use crate::{catalog, error::AssessmentError};

// Frames exchanged with the browser over the WebSocket.
// Using serde allows easy conversion to/from JSON for WebSocket messages.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct Frame {
    message_type: String,
    payload: serde_json::Value,
}

impl Frame {
    fn new(message_type: &str, payload: serde_json::Value) -> Self {
        Self {
            message_type: message_type.to_string(),
            payload,
        }
    }
}

// Shared application state
#[derive(Clone)]
struct AppState {
    templates: Arc<AutoReloader>,
}

// Minijinja Environment setup
fn create_minijinja_env() -> Result<AutoReloader> {
    // Use AutoReloader for development convenience
    let reloader = AutoReloader::new(|notifier| {
        let loader = path_loader("templates");
        let mut env = Environment::new();
        env.set_loader(loader);
        // Watch the templates directory for changes
        notifier.watch_path("templates", true);
        Ok(env)
    });
    Ok(reloader)
}

async fn index_handler(
    State(state): State<AppState>,
) -> Result<axum::response::Html<String>, axum::response::Html<String>> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                let ctx = context! {
                    title => "GenAI Readiness Assessment",
                    areas => catalog::ASSESSMENT_AREAS,
                    widget_enabled => config::widget_enabled(),
                    widget_prompt_id => config::WIDGET_PROMPT_ID.clone(),
                    widget_licensing_key => config::WIDGET_LICENSING_KEY.clone(),
                    widget_visible => *config::WIDGET_VISIBLE,
                };
                tmpl.render(ctx)
            })
        })
        .map(axum::response::Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            axum::response::Html(format!("Internal Server Error: {}", e))
        })
}

// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(_state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(handle_socket)
}

async fn send_frame(socket: &mut WebSocket, frame: Frame) -> bool {
    match serde_json::to_string(&frame) {
        Ok(json) => socket.send(WsMessage::Text(json)).await.is_ok(),
        Err(e) => {
            error!("Failed to serialize frame: {}", e);
            true
        }
    }
}

async fn send_error(socket: &mut WebSocket, err: &AssessmentError) -> bool {
    let message_type = if err.is_missing_credential() {
        "credential_required"
    } else {
        "error"
    };
    send_frame(
        socket,
        Frame::new(
            message_type,
            serde_json::json!({"message": err.to_string()}),
        ),
    )
    .await
}

// Handle one WebSocket connection. The socket task owns the session; it is
// created here and dropped when the client disconnects, with no state shared
// across connections.
async fn handle_socket(mut socket: WebSocket) {
    info!("New WebSocket connection established");

    let mut session = Session::new();
    driver::start_session(&mut session);

    // A key from the environment pre-authenticates the connection; otherwise
    // the client must send a credential frame before its first turn.
    let mut client: Option<ChatClient> = ChatClient::new(&config::OPENAI_API_KEY).ok();

    // Seed the browser with the visible transcript (system persona excluded).
    let visible: Vec<_> = session
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .cloned()
        .collect();
    let seeded = send_frame(
        &mut socket,
        Frame::new("transcript", serde_json::json!({"messages": visible})),
    )
    .await;
    if !seeded {
        warn!("Failed to send transcript seed to new WebSocket client");
        return;
    }

    while let Some(Ok(msg)) = socket.recv().await {
        let text = match msg {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => {
                info!("Client requested WebSocket close");
                break;
            }
            WsMessage::Binary(_) => {
                warn!("Received unexpected binary message from client");
                continue;
            }
            // Axum answers Pings automatically
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
        };

        let frame: Frame = match serde_json::from_str(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Ignoring malformed client frame: {}", e);
                continue;
            }
        };

        match frame.message_type.as_str() {
            "credential" => {
                let key = frame.payload["key"].as_str().unwrap_or_default();
                match ChatClient::new(key) {
                    Ok(chat_client) => {
                        client = Some(chat_client);
                        if !send_frame(
                            &mut socket,
                            Frame::new("info", serde_json::json!({"message": "API key accepted"})),
                        )
                        .await
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        if !send_error(&mut socket, &e).await {
                            break;
                        }
                    }
                }
            }
            "set_area" => {
                if let Some(area_id) = frame.payload["area_id"].as_str() {
                    info!("Switching active topic area to {}", area_id);
                    session.set_current_area(area_id);
                }
            }
            "user_turn" => {
                let turn = frame.payload["text"].as_str().unwrap_or_default().to_string();
                let Some(chat_client) = client.as_ref() else {
                    if !send_error(&mut socket, &AssessmentError::MissingCredential).await {
                        break;
                    }
                    continue;
                };
                if let Err(()) = run_turn(&mut socket, chat_client, &mut session, &turn).await {
                    break;
                }
            }
            "finish" => {
                session.mark_complete();
                let Some(chat_client) = client.as_ref() else {
                    if !send_error(&mut socket, &AssessmentError::MissingCredential).await {
                        break;
                    }
                    continue;
                };
                match report::generate(chat_client, session.responses()).await {
                    Ok(text) => {
                        if !send_frame(
                            &mut socket,
                            Frame::new("report", serde_json::json!({"text": text})),
                        )
                        .await
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Report generation failed: {}", e);
                        if !send_error(&mut socket, &e).await {
                            break;
                        }
                    }
                }
            }
            other => {
                warn!("Ignoring unknown client frame type: {}", other);
            }
        }
    }
    info!("WebSocket connection closed");
}

// Drives one dialogue turn, forwarding token fragments to the browser as
// they arrive. Returns Err(()) when the socket is gone.
async fn run_turn(
    socket: &mut WebSocket,
    client: &ChatClient,
    session: &mut Session,
    text: &str,
) -> Result<(), ()> {
    let (tx, mut rx) = mpsc::channel::<StreamEvent>(64);
    let mut drive = Box::pin(driver::submit_user_turn(client, session, text, tx));

    let result = loop {
        tokio::select! {
            res = &mut drive => break res,
            Some(event) = rx.recv() => {
                if !forward_event(socket, event).await {
                    return Err(());
                }
            }
        }
    };

    // The driver has finished; drain whatever fragments are still buffered.
    while let Ok(event) = rx.try_recv() {
        if !forward_event(socket, event).await {
            return Err(());
        }
    }

    match result {
        Ok(reply) => {
            if !send_frame(
                socket,
                Frame::new("turn_complete", serde_json::json!({"text": reply})),
            )
            .await
            {
                return Err(());
            }
        }
        Err(e) => {
            error!("User turn failed: {}", e);
            if !send_error(socket, &e).await {
                return Err(());
            }
        }
    }
    Ok(())
}

async fn forward_event(socket: &mut WebSocket, event: StreamEvent) -> bool {
    match event {
        StreamEvent::Text { text } => {
            send_frame(socket, Frame::new("token", serde_json::json!({"text": text}))).await
        }
        // Start/End/Error are implied by the transcript seed, turn_complete
        // and error frames.
        _ => true,
    }
}

pub async fn start_web_server(port: u16) -> Result<()> {
    let templates = create_minijinja_env().context("Failed to initialize template engine")?;

    let state = AppState {
        templates: Arc::new(templates),
    };

    // Build our application router
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
        .layer(TraceLayer::new_for_http()); // Add request logging

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
