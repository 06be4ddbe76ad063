// Environment-derived settings, loaded once via dotenvy in main.

use std::env;

// Use lazy_static to initialize static variables safely.
lazy_static::lazy_static! {
    /// Base URL of the OpenAI-compatible API. Overridable so tests can point
    /// at a local mock server.
    pub static ref OPENAI_BASE_URL: String = env::var("OPENAI_BASE_URL")
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

    /// Credential for the chat completion API. An empty value short-circuits
    /// all remote calls with a prompt to supply one.
    pub static ref OPENAI_API_KEY: String = env::var("OPENAI_API_KEY").unwrap_or_default();

    /// Model used for both the assessment dialogue and the final report.
    pub static ref CHAT_MODEL: String = env::var("READINESS_CHAT_MODEL")
        .unwrap_or_else(|_| "gpt-4".to_string());

    // Embedded third-party chat widget (alternate UI path). The widget is a
    // black box reachable only through these embed parameters; when the
    // prompt id and licensing key are both set, the index page renders the
    // embed instead of the native chat.
    pub static ref WIDGET_PROMPT_ID: String = env::var("WIDGET_PROMPT_ID").unwrap_or_default();
    pub static ref WIDGET_LICENSING_KEY: String =
        env::var("WIDGET_LICENSING_KEY").unwrap_or_default();
    pub static ref WIDGET_VISIBLE: bool = env::var("WIDGET_VISIBLE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
}

/// Whether the opaque widget path is configured at all.
pub fn widget_enabled() -> bool {
    !WIDGET_PROMPT_ID.is_empty() && !WIDGET_LICENSING_KEY.is_empty()
}
