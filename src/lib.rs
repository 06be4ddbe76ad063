pub mod catalog;
pub mod chat;
pub mod config;
pub mod driver;
pub mod error;
pub mod openai;
pub mod report;
pub mod session;
pub mod web_server;

pub use error::AssessmentError;
pub use openai::{ChatClient, StreamEvent};
pub use session::{Message, ResponsePair, Role, Session};
