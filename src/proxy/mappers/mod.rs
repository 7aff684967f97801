pub mod chat;

pub use chat::{ChatRequest, UpstreamChatRequest};
