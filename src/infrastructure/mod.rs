//! Infrastructure layer - External service implementations

pub mod account;
pub mod api_key;
pub mod auth;
pub mod github;
pub mod llm;
pub mod logging;
pub mod storage;
pub mod summarizer;
