//! Summarizer model client

mod http_client;
mod summarizer;

pub use http_client::{HttpClient, HttpClientTrait};
pub use summarizer::{ChatReadmeSummarizer, DEFAULT_SUMMARIZER_BASE_URL, DEFAULT_SUMMARIZER_MODEL};
