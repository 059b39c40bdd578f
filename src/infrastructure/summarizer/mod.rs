//! Repository summarization flow

mod service;

pub use service::{Summarized, SummarizerService};
