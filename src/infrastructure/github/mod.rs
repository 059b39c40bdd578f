//! GitHub REST API client

mod client;

pub use client::{DEFAULT_GITHUB_BASE_URL, GitHubClient};
