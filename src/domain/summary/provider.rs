//! External collaborators of the summarizer endpoint

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{ReadmeSummary, RepositoryData, RepositoryRef};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Source of README text and repository metadata
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RepositoryFetcher: Send + Sync + Debug {
    /// Fetch README, metadata and latest release. A missing release is not
    /// an error and yields `latest_version: None`.
    async fn fetch(&self, repository: &RepositoryRef) -> Result<RepositoryData, DomainError>;
}

/// Turns README text into a summary and a list of facts
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReadmeSummarizer: Send + Sync + Debug {
    async fn summarize(&self, readme: &str) -> Result<ReadmeSummary, DomainError>;
}
