//! Repository summary domain
//!
//! Types describing a GitHub repository reference, the data fetched for it,
//! and the merged summary returned to callers, plus the traits of the two
//! external collaborators (repository data source and README summarizer).

mod entity;
mod provider;

pub use entity::{
    LicenseInfo, ReadmeSummary, RepositoryData, RepositoryMetadata, RepositoryRef,
    RepositorySummary,
};
pub use provider::{ReadmeSummarizer, RepositoryFetcher};

#[cfg(test)]
pub use provider::{MockReadmeSummarizer, MockRepositoryFetcher};
