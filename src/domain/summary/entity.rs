//! Repository summary entities

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// GitHub repository URL: optional scheme and www, then owner and repo,
/// then anything (tree paths, query, fragment).
static GITHUB_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?github\.com/(?P<owner>[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)/(?P<repo>[A-Za-z0-9._-]+?)(?:\.git)?(?:[/?#].*)?$",
    )
    .unwrap()
});

/// Owner/repository pair parsed from a GitHub URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    owner: String,
    name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse a repository URL such as `https://github.com/owner/repo`
    pub fn parse(url: &str) -> Result<Self, DomainError> {
        let url = url.trim();

        let captures = GITHUB_URL_PATTERN.captures(url).ok_or_else(|| {
            DomainError::validation(format!("Invalid GitHub repository URL: '{}'", url))
        })?;

        let owner = &captures["owner"];
        let name = &captures["repo"];

        if name == "." || name == ".." {
            return Err(DomainError::validation(format!(
                "Invalid GitHub repository URL: '{}'",
                url
            )));
        }

        Ok(Self::new(owner, name))
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// License as reported by the repository host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub name: String,
    pub url: Option<String>,
}

/// Repository metadata merged into every summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryMetadata {
    pub stars: u64,
    pub homepage: Option<String>,
    pub license: Option<LicenseInfo>,
}

/// Everything fetched for a repository before summarization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryData {
    pub readme: String,
    pub metadata: RepositoryMetadata,
    /// Tag of the latest release, absent when the repository has none
    pub latest_version: Option<String>,
}

/// Structured output of the README summarizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadmeSummary {
    pub summary: String,
    #[serde(default)]
    pub cool_facts: Vec<String>,
}

/// Response body of the summarizer endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub summary: String,
    pub cool_facts: Vec<String>,
    pub stars: u64,
    #[serde(rename = "latestVersion")]
    pub latest_version: Option<String>,
    pub website: Option<String>,
    pub license: Option<LicenseInfo>,
}

impl RepositorySummary {
    /// Merge generated text with the fetched repository metadata
    pub fn merge(generated: ReadmeSummary, data: RepositoryData) -> Self {
        Self {
            summary: generated.summary,
            cool_facts: generated.cool_facts,
            stars: data.metadata.stars,
            latest_version: data.latest_version,
            website: data.metadata.homepage,
            license: data.metadata.license,
        }
    }
}
