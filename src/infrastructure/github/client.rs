use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{
    DomainError, LicenseInfo, RepositoryData, RepositoryFetcher, RepositoryMetadata,
    RepositoryRef,
};

pub const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";

const SOURCE: &str = "github";
const ACCEPT_RAW: &str = "application/vnd.github.v3.raw";
const ACCEPT_JSON: &str = "application/vnd.github.v3+json";

/// Fetches README, metadata and latest release of a repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    user_agent: String,
}

impl GitHubClient {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build GitHub client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: DEFAULT_GITHUB_BASE_URL.to_string(),
            token: None,
            user_agent: env!("CARGO_PKG_NAME").to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn repo_url(&self, repository: &RepositoryRef) -> String {
        format!(
            "{}/repos/{}/{}",
            self.base_url,
            repository.owner(),
            repository.name()
        )
    }

    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response, DomainError> {
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, accept)
            .header(USER_AGENT, &self.user_agent);

        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        request
            .send()
            .await
            .map_err(|e| DomainError::upstream(SOURCE, format!("Request failed: {}", e)))
    }

    async fn fetch_readme(&self, base: &str) -> Result<String, DomainError> {
        let response = self.get(&format!("{}/readme", base), ACCEPT_RAW).await?;
        let response = ensure_success(response, "README").await?;

        response
            .text()
            .await
            .map_err(|e| DomainError::upstream(SOURCE, format!("Failed to read README: {}", e)))
    }

    async fn fetch_metadata(&self, base: &str) -> Result<RepositoryMetadata, DomainError> {
        let response = self.get(base, ACCEPT_JSON).await?;
        let response = ensure_success(response, "repository data").await?;

        let repo: GitHubRepo = response.json().await.map_err(|e| {
            DomainError::upstream(SOURCE, format!("Failed to parse repository data: {}", e))
        })?;

        Ok(repo.into())
    }

    /// Repositories without releases answer 404; any failure here yields `None`.
    async fn fetch_latest_version(&self, base: &str) -> Option<String> {
        let response = match self
            .get(&format!("{}/releases/latest", base), ACCEPT_JSON)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Latest release lookup failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "No latest release");
            return None;
        }

        match response.json::<GitHubRelease>().await {
            Ok(release) => Some(release.tag_name),
            Err(e) => {
                warn!(error = %e, "Failed to parse latest release");
                None
            }
        }
    }
}

#[async_trait]
impl RepositoryFetcher for GitHubClient {
    async fn fetch(&self, repository: &RepositoryRef) -> Result<RepositoryData, DomainError> {
        let base = self.repo_url(repository);
        debug!(repository = %repository, "Fetching repository from GitHub");

        let (readme, metadata, latest_version) = futures::join!(
            self.fetch_readme(&base),
            self.fetch_metadata(&base),
            self.fetch_latest_version(&base),
        );

        Ok(RepositoryData {
            readme: readme?,
            metadata: metadata?,
            latest_version,
        })
    }
}

async fn ensure_success(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, DomainError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(DomainError::upstream(
        SOURCE,
        format!("Failed to fetch {}: HTTP {}: {}", what, status, body),
    ))
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    #[serde(default)]
    stargazers_count: u64,
    homepage: Option<String>,
    license: Option<GitHubLicense>,
}

#[derive(Debug, Deserialize)]
struct GitHubLicense {
    name: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
}

impl From<GitHubRepo> for RepositoryMetadata {
    fn from(repo: GitHubRepo) -> Self {
        Self {
            stars: repo.stargazers_count,
            homepage: repo.homepage.filter(|h| !h.trim().is_empty()),
            license: repo.license.and_then(|l| {
                l.name.map(|name| LicenseInfo { name, url: l.url })
            }),
        }
    }
}
