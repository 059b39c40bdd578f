//! Summarizer service
//!
//! Admission runs before any external call: a rejected request never reaches
//! GitHub or the model.

use std::sync::Arc;

use tracing::{error, info};

use crate::domain::api_key::ApiKeyRepository;
use crate::domain::{
    DomainError, ReadmeSummarizer, RepositoryFetcher, RepositoryRef, RepositorySummary,
};
use crate::infrastructure::api_key::{Admission, QuotaLimiter};

/// A produced summary with the admission that paid for it
#[derive(Debug, Clone)]
pub struct Summarized {
    pub summary: RepositorySummary,
    pub admission: Admission,
}

pub struct SummarizerService<R>
where
    R: ApiKeyRepository,
{
    limiter: QuotaLimiter<R>,
    fetcher: Arc<dyn RepositoryFetcher>,
    summarizer: Arc<dyn ReadmeSummarizer>,
}

impl<R: ApiKeyRepository> std::fmt::Debug for SummarizerService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizerService")
            .field("limiter", &self.limiter)
            .field("fetcher", &self.fetcher)
            .field("summarizer", &self.summarizer)
            .finish()
    }
}

impl<R: ApiKeyRepository> SummarizerService<R> {
    pub fn new(
        repository: Arc<R>,
        fetcher: Arc<dyn RepositoryFetcher>,
        summarizer: Arc<dyn ReadmeSummarizer>,
    ) -> Self {
        Self {
            limiter: QuotaLimiter::new(repository),
            fetcher,
            summarizer,
        }
    }

    /// Summarize the repository at `repository_url`, charging one call to the key.
    pub async fn handle(
        &self,
        secret: &str,
        repository_url: &str,
    ) -> Result<Summarized, DomainError> {
        if secret.trim().is_empty() {
            return Err(DomainError::validation("API key is required"));
        }
        if repository_url.trim().is_empty() {
            return Err(DomainError::validation("Repository URL is required"));
        }

        let repository = RepositoryRef::parse(repository_url)?;

        let admission = self.limiter.check_and_consume(secret).await?.into_result()?;

        let data = self.fetcher.fetch(&repository).await.map_err(|e| {
            error!(repository = %repository, error = %e, "Failed to fetch repository data");
            e
        })?;

        let generated = self.summarizer.summarize(&data.readme).await.map_err(|e| {
            error!(repository = %repository, error = %e, "Failed to summarize README");
            e
        })?;

        info!(
            repository = %repository,
            key_id = %admission.key_id,
            usage = admission.usage,
            "Repository summarized"
        );

        Ok(Summarized {
            summary: RepositorySummary::merge(generated, data),
            admission,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountId;
    use crate::domain::api_key::ApiKey;
    use crate::domain::summary::{MockReadmeSummarizer, MockRepositoryFetcher};
    use crate::domain::{LicenseInfo, ReadmeSummary, RepositoryData, RepositoryMetadata};
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;

    const SECRET: &str = "rsg_summarize";

    async fn repository_with(key: ApiKey) -> Arc<InMemoryApiKeyRepository> {
        let repository = Arc::new(InMemoryApiKeyRepository::new());
        repository.create(key).await.unwrap();
        repository
    }

    fn data(latest_version: Option<&str>) -> RepositoryData {
        RepositoryData {
            readme: "# axum".to_string(),
            metadata: RepositoryMetadata {
                stars: 42,
                homepage: Some("https://docs.rs/axum".to_string()),
                license: Some(LicenseInfo {
                    name: "MIT License".to_string(),
                    url: None,
                }),
            },
            latest_version: latest_version.map(str::to_string),
        }
    }

    fn fetcher_returning(result: RepositoryData) -> MockRepositoryFetcher {
        let mut fetcher = MockRepositoryFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|repo| repo.owner() == "tokio-rs" && repo.name() == "axum")
            .times(1)
            .returning(move |_| Ok(result.clone()));
        fetcher
    }

    fn summarizer_returning() -> MockReadmeSummarizer {
        let mut summarizer = MockReadmeSummarizer::new();
        summarizer
            .expect_summarize()
            .withf(|readme| readme == "# axum")
            .times(1)
            .returning(|_| {
                Ok(ReadmeSummary {
                    summary: "Ergonomic web framework".to_string(),
                    cool_facts: vec!["Built on tower".to_string()],
                })
            });
        summarizer
    }

    fn untouched_fetcher() -> MockRepositoryFetcher {
        let mut fetcher = MockRepositoryFetcher::new();
        fetcher.expect_fetch().never();
        fetcher
    }

    fn untouched_summarizer() -> MockReadmeSummarizer {
        let mut summarizer = MockReadmeSummarizer::new();
        summarizer.expect_summarize().never();
        summarizer
    }

    #[tokio::test]
    async fn test_handle_success_merges_metadata() {
        let key = ApiKey::new("cli", SECRET, AccountId::generate());
        let key_id = *key.id();
        let repository = repository_with(key).await;
        let service = SummarizerService::new(
            Arc::clone(&repository),
            Arc::new(fetcher_returning(data(Some("v0.8.1")))),
            Arc::new(summarizer_returning()),
        );

        let result = service
            .handle(SECRET, "https://github.com/tokio-rs/axum")
            .await
            .unwrap();

        assert_eq!(result.summary.summary, "Ergonomic web framework");
        assert_eq!(result.summary.cool_facts, vec!["Built on tower"]);
        assert_eq!(result.summary.stars, 42);
        assert_eq!(result.summary.latest_version.as_deref(), Some("v0.8.1"));
        assert_eq!(result.summary.website.as_deref(), Some("https://docs.rs/axum"));
        assert_eq!(result.admission.usage, 1);

        let stored = repository.get(&key_id).await.unwrap().unwrap();
        assert_eq!(stored.usage(), 1);
    }

    #[tokio::test]
    async fn test_handle_without_release() {
        let repository = repository_with(ApiKey::new("cli", SECRET, AccountId::generate())).await;
        let service = SummarizerService::new(
            repository,
            Arc::new(fetcher_returning(data(None))),
            Arc::new(summarizer_returning()),
        );

        let result = service
            .handle(SECRET, "https://github.com/tokio-rs/axum")
            .await
            .unwrap();

        assert_eq!(result.summary.latest_version, None);
        assert_eq!(result.summary.summary, "Ergonomic web framework");
        assert_eq!(result.summary.stars, 42);
    }

    #[tokio::test]
    async fn test_handle_malformed_url_consumes_nothing() {
        let key = ApiKey::new("cli", SECRET, AccountId::generate()).with_monthly_limit(Some(5));
        let key_id = *key.id();
        let repository = repository_with(key).await;
        let service = SummarizerService::new(
            Arc::clone(&repository),
            Arc::new(untouched_fetcher()),
            Arc::new(untouched_summarizer()),
        );

        let result = service.handle(SECRET, "not-a-url").await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        let stored = repository.get(&key_id).await.unwrap().unwrap();
        assert_eq!(stored.usage(), 0);
    }

    #[tokio::test]
    async fn test_handle_missing_inputs() {
        let repository = Arc::new(InMemoryApiKeyRepository::new());
        let service = SummarizerService::new(
            repository,
            Arc::new(untouched_fetcher()),
            Arc::new(untouched_summarizer()),
        );

        match service.handle("", "https://github.com/tokio-rs/axum").await {
            Err(DomainError::Validation { message }) => assert_eq!(message, "API key is required"),
            other => panic!("unexpected result: {:?}", other),
        }

        match service.handle(SECRET, "  ").await {
            Err(DomainError::Validation { message }) => {
                assert_eq!(message, "Repository URL is required")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handle_invalid_key_short_circuits() {
        let repository = Arc::new(InMemoryApiKeyRepository::new());
        let service = SummarizerService::new(
            repository,
            Arc::new(untouched_fetcher()),
            Arc::new(untouched_summarizer()),
        );

        let result = service
            .handle("rsg_unknown", "https://github.com/tokio-rs/axum")
            .await;

        assert!(matches!(result, Err(DomainError::InvalidKey)));
    }

    #[tokio::test]
    async fn test_handle_quota_exceeded_short_circuits() {
        let key = ApiKey::new("cli", SECRET, AccountId::generate())
            .with_monthly_limit(Some(2))
            .with_usage(2);
        let repository = repository_with(key).await;
        let service = SummarizerService::new(
            repository,
            Arc::new(untouched_fetcher()),
            Arc::new(untouched_summarizer()),
        );

        let result = service
            .handle(SECRET, "https://github.com/tokio-rs/axum")
            .await;

        assert!(matches!(
            result,
            Err(DomainError::QuotaExceeded { usage: 2, limit: 2 })
        ));
    }

    #[tokio::test]
    async fn test_handle_fetch_failure_skips_model() {
        let repository = repository_with(ApiKey::new("cli", SECRET, AccountId::generate())).await;
        let mut fetcher = MockRepositoryFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(DomainError::upstream("github", "HTTP 404")));

        let service = SummarizerService::new(
            repository,
            Arc::new(fetcher),
            Arc::new(untouched_summarizer()),
        );

        let result = service
            .handle(SECRET, "https://github.com/tokio-rs/axum")
            .await;

        assert!(matches!(result, Err(DomainError::Upstream { .. })));
    }
}
