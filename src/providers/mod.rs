//! Candidate background providers and the fallback coordinator
//!
//! Each provider speaks its own HTTP dialect but returns the same
//! `BackgroundCandidate` shape. `CandidateSource` walks an ordered list of
//! providers and only moves to the next one when the current provider reports
//! exhausted quota or rejected credentials (HTTP 401/403/429).

pub mod pixabay;
pub mod unsplash;

#[cfg(test)]
pub mod test_utils;

pub use self::pixabay::PixabayProvider;
pub use self::unsplash::UnsplashProvider;

use crate::{
    config::StudioConfig,
    error::{Result, StudioError},
    types::BackgroundCandidate,
};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument, warn};

/// A stock photo service able to answer a free-text query
#[async_trait]
pub trait CandidateImageProvider: Send + Sync {
    /// Display name used in attribution and logs
    fn name(&self) -> &str;

    /// Fetch up to `page_size` candidates for `query`
    ///
    /// # Errors
    /// - `StudioError::SourceFetch` carrying the HTTP status when the provider
    ///   answered with a non-success code, or no status for transport and
    ///   decode failures
    async fn fetch(&self, query: &str, page_size: usize) -> Result<Vec<BackgroundCandidate>>;
}

/// Candidates together with the provider that produced them
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub provider: String,
    pub candidates: Vec<BackgroundCandidate>,
}

/// Fallback-chained candidate client
///
/// Stateless between calls: pagination and accumulation belong to the caller
/// (see `CandidateFeed`).
pub struct CandidateSource {
    providers: Vec<Box<dyn CandidateImageProvider>>,
}

impl CandidateSource {
    /// Create a source over an ordered provider list, primary first
    #[must_use]
    pub fn new(providers: Vec<Box<dyn CandidateImageProvider>>) -> Self {
        Self { providers }
    }

    /// Primary Unsplash, secondary Pixabay, sharing one HTTP client
    #[must_use]
    pub fn from_config(config: &StudioConfig, client: Client) -> Self {
        Self::new(vec![
            Box::new(UnsplashProvider::new(client.clone(), config.primary.clone())),
            Box::new(PixabayProvider::new(client, config.secondary.clone())),
        ])
    }

    /// Names of the configured providers in fallback order
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve a query into one page of candidates
    ///
    /// # Errors
    /// - The first non-fallback error from any provider
    /// - The last provider's error when every provider was exhausted
    pub async fn fetch_candidates(
        &self,
        query: &str,
        page_size: usize,
    ) -> Result<Vec<BackgroundCandidate>> {
        self.fetch_with_provider(query, page_size)
            .await
            .map(|outcome| outcome.candidates)
    }

    /// Like `fetch_candidates`, also reporting which provider answered
    #[instrument(skip(self), fields(providers = self.providers.len()))]
    pub async fn fetch_with_provider(&self, query: &str, page_size: usize) -> Result<FetchOutcome> {
        let mut providers = self.providers.iter().peekable();

        while let Some(provider) = providers.next() {
            match provider.fetch(query, page_size).await {
                Ok(candidates) => {
                    info!(
                        provider = provider.name(),
                        count = candidates.len(),
                        "Fetched background candidates"
                    );
                    return Ok(FetchOutcome {
                        provider: provider.name().to_string(),
                        candidates,
                    });
                },
                Err(e) if e.is_fallback_eligible() && providers.peek().is_some() => {
                    warn!(
                        provider = provider.name(),
                        status = e.status(),
                        "Provider unavailable, falling back to next provider"
                    );
                },
                Err(e) => return Err(e),
            }
        }

        Err(StudioError::source_fetch(
            "none",
            "no candidate providers configured",
        ))
    }
}
