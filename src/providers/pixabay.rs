//! Secondary provider: Pixabay image search

use super::CandidateImageProvider;
use crate::{
    config::ProviderConfig,
    error::{Result, StudioError},
    http::send_for_body,
    types::BackgroundCandidate,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const PROVIDER_NAME: &str = "Pixabay";

/// Pixabay rejects `per_page` below this value
const MIN_PER_PAGE: usize = 3;

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    id: u64,
    #[serde(rename = "largeImageURL")]
    large_image_url: String,
    #[serde(rename = "previewURL")]
    preview_url: String,
    user: String,
}

impl From<PixabayHit> for BackgroundCandidate {
    fn from(hit: PixabayHit) -> Self {
        Self {
            id: hit.id.to_string(),
            full_url: hit.large_image_url,
            thumbnail_url: hit.preview_url,
            attribution: format!("Photo by {} on {}", hit.user, PROVIDER_NAME),
        }
    }
}

/// `GET /api/?key=..&q=..&per_page=..` with the key in the query string
pub struct PixabayProvider {
    client: Client,
    config: ProviderConfig,
}

impl PixabayProvider {
    #[must_use]
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    fn query_params(&self, key: &str, query: &str, page_size: usize) -> Vec<(&'static str, String)> {
        vec![
            ("key", key.to_string()),
            ("q", query.to_string()),
            ("per_page", page_size.max(MIN_PER_PAGE).to_string()),
            ("image_type", "photo".to_string()),
            ("orientation", self.config.orientation.clone()),
            ("safesearch", "true".to_string()),
            ("order", "popular".to_string()),
        ]
    }
}

/// Decode a search response into at most `page_size` candidates
pub(crate) fn parse_hits(body: &[u8], page_size: usize) -> Result<Vec<BackgroundCandidate>> {
    let response: PixabayResponse = serde_json::from_slice(body).map_err(|e| {
        StudioError::source_fetch(PROVIDER_NAME, format!("malformed response: {}", e))
    })?;
    Ok(response
        .hits
        .into_iter()
        .take(page_size)
        .map(Into::into)
        .collect())
}

#[async_trait]
impl CandidateImageProvider for PixabayProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch(&self, query: &str, page_size: usize) -> Result<Vec<BackgroundCandidate>> {
        let Some(key) = self.config.api_key.as_deref() else {
            return Err(StudioError::SourceFetch {
                provider: PROVIDER_NAME.to_string(),
                status: Some(401),
                message: "no API key configured".to_string(),
            });
        };

        let request = self
            .client
            .get(&self.config.endpoint)
            .query(&self.query_params(key, query, page_size));

        let body = send_for_body(PROVIDER_NAME, request).await?;
        parse_hits(&body, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = br#"{
        "total": 4692,
        "totalHits": 500,
        "hits": [
            {"id": 195893, "pageURL": "p", "largeImageURL": "https://px/large1.jpg", "previewURL": "https://px/prev1.jpg", "user": "Josch13"},
            {"id": 73424, "largeImageURL": "https://px/large2.jpg", "previewURL": "https://px/prev2.jpg", "user": "jill111"},
            {"id": 11, "largeImageURL": "https://px/large3.jpg", "previewURL": "https://px/prev3.jpg", "user": "x"}
        ]
    }"#;

    fn provider() -> PixabayProvider {
        let client = crate::http::build_client(std::time::Duration::from_secs(1)).unwrap();
        PixabayProvider::new(client, ProviderConfig::pixabay())
    }

    #[test]
    fn test_parse_hits() {
        let candidates = parse_hits(SAMPLE, 12).unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(
            candidates[0],
            BackgroundCandidate {
                id: "195893".to_string(),
                full_url: "https://px/large1.jpg".to_string(),
                thumbnail_url: "https://px/prev1.jpg".to_string(),
                attribution: "Photo by Josch13 on Pixabay".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_hits_respects_page_size() {
        let candidates = parse_hits(SAMPLE, 1).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "195893");
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_hits(b"[not json", 12).unwrap_err();
        assert!(matches!(err, StudioError::SourceFetch { status: None, .. }));
    }

    #[test]
    fn test_query_params() {
        let params = provider().query_params("secret", "gradient background", 12);
        assert_eq!(
            params,
            vec![
                ("key", "secret".to_string()),
                ("q", "gradient background".to_string()),
                ("per_page", "12".to_string()),
                ("image_type", "photo".to_string()),
                ("orientation", "horizontal".to_string()),
                ("safesearch", "true".to_string()),
                ("order", "popular".to_string()),
            ]
        );

        // Small pages are requested at the provider minimum and trimmed locally
        let params = provider().query_params("secret", "q", 1);
        assert!(params.contains(&("per_page", "3".to_string())));
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let err = provider().fetch("texture", 12).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }
}
