//! Primary provider: Unsplash random photo search

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

const PROVIDER_NAME: &str = "Unsplash";

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    id: String,
    urls: UnsplashUrls,
    user: UnsplashUser,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: String,
    thumb: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: String,
}

impl From<UnsplashPhoto> for BackgroundCandidate {
    fn from(photo: UnsplashPhoto) -> Self {
        Self {
            id: photo.id,
            full_url: photo.urls.regular,
            thumbnail_url: photo.urls.thumb,
            attribution: format!("Photo by {} on {}", photo.user.name, PROVIDER_NAME),
        }
    }
}

/// `GET /photos/random?query=..&count=..&orientation=..` with a `Client-ID` header
pub struct UnsplashProvider {
    client: Client,
    config: ProviderConfig,
}

impl UnsplashProvider {
    #[must_use]
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    fn query_params(&self, query: &str, page_size: usize) -> Vec<(&'static str, String)> {
        vec![
            ("query", query.to_string()),
            ("count", page_size.to_string()),
            ("orientation", self.config.orientation.clone()),
        ]
    }
}

/// Decode a photo array into candidates
pub(crate) fn parse_photos(body: &[u8]) -> Result<Vec<BackgroundCandidate>> {
    let photos: Vec<UnsplashPhoto> = serde_json::from_slice(body).map_err(|e| {
        StudioError::source_fetch(PROVIDER_NAME, format!("malformed response: {}", e))
    })?;
    Ok(photos.into_iter().map(Into::into).collect())
}

#[async_trait]
impl CandidateImageProvider for UnsplashProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch(&self, query: &str, page_size: usize) -> Result<Vec<BackgroundCandidate>> {
        // Missing key reported as 401 without a request
        let Some(key) = self.config.api_key.as_deref() else {
            return Err(StudioError::SourceFetch {
                provider: PROVIDER_NAME.to_string(),
                status: Some(401),
                message: "no access key configured".to_string(),
            });
        };

        let request = self
            .client
            .get(&self.config.endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("Client-ID {}", key))
            .query(&self.query_params(query, page_size));

        let body = send_for_body(PROVIDER_NAME, request).await?;
        parse_photos(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api_key: Option<&str>) -> UnsplashProvider {
        let mut config = ProviderConfig::unsplash();
        config.api_key = api_key.map(str::to_string);
        let client = crate::http::build_client(std::time::Duration::from_secs(1)).unwrap();
        UnsplashProvider::new(client, config)
    }

    #[test]
    fn test_parse_photos() {
        let body = br#"[
            {
                "id": "Xy12",
                "urls": {"raw": "r", "full": "f", "regular": "https://u/regular.jpg", "thumb": "https://u/thumb.jpg"},
                "user": {"name": "Ana Lopez", "username": "ana"},
                "width": 4000
            }
        ]"#;

        let candidates = parse_photos(body).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0],
            BackgroundCandidate {
                id: "Xy12".to_string(),
                full_url: "https://u/regular.jpg".to_string(),
                thumbnail_url: "https://u/thumb.jpg".to_string(),
                attribution: "Photo by Ana Lopez on Unsplash".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_malformed_has_no_status() {
        let err = parse_photos(br#"{"errors": ["Rate Limit Exceeded"]}"#).unwrap_err();
        assert!(err.status().is_none());
        assert!(!err.is_fallback_eligible());
        assert!(err.to_string().contains("malformed response"));
    }

    #[test]
    fn test_query_params() {
        let params = provider(Some("k")).query_params("abstract background pattern", 12);
        assert_eq!(
            params,
            vec![
                ("query", "abstract background pattern".to_string()),
                ("count", "12".to_string()),
                ("orientation", "squarish".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let err = provider(None).fetch("texture", 12).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.is_fallback_eligible());
    }
}
