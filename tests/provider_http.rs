//! Provider behaviour over real HTTP
//!
//! Each test serves canned responses from a local listener so the status
//! handling in the Unsplash and Pixabay clients runs against actual
//! HTTP/1.1 exchanges.

use backdrop_studio::{
    CandidateImageProvider, CandidateSource, PixabayProvider, ProviderConfig,
    StudioError, UnsplashProvider,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const UNSPLASH_BODY: &str = r#"[
    {"id": "a1", "urls": {"regular": "https://u/a1.jpg", "thumb": "https://u/a1-t.jpg"}, "user": {"name": "Ana"}},
    {"id": "b2", "urls": {"regular": "https://u/b2.jpg", "thumb": "https://u/b2-t.jpg"}, "user": {"name": "Ben"}}
]"#;

const PIXABAY_BODY: &str = r#"{"total": 2, "totalHits": 2, "hits": [
    {"id": 101, "largeImageURL": "https://px/101.jpg", "previewURL": "https://px/101-p.jpg", "user": "kim"},
    {"id": 202, "largeImageURL": "https://px/202.jpg", "previewURL": "https://px/202-p.jpg", "user": "lee"}
]}"#;

/// Local server answering every request with one canned response
struct CannedServer {
    endpoint: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    async fn start(status: u16, reason: &str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/search", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let head = read_head(&mut stream).await;
                seen.lock().unwrap().push(head);
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self { endpoint, requests }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn first_request(&self) -> String {
        self.requests.lock().unwrap().first().cloned().unwrap_or_default()
    }
}

async fn read_head(stream: &mut tokio::net::TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// Client that talks to the local listener directly, ignoring proxy settings
fn local_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn unsplash(endpoint: &str) -> UnsplashProvider {
    let mut config = ProviderConfig::unsplash();
    config.endpoint = endpoint.to_string();
    config.api_key = Some("u-key".to_string());
    UnsplashProvider::new(local_client(), config)
}

fn pixabay(endpoint: &str) -> PixabayProvider {
    let mut config = ProviderConfig::pixabay();
    config.endpoint = endpoint.to_string();
    config.api_key = Some("p-key".to_string());
    PixabayProvider::new(local_client(), config)
}

#[tokio::test]
async fn test_unsplash_rate_limit_is_fallback_eligible() {
    let server = CannedServer::start(429, "Too Many Requests", "Rate Limit Exceeded").await;

    let err = unsplash(&server.endpoint).fetch("gradient background", 4).await.unwrap_err();

    assert_eq!(err.status(), Some(429));
    assert!(err.is_fallback_eligible());
    assert!(matches!(err, StudioError::SourceFetch { ref provider, .. } if provider == "Unsplash"));
}

#[tokio::test]
async fn test_status_classification_over_http() {
    for (status, reason, eligible) in [
        (401, "Unauthorized", true),
        (403, "Forbidden", true),
        (404, "Not Found", false),
        (500, "Internal Server Error", false),
        (503, "Service Unavailable", false),
    ] {
        let server = CannedServer::start(status, reason, "{}").await;

        let err = unsplash(&server.endpoint).fetch("q", 2).await.unwrap_err();
        assert_eq!(err.status(), Some(status));
        assert_eq!(err.is_fallback_eligible(), eligible, "unsplash {status}");

        let err = pixabay(&server.endpoint).fetch("q", 2).await.unwrap_err();
        assert_eq!(err.status(), Some(status));
        assert_eq!(err.is_fallback_eligible(), eligible, "pixabay {status}");
    }
}

#[tokio::test]
async fn test_successful_responses_are_mapped() {
    let server = CannedServer::start(200, "OK", UNSPLASH_BODY).await;
    let candidates = unsplash(&server.endpoint).fetch("minimal clean background", 2).await.unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].attribution, "Photo by Ana on Unsplash");

    let head = server.first_request();
    assert!(head.starts_with("GET /search?"));
    assert!(head.contains("count=2"));
    assert!(head.contains("orientation=squarish"));
    assert!(head.to_ascii_lowercase().contains("authorization: client-id u-key"));

    let server = CannedServer::start(200, "OK", PIXABAY_BODY).await;
    let candidates = pixabay(&server.endpoint).fetch("minimal clean background", 2).await.unwrap();
    assert_eq!(candidates[1].id, "202");
    assert_eq!(candidates[1].attribution, "Photo by lee on Pixabay");

    let head = server.first_request();
    assert!(head.contains("key=p-key"));
    assert!(head.contains("per_page=3"));
    assert!(head.contains("safesearch=true"));
}

#[tokio::test]
async fn test_source_falls_back_after_primary_rate_limit() {
    let primary = CannedServer::start(429, "Too Many Requests", "{}").await;
    let secondary = CannedServer::start(200, "OK", PIXABAY_BODY).await;
    let source = CandidateSource::new(vec![
        Box::new(unsplash(&primary.endpoint)),
        Box::new(pixabay(&secondary.endpoint)),
    ]);

    let outcome = source.fetch_with_provider("studio backdrop background", 2).await.unwrap();

    assert_eq!(outcome.provider, "Pixabay");
    assert_eq!(outcome.candidates.len(), 2);
    assert_eq!(primary.request_count(), 1);
    assert_eq!(secondary.request_count(), 1);
}

#[tokio::test]
async fn test_source_does_not_fall_back_after_server_error() {
    let primary = CannedServer::start(500, "Internal Server Error", "{}").await;
    let secondary = CannedServer::start(200, "OK", PIXABAY_BODY).await;
    let source = CandidateSource::new(vec![
        Box::new(unsplash(&primary.endpoint)),
        Box::new(pixabay(&secondary.endpoint)),
    ]);

    let err = source.fetch_candidates("studio backdrop background", 2).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(primary.request_count(), 1);
    assert_eq!(secondary.request_count(), 0);
}

#[tokio::test]
async fn test_secondary_failure_propagates() {
    let primary = CannedServer::start(403, "Forbidden", "{}").await;
    let secondary = CannedServer::start(429, "Too Many Requests", "{}").await;
    let source = CandidateSource::new(vec![
        Box::new(unsplash(&primary.endpoint)),
        Box::new(pixabay(&secondary.endpoint)),
    ]);

    let err = source.fetch_candidates("q", 2).await.unwrap_err();

    assert!(matches!(err, StudioError::SourceFetch { ref provider, status: Some(429), .. } if provider == "Pixabay"));
    assert_eq!(secondary.request_count(), 1);
}
