//! Mock providers for testing the fallback coordinator without network access

use super::CandidateImageProvider;
use crate::{
    error::{Result, StudioError},
    types::BackgroundCandidate,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Canned behaviour of a mock provider
#[derive(Debug, Clone, Copy)]
pub enum MockResponse {
    /// Answer with this many candidates
    Candidates(usize),
    /// Fail with this HTTP status
    Status(u16),
    /// Fail before any status was received
    Transport,
}

/// Provider that records every call and answers with a canned response
#[derive(Debug, Clone)]
pub struct MockProvider {
    name: String,
    response: MockResponse,
    call_history: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockProvider {
    #[must_use]
    pub fn new(name: &str, response: MockResponse) -> Self {
        Self {
            name: name.to_string(),
            response,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(query, page_size)` pairs received so far
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.call_history.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateImageProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: &str, page_size: usize) -> Result<Vec<BackgroundCandidate>> {
        self.call_history
            .lock()
            .unwrap()
            .push((query.to_string(), page_size));

        match self.response {
            MockResponse::Candidates(count) => Ok((0..count)
                .map(|i| BackgroundCandidate {
                    id: format!("{}-{}", self.name.to_lowercase(), i),
                    full_url: format!("https://{}.test/full/{}.jpg", self.name, i),
                    thumbnail_url: format!("https://{}.test/thumb/{}.jpg", self.name, i),
                    attribution: format!("Photo by Tester on {}", self.name),
                })
                .collect()),
            MockResponse::Status(status) => Err(StudioError::source_status(&self.name, status)),
            MockResponse::Transport => {
                Err(StudioError::source_fetch(&self.name, "connection refused"))
            },
        }
    }
}
