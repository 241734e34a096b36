//! Query state and accumulated background candidates
//!
//! A `CandidateFeed` holds the active query and every candidate fetched for it
//! so far. Fetches are started with a `FetchTicket` and applied afterwards; a
//! ticket issued before the query changed is discarded on arrival.

use crate::{
    error::{Result, StudioError},
    providers::CandidateSource,
    types::BackgroundCandidate,
};
use serde::Serialize;
use tracing::{debug, instrument};

/// Preset query shown as a category chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackgroundCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub query: &'static str,
}

pub const CATEGORIES: [BackgroundCategory; 8] = [
    BackgroundCategory { id: "all", name: "All", query: "background texture" },
    BackgroundCategory { id: "abstract", name: "Abstract", query: "abstract background pattern" },
    BackgroundCategory { id: "nature", name: "Nature", query: "nature landscape background" },
    BackgroundCategory { id: "gradient", name: "Gradient", query: "gradient background" },
    BackgroundCategory { id: "texture", name: "Texture", query: "texture pattern background" },
    BackgroundCategory { id: "minimal", name: "Minimal", query: "minimal clean background" },
    BackgroundCategory { id: "geometric", name: "Geometric", query: "geometric pattern background" },
    BackgroundCategory { id: "studio", name: "Studio", query: "studio backdrop background" },
];

impl BackgroundCategory {
    /// The `all` category, selected on start-up
    #[must_use]
    pub fn default_category() -> &'static Self {
        &CATEGORIES[0]
    }

    /// Look up a category by id
    ///
    /// # Errors
    /// - `StudioError::InvalidConfig` for unknown ids
    pub fn find(id: &str) -> Result<&'static Self> {
        CATEGORIES.iter().find(|c| c.id == id).ok_or_else(|| {
            let known: Vec<&str> = CATEGORIES.iter().map(|c| c.id).collect();
            StudioError::invalid_config(format!(
                "Unknown category '{}'. Available: {}",
                id,
                known.join(", ")
            ))
        })
    }
}

/// How fetched candidates are merged into the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// First page for a query
    Replace,
    /// "Load more"
    Append,
}

/// Token for one in-flight fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    query: String,
    mode: FetchMode,
}

impl FetchTicket {
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn mode(&self) -> FetchMode {
        self.mode
    }
}

/// Result of applying a finished fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedUpdate {
    Applied { added: usize, total: usize },
    /// The query changed while the fetch was in flight
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct CandidateFeed {
    query: String,
    candidates: Vec<BackgroundCandidate>,
    generation: u64,
}

impl CandidateFeed {
    #[must_use]
    pub fn new<S: Into<String>>(query: S) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Feed for a preset category
    #[must_use]
    pub fn for_category(category: &BackgroundCategory) -> Self {
        Self::new(category.query)
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn candidates(&self) -> &[BackgroundCandidate] {
        &self.candidates
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Find an accumulated candidate by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BackgroundCandidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Switch to `query`, clearing accumulated candidates if it differs
    ///
    /// Returns whether the query changed. Any fetch started before a change is
    /// reported as stale when applied.
    pub fn set_query<S: Into<String>>(&mut self, query: S) -> bool {
        let query = query.into();
        if query == self.query {
            return false;
        }
        debug!(from = %self.query, to = %query, "Query changed, clearing candidates");
        self.query = query;
        self.candidates.clear();
        self.generation += 1;
        true
    }

    #[must_use]
    pub fn begin_fetch(&self, mode: FetchMode) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            query: self.query.clone(),
            mode,
        }
    }

    /// Merge the candidates fetched for `ticket`
    pub fn apply(&mut self, ticket: FetchTicket, candidates: Vec<BackgroundCandidate>) -> FeedUpdate {
        if ticket.generation != self.generation {
            debug!(query = %ticket.query, "Discarding candidates for a previous query");
            return FeedUpdate::Stale;
        }

        let added = candidates.len();
        match ticket.mode {
            FetchMode::Replace => self.candidates = candidates,
            FetchMode::Append => self.candidates.extend(candidates),
        }
        FeedUpdate::Applied {
            added,
            total: self.candidates.len(),
        }
    }

    /// Fetch the first page for the current query, replacing the feed
    ///
    /// # Errors
    /// - Propagates the source's fetch error; the feed is left unchanged
    #[instrument(skip(self, source), fields(query = %self.query))]
    pub async fn refresh(&mut self, source: &CandidateSource, page_size: usize) -> Result<FeedUpdate> {
        self.fetch(source, page_size, FetchMode::Replace).await
    }

    /// Fetch another page for the current query and append it
    ///
    /// # Errors
    /// - Propagates the source's fetch error; the feed is left unchanged
    #[instrument(skip(self, source), fields(query = %self.query))]
    pub async fn load_more(&mut self, source: &CandidateSource, page_size: usize) -> Result<FeedUpdate> {
        self.fetch(source, page_size, FetchMode::Append).await
    }

    async fn fetch(
        &mut self,
        source: &CandidateSource,
        page_size: usize,
        mode: FetchMode,
    ) -> Result<FeedUpdate> {
        let ticket = self.begin_fetch(mode);
        let candidates = source.fetch_candidates(ticket.query(), page_size).await?;
        Ok(self.apply(ticket, candidates))
    }
}
