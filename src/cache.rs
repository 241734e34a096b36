//! Single-entry cache for the current upload's cutout
//!
//! Background removal is a paid remote call, so its result is kept for the
//! lifetime of the upload it was computed for. A lookup for any other upload
//! misses, and `invalidate` drops the entry outright when a new image arrives.

use crate::types::{CutoutImage, UploadId};

/// Hit/miss counters since the cache was created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutoutCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of times an entry was dropped by `invalidate`
    pub invalidations: u64,
}

impl CutoutCacheStats {
    /// Hit ratio as a percentage, 0 when nothing has been looked up
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Debug, Default)]
pub struct CutoutCache {
    entry: Option<CutoutImage>,
    stats: CutoutCacheStats,
}

impl CutoutCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached cutout for `upload`, if one was stored for exactly that upload
    pub fn get(&mut self, upload: UploadId) -> Option<CutoutImage> {
        match &self.entry {
            Some(cutout) if cutout.source() == upload => {
                self.stats.hits += 1;
                Some(cutout.clone())
            },
            _ => {
                self.stats.misses += 1;
                None
            },
        }
    }

    /// Whether a cutout for `upload` is held, without touching the counters
    #[must_use]
    pub fn contains(&self, upload: UploadId) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|cutout| cutout.source() == upload)
    }

    /// Replace the entry with `cutout`
    pub fn store(&mut self, cutout: CutoutImage) {
        log::debug!("Caching cutout for {}", cutout.source());
        self.entry = Some(cutout);
    }

    /// Drop the cached cutout, if any
    pub fn invalidate(&mut self) {
        if let Some(old) = self.entry.take() {
            log::debug!("Invalidated cutout for {}", old.source());
            self.stats.invalidations += 1;
        }
    }

    #[must_use]
    pub fn stats(&self) -> &CutoutCacheStats {
        &self.stats
    }
}
