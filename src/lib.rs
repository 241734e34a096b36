#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Backdrop Studio
//!
//! Background replacement and social-media export. A user photo is sent to a
//! background-removal service once, the cutout is composited over a stock
//! background chosen from Unsplash (with automatic fallback to Pixabay), a
//! colour effect is applied and the result is exported sized for an
//! Instagram, Facebook or WhatsApp layout.
//!
//! ## Features
//!
//! - **Removal service**: remove.bg over multipart HTTP, cached per upload
//! - **Candidate sourcing**: Unsplash first, Pixabay when Unsplash answers
//!   401, 403 or 429
//! - **Compositing**: cutout scaled to 80% of the fitting size and centred
//! - **Effects**: brightness, contrast, warm, cool and vintage presets with
//!   CSS filter semantics
//! - **Layouts**: cover-fitted PNG export named `{brand}-{platform}-{date}.png`
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use backdrop_studio::{
//!     layout, CandidateSource, Effect, ExportRequest, StudioConfig, StudioSession,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = StudioConfig::from_env();
//! let client = backdrop_studio::http::build_client(config.request_timeout())?;
//! let source = CandidateSource::from_config(&config, client);
//! let candidates = source.fetch_candidates("studio backdrop background", 12).await?;
//!
//! let mut session = StudioSession::from_config(&config)?;
//! session.upload(std::fs::read("portrait.jpg")?, Some("portrait.jpg"));
//! session.select_background(&candidates[0]).await?;
//!
//! let request = ExportRequest::new("Acme Co", layout::find("instagram-post")?, Effect::Warm);
//! let exported = session.export(&request)?;
//! exported.save_to("exports").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): Command-line interface and progress reporting
//! - `webp-support` (default): WebP upload support
//! - `tracing-json`: JSON log output for the CLI

pub mod backends;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compositor;
pub mod config;
pub mod effects;
pub mod error;
pub mod export;
pub mod feed;
pub mod http;
pub mod layout;
pub mod providers;
pub mod removal;
pub mod services;
pub mod session;
pub mod tracing_config;
pub mod types;

// Public API exports
pub use backends::RemoveBgBackend;
pub use cache::{CutoutCache, CutoutCacheStats};
pub use compositor::{
    composite_images, subject_placement, Compositor, HttpImageLoader, ImageLoader, Placement,
    SUBJECT_SCALE,
};
pub use config::{ProviderConfig, RemovalServiceConfig, StudioConfig, StudioConfigBuilder};
pub use effects::{Effect, FilterOp};
pub use error::{Result, StudioError};
pub use export::{
    brand_handle, brand_slug, export_file_name, render_export, ExportRequest, ExportedImage,
};
pub use feed::{BackgroundCategory, CandidateFeed, FeedUpdate, FetchMode, FetchTicket};
pub use layout::{fit_cover, Platform, PreviewLayout, LAYOUTS};
pub use providers::{
    CandidateImageProvider, CandidateSource, FetchOutcome, PixabayProvider, UnsplashProvider,
};
pub use removal::BackgroundRemover;
pub use services::{
    ConsoleProgressReporter, NoOpProgressReporter, PipelineTimings, ProcessingStage,
    ProgressReporter, ProgressTracker, ProgressUpdate, UploadIOService,
};
pub use session::{
    RemovalOutcome, RemovalTicket, SelectionOutcome, SelectionTicket, StudioSession,
};
pub use types::{BackgroundCandidate, CompositeResult, CutoutImage, UploadId, UploadedImage};

#[cfg(feature = "cli")]
pub use tracing_config::init_cli_tracing;
pub use tracing_config::{events, spans, TracingConfig, TracingFormat};

/// Resolve `query` into one page of candidates using the configured providers
///
/// # Examples
///
/// ```rust,no_run
/// use backdrop_studio::{fetch_candidates, StudioConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = StudioConfig::from_env();
/// for candidate in fetch_candidates("gradient background", &config).await? {
///     println!("{} ({})", candidate.full_url, candidate.attribution);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn fetch_candidates(query: &str, config: &StudioConfig) -> Result<Vec<BackgroundCandidate>> {
    config.validate()?;
    let client = http::build_client(config.request_timeout())?;
    CandidateSource::from_config(config, client)
        .fetch_candidates(query, config.page_size)
        .await
}

/// Replace the background of `image_bytes` with `background` in one call
///
/// Uses a throwaway session, so the cutout is not reused across calls. Keep
/// a `StudioSession` to try several backgrounds on one upload.
///
/// # Examples
///
/// ```rust,no_run
/// use backdrop_studio::{replace_background, BackgroundCandidate, StudioConfig};
///
/// # async fn example(photo: Vec<u8>) -> anyhow::Result<()> {
/// let background = BackgroundCandidate {
///     id: "local".to_string(),
///     full_url: "backgrounds/beach.jpg".to_string(),
///     thumbnail_url: String::new(),
///     attribution: String::new(),
/// };
/// let result = replace_background(&photo, &background, &StudioConfig::from_env()).await?;
/// std::fs::write("composite.png", &result.png)?;
/// # Ok(())
/// # }
/// ```
pub async fn replace_background(
    image_bytes: &[u8],
    background: &BackgroundCandidate,
    config: &StudioConfig,
) -> Result<CompositeResult> {
    let mut session = StudioSession::from_config(config)?;
    session.upload(image_bytes.to_vec(), None);
    session.select_background(background).await.cloned()
}
