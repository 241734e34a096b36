//! Backdrop Studio CLI
//!
//! Command-line front end driving the replace-and-export pipeline.

use super::config::CliConfigBuilder;
use crate::{
    effects::Effect,
    error::StudioError,
    export::{brand_handle, ExportRequest},
    feed::{BackgroundCategory, CandidateFeed, FeedUpdate},
    http::build_client,
    layout::{self, LAYOUTS},
    providers::CandidateSource,
    services::{ConsoleProgressReporter, ProcessingStage, ProgressTracker, UploadIOService},
    session::{RemovalOutcome, StudioSession},
    tracing_config::{events, init_cli_tracing, spans, TracingFormat},
    types::BackgroundCandidate,
    StudioConfig,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Instrument};

/// Background replacement and social-media export
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "backdrop")]
pub struct Cli {
    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console, global = true)]
    pub log_format: CliLogFormat,

    /// Candidates requested per page (1-30) [default: 12]
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// HTTP request timeout in seconds [default: 30]
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => TracingFormat::Console,
            CliLogFormat::Compact => TracingFormat::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => TracingFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search for background candidates
    Search(SearchArgs),
    /// Replace the background of a photo and export it for a layout
    Compose(ComposeArgs),
    /// List export layouts
    Layouts,
    /// List colour effects
    Effects,
    /// List preset background categories
    Categories,
}

/// Query selection shared by `search` and `compose`
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Free-text background query
    #[arg(long, short, conflicts_with = "category")]
    pub query: Option<String>,

    /// Preset category id (see `categories`) [default: all]
    #[arg(long, short)]
    pub category: Option<String>,
}

impl QueryArgs {
    /// Query text to search for, falling back to the default category
    pub(crate) fn resolve(&self) -> crate::Result<String> {
        if let Some(query) = &self.query {
            return Ok(query.clone());
        }
        let category = match &self.category {
            Some(id) => BackgroundCategory::find(id)?,
            None => BackgroundCategory::default_category(),
        };
        Ok(category.query.to_string())
    }
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Number of pages to accumulate ("load more" count + 1)
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// Print candidates as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ComposeArgs {
    /// Photo whose background is replaced
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Background image URL or local path (skips candidate search)
    #[arg(short, long, value_name = "URL|PATH", conflicts_with_all = ["query", "category"])]
    pub background: Option<String>,

    #[command(flatten)]
    pub query: QueryArgs,

    /// Index of the search result to use
    #[arg(long, default_value_t = 0)]
    pub pick: usize,

    /// Export layout id (see `layouts`)
    #[arg(short, long, default_value = "instagram-post")]
    pub layout: String,

    /// Colour effect id (see `effects`)
    #[arg(short, long, default_value = "none")]
    pub effect: String,

    /// Brand name used in the export file name
    #[arg(long)]
    pub brand: String,

    /// Directory the export is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Export date as YYYY-MM-DD [default: today, UTC]
    #[arg(long)]
    pub date: Option<String>,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = init_cli_tracing(cli.verbose, cli.log_format.into())
        .context("Failed to initialize tracing")?;

    let command_name = match &cli.command {
        Command::Search(_) => "search",
        Command::Compose(_) => "compose",
        Command::Layouts => "layouts",
        Command::Effects => "effects",
        Command::Categories => "categories",
    };

    let result = run(&cli)
        .instrument(spans::session(&session_id, command_name))
        .await;

    if let Err(e) = &result {
        if let Some(studio) = e.downcast_ref::<StudioError>() {
            events::error_with_context(studio, command_name);
            eprintln!("{}", studio.user_message());
        }
    }
    result
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Layouts => {
            print_layouts();
            Ok(())
        },
        Command::Effects => {
            print_effects();
            Ok(())
        },
        Command::Categories => {
            print_categories();
            Ok(())
        },
        Command::Search(args) => {
            CliConfigBuilder::validate_search(args).context("Invalid search arguments")?;
            let config = CliConfigBuilder::from_cli(cli).context("Failed to build configuration")?;
            search(args, &config).await
        },
        Command::Compose(args) => {
            let config = CliConfigBuilder::from_cli(cli).context("Failed to build configuration")?;
            compose(args, &config, cli.verbose > 0).await
        },
    }
}

fn print_layouts() {
    println!("{:<16} {:<16} {:<10} {:>10} {:>6}", "ID", "NAME", "PLATFORM", "SIZE", "RATIO");
    for layout in &LAYOUTS {
        println!(
            "{:<16} {:<16} {:<10} {:>10} {:>6}",
            layout.id,
            layout.name,
            layout.platform,
            format!("{}x{}", layout.width, layout.height),
            layout.aspect_label()
        );
    }
}

fn print_effects() {
    println!("{:<12} {:<10} FILTER", "ID", "NAME");
    for effect in Effect::ALL {
        println!("{:<12} {:<10} {}", effect.id(), effect.display_name(), effect.css_filter());
    }
}

fn print_categories() {
    println!("{:<10} {:<10} QUERY", "ID", "NAME");
    for category in &crate::feed::CATEGORIES {
        println!("{:<10} {:<10} {}", category.id, category.name, category.query);
    }
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .context("Invalid spinner template")?,
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn candidate_source(config: &StudioConfig) -> Result<CandidateSource> {
    let client = build_client(config.request_timeout()).context("Failed to create HTTP client")?;
    Ok(CandidateSource::from_config(config, client))
}

/// Accumulate `pages` pages for `query` into a feed
async fn load_feed(
    source: &CandidateSource,
    query: String,
    pages: usize,
    page_size: usize,
    tracker: &mut ProgressTracker,
) -> crate::Result<CandidateFeed> {
    let mut feed = CandidateFeed::new(query);
    for page in 0..pages {
        tracker.report_stage_with_description(
            ProcessingStage::FetchingCandidates,
            format!("Fetching page {} for \"{}\"", page + 1, feed.query()),
        );
        let update = if page == 0 {
            feed.refresh(source, page_size).await?
        } else {
            feed.load_more(source, page_size).await?
        };
        if let FeedUpdate::Applied { added, total } = update {
            debug!(page, added, total, "Loaded candidate page");
        }
    }
    Ok(feed)
}

async fn search(args: &SearchArgs, config: &StudioConfig) -> Result<()> {
    let query = args.query.resolve()?;
    let source = candidate_source(config)?;

    let pb = spinner(&format!("Searching \"{}\"", query))?;
    let mut tracker = ProgressTracker::console(false);
    let feed = load_feed(&source, query.clone(), args.pages, config.page_size, &mut tracker)
        .instrument(spans::candidate_search(&query, config.page_size))
        .await;
    pb.finish_and_clear();
    let feed = feed.with_context(|| format!("Failed to fetch backgrounds for \"{}\"", query))?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(feed.candidates())
                .context("Failed to serialize candidates")?
        );
        return Ok(());
    }

    for (index, candidate) in feed.candidates().iter().enumerate() {
        println!("{:>3}  {}", index, candidate.full_url);
        println!("     {}", candidate.attribution);
    }
    info!(count = feed.len(), query = %query, "Search complete");
    Ok(())
}

/// Candidate for a background given directly on the command line
fn direct_candidate(source: &str) -> BackgroundCandidate {
    BackgroundCandidate {
        id: "custom".to_string(),
        full_url: source.to_string(),
        thumbnail_url: source.to_string(),
        attribution: String::new(),
    }
}

async fn resolve_background(
    args: &ComposeArgs,
    config: &StudioConfig,
    mut tracker: ProgressTracker,
) -> crate::Result<BackgroundCandidate> {
    if let Some(background) = &args.background {
        return Ok(direct_candidate(background));
    }

    let query = args.query.resolve()?;
    let client = build_client(config.request_timeout())?;
    let source = CandidateSource::from_config(config, client);
    let page_size = config.page_size.max(args.pick + 1).min(crate::config::MAX_PAGE_SIZE);

    let feed = load_feed(&source, query.clone(), 1, page_size, &mut tracker).await?;
    feed.candidates().get(args.pick).cloned().ok_or_else(|| {
        StudioError::source_fetch(
            "search",
            format!(
                "only {} candidates for \"{}\", cannot pick index {}",
                feed.len(),
                query,
                args.pick
            ),
        )
    })
}

async fn compose(args: &ComposeArgs, config: &StudioConfig, verbose: bool) -> Result<()> {
    if args.brand.trim().is_empty() {
        return Err(StudioError::export("brand name must not be empty").into());
    }
    let layout = layout::find(&args.layout)?;
    let effect: Effect = args.effect.parse()?;
    let mut request = ExportRequest::new(args.brand.clone(), layout, effect);
    if let Some(date) = &args.date {
        let date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("Invalid --date '{}', expected YYYY-MM-DD", date))?;
        request = request.with_date(date);
    }

    let upload = UploadIOService::read_upload(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let reporter = Arc::new(ConsoleProgressReporter::new(verbose));
    let mut session = StudioSession::from_config(config)
        .context("Failed to create session")?
        .with_progress_reporter(Arc::<ConsoleProgressReporter>::clone(&reporter));
    let upload_id = session.upload(upload.bytes, upload.file_name.as_deref());

    let span = spans::compose(&args.input, layout.id);
    async {
        // Background removal and candidate search are independent, run them together
        let pb = spinner("Removing background and finding a backdrop")?;
        let ticket = session.begin_removal()?;
        let remover = session.remover();
        let (removal, background) = futures::join!(
            ticket.execute(remover.as_ref()),
            resolve_background(args, config, ProgressTracker::new(reporter))
        );
        pb.finish_and_clear();

        match session.complete_removal(ticket, removal).context("Background removal failed")? {
            RemovalOutcome::Applied(cutout) => {
                let (w, h) = cutout.dimensions();
                debug!(upload = %upload_id, width = w, height = h, "Cutout ready");
            },
            RemovalOutcome::Stale => anyhow::bail!("Upload was replaced during background removal"),
        }
        let background = background.context("Failed to choose a background")?;
        if !background.attribution.is_empty() {
            println!("Background: {}", background.attribution);
        }

        let pb = spinner("Compositing")?;
        let composite = session.select_background(&background).await;
        pb.finish_and_clear();
        let (width, height) = composite.context("Failed to apply background")?.dimensions();
        debug!(width, height, "Composite ready");

        let exported = session.export(&request).context("Failed to render export")?;
        let path = exported
            .save_to(&args.output_dir)
            .await
            .with_context(|| format!("Failed to write to {}", args.output_dir.display()))?;

        println!(
            "Exported {} ({}x{}) for {}",
            path.display(),
            exported.width,
            exported.height,
            brand_handle(&request.brand_name)
        );
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_utils::{MockProvider, MockResponse};
    use crate::services::{PipelineTimings, ProgressReporter, ProgressUpdate};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StageRecorder {
        stages: Mutex<Vec<ProcessingStage>>,
    }

    impl ProgressReporter for StageRecorder {
        fn report_progress(&self, update: ProgressUpdate) {
            self.stages.lock().unwrap().push(update.stage);
        }

        fn report_completion(&self, _timings: PipelineTimings) {}

        fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
    }

    #[test]
    fn test_parse_compose() {
        let cli = Cli::parse_from([
            "backdrop",
            "-v",
            "compose",
            "--input",
            "me.jpg",
            "--category",
            "studio",
            "--pick",
            "2",
            "--layout",
            "facebook-post",
            "--effect",
            "vintage",
            "--brand",
            "Acme Co",
        ]);
        assert_eq!(cli.verbose, 1);
        let Command::Compose(args) = cli.command else {
            panic!("expected compose");
        };
        assert_eq!(args.input, PathBuf::from("me.jpg"));
        assert_eq!(args.query.resolve().unwrap(), "studio backdrop background");
        assert_eq!(args.pick, 2);
        assert_eq!(args.layout, "facebook-post");
        assert_eq!(args.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_parse_search_defaults() {
        let cli = Cli::parse_from(["backdrop", "search", "--page-size", "20"]);
        assert_eq!(cli.page_size, Some(20));
        let Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.pages, 1);
        assert!(!args.json);
        assert_eq!(args.query.resolve().unwrap(), "background texture");
    }

    #[test]
    fn test_background_conflicts_with_query() {
        let parsed = Cli::try_parse_from([
            "backdrop",
            "compose",
            "--input",
            "a.png",
            "--brand",
            "x",
            "--background",
            "bg.png",
            "--query",
            "sky",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let args = QueryArgs {
            query: None,
            category: Some("space".to_string()),
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn test_direct_candidate() {
        let candidate = direct_candidate("https://example.com/bg.jpg");
        assert_eq!(candidate.full_url, "https://example.com/bg.jpg");
        assert!(candidate.attribution.is_empty());
    }

    #[tokio::test]
    async fn test_load_feed_reports_each_page() {
        let recorder = Arc::new(StageRecorder::default());
        let mut tracker = ProgressTracker::new(Arc::clone(&recorder) as Arc<dyn ProgressReporter>);
        let source = CandidateSource::new(vec![Box::new(MockProvider::new(
            "unsplash",
            MockResponse::Candidates(4),
        ))]);

        let feed = load_feed(&source, "gradient background".to_string(), 3, 4, &mut tracker)
            .await
            .unwrap();

        assert_eq!(feed.len(), 12);
        assert_eq!(
            *recorder.stages.lock().unwrap(),
            vec![ProcessingStage::FetchingCandidates; 3]
        );
    }

    #[tokio::test]
    async fn test_blank_brand_rejected_before_any_work() {
        let cli = Cli::parse_from([
            "backdrop",
            "compose",
            "--input",
            "/nonexistent/photo.jpg",
            "--brand",
            "   ",
        ]);
        let Command::Compose(args) = cli.command else {
            panic!("expected compose");
        };

        let err = compose(&args, &StudioConfig::default(), false).await.unwrap_err();
        let studio = err.downcast_ref::<StudioError>().unwrap();
        assert!(matches!(studio, StudioError::Export(_)));
        assert_eq!(studio.user_message(), "Please enter your brand name before downloading");
    }
}
