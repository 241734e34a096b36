//! Editing session: upload, background selection and export
//!
//! `StudioSession` owns the current upload, its cached cutout and the latest
//! composite. Long-running work is split into a `begin_*` step that issues a
//! ticket and a `complete_*` step that applies the result, so a front end can
//! release the session while a request is in flight. Results whose ticket no
//! longer matches the current upload are reported as stale and dropped.

use crate::{
    backends::RemoveBgBackend,
    cache::{CutoutCache, CutoutCacheStats},
    compositor::{Compositor, HttpImageLoader},
    config::StudioConfig,
    error::{Result, StudioError},
    export::{render_export, ExportRequest, ExportedImage},
    http::build_client,
    removal::BackgroundRemover,
    services::{
        NoOpProgressReporter, PipelineTimings, ProcessingStage, ProgressReporter, ProgressTracker,
        UploadIOService,
    },
    types::{BackgroundCandidate, CompositeResult, CutoutImage, UploadId, UploadedImage},
};
use instant::Instant;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Token for a background-removal request issued for one upload
#[derive(Debug, Clone)]
pub struct RemovalTicket {
    upload: UploadedImage,
}

impl RemovalTicket {
    #[must_use]
    pub fn upload_id(&self) -> UploadId {
        self.upload.id()
    }

    #[must_use]
    pub fn upload(&self) -> &UploadedImage {
        &self.upload
    }

    /// Run the removal this ticket was issued for
    pub async fn execute(&self, remover: &dyn BackgroundRemover) -> Result<CutoutImage> {
        remover.remove_background(&self.upload).await
    }
}

#[derive(Debug, Clone)]
pub enum RemovalOutcome {
    /// Cutout stored for the current upload
    Applied(CutoutImage),
    /// Result belonged to a replaced upload and was dropped
    Stale,
}

/// Token for compositing the current upload over one background
#[derive(Debug, Clone)]
pub struct SelectionTicket {
    upload_id: UploadId,
    background: BackgroundCandidate,
}

impl SelectionTicket {
    #[must_use]
    pub fn upload_id(&self) -> UploadId {
        self.upload_id
    }

    #[must_use]
    pub fn background(&self) -> &BackgroundCandidate {
        &self.background
    }

    fn key(&self) -> (UploadId, String) {
        (self.upload_id, self.background.id.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The composite became the session's current preview
    Applied,
    Stale,
}

pub struct StudioSession {
    remover: Arc<dyn BackgroundRemover>,
    compositor: Compositor,
    reporter: Arc<dyn ProgressReporter>,
    upload: Option<UploadedImage>,
    next_upload_id: u64,
    cache: CutoutCache,
    removal_in_flight: Option<UploadId>,
    composite: Option<CompositeResult>,
    selected: Option<BackgroundCandidate>,
    selections_in_flight: HashSet<(UploadId, String)>,
    timings: PipelineTimings,
}

impl StudioSession {
    #[must_use]
    pub fn new(remover: Arc<dyn BackgroundRemover>, compositor: Compositor) -> Self {
        Self {
            remover,
            compositor,
            reporter: Arc::new(NoOpProgressReporter),
            upload: None,
            next_upload_id: 1,
            cache: CutoutCache::new(),
            removal_in_flight: None,
            composite: None,
            selected: None,
            selections_in_flight: HashSet::new(),
            timings: PipelineTimings::default(),
        }
    }

    /// Session backed by remove.bg and an HTTP image loader
    ///
    /// # Errors
    /// - Invalid configuration or HTTP client construction failure
    pub fn from_config(config: &StudioConfig) -> Result<Self> {
        config.validate()?;
        let client = build_client(config.request_timeout())?;
        let remover = RemoveBgBackend::new(client.clone(), config.removal.clone());
        let compositor = Compositor::new(Arc::new(HttpImageLoader::new(client)));
        Ok(Self::new(Arc::new(remover), compositor))
    }

    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replace the current image
    ///
    /// The previous cutout and composite are discarded before this returns, so
    /// no later result can pair the new upload with stale derived images.
    pub fn upload(&mut self, bytes: impl Into<Arc<[u8]>>, file_name: Option<&str>) -> UploadId {
        let id = UploadId(self.next_upload_id);
        self.next_upload_id += 1;

        let mut image = UploadedImage::new(id, bytes);
        if let Some(name) = file_name {
            image = image.with_file_name(name);
        }

        self.cache.invalidate();
        self.composite = None;
        self.selected = None;
        self.removal_in_flight = None;
        self.timings = PipelineTimings::default();
        self.upload = Some(image);

        info!(upload = %id, "New upload");
        id
    }

    #[must_use]
    pub fn current_upload(&self) -> Option<&UploadedImage> {
        self.upload.as_ref()
    }

    #[must_use]
    pub fn current_upload_id(&self) -> Option<UploadId> {
        self.upload.as_ref().map(UploadedImage::id)
    }

    /// Latest successful composite for the current upload
    #[must_use]
    pub fn composite(&self) -> Option<&CompositeResult> {
        self.composite.as_ref()
    }

    #[must_use]
    pub fn selected_background(&self) -> Option<&BackgroundCandidate> {
        self.selected.as_ref()
    }

    /// Whether a selection for `background_id` is pending on the current upload
    #[must_use]
    pub fn is_busy(&self, background_id: &str) -> bool {
        self.current_upload_id().is_some_and(|id| {
            self.selections_in_flight
                .contains(&(id, background_id.to_string()))
        })
    }

    #[must_use]
    pub fn cache_stats(&self) -> &CutoutCacheStats {
        self.cache.stats()
    }

    #[must_use]
    pub fn timings(&self) -> &PipelineTimings {
        &self.timings
    }

    #[must_use]
    pub fn remover_name(&self) -> &str {
        self.remover.name()
    }

    /// Shared handle to the remover, for executing tickets outside the session
    #[must_use]
    pub fn remover(&self) -> Arc<dyn BackgroundRemover> {
        Arc::clone(&self.remover)
    }

    /// Issue a removal ticket for the current upload
    ///
    /// # Errors
    /// - `StudioError::NoUpload` when nothing has been uploaded
    /// - `StudioError::Busy` when a removal for this upload is already pending
    ///   or its cutout is already cached
    pub fn begin_removal(&mut self) -> Result<RemovalTicket> {
        let upload = self.upload.as_ref().ok_or(StudioError::NoUpload)?;
        if self.cache.contains(upload.id()) {
            return Err(StudioError::Busy(format!(
                "cutout for {} is already available",
                upload.id()
            )));
        }
        if self.removal_in_flight == Some(upload.id()) {
            return Err(StudioError::Busy(format!("background removal for {}", upload.id())));
        }
        self.removal_in_flight = Some(upload.id());
        Ok(RemovalTicket {
            upload: upload.clone(),
        })
    }

    /// Apply the result of a removal ticket
    ///
    /// Failures are returned and never cached, so the next selection retries.
    ///
    /// # Errors
    /// - The removal error, when the ticket is still current
    pub fn complete_removal(
        &mut self,
        ticket: RemovalTicket,
        result: Result<CutoutImage>,
    ) -> Result<RemovalOutcome> {
        let id = ticket.upload_id();
        if self.removal_in_flight == Some(id) {
            self.removal_in_flight = None;
        }

        if self.current_upload_id() != Some(id) {
            debug!(upload = %id, "Discarding removal result for a replaced upload");
            return Ok(RemovalOutcome::Stale);
        }

        let cutout = result?;
        self.cache.store(cutout.clone());
        Ok(RemovalOutcome::Applied(cutout))
    }

    /// Cutout for the current upload, calling the remover only on a cache miss
    ///
    /// # Errors
    /// - `StudioError::NoUpload`, or the remover's error
    #[instrument(skip(self))]
    pub async fn ensure_cutout(&mut self) -> Result<CutoutImage> {
        let id = self.current_upload_id().ok_or(StudioError::NoUpload)?;
        if let Some(cutout) = self.cache.get(id) {
            debug!(upload = %id, "Using cached cutout");
            return Ok(cutout);
        }

        let ticket = self.begin_removal()?;
        let remover = Arc::clone(&self.remover);
        let start = Instant::now();
        let result = ticket.execute(remover.as_ref()).await;
        self.timings.removal_ms = start.elapsed().as_millis() as u64;

        match self.complete_removal(ticket, result)? {
            RemovalOutcome::Applied(cutout) => Ok(cutout),
            RemovalOutcome::Stale => Err(StudioError::Busy(format!(
                "{} was replaced during background removal",
                id
            ))),
        }
    }

    /// Reserve `background` for compositing against the current upload
    ///
    /// # Errors
    /// - `StudioError::NoUpload` when nothing has been uploaded
    /// - `StudioError::Busy` while the same background is still being applied
    pub fn begin_selection(&mut self, background: &BackgroundCandidate) -> Result<SelectionTicket> {
        let upload_id = self.current_upload_id().ok_or(StudioError::NoUpload)?;
        let ticket = SelectionTicket {
            upload_id,
            background: background.clone(),
        };
        if !self.selections_in_flight.insert(ticket.key()) {
            return Err(StudioError::Busy(format!("background {}", background.id)));
        }
        Ok(ticket)
    }

    /// Apply a finished composite
    ///
    /// A failed composite leaves the previous preview in place.
    ///
    /// # Errors
    /// - The compositing error, when the ticket is still current
    pub fn complete_selection(
        &mut self,
        ticket: SelectionTicket,
        result: Result<CompositeResult>,
    ) -> Result<SelectionOutcome> {
        self.selections_in_flight.remove(&ticket.key());

        if self.current_upload_id() != Some(ticket.upload_id) {
            debug!(
                upload = %ticket.upload_id,
                background = %ticket.background.id,
                "Discarding composite for a replaced upload"
            );
            return Ok(SelectionOutcome::Stale);
        }

        match result {
            Ok(composite) => {
                self.composite = Some(composite);
                self.selected = Some(ticket.background);
                Ok(SelectionOutcome::Applied)
            },
            Err(e) => {
                warn!(background = %ticket.background.id, error = %e, "Keeping previous preview");
                Err(e)
            },
        }
    }

    /// Composite the current upload over `background`
    ///
    /// Removes the background on first use and reuses the cached cutout for
    /// every later selection until the next upload.
    ///
    /// # Errors
    /// - `NoUpload`, `Busy`, or the removal/compositing error
    #[instrument(skip(self, background), fields(background = %background.id))]
    pub async fn select_background(
        &mut self,
        background: &BackgroundCandidate,
    ) -> Result<&CompositeResult> {
        let ticket = self.begin_selection(background)?;
        let mut tracker = ProgressTracker::new(Arc::clone(&self.reporter));

        let result = self.composite_for(&ticket, &mut tracker).await;
        if let Err(e) = &result {
            tracker.report_error(&e.to_string());
        }

        match self.complete_selection(ticket, result)? {
            SelectionOutcome::Applied => self.composite.as_ref().ok_or(StudioError::NoUpload),
            SelectionOutcome::Stale => Err(StudioError::Busy(format!(
                "selection of {} was superseded by a new upload",
                background.id
            ))),
        }
    }

    async fn composite_for(
        &mut self,
        ticket: &SelectionTicket,
        tracker: &mut ProgressTracker,
    ) -> Result<CompositeResult> {
        if !self.cache.contains(ticket.upload_id) {
            tracker.report_stage(ProcessingStage::RemovingBackground);
        }
        let cutout = self.ensure_cutout().await?;

        tracker.report_stage_with_description(
            ProcessingStage::LoadingBackground,
            format!("Loading background {}", ticket.background.id),
        );
        let start = Instant::now();
        let composite = self.compositor.composite(&cutout, &ticket.background).await?;
        self.timings.compositing_ms = start.elapsed().as_millis() as u64;
        tracker.report_stage(ProcessingStage::Compositing);
        Ok(composite)
    }

    /// Render the current composite, or the original upload when no
    /// background has been applied yet, for `request`
    ///
    /// # Errors
    /// - `StudioError::NoUpload` when nothing has been uploaded
    /// - `StudioError::Export` for a blank brand name
    /// - Decode or encode failures
    #[instrument(skip(self, request), fields(layout = request.layout.id))]
    pub fn export(&mut self, request: &ExportRequest) -> Result<ExportedImage> {
        let upload = self.upload.as_ref().ok_or(StudioError::NoUpload)?;
        let mut tracker = ProgressTracker::new(Arc::clone(&self.reporter));
        let start = Instant::now();

        let source = match &self.composite {
            Some(composite) => composite.image.to_rgba8(),
            None => UploadIOService::decode(upload.bytes())?.to_rgba8(),
        };

        tracker.report_stage(ProcessingStage::ApplyingEffect);
        tracker.report_stage_with_description(
            ProcessingStage::Exporting,
            format!("Exporting {}", request.file_name()),
        );
        let exported = render_export(&source, request).map_err(|e| {
            tracker.report_error(&e.to_string());
            e
        })?;

        self.timings.export_ms = start.elapsed().as_millis() as u64;
        self.timings.total_ms =
            self.timings.removal_ms + self.timings.compositing_ms + self.timings.export_ms;
        tracker.report_stage(ProcessingStage::Completed);
        tracker.report_completion(self.timings.clone());
        Ok(exported)
    }
}
