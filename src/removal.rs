//! Background removal abstraction

use crate::{error::Result, types::CutoutImage, types::UploadedImage};
use async_trait::async_trait;

/// A service that isolates the subject of an uploaded image
///
/// Implementations are assumed deterministic and expensive: callers cache the
/// cutout per upload (see `CutoutCache`) and never call twice for one upload.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Produce an alpha-masked cutout for `image`
    ///
    /// # Errors
    /// - `StudioError::RemoteService` when the service errors or answers
    ///   with a non-success status
    async fn remove_background(&self, image: &UploadedImage) -> Result<CutoutImage>;

    /// Short name used in logs
    fn name(&self) -> &str;
}
