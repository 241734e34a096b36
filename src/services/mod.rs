//! Services separating I/O and progress reporting from the pipeline

pub mod io;
pub mod progress;

pub use io::{UploadIOService, UploadSource};
pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, PipelineTimings, ProcessingStage,
    ProgressReporter, ProgressTracker, ProgressUpdate,
};
