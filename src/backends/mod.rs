//! Background removal backends
//!
//! - remove.bg HTTP service (multipart upload, API key header)

pub mod remove_bg;

// Test utilities for backend testing
#[cfg(test)]
pub mod test_utils;

pub use self::remove_bg::RemoveBgBackend;
