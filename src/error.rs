//! Error types for background replacement and candidate sourcing

use thiserror::Error;

/// Result type alias for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// HTTP statuses that mark a provider as exhausted rather than broken
const FALLBACK_STATUSES: &[u16] = &[401, 403, 429];

/// Error types surfaced by the pipeline and the candidate client
#[derive(Error, Debug)]
pub enum StudioError {
    /// The remote background-removal service failed or rejected the request
    #[error("Background removal service error: {message}")]
    RemoteService {
        /// HTTP status returned by the service, if one was received
        status: Option<u16>,
        message: String,
    },

    /// A raster source could not be fetched or decoded
    #[error("Image load error: {0}")]
    ImageLoad(String),

    /// A candidate image provider failed
    #[error("Background source error ({provider}): {message}")]
    SourceFetch {
        /// Display name of the provider that produced the error
        provider: String,
        /// HTTP status returned by the provider, if one was received
        status: Option<u16>,
        message: String,
    },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Export could not be produced
    #[error("Export error: {0}")]
    Export(String),

    /// An operation required an uploaded image but none is present
    #[error("No image has been uploaded")]
    NoUpload,

    /// The same target already has an operation in flight
    #[error("Operation already in progress for {0}")]
    Busy(String),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl StudioError {
    /// Create a new remote service error without a status
    pub fn remote_service<S: Into<String>>(msg: S) -> Self {
        Self::RemoteService {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a remote service error for a non-success HTTP status
    pub fn remote_status(status: u16, body: &str) -> Self {
        let detail = body.trim();
        let message = if detail.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, truncate(detail, 200))
        };
        Self::RemoteService {
            status: Some(status),
            message,
        }
    }

    /// Create a new image load error
    pub fn image_load<S: Into<String>>(msg: S) -> Self {
        Self::ImageLoad(msg.into())
    }

    /// Create an image load error naming the source that failed
    pub fn image_load_from(source: &str, error: impl std::fmt::Display) -> Self {
        Self::ImageLoad(format!("Failed to load image '{}': {}", source, error))
    }

    /// Create a source fetch error that carries no HTTP status
    pub fn source_fetch<P: Into<String>, S: Into<String>>(provider: P, msg: S) -> Self {
        Self::SourceFetch {
            provider: provider.into(),
            status: None,
            message: msg.into(),
        }
    }

    /// Create a source fetch error for a non-success HTTP status
    pub fn source_status<P: Into<String>>(provider: P, status: u16) -> Self {
        Self::SourceFetch {
            provider: provider.into(),
            status: Some(status),
            message: format!("HTTP {}", status),
        }
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new export error
    pub fn export<S: Into<String>>(msg: S) -> Self {
        Self::Export(msg.into())
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }

    /// Whether a secondary provider should be tried after this error
    ///
    /// Only authorization and rate-limit failures qualify. Network errors,
    /// malformed payloads and server errors propagate unchanged.
    #[must_use]
    pub fn is_fallback_eligible(&self) -> bool {
        match self {
            Self::SourceFetch {
                status: Some(status),
                ..
            } => FALLBACK_STATUSES.contains(status),
            _ => false,
        }
    }

    /// HTTP status attached to this error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteService { status, .. } | Self::SourceFetch { status, .. } => *status,
            _ => None,
        }
    }

    /// Short message suitable for showing to the person driving the tool
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RemoteService { .. } | Self::ImageLoad(_) => {
                "Failed to apply background. Please try again."
            },
            Self::SourceFetch { .. } => "Failed to load backgrounds. Please try again.",
            Self::Export(_) => "Please enter your brand name before downloading",
            Self::NoUpload => "Upload an image first.",
            Self::Busy(_) => "Still working on the previous request.",
            Self::InvalidConfig(_) | Self::Io(_) | Self::Image(_) => {
                "Something went wrong. Please try again."
            },
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text.get(..idx).unwrap_or(text),
        None => text,
    }
}
