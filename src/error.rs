//! Error classification shared by every layer.
//!
//! Each domain error enum implements [`ErrorCode`] so the HTTP layer can
//! render a stable machine-readable code alongside the display message.

/// Stable error code + retry hint for a domain error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    /// Informational only. Nothing in this service retries automatically.
    fn retryable(&self) -> bool {
        false
    }
}
