//! Error types for the render stage.
//!
//! The taxonomy mirrors how the host distinguishes failures:
//! - [`RenderError::Format`] - unsupported or mismatched pixel formats
//! - [`RenderError::Value`] - windows outside buffer bounds
//! - [`RenderError::HostContract`] - the host broke its own contract
//!   (wrong render scale/field on a fetched image, missing image)
//! - [`RenderError::Gpu`] - GPU resource failures (same severity as a
//!   host contract violation)
//! - [`RenderError::Transform`] - transform resolution failures from
//!   the color layer
//!
//! Every variant is fatal for the render call it occurs in: the call
//! aborts before writing any destination pixels. Configuration-load
//! failures are NOT errors at this level; they degrade to the built-in
//! fallback profile (see `instance`).

use thiserror::Error;

use loglin_color::ColorError;
use loglin_core::CoreError;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that abort a render call.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Unsupported or mismatched pixel format.
    #[error("format error: {reason}")]
    Format {
        /// What was wrong.
        reason: String,
    },

    /// A window that does not fit its buffer.
    #[error("value error: {reason}")]
    Value {
        /// What was wrong.
        reason: String,
    },

    /// The host violated its own contract.
    #[error("host contract violation: {reason}")]
    HostContract {
        /// What the host got wrong.
        reason: String,
    },

    /// A required image could not be fetched for the requested time.
    #[error("missing {what} image for the requested render")]
    MissingImage {
        /// Which image was missing ("source", "destination", ...).
        what: &'static str,
    },

    /// GPU resource failure (texture load, program compile).
    #[error("GPU error: {reason}")]
    Gpu {
        /// What failed.
        reason: String,
    },

    /// Transform resolution or construction failed.
    #[error("transform error: {0}")]
    Transform(#[from] ColorError),

    /// Buffer-view validation failed.
    #[error("buffer error: {0}")]
    Core(#[from] CoreError),
}

impl RenderError {
    /// Creates a [`RenderError::Format`] error.
    #[inline]
    pub fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }

    /// Creates a [`RenderError::Value`] error.
    #[inline]
    pub fn value(reason: impl Into<String>) -> Self {
        Self::Value {
            reason: reason.into(),
        }
    }

    /// Creates a [`RenderError::HostContract`] error.
    #[inline]
    pub fn host_contract(reason: impl Into<String>) -> Self {
        Self::HostContract {
            reason: reason.into(),
        }
    }

    /// Creates a [`RenderError::Gpu`] error.
    #[inline]
    pub fn gpu(reason: impl Into<String>) -> Self {
        Self::Gpu {
            reason: reason.into(),
        }
    }

    /// Returns `true` for format errors.
    #[inline]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Returns `true` for host-contract class errors (including missing
    /// images and GPU resource failures).
    #[inline]
    pub fn is_host_contract_error(&self) -> bool {
        matches!(
            self,
            Self::HostContract { .. } | Self::MissingImage { .. } | Self::Gpu { .. }
        )
    }
}
