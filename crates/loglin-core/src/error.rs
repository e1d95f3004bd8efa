//! Error types for loglin-core operations.
//!
//! Covers the failure modes of buffer-view construction and window
//! validation:
//! - Windows that fall outside a buffer's declared bounds
//! - Buffer slices too small for their declared geometry
//! - Component-layout and bit-depth mismatches between buffers
//!
//! # Usage
//!
//! ```rust
//! use loglin_core::{CoreError, Result, Window};
//!
//! fn check(window: Window, bounds: Window) -> Result<()> {
//!     if !bounds.contains_window(&window) {
//!         return Err(CoreError::window_out_of_bounds(window, bounds));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::buffer::{BitDepth, PixelComponents};
use crate::window::Window;

/// Result type alias using [`CoreError`] as the error type.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while describing or validating pixel buffers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A window does not lie inside the buffer bounds it is applied to.
    #[error("window {window} outside buffer bounds {bounds}")]
    WindowOutOfBounds {
        /// The offending window.
        window: Window,
        /// The bounds it was checked against.
        bounds: Window,
    },

    /// A window with zero or negative extent where a non-empty one is required.
    #[error("empty window {window}")]
    EmptyWindow {
        /// The degenerate window.
        window: Window,
    },

    /// Row stride is too small for the buffer width and component count.
    #[error("row stride {stride} is less than minimum {min_stride} for width {width}")]
    InvalidStride {
        /// Provided stride in f32 elements.
        stride: usize,
        /// Minimum stride in f32 elements.
        min_stride: usize,
        /// Buffer width in pixels.
        width: u32,
    },

    /// The backing slice is shorter than the declared geometry requires.
    #[error("buffer too small: need {required} f32 elements, got {actual}")]
    BufferTooSmall {
        /// Elements required by bounds and stride.
        required: usize,
        /// Elements actually present.
        actual: usize,
    },

    /// Component layouts differ where they must match.
    #[error("component layout mismatch: {expected:?} vs {got:?}")]
    ComponentMismatch {
        /// Layout of the first buffer.
        expected: PixelComponents,
        /// Layout of the second buffer.
        got: PixelComponents,
    },

    /// Bit depths differ where they must match, or a non-float depth was
    /// supplied to a float-only stage.
    #[error("bit depth mismatch: {expected:?} vs {got:?}")]
    DepthMismatch {
        /// Required depth.
        expected: BitDepth,
        /// Declared depth.
        got: BitDepth,
    },
}

impl CoreError {
    /// Creates a [`CoreError::WindowOutOfBounds`] error.
    #[inline]
    pub fn window_out_of_bounds(window: Window, bounds: Window) -> Self {
        Self::WindowOutOfBounds { window, bounds }
    }

    /// Creates a [`CoreError::InvalidStride`] error.
    #[inline]
    pub fn invalid_stride(stride: usize, min_stride: usize, width: u32) -> Self {
        Self::InvalidStride {
            stride,
            min_stride,
            width,
        }
    }

    /// Creates a [`CoreError::BufferTooSmall`] error.
    #[inline]
    pub fn buffer_too_small(required: usize, actual: usize) -> Self {
        Self::BufferTooSmall { required, actual }
    }

    /// Returns `true` if this is a bounds-related error.
    #[inline]
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            Self::WindowOutOfBounds { .. } | Self::EmptyWindow { .. }
        )
    }

    /// Returns `true` if this is a format-related error.
    #[inline]
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::ComponentMismatch { .. } | Self::DepthMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_error_message() {
        let err = CoreError::window_out_of_bounds(
            Window::new(0, 0, 200, 200),
            Window::new(0, 0, 100, 100),
        );
        let msg = err.to_string();
        assert!(msg.contains("200"));
        assert!(msg.contains("100"));
        assert!(err.is_bounds_error());
        assert!(!err.is_format_error());
    }

    #[test]
    fn format_error_classification() {
        let err = CoreError::DepthMismatch {
            expected: BitDepth::F32,
            got: BitDepth::U8,
        };
        assert!(err.is_format_error());
    }
}
