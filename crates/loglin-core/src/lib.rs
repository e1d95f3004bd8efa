//! # loglin-core
//!
//! Core types for the loglin color-conversion stage.
//!
//! This crate provides the foundational types shared by the color and
//! render crates:
//!
//! - [`Window`] - Integer render windows in corner form
//! - [`PixelBufferView`] / [`PixelBufferViewMut`] - Non-owning views
//!   over host-owned f32 pixel storage
//! - [`PixelComponents`] / [`BitDepth`] - Component-layout and depth
//!   metadata
//! - [`CoreError`] - Validation failures for the above
//!
//! ## Design Philosophy
//!
//! The host owns every pixel buffer; this crate only describes them.
//! All validation happens at view-construction time, so the render
//! paths can address rows without per-pixel bounds checks.
//!
//! ```text
//! loglin-core (this crate)
//!    ^
//!    |
//!    +-- loglin-color (transforms, profiles)
//!    +-- loglin-render (CPU/GPU render paths)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod error;
pub mod window;

// Re-exports for convenience
pub use buffer::{BitDepth, PixelBufferView, PixelBufferViewMut, PixelComponents};
pub use error::{CoreError, Result};
pub use window::Window;
