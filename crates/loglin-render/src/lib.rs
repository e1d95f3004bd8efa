//! Tile-based log/lin color conversion render stage.
//!
//! This crate is the render pipeline of loglin: given a window of
//! float pixels and a conversion mode, it produces transformed output
//! while handling alpha premultiplication, optional mask blending, and
//! CPU or GPU execution, with the expensive transform objects cached
//! per instance and GPU resources cached per rendering context.
//!
//! # Architecture
//!
//! ```text
//! Instance::render (dispatcher)
//!     ├── TransformCache ── loglin_color::Processor
//!     ├── cpu path: copy in → transform → copy out  (copier)
//!     └── gpu path: bake LUT + shader → one full-image pass
//!             └── GpuContextCache (per host rendering context)
//! ```
//!
//! # Example
//!
//! ```
//! use loglin_render::{Instance, IsIdentityArgs, Params, RenderScale};
//! use loglin_core::Window;
//!
//! let instance = Instance::new(Params::default());
//!
//! // mix == 0 short-circuits before any transform work.
//! instance.update_params(|p| p.mix = 0.0);
//! let skip = instance.is_identity(&IsIdentityArgs {
//!     time: 0.0,
//!     window: Window::from_size(64, 64),
//!     render_scale: RenderScale::default(),
//!     mask_connected: false,
//!     mask_rod: None,
//! });
//! assert!(skip.is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cache;
mod copier;
mod cpu;
mod error;
mod gpu;
mod host;
mod instance;
mod validate;

// Re-exports
pub use cache::{role_pair, Mode, TransformCache};
pub use copier::{copy_pixels, premultiply, unpremultiply, CopyMode, MaskView, MixInputs};
pub use error::{RenderError, RenderResult};
pub use gpu::{GpuContextCache, GpuDevice, GpuImage, LUT3D_EDGE};
pub use host::{
    Field, HostImage, HostImageMut, ImageMeta, ImagePremult, IsIdentityArgs, Passthrough,
    RenderArgs, RenderImages, RenderScale,
};
pub use instance::{Instance, ParamChange, Params, CONFIG_ENV_VAR};
pub use validate::{check_formats, check_scale_field, check_window, ImageDesc};
