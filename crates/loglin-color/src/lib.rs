//! Color management for the loglin conversion stage.
//!
//! This crate owns everything the render pipeline treats as "the color
//! transform": profile files, role resolution, and compiled processors,
//! plus the GPU-side artifacts derived from them (baked 3D LUTs and
//! fragment shader text).
//!
//! # Quick Start
//!
//! ```
//! use loglin_color::builtin;
//!
//! // Process-wide fallback profile
//! let config = builtin::default_config();
//!
//! // Resolve roles and build a processor
//! let proc = config.processor("scene_linear", "compositing_log").unwrap();
//!
//! let mut pixels = [[0.18_f32, 0.18, 0.18]];
//! proc.apply_rgb(&mut pixels);
//! ```
//!
//! # Loading External Profiles
//!
//! ```ignore
//! use loglin_color::Config;
//!
//! let config = Config::from_file("show/profile.yaml")?;
//! for cs in config.colorspaces() {
//!     println!("{}: {}", cs.name(), cs.description());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod baker;
mod colorspace;
mod config;
mod error;
mod processor;
mod shader;
mod transform;

pub mod builtin;
pub mod role;

// Re-exports
pub use baker::{BakedLut3D, Baker};
pub use colorspace::{ColorSpace, ColorSpaceBuilder};
pub use config::Config;
pub use error::{ColorError, ColorResult};
pub use processor::{Processor, ProcessorOp};
pub use shader::{lut_fragment, GpuLanguage, ShaderSource};
pub use transform::{
    LogAffineTransform, MatrixTransform, Transform, TransformDirection,
};
pub use role::{names as role_names, Roles};
