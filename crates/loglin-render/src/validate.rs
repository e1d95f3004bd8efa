//! Shared validation for the CPU and GPU render paths.
//!
//! Both paths funnel through these checks before they diverge, so a
//! given bad input produces the same error class whichever path runs.

use loglin_core::{BitDepth, PixelComponents, Window};

use crate::error::{RenderError, RenderResult};
use crate::host::{Field, ImageMeta, RenderScale};

/// Format facts about an image, independent of where its pixels live.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageDesc {
    /// Component layout.
    pub components: PixelComponents,
    /// Declared bit depth.
    pub depth: BitDepth,
    /// Pixel bounds.
    pub bounds: Window,
}

/// Checks destination format and source/destination agreement.
///
/// The destination must be 32-bit float with a supported layout, and
/// the source must match it exactly in layout and depth.
pub fn check_formats(src: &ImageDesc, dst: &ImageDesc) -> RenderResult<()> {
    if dst.depth != BitDepth::F32 {
        return Err(RenderError::format(format!(
            "destination depth must be 32-bit float, got {:?}",
            dst.depth
        )));
    }
    if src.depth != dst.depth {
        return Err(RenderError::format(format!(
            "source depth {:?} does not match destination {:?}",
            src.depth, dst.depth
        )));
    }
    if src.components != dst.components {
        return Err(RenderError::format(format!(
            "source components {:?} do not match destination {:?}",
            src.components, dst.components
        )));
    }
    Ok(())
}

/// Checks that the render window lies inside `bounds`.
pub fn check_window(window: &Window, bounds: &Window, what: &str) -> RenderResult<()> {
    if !bounds.contains_window(window) {
        return Err(RenderError::value(format!(
            "render window {window} outside {what} bounds {bounds}"
        )));
    }
    Ok(())
}

/// Checks a fetched image's scale and field against the request.
///
/// A mismatch means the host handed back an image it was not asked for,
/// which is a contract violation rather than a format problem.
pub fn check_scale_field(
    scale: &RenderScale,
    field: Field,
    meta: &ImageMeta,
    what: &str,
) -> RenderResult<()> {
    if meta.render_scale != *scale || meta.field != field {
        return Err(RenderError::host_contract(format!(
            "host gave {what} image with wrong scale or field properties"
        )));
    }
    Ok(())
}
