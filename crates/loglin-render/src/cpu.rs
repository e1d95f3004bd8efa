//! CPU render path.
//!
//! Copies the window into call-scoped scratch (un-premultiplying when
//! the premult setting is active), applies the color transform in place
//! row-parallel, then copies scratch into the destination
//! (re-premultiplying and mask-blending). Pixels outside the window are
//! never written.

use rayon::prelude::*;

use loglin_color::Processor;
use loglin_core::{PixelBufferView, PixelBufferViewMut, PixelComponents, Window};

use crate::copier::{copy_pixels, CopyMode, MaskView, MixInputs};
use crate::error::{RenderError, RenderResult};
use crate::host::{HostImage, HostImageMut};
use crate::validate::{check_formats, check_window, ImageDesc};

/// Per-call settings the CPU path needs beyond the images.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CpuRenderParams {
    /// Un-premultiply before, re-premultiply after the transform.
    pub premult: bool,
    /// Blend factor between processed and original output.
    pub mix: f32,
    /// Invert the mask weighting.
    pub mask_invert: bool,
}

/// Renders `window` from `src` into `dst` through `processor`.
pub(crate) fn render_window(
    processor: &Processor,
    window: &Window,
    src: &HostImage<'_>,
    dst: &mut HostImageMut<'_>,
    mask: Option<&HostImage<'_>>,
    params: CpuRenderParams,
) -> RenderResult<()> {
    let src_desc = ImageDesc {
        components: src.view.components(),
        depth: src.view.depth(),
        bounds: src.view.bounds(),
    };
    let dst_desc = ImageDesc {
        components: dst.view.components(),
        depth: dst.view.depth(),
        bounds: dst.view.bounds(),
    };
    check_formats(&src_desc, &dst_desc)?;
    check_window(window, &dst_desc.bounds, "destination")?;
    check_window(window, &src_desc.bounds, "source")?;

    let components = src_desc.components;

    // Scratch sized exactly to the window; dropped on every exit path.
    let ncomp = components.count();
    let mut scratch = vec![0.0f32; window.area() as usize * ncomp];

    // Window into scratch, un-premultiplying so the transform sees
    // straight color.
    {
        let mut scratch_view = PixelBufferViewMut::tight(&mut scratch, *window, components)?;
        let copy_in = if params.premult {
            CopyMode::Unpremult
        } else {
            CopyMode::Plain
        };
        copy_pixels(copy_in, window, &src.view, &mut scratch_view, None)?;
    }

    apply_in_place(processor, components, &mut scratch)?;

    // Scratch into the destination, re-premultiplying and blending.
    let scratch_view = PixelBufferView::tight(&scratch, *window, components)?;
    let copy_out = if params.premult {
        CopyMode::PremultMaskMix
    } else {
        CopyMode::MaskMix
    };
    let inputs = MixInputs {
        orig: src.view,
        mask: mask.map(|m| MaskView {
            view: m.view,
            invert: params.mask_invert,
        }),
        mix: params.mix,
    };
    copy_pixels(copy_out, window, &scratch_view, &mut dst.view, Some(&inputs))
}

/// Applies the processor to every pixel of the tight scratch buffer.
///
/// Color channels only; alpha rides along untouched. Alpha-only layouts
/// have no color to transform and are rejected.
fn apply_in_place(
    processor: &Processor,
    components: PixelComponents,
    scratch: &mut [f32],
) -> RenderResult<()> {
    if !components.has_color() {
        return Err(RenderError::format(
            "color transform requires RGB or RGBA pixels",
        ));
    }

    let ncomp = components.count();
    scratch
        .par_chunks_mut(ncomp)
        .for_each(|pixel| processor.apply_rgb_prefix(pixel));
    Ok(())
}
