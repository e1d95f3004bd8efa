//! Tiled pixel copy and blend primitives.
//!
//! The CPU render path is built from windowed copies: source into
//! scratch (optionally un-premultiplying), scratch into destination
//! (optionally re-premultiplying, optionally blending with the original
//! through a mask). Which of those behaviors a copy performs is a
//! [`CopyMode`], selected once per call and dispatched through a single
//! routine generic over component count.
//!
//! Per-pixel formulas:
//! - premultiply: `rgb *= a`
//! - un-premultiply: `rgb /= a` for `a > 0`, transparent black otherwise
//! - mask mix: `out = w*src + (1-w)*orig` with `w = mix * maskValue`,
//!   the mask sampled per pixel (0 outside its bounds), optionally
//!   inverted; `w = mix` when no mask is connected
//!
//! Only pixels inside the render window are written. Rows are processed
//! in parallel.

use rayon::prelude::*;

use loglin_core::{PixelBufferView, PixelBufferViewMut, PixelComponents, Window};

use crate::error::{RenderError, RenderResult};

/// How a windowed copy treats each pixel.
///
/// `Unpremult` never combines with `PremultMaskMix` in one call; the
/// render path un-premultiplies on the way into scratch and
/// re-premultiplies on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    /// Straight copy.
    Plain,
    /// Copy, dividing color channels by alpha.
    Unpremult,
    /// Copy, blending against the original through mix and mask.
    MaskMix,
    /// Copy, multiplying color by alpha, then blending like [`CopyMode::MaskMix`].
    PremultMaskMix,
}

impl CopyMode {
    /// Returns `true` for the modes that blend against the original.
    #[inline]
    pub fn mixes(&self) -> bool {
        matches!(self, Self::MaskMix | Self::PremultMaskMix)
    }
}

/// Mask image plus its invert flag.
#[derive(Debug, Clone, Copy)]
pub struct MaskView<'a> {
    /// Single-channel mask pixels.
    pub view: PixelBufferView<'a>,
    /// Swap masked and unmasked regions.
    pub invert: bool,
}

/// Blend inputs for the mask-mix copy modes.
#[derive(Debug, Clone, Copy)]
pub struct MixInputs<'a> {
    /// The original (unprocessed) image blended against.
    pub orig: PixelBufferView<'a>,
    /// Optional mask weighting the blend per pixel.
    pub mask: Option<MaskView<'a>>,
    /// Blend factor between processed and original.
    pub mix: f32,
}

/// Premultiplies an RGBA pixel: `rgb *= a`.
#[inline]
pub fn premultiply(rgba: [f32; 4]) -> [f32; 4] {
    let a = rgba[3];
    [rgba[0] * a, rgba[1] * a, rgba[2] * a, a]
}

/// Un-premultiplies an RGBA pixel: `rgb /= a`.
///
/// Returns transparent black when alpha is zero.
#[inline]
pub fn unpremultiply(rgba: [f32; 4]) -> [f32; 4] {
    let a = rgba[3];
    if a <= 0.0 {
        [0.0, 0.0, 0.0, 0.0]
    } else {
        let inv_a = 1.0 / a;
        [rgba[0] * inv_a, rgba[1] * inv_a, rgba[2] * inv_a, a]
    }
}

/// Copies `window` from `src` into `dst` applying `mode`.
///
/// `mix` must be provided for the mask-mix modes and is ignored
/// otherwise. Pixels outside the window are untouched. Both buffers
/// must share component layout, and the window must lie inside both
/// buffers' bounds (and the blend original's, when mixing).
pub fn copy_pixels(
    mode: CopyMode,
    window: &Window,
    src: &PixelBufferView<'_>,
    dst: &mut PixelBufferViewMut<'_>,
    mix: Option<&MixInputs<'_>>,
) -> RenderResult<()> {
    if src.components() != dst.components() {
        return Err(RenderError::format(format!(
            "copy layout mismatch: {:?} vs {:?}",
            src.components(),
            dst.components()
        )));
    }
    for (what, bounds) in [("source", src.bounds()), ("destination", dst.bounds())] {
        if !bounds.contains_window(window) {
            return Err(RenderError::value(format!(
                "copy window {window} outside {what} bounds {bounds}"
            )));
        }
    }

    let inputs = if mode.mixes() {
        let mi = mix.ok_or_else(|| {
            RenderError::value("mask-mix copy requested without blend inputs")
        })?;
        if !mi.orig.bounds().contains_window(window) {
            return Err(RenderError::value(format!(
                "copy window {window} outside original bounds {}",
                mi.orig.bounds()
            )));
        }
        Some(*mi)
    } else {
        None
    };

    let ncomp = src.components().count();
    let has_alpha = src.components() == PixelComponents::Rgba;
    let (x1, x2) = (window.x1, window.x2);
    let src = *src;

    dst.window_rows_mut(window)
        .into_par_iter()
        .for_each(|(y, dst_row)| {
            let src_row = src.span(y, x1, x2);
            match mode {
                CopyMode::Plain => dst_row.copy_from_slice(src_row),
                CopyMode::Unpremult => {
                    if has_alpha {
                        for (s, d) in src_row
                            .chunks_exact(4)
                            .zip(dst_row.chunks_exact_mut(4))
                        {
                            d.copy_from_slice(&unpremultiply([s[0], s[1], s[2], s[3]]));
                        }
                    } else {
                        // No alpha channel, nothing to divide out.
                        dst_row.copy_from_slice(src_row);
                    }
                }
                CopyMode::MaskMix | CopyMode::PremultMaskMix => {
                    // Checked above; mixing modes always carry inputs.
                    if let Some(mi) = &inputs {
                        let premult = mode == CopyMode::PremultMaskMix && has_alpha;
                        mix_row(y, x1, ncomp, premult, src_row, dst_row, mi);
                    }
                }
            }
        });

    Ok(())
}

/// Blends one row: `out = w*src + (1-w)*orig` per channel.
fn mix_row(
    y: i32,
    x1: i32,
    ncomp: usize,
    premult: bool,
    src_row: &[f32],
    dst_row: &mut [f32],
    mi: &MixInputs<'_>,
) {
    let width = (src_row.len() / ncomp) as i32;
    let orig_row = mi.orig.span(y, x1, x1 + width);
    for (i, (s, (o, d))) in src_row
        .chunks_exact(ncomp)
        .zip(orig_row.chunks_exact(ncomp).zip(dst_row.chunks_exact_mut(ncomp)))
        .enumerate()
    {
        let x = x1 + i as i32;
        let w = mi.mix * mask_weight(&mi.mask, x, y);

        let mut processed = [0.0f32; 4];
        processed[..ncomp].copy_from_slice(s);
        if premult {
            processed = premultiply(processed);
        }

        for c in 0..ncomp {
            d[c] = w * processed[c] + (1.0 - w) * o[c];
        }
    }
}

/// Samples the mask weight at (x, y): 0 outside the mask bounds, the
/// first channel clamped to [0, 1] inside, flipped when inverted. No
/// mask connected means full weight.
#[inline]
fn mask_weight(mask: &Option<MaskView<'_>>, x: i32, y: i32) -> f32 {
    match mask {
        None => 1.0,
        Some(m) => {
            let raw = if m.view.bounds().contains(x, y) {
                m.view.pixel(x, y)[0].clamp(0.0, 1.0)
            } else {
                0.0
            };
            if m.invert { 1.0 - raw } else { raw }
        }
    }
}
