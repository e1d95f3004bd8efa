//! GPU render path.
//!
//! The host owns the GPU: it loads source/destination textures and
//! exposes the device services this path needs (LUT upload, fragment
//! program compilation, a full-image draw pass) through [`GpuDevice`].
//! The path itself only orchestrates: it bakes a 3D LUT
//! and generates shader text from the current transform, caches both
//! per rendering context keyed on the transform's cache id, and
//! dispatches one pass.
//!
//! Unlike the CPU path, the pass covers the full image extent rather
//! than the requested sub-window; hosts account for this by declaring
//! tiles unsupported while GPU render is enabled.

use tracing::debug;

use loglin_color::{lut_fragment, Baker, BakedLut3D, GpuLanguage, Processor};
use loglin_core::{BitDepth, PixelComponents, Window};

use crate::error::RenderResult;
use crate::host::{Field, ImageMeta, RenderScale};
use crate::validate::{check_formats, check_scale_field, check_window, ImageDesc};

/// 3D LUT size per dimension used for GPU evaluation.
pub const LUT3D_EDGE: usize = 33;

/// A host-resident texture and its declared geometry.
#[derive(Debug, Clone)]
pub struct GpuImage {
    /// Opaque host texture handle.
    pub texture: u32,
    /// Pixel bounds of the texture.
    pub bounds: Window,
    /// Component layout.
    pub components: PixelComponents,
    /// Declared bit depth.
    pub depth: BitDepth,
    /// Host-declared metadata.
    pub meta: ImageMeta,
}

impl GpuImage {
    fn desc(&self) -> ImageDesc {
        ImageDesc {
            components: self.components,
            depth: self.depth,
            bounds: self.bounds,
        }
    }
}

/// GPU services the host provides to this path.
///
/// Handles are opaque to the render stage; the device owns their
/// lifetime beyond the explicit release calls.
pub trait GpuDevice {
    /// Uploads a baked 3D LUT, returning its texture handle.
    fn upload_lut3d(&mut self, lut: &BakedLut3D) -> RenderResult<u32>;

    /// Compiles a fragment program, returning its program handle.
    fn compile_fragment(&mut self, source: &str) -> RenderResult<u32>;

    /// Releases a LUT texture handle.
    fn release_lut3d(&mut self, handle: u32);

    /// Releases a program handle.
    fn release_program(&mut self, handle: u32);

    /// Draws one full-image pass: `src` through `program` (sampling
    /// `lut`) into `dst`.
    fn draw_pass(&mut self, program: u32, lut: u32, src: &GpuImage, dst: &GpuImage)
    -> RenderResult<()>;
}

/// Per-rendering-context GPU resource cache.
///
/// One per host rendering context (the host binds a context to a single
/// thread for the duration of a GPU call, so no locking happens here).
/// Created on context attach, released on detach.
#[derive(Debug, Default)]
pub struct GpuContextCache {
    /// Cached LUT handle and the cache id it was baked from.
    lut: Option<(u32, u64)>,
    /// Cached program handle and the cache id it was generated from.
    program: Option<(u32, u64)>,
}

impl GpuContextCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(program, lut)` handles for `processor`, rebuilding
    /// whichever cached resource is missing or stale.
    ///
    /// Staleness is decided by the processor's cache id, so an
    /// unchanged transform re-renders without recompiling the program
    /// or resampling the LUT.
    pub fn ensure_resources(
        &mut self,
        device: &mut dyn GpuDevice,
        processor: &Processor,
    ) -> RenderResult<(u32, u32)> {
        let id = processor.cache_id();

        let lut = match self.lut {
            Some((handle, cached_id)) if cached_id == id => handle,
            stale => {
                if let Some((old, _)) = stale {
                    device.release_lut3d(old);
                    self.lut = None;
                }
                let baked = Baker::new(processor).bake_lut_3d(LUT3D_EDGE)?;
                let handle = device.upload_lut3d(&baked)?;
                debug!(cache_id = id, edge = LUT3D_EDGE, "rebuilt GPU 3D LUT");
                self.lut = Some((handle, id));
                handle
            }
        };

        let program = match self.program {
            Some((handle, cached_id)) if cached_id == id => handle,
            stale => {
                if let Some((old, _)) = stale {
                    device.release_program(old);
                    self.program = None;
                }
                let shader = lut_fragment(id, LUT3D_EDGE, GpuLanguage::default());
                let handle = device.compile_fragment(shader.fragment_code())?;
                debug!(cache_id = id, "recompiled GPU shader program");
                self.program = Some((handle, id));
                handle
            }
        };

        Ok((program, lut))
    }

    /// Releases any cached resources back to the device.
    pub fn release(&mut self, device: &mut dyn GpuDevice) {
        if let Some((handle, _)) = self.lut.take() {
            device.release_lut3d(handle);
        }
        if let Some((handle, _)) = self.program.take() {
            device.release_program(handle);
        }
    }

    /// Returns `true` when no resources are cached.
    pub fn is_empty(&self) -> bool {
        self.lut.is_none() && self.program.is_none()
    }
}

/// Renders through the GPU: validate, resolve cached resources, one
/// full-image pass.
pub(crate) fn render_window(
    device: &mut dyn GpuDevice,
    context: &mut GpuContextCache,
    processor: &Processor,
    window: &Window,
    render_scale: &RenderScale,
    field: Field,
    src: &GpuImage,
    dst: &GpuImage,
) -> RenderResult<()> {
    check_scale_field(render_scale, field, &src.meta, "source")?;
    check_scale_field(render_scale, field, &dst.meta, "destination")?;
    check_formats(&src.desc(), &dst.desc())?;
    check_window(window, &dst.bounds, "destination")?;

    let (program, lut) = context.ensure_resources(device, processor)?;
    device.draw_pass(program, lut, src, dst)
}
