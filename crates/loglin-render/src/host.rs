//! Host-facing request types.
//!
//! The host fetches images and textures itself; render calls receive
//! them here together with the metadata the host declared for them.
//! That metadata is authoritative: the stage validates against it and
//! fails rather than renegotiating.

use loglin_core::{PixelBufferView, PixelBufferViewMut, Window};

use crate::gpu::{GpuContextCache, GpuDevice, GpuImage};

/// Field of an interlaced frame a render applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    /// Progressive / no field separation.
    #[default]
    None,
    /// Both fields interleaved.
    Both,
    /// Lower field only.
    Lower,
    /// Upper field only.
    Upper,
}

/// Proxy render scale of a request or fetched image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderScale {
    /// Horizontal scale (1.0 = full resolution).
    pub x: f64,
    /// Vertical scale.
    pub y: f64,
}

impl Default for RenderScale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// Host-declared metadata accompanying a fetched image or texture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImageMeta {
    /// Scale the image was rendered at.
    pub render_scale: RenderScale,
    /// Field the image carries.
    pub field: Field,
}

/// A fetched read-only host image.
#[derive(Debug)]
pub struct HostImage<'a> {
    /// Pixel data view.
    pub view: PixelBufferView<'a>,
    /// Host-declared metadata.
    pub meta: ImageMeta,
}

/// A fetched writable host image.
#[derive(Debug)]
pub struct HostImageMut<'a> {
    /// Pixel data view.
    pub view: PixelBufferViewMut<'a>,
    /// Host-declared metadata.
    pub meta: ImageMeta,
}

/// One render request.
#[derive(Debug)]
pub struct RenderArgs<'a> {
    /// Frame time of the request.
    pub time: f64,
    /// Window of pixels to produce.
    pub window: Window,
    /// Requested proxy scale.
    pub render_scale: RenderScale,
    /// Requested field.
    pub field: Field,
    /// The images to operate on; also selects the execution path.
    pub images: RenderImages<'a>,
}

/// Images for one render call. The host signals GPU execution by
/// handing over textures and a device instead of buffers.
pub enum RenderImages<'a> {
    /// CPU path: pixel buffers.
    Cpu {
        /// Source image (missing = host contract failure).
        src: Option<HostImage<'a>>,
        /// Destination image (missing = host contract failure).
        dst: Option<HostImageMut<'a>>,
        /// Mask image, when connected and applied.
        mask: Option<HostImage<'a>>,
    },
    /// GPU path: textures plus the device that owns them.
    Gpu {
        /// The host GPU device services.
        device: &'a mut dyn GpuDevice,
        /// Source texture.
        src: Option<GpuImage>,
        /// Destination texture.
        dst: Option<GpuImage>,
        /// Per-context cache returned from context attach, when the
        /// host supports passing it back.
        context: Option<&'a mut GpuContextCache>,
    },
}

impl std::fmt::Debug for RenderImages<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu { src, dst, mask } => f
                .debug_struct("Cpu")
                .field("src", &src.is_some())
                .field("dst", &dst.is_some())
                .field("mask", &mask.is_some())
                .finish(),
            Self::Gpu { src, dst, context, .. } => f
                .debug_struct("Gpu")
                .field("src", &src.is_some())
                .field("dst", &dst.is_some())
                .field("context", &context.is_some())
                .finish(),
        }
    }
}

/// One identity-check request.
#[derive(Debug, Clone, Copy)]
pub struct IsIdentityArgs {
    /// Frame time of the request.
    pub time: f64,
    /// Window that would be rendered.
    pub window: Window,
    /// Requested proxy scale.
    pub render_scale: RenderScale,
    /// Whether a mask input is connected.
    pub mask_connected: bool,
    /// Region of definition of the connected mask, in pixels at the
    /// requested scale.
    pub mask_rod: Option<Window>,
}

/// Which input a bypassed render should pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passthrough {
    /// Pass the source input through unchanged.
    Source,
}

/// Declared premultiplication state of a host clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePremult {
    /// No alpha, or alpha is meaningless.
    Opaque,
    /// Color channels premultiplied by alpha.
    PreMultiplied,
    /// Straight (un-premultiplied) alpha.
    UnPreMultiplied,
}
