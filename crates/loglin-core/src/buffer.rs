//! Non-owning pixel buffer descriptors.
//!
//! The host owns all pixel storage. Render calls receive
//! [`PixelBufferView`] / [`PixelBufferViewMut`] descriptors: a borrowed
//! `f32` slice plus the geometry needed to address it (bounds
//! [`Window`], component layout, declared bit depth, and row stride).
//! Views never allocate and never outlive the caller's buffer.
//!
//! Strides are counted in `f32` elements. The host-facing contract
//! speaks of bytes, but a slice of `f32` cannot be addressed at a
//! non-element offset, so views carry the element count and validate it
//! against the declared width on construction.
//!
//! # Usage
//!
//! ```rust
//! use loglin_core::{BitDepth, PixelBufferView, PixelComponents, Window};
//!
//! let bounds = Window::from_size(4, 2);
//! let data = vec![0.0f32; 4 * 2 * 4];
//! let view = PixelBufferView::new(
//!     &data,
//!     bounds,
//!     PixelComponents::Rgba,
//!     BitDepth::F32,
//!     4 * 4,
//! )
//! .unwrap();
//!
//! assert_eq!(view.span(0, 0, 4).len(), 16);
//! ```

use crate::error::{CoreError, Result};
use crate::window::Window;

/// Per-pixel component layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelComponents {
    /// Single alpha/mask channel.
    Alpha,
    /// Three color channels, no alpha.
    Rgb,
    /// Three color channels plus alpha.
    Rgba,
}

impl PixelComponents {
    /// Number of f32 elements per pixel.
    #[inline]
    pub const fn count(&self) -> usize {
        match self {
            Self::Alpha => 1,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Returns `true` if the layout carries an alpha channel.
    #[inline]
    pub const fn has_alpha(&self) -> bool {
        matches!(self, Self::Alpha | Self::Rgba)
    }

    /// Returns `true` if the layout carries color channels.
    #[inline]
    pub const fn has_color(&self) -> bool {
        matches!(self, Self::Rgb | Self::Rgba)
    }
}

/// Declared bit depth of a host image.
///
/// The conversion stage processes single-precision float only; the other
/// variants exist so host metadata can be validated and rejected with a
/// format error rather than silently reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit half float.
    F16,
    /// 32-bit float.
    F32,
}

impl BitDepth {
    /// Size of one component in bytes.
    #[inline]
    pub const fn bytes(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 | Self::F16 => 2,
            Self::F32 => 4,
        }
    }

    /// Returns `true` for floating-point depths.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }
}

/// Validates geometry shared by both view types.
fn check_geometry(
    len: usize,
    bounds: &Window,
    components: PixelComponents,
    row_stride: usize,
) -> Result<()> {
    if bounds.is_empty() {
        return Err(CoreError::EmptyWindow { window: *bounds });
    }
    let width = bounds.width();
    let min_stride = width as usize * components.count();
    if row_stride < min_stride {
        return Err(CoreError::invalid_stride(row_stride, min_stride, width));
    }
    let required = (bounds.height() as usize - 1) * row_stride + min_stride;
    if len < required {
        return Err(CoreError::buffer_too_small(required, len));
    }
    Ok(())
}

/// Element offset of pixel (x, y) expressed in bounds coordinates.
#[inline]
fn offset(
    bounds: &Window,
    components: PixelComponents,
    row_stride: usize,
    x: i32,
    y: i32,
) -> usize {
    debug_assert!(bounds.contains(x, y), "pixel ({x}, {y}) outside {bounds}");
    (y - bounds.y1) as usize * row_stride + (x - bounds.x1) as usize * components.count()
}

/// Read-only view over host pixel storage.
#[derive(Debug, Clone, Copy)]
pub struct PixelBufferView<'a> {
    data: &'a [f32],
    bounds: Window,
    components: PixelComponents,
    depth: BitDepth,
    row_stride: usize,
}

impl<'a> PixelBufferView<'a> {
    /// Creates a view, validating stride and slice length against bounds.
    pub fn new(
        data: &'a [f32],
        bounds: Window,
        components: PixelComponents,
        depth: BitDepth,
        row_stride: usize,
    ) -> Result<Self> {
        check_geometry(data.len(), &bounds, components, row_stride)?;
        Ok(Self {
            data,
            bounds,
            components,
            depth,
            row_stride,
        })
    }

    /// Creates a tightly packed view (stride == width * components).
    pub fn tight(
        data: &'a [f32],
        bounds: Window,
        components: PixelComponents,
    ) -> Result<Self> {
        let stride = bounds.width() as usize * components.count();
        Self::new(data, bounds, components, BitDepth::F32, stride)
    }

    /// Buffer bounds.
    #[inline]
    pub fn bounds(&self) -> Window {
        self.bounds
    }

    /// Component layout.
    #[inline]
    pub fn components(&self) -> PixelComponents {
        self.components
    }

    /// Declared bit depth.
    #[inline]
    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    /// Row stride in f32 elements.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// The backing slice.
    #[inline]
    pub fn data(&self) -> &'a [f32] {
        self.data
    }

    /// Contiguous pixel run `[x1, x2)` of row `y`, in bounds coordinates.
    #[inline]
    pub fn span(&self, y: i32, x1: i32, x2: i32) -> &'a [f32] {
        let start = offset(&self.bounds, self.components, self.row_stride, x1, y);
        let len = (x2 - x1) as usize * self.components.count();
        &self.data[start..start + len]
    }

    /// Single pixel at (x, y), in bounds coordinates.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> &'a [f32] {
        self.span(y, x, x + 1)
    }
}

/// Mutable view over host pixel storage.
#[derive(Debug)]
pub struct PixelBufferViewMut<'a> {
    data: &'a mut [f32],
    bounds: Window,
    components: PixelComponents,
    depth: BitDepth,
    row_stride: usize,
}

impl<'a> PixelBufferViewMut<'a> {
    /// Creates a mutable view, validating stride and slice length.
    pub fn new(
        data: &'a mut [f32],
        bounds: Window,
        components: PixelComponents,
        depth: BitDepth,
        row_stride: usize,
    ) -> Result<Self> {
        check_geometry(data.len(), &bounds, components, row_stride)?;
        Ok(Self {
            data,
            bounds,
            components,
            depth,
            row_stride,
        })
    }

    /// Creates a tightly packed mutable view.
    pub fn tight(
        data: &'a mut [f32],
        bounds: Window,
        components: PixelComponents,
    ) -> Result<Self> {
        let stride = bounds.width() as usize * components.count();
        Self::new(data, bounds, components, BitDepth::F32, stride)
    }

    /// Buffer bounds.
    #[inline]
    pub fn bounds(&self) -> Window {
        self.bounds
    }

    /// Component layout.
    #[inline]
    pub fn components(&self) -> PixelComponents {
        self.components
    }

    /// Declared bit depth.
    #[inline]
    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    /// Row stride in f32 elements.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Reborrows as a read-only view.
    #[inline]
    pub fn as_view(&self) -> PixelBufferView<'_> {
        PixelBufferView {
            data: self.data,
            bounds: self.bounds,
            components: self.components,
            depth: self.depth,
            row_stride: self.row_stride,
        }
    }

    /// Mutable pixel run `[x1, x2)` of row `y`, in bounds coordinates.
    #[inline]
    pub fn span_mut(&mut self, y: i32, x1: i32, x2: i32) -> &mut [f32] {
        let start = offset(&self.bounds, self.components, self.row_stride, x1, y);
        let len = (x2 - x1) as usize * self.components.count();
        &mut self.data[start..start + len]
    }

    /// Splits the window's rows into disjoint mutable row slices.
    ///
    /// Returns one `(y, row)` entry per window row where `row` covers
    /// exactly the `[window.x1, window.x2)` pixel run. This is the shape
    /// parallel copy loops consume: each row slice is independent, so
    /// they can be processed on different threads.
    pub fn window_rows_mut(&mut self, window: &Window) -> Vec<(i32, &mut [f32])> {
        debug_assert!(self.bounds.contains_window(window));
        let ncomp = self.components.count();
        let stride = self.row_stride;
        let x_off = (window.x1 - self.bounds.x1) as usize * ncomp;
        let row_len = window.width() as usize * ncomp;
        let first = (window.y1 - self.bounds.y1) as usize * stride;

        let mut rows = Vec::with_capacity(window.height() as usize);
        let mut rest: &mut [f32] = &mut self.data[first..];
        for y in window.rows() {
            let take = stride.min(rest.len());
            let chunk = std::mem::take(&mut rest);
            let (row, tail) = chunk.split_at_mut(take);
            rest = tail;
            let (_, row) = row.split_at_mut(x_off);
            let (row, _) = row.split_at_mut(row_len);
            rows.push((y, row));
        }
        rows
    }
}
