//! Compiled color transform processors.
//!
//! A [`Processor`] is the executable form of a transform chain: a flat
//! list of ops applied in sequence to each pixel's RGB channels. Alpha
//! is never touched. Processors are immutable once built and are shared
//! between concurrent render calls behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use loglin_color::{LogAffineTransform, Processor, Transform, TransformDirection};
//!
//! let lin_to_log = Transform::LogAffine(LogAffineTransform {
//!     base: 10.0,
//!     ..Default::default()
//! });
//! let proc = Processor::from_transform(&lin_to_log, TransformDirection::Forward).unwrap();
//!
//! let mut pixels = [[1.0_f32, 1.0, 1.0]];
//! proc.apply_rgb(&mut pixels);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{ColorError, ColorResult};
use crate::transform::{Transform, TransformDirection};

/// A single compiled operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorOp {
    /// Matrix multiply (row-major 4x4, RGB in the upper 3x3) plus offset.
    Matrix {
        /// Row-major 4x4 matrix.
        matrix: [f32; 16],
        /// Per-channel offset.
        offset: [f32; 4],
    },
    /// Log/affine transform.
    LogAffine {
        /// Logarithm base.
        base: f32,
        /// Slope on the log side.
        log_side_slope: [f32; 3],
        /// Offset on the log side.
        log_side_offset: [f32; 3],
        /// Slope on the linear side.
        lin_side_slope: [f32; 3],
        /// Offset on the linear side.
        lin_side_offset: [f32; 3],
        /// True for lin-to-log, false for log-to-lin.
        forward: bool,
    },
}

/// Compiled, immutable color transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Processor {
    ops: Vec<ProcessorOp>,
}

impl Processor {
    /// Creates an identity processor (no ops).
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a processor from pre-built ops.
    #[inline]
    pub fn from_ops(ops: Vec<ProcessorOp>) -> Self {
        Self { ops }
    }

    /// Compiles a transform into a processor.
    pub fn from_transform(
        transform: &Transform,
        direction: TransformDirection,
    ) -> ColorResult<Self> {
        let mut ops = Vec::new();
        push_transform(&mut ops, transform, direction)?;
        Ok(Self { ops })
    }

    /// Returns the compiled ops.
    #[inline]
    pub fn ops(&self) -> &[ProcessorOp] {
        &self.ops
    }

    /// Number of compiled ops.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if applying this processor changes nothing.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Stable identifier for cache invalidation.
    ///
    /// Two processors with identical op lists produce identical ids, so
    /// GPU resources (baked LUTs, shader programs) keyed on this value
    /// are rebuilt exactly when the transform changes. Valid within one
    /// process lifetime.
    pub fn cache_id(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for op in &self.ops {
            match op {
                ProcessorOp::Matrix { matrix, offset } => {
                    0u8.hash(&mut hasher);
                    for v in matrix {
                        v.to_bits().hash(&mut hasher);
                    }
                    for v in offset {
                        v.to_bits().hash(&mut hasher);
                    }
                }
                ProcessorOp::LogAffine {
                    base,
                    log_side_slope,
                    log_side_offset,
                    lin_side_slope,
                    lin_side_offset,
                    forward,
                } => {
                    1u8.hash(&mut hasher);
                    base.to_bits().hash(&mut hasher);
                    for arr in [log_side_slope, log_side_offset, lin_side_slope, lin_side_offset]
                    {
                        for v in arr {
                            v.to_bits().hash(&mut hasher);
                        }
                    }
                    forward.hash(&mut hasher);
                }
            }
        }
        hasher.finish()
    }

    /// Applies the transform to RGB pixels in-place.
    pub fn apply_rgb(&self, pixels: &mut [[f32; 3]]) {
        for pixel in pixels.iter_mut() {
            self.apply_one(pixel);
        }
    }

    /// Applies the transform to RGBA pixels in-place. Alpha is untouched.
    pub fn apply_rgba(&self, pixels: &mut [[f32; 4]]) {
        for pixel in pixels.iter_mut() {
            let mut rgb = [pixel[0], pixel[1], pixel[2]];
            self.apply_one(&mut rgb);
            pixel[0] = rgb[0];
            pixel[1] = rgb[1];
            pixel[2] = rgb[2];
        }
    }

    /// Applies the transform to the first three channels of a pixel slice.
    ///
    /// The slice must hold at least three components; anything past the
    /// third channel (alpha) is untouched. This is the entry point row
    /// loops use on interleaved data.
    #[inline]
    pub fn apply_rgb_prefix(&self, pixel: &mut [f32]) {
        debug_assert!(pixel.len() >= 3);
        let mut rgb = [pixel[0], pixel[1], pixel[2]];
        self.apply_one(&mut rgb);
        pixel[0] = rgb[0];
        pixel[1] = rgb[1];
        pixel[2] = rgb[2];
    }

    /// Applies all ops to a single RGB pixel.
    #[inline]
    fn apply_one(&self, pixel: &mut [f32; 3]) {
        for op in &self.ops {
            match op {
                ProcessorOp::Matrix { matrix, offset } => {
                    let [r, g, b] = *pixel;
                    pixel[0] = r * matrix[0] + g * matrix[1] + b * matrix[2] + offset[0];
                    pixel[1] = r * matrix[4] + g * matrix[5] + b * matrix[6] + offset[1];
                    pixel[2] = r * matrix[8] + g * matrix[9] + b * matrix[10] + offset[2];
                }

                ProcessorOp::LogAffine {
                    base,
                    log_side_slope,
                    log_side_offset,
                    lin_side_slope,
                    lin_side_offset,
                    forward,
                } => {
                    let log_base = base.ln();
                    for (ch, v) in pixel.iter_mut().enumerate() {
                        if *forward {
                            let lin = lin_side_slope[ch] * *v + lin_side_offset[ch];
                            if lin > 0.0 {
                                *v = log_side_slope[ch] * lin.ln() / log_base
                                    + log_side_offset[ch];
                            } else {
                                // Clamp to the log-side floor.
                                *v = log_side_offset[ch];
                            }
                        } else {
                            let exp_arg = (*v - log_side_offset[ch]) / log_side_slope[ch];
                            let lin = base.powf(exp_arg) - lin_side_offset[ch];
                            *v = lin / lin_side_slope[ch];
                        }
                    }
                }
            }
        }
    }
}

/// Appends the ops for `transform` evaluated in `direction`.
fn push_transform(
    ops: &mut Vec<ProcessorOp>,
    transform: &Transform,
    direction: TransformDirection,
) -> ColorResult<()> {
    match transform {
        Transform::Matrix(m) => {
            let dir = combine(m.direction, direction);
            let matrix: [f32; 16] = m.matrix.map(|v| v as f32);
            let offset = [
                m.offset[0] as f32,
                m.offset[1] as f32,
                m.offset[2] as f32,
                m.offset[3] as f32,
            ];
            match dir {
                TransformDirection::Forward => {
                    ops.push(ProcessorOp::Matrix { matrix, offset });
                }
                TransformDirection::Inverse => {
                    let (inv, inv_offset) = invert_matrix(&matrix, &offset)?;
                    ops.push(ProcessorOp::Matrix {
                        matrix: inv,
                        offset: inv_offset,
                    });
                }
            }
        }

        Transform::LogAffine(la) => {
            if la.base <= 0.0 || la.base == 1.0 {
                return Err(ColorError::invalid_transform(format!(
                    "log base must be positive and != 1, got {}",
                    la.base
                )));
            }
            if la.log_side_slope.iter().any(|&s| s == 0.0)
                || la.lin_side_slope.iter().any(|&s| s == 0.0)
            {
                return Err(ColorError::invalid_transform(
                    "log/affine slopes must be non-zero",
                ));
            }
            let dir = combine(la.direction, direction);
            ops.push(ProcessorOp::LogAffine {
                base: la.base as f32,
                log_side_slope: la.log_side_slope.map(|v| v as f32),
                log_side_offset: la.log_side_offset.map(|v| v as f32),
                lin_side_slope: la.lin_side_slope.map(|v| v as f32),
                lin_side_offset: la.lin_side_offset.map(|v| v as f32),
                forward: dir == TransformDirection::Forward,
            });
        }

        Transform::Group(children) => match direction {
            TransformDirection::Forward => {
                for child in children {
                    push_transform(ops, child, direction)?;
                }
            }
            TransformDirection::Inverse => {
                for child in children.iter().rev() {
                    push_transform(ops, child, direction)?;
                }
            }
        },
    }
    Ok(())
}

/// Composes a transform's own direction with the requested one.
#[inline]
fn combine(own: TransformDirection, requested: TransformDirection) -> TransformDirection {
    match requested {
        TransformDirection::Forward => own,
        TransformDirection::Inverse => own.inverse(),
    }
}

/// Inverts the RGB part of an affine matrix op: `y = Mx + o` becomes
/// `x = M'(y - o)` with `M'` the 3x3 inverse.
fn invert_matrix(matrix: &[f32; 16], offset: &[f32; 4]) -> ColorResult<([f32; 16], [f32; 4])> {
    let m = [
        [matrix[0] as f64, matrix[1] as f64, matrix[2] as f64],
        [matrix[4] as f64, matrix[5] as f64, matrix[6] as f64],
        [matrix[8] as f64, matrix[9] as f64, matrix[10] as f64],
    ];
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    if det.abs() < 1e-12 {
        return Err(ColorError::invalid_transform(
            "matrix transform is singular and cannot be inverted",
        ));
    }
    let inv_det = 1.0 / det;
    let inv = [
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ];

    let mut out = [0.0f32; 16];
    for r in 0..3 {
        for c in 0..3 {
            out[r * 4 + c] = inv[r][c] as f32;
        }
    }
    out[15] = 1.0;

    // x = M'y - M'o
    let mut inv_offset = [0.0f32; 4];
    for r in 0..3 {
        let mut acc = 0.0f64;
        for c in 0..3 {
            acc += inv[r][c] * offset[c] as f64;
        }
        inv_offset[r] = -acc as f32;
    }
    Ok((out, inv_offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{LogAffineTransform, MatrixTransform};
    use approx::assert_relative_eq;

    fn cineon() -> LogAffineTransform {
        LogAffineTransform {
            base: 10.0,
            log_side_slope: [0.293_255_1; 3],
            log_side_offset: [0.669_599_2; 3],
            lin_side_slope: [0.9892; 3],
            lin_side_offset: [0.0108; 3],
            direction: TransformDirection::Forward,
        }
    }

    #[test]
    fn identity_processor() {
        let proc = Processor::new();
        assert!(proc.is_identity());
        let mut px = [[0.25_f32, 0.5, 0.75]];
        proc.apply_rgb(&mut px);
        assert_eq!(px, [[0.25, 0.5, 0.75]]);
    }

    #[test]
    fn log_affine_round_trip() {
        let forward =
            Processor::from_transform(&Transform::LogAffine(cineon()), TransformDirection::Forward)
                .unwrap();
        let inverse =
            Processor::from_transform(&Transform::LogAffine(cineon()), TransformDirection::Inverse)
                .unwrap();

        for v in [0.001_f32, 0.18, 1.0, 4.0] {
            let mut px = [[v, v, v]];
            forward.apply_rgb(&mut px);
            inverse.apply_rgb(&mut px);
            assert_relative_eq!(px[0][0], v, max_relative = 1e-4);
        }
    }

    #[test]
    fn log_affine_midgray() {
        // 18% gray lands in the middle of the Cineon log range.
        let proc =
            Processor::from_transform(&Transform::LogAffine(cineon()), TransformDirection::Forward)
                .unwrap();
        let mut px = [[0.18_f32, 0.18, 0.18]];
        proc.apply_rgb(&mut px);
        assert!(px[0][0] > 0.4 && px[0][0] < 0.6, "got {}", px[0][0]);
    }

    #[test]
    fn log_affine_clamps_non_positive() {
        let proc =
            Processor::from_transform(&Transform::LogAffine(cineon()), TransformDirection::Forward)
                .unwrap();
        let mut px = [[-1.0_f32, -1.0, -1.0]];
        proc.apply_rgb(&mut px);
        assert_relative_eq!(px[0][0], 0.669_599_2, max_relative = 1e-5);
    }

    #[test]
    fn matrix_inverse_round_trip() {
        let t = Transform::Matrix(MatrixTransform {
            matrix: {
                let mut m = MatrixTransform::default().matrix;
                m[0] = 2.0;
                m[1] = 0.5;
                m[5] = 1.5;
                m[10] = 0.75;
                m
            },
            offset: [0.1, -0.2, 0.3, 0.0],
            direction: TransformDirection::Forward,
        });
        let forward = Processor::from_transform(&t, TransformDirection::Forward).unwrap();
        let inverse = Processor::from_transform(&t, TransformDirection::Inverse).unwrap();

        let mut px = [[0.3_f32, 0.6, 0.9]];
        forward.apply_rgb(&mut px);
        inverse.apply_rgb(&mut px);
        assert_relative_eq!(px[0][0], 0.3, max_relative = 1e-5);
        assert_relative_eq!(px[0][1], 0.6, max_relative = 1e-5);
        assert_relative_eq!(px[0][2], 0.9, max_relative = 1e-5);
    }

    #[test]
    fn singular_matrix_rejected() {
        let t = Transform::Matrix(MatrixTransform {
            matrix: [0.0; 16],
            offset: [0.0; 4],
            direction: TransformDirection::Forward,
        });
        assert!(Processor::from_transform(&t, TransformDirection::Inverse).is_err());
    }

    #[test]
    fn group_inverse_reverses_order() {
        let scale = Transform::Matrix(MatrixTransform {
            matrix: {
                let mut m = MatrixTransform::default().matrix;
                m[0] = 2.0;
                m[5] = 2.0;
                m[10] = 2.0;
                m
            },
            offset: [0.0; 4],
            direction: TransformDirection::Forward,
        });
        let group = Transform::group(vec![scale, Transform::LogAffine(cineon())]);

        let forward = Processor::from_transform(&group, TransformDirection::Forward).unwrap();
        let inverse = Processor::from_transform(&group, TransformDirection::Inverse).unwrap();

        let mut px = [[0.4_f32, 0.4, 0.4]];
        forward.apply_rgb(&mut px);
        inverse.apply_rgb(&mut px);
        assert_relative_eq!(px[0][0], 0.4, max_relative = 1e-4);
    }

    #[test]
    fn rgba_alpha_untouched() {
        let proc =
            Processor::from_transform(&Transform::LogAffine(cineon()), TransformDirection::Forward)
                .unwrap();
        let mut px = [[0.18_f32, 0.18, 0.18, 0.37]];
        proc.apply_rgba(&mut px);
        assert_eq!(px[0][3], 0.37);
        assert!(px[0][0] != 0.18);
    }

    #[test]
    fn cache_id_stability() {
        let a =
            Processor::from_transform(&Transform::LogAffine(cineon()), TransformDirection::Forward)
                .unwrap();
        let b =
            Processor::from_transform(&Transform::LogAffine(cineon()), TransformDirection::Forward)
                .unwrap();
        let c =
            Processor::from_transform(&Transform::LogAffine(cineon()), TransformDirection::Inverse)
                .unwrap();
        assert_eq!(a.cache_id(), b.cache_id());
        assert_ne!(a.cache_id(), c.cache_id());
    }

    #[test]
    fn invalid_log_base_rejected() {
        let t = Transform::LogAffine(LogAffineTransform {
            base: 1.0,
            ..Default::default()
        });
        assert!(Processor::from_transform(&t, TransformDirection::Forward).is_err());
    }
}
