//! 3D LUT baking for processors.
//!
//! The GPU path evaluates transforms by sampling a 3D lookup table
//! instead of running the op chain per fragment. [`Baker`] samples a
//! [`crate::Processor`] over an input domain into a [`BakedLut3D`]
//! ready for texture upload.

use crate::error::{ColorError, ColorResult};
use crate::processor::Processor;

/// Baked 3D LUT data.
#[derive(Debug, Clone)]
pub struct BakedLut3D {
    /// LUT size per dimension (e.g. 33 for 33x33x33).
    pub size: usize,
    /// Input domain minimum per channel.
    pub domain_min: [f32; 3],
    /// Input domain maximum per channel.
    pub domain_max: [f32; 3],
    /// LUT data as RGB triplets (size^3 * 3 values).
    /// Ordered: B varies fastest, then G, then R.
    pub data: Vec<f32>,
}

/// LUT baker for converting processors to lookup tables.
#[derive(Debug)]
pub struct Baker<'a> {
    processor: &'a Processor,
}

impl<'a> Baker<'a> {
    /// Creates a new baker for the given processor.
    pub fn new(processor: &'a Processor) -> Self {
        Self { processor }
    }

    /// Bakes the processor to a 3D LUT over the [0, 1] domain.
    ///
    /// # Arguments
    ///
    /// * `size` - LUT size per dimension (typical: 17, 33, 65)
    pub fn bake_lut_3d(&self, size: usize) -> ColorResult<BakedLut3D> {
        self.bake_lut_3d_with_domain(size, [0.0; 3], [1.0; 3])
    }

    /// Bakes the processor to a 3D LUT with a custom input domain.
    pub fn bake_lut_3d_with_domain(
        &self,
        size: usize,
        domain_min: [f32; 3],
        domain_max: [f32; 3],
    ) -> ColorResult<BakedLut3D> {
        if size < 2 {
            return Err(ColorError::Validation(
                "LUT size must be at least 2".into(),
            ));
        }

        let total = size * size * size;
        let mut data = Vec::with_capacity(total * 3);

        let range = [
            domain_max[0] - domain_min[0],
            domain_max[1] - domain_min[1],
            domain_max[2] - domain_min[2],
        ];

        // B varies fastest, then G, then R.
        for r in 0..size {
            let tr = r as f32 / (size - 1) as f32;
            let red = domain_min[0] + tr * range[0];

            for g in 0..size {
                let tg = g as f32 / (size - 1) as f32;
                let green = domain_min[1] + tg * range[1];

                for b in 0..size {
                    let tb = b as f32 / (size - 1) as f32;
                    let blue = domain_min[2] + tb * range[2];

                    let mut pixel = [[red, green, blue]];
                    self.processor.apply_rgb(&mut pixel);

                    data.push(pixel[0][0]);
                    data.push(pixel[0][1]);
                    data.push(pixel[0][2]);
                }
            }
        }

        Ok(BakedLut3D {
            size,
            domain_min,
            domain_max,
            data,
        })
    }
}
