//! Color space definitions.
//!
//! A color space names a pair of transforms relating it to the
//! profile's reference space: `to_reference` (this space → reference)
//! and `from_reference` (reference → this space). Either may be absent,
//! in which case the space *is* the reference (identity both ways).

use crate::transform::Transform;

/// A named color space in a profile.
#[derive(Debug, Clone, Default)]
pub struct ColorSpace {
    name: String,
    description: String,
    to_reference: Option<Transform>,
    from_reference: Option<Transform>,
}

impl ColorSpace {
    /// Starts building a color space with the given name.
    pub fn builder(name: impl Into<String>) -> ColorSpaceBuilder {
        ColorSpaceBuilder {
            cs: ColorSpace {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    /// Color space name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description (may be empty).
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Transform from this space to the reference space.
    #[inline]
    pub fn to_reference(&self) -> Option<&Transform> {
        self.to_reference.as_ref()
    }

    /// Transform from the reference space to this space.
    #[inline]
    pub fn from_reference(&self) -> Option<&Transform> {
        self.from_reference.as_ref()
    }

    /// Returns `true` if `name` refers to this space.
    #[inline]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Builder for [`ColorSpace`].
#[derive(Debug)]
pub struct ColorSpaceBuilder {
    cs: ColorSpace,
}

impl ColorSpaceBuilder {
    /// Sets the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.cs.description = desc.into();
        self
    }

    /// Sets the to-reference transform.
    pub fn to_reference(mut self, t: Transform) -> Self {
        self.cs.to_reference = Some(t);
        self
    }

    /// Sets the from-reference transform.
    pub fn from_reference(mut self, t: Transform) -> Self {
        self.cs.from_reference = Some(t);
        self
    }

    /// Finishes the color space.
    pub fn build(self) -> ColorSpace {
        self.cs
    }
}
