//! Built-in fallback profile.
//!
//! When a profile file fails to load, the conversion stage degrades to
//! this process-wide default instead of aborting: a scene-linear
//! reference space plus a Cineon-style film log space, with the
//! `scene_linear` and `compositing_log` roles bound.
//!
//! # Example
//!
//! ```
//! use loglin_color::builtin;
//!
//! let config = builtin::default_config();
//! assert!(config.colorspace("compositing_log").is_some());
//! ```

use crate::colorspace::ColorSpace;
use crate::config::Config;
use crate::role;
use crate::transform::{LogAffineTransform, Transform, TransformDirection};

/// Cineon printing-density parameters expressed as a log/affine pair.
///
/// Ref white 685, ref black 95 on the 10-bit code scale:
/// log slope 300/1023, log offset 685/1023, linear gain 0.9892 with a
/// 0.0108 toe offset.
fn cineon_log_affine(direction: TransformDirection) -> Transform {
    Transform::LogAffine(LogAffineTransform {
        base: 10.0,
        log_side_slope: [300.0 / 1023.0; 3],
        log_side_offset: [685.0 / 1023.0; 3],
        lin_side_slope: [0.9892; 3],
        lin_side_offset: [0.0108; 3],
        direction,
    })
}

/// Creates the process-wide default profile.
///
/// Used as the fallback when no profile file is configured or loading
/// fails. Defines:
/// - `scene-linear` - the reference space (identity transforms)
/// - `cineon-log` - Cineon-style film log
///
/// with the `reference`, `default`, `scene_linear` and `compositing_log`
/// roles bound.
pub fn default_config() -> Config {
    let mut config = Config::new();
    config.set_name("loglin-default");
    config.set_description(
        "Built-in fallback profile: scene-linear reference with a Cineon-style compositing log.",
    );

    config.add_colorspace(
        ColorSpace::builder("scene-linear")
            .description("Scene-referred linear reference space.")
            .build(),
    );
    config.add_colorspace(
        ColorSpace::builder("cineon-log")
            .description("Cineon-style film log (ref white 685, ref black 95).")
            .to_reference(cineon_log_affine(TransformDirection::Inverse))
            .from_reference(cineon_log_affine(TransformDirection::Forward))
            .build(),
    );

    config.set_role(role::names::REFERENCE, "scene-linear");
    config.set_role(role::names::DEFAULT, "scene-linear");
    config.set_role(role::names::SCENE_LINEAR, "scene-linear");
    config.set_role(role::names::COMPOSITING_LOG, "cineon-log");

    config
}
