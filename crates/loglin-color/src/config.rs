//! Profile file parsing and management.
//!
//! A profile is a YAML document defining color spaces, their transforms
//! to and from the reference space, and role bindings. This is the
//! "configuration" the conversion stage loads from disk and shares,
//! immutable, across concurrent render calls.
//!
//! # Example
//!
//! ```ignore
//! use loglin_color::Config;
//!
//! let config = Config::from_file("show/profile.yaml")?;
//! let proc = config.processor("compositing_log", "scene_linear")?;
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::colorspace::ColorSpace;
use crate::error::{ColorError, ColorResult};
use crate::processor::Processor;
use crate::role::Roles;
use crate::transform::{
    LogAffineTransform, MatrixTransform, Transform, TransformDirection,
};

/// A color-management profile.
///
/// Immutable once loaded; shared by reference between render calls.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Profile name.
    name: String,
    /// Profile description.
    description: String,
    /// Directory the profile was loaded from.
    working_dir: PathBuf,
    /// All color spaces.
    colorspaces: Vec<ColorSpace>,
    /// Role mappings.
    roles: Roles,
}

impl Config {
    /// Creates a new empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a profile from a file.
    pub fn from_file(path: impl AsRef<Path>) -> ColorResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ColorError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let working_dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self::from_yaml_str(&content, working_dir)
    }

    /// Loads a profile from a YAML string.
    pub fn from_yaml_str(yaml: &str, working_dir: PathBuf) -> ColorResult<Self> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        Self::from_raw(raw, working_dir)
    }

    /// Constructs a profile from parsed raw data.
    fn from_raw(raw: RawConfig, working_dir: PathBuf) -> ColorResult<Self> {
        if raw.profile_version != 1 {
            return Err(ColorError::UnsupportedVersion {
                version: raw.profile_version,
            });
        }

        let mut config = Self {
            name: raw.name.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            working_dir,
            colorspaces: Vec::new(),
            roles: Roles::new(),
        };

        if let Some(roles) = raw.roles {
            for (role, cs) in roles {
                config.roles.define(role, cs);
            }
        }

        if let Some(colorspaces) = raw.colorspaces {
            for raw_cs in colorspaces {
                let cs = parse_colorspace(raw_cs)?;
                config.colorspaces.push(cs);
            }
        }

        Ok(config)
    }

    /// Profile name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Profile description (may be empty).
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Directory the profile was loaded from.
    #[inline]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// All color spaces.
    #[inline]
    pub fn colorspaces(&self) -> &[ColorSpace] {
        &self.colorspaces
    }

    /// Returns the roles mapping.
    #[inline]
    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    /// Gets a color space by name or role.
    pub fn colorspace(&self, name: &str) -> Option<&ColorSpace> {
        if let Some(cs_name) = self.roles.get(name) {
            return self.colorspaces.iter().find(|cs| cs.matches_name(cs_name));
        }
        self.colorspaces.iter().find(|cs| cs.matches_name(name))
    }

    /// Color space names in profile order.
    pub fn colorspace_names(&self) -> impl Iterator<Item = &str> {
        self.colorspaces.iter().map(|cs| cs.name())
    }

    /// Resolves a role to its color space, failing loudly.
    ///
    /// Distinguishes an unbound role from a role bound to a color space
    /// the profile never defines.
    pub fn require_role(&self, role: &str) -> ColorResult<&ColorSpace> {
        let cs_name = self
            .roles
            .get(role)
            .ok_or_else(|| ColorError::RoleNotDefined { role: role.into() })?;
        self.colorspaces
            .iter()
            .find(|cs| cs.matches_name(cs_name))
            .ok_or_else(|| ColorError::ColorSpaceNotFound {
                name: cs_name.into(),
            })
    }

    /// Adds a color space (programmatic assembly).
    pub fn add_colorspace(&mut self, cs: ColorSpace) {
        self.colorspaces.push(cs);
    }

    /// Defines a role (programmatic assembly).
    pub fn set_role(&mut self, role: impl Into<String>, colorspace: impl Into<String>) {
        self.roles.define(role, colorspace);
    }

    /// Sets the profile name (programmatic assembly).
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Sets the profile description (programmatic assembly).
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Creates a processor converting between two color spaces.
    ///
    /// Either argument may be a role name. The chain is
    /// `src → reference → dst`; spaces without transforms contribute
    /// nothing, so converting a space to itself yields an identity
    /// processor.
    pub fn processor(&self, src: &str, dst: &str) -> ColorResult<Processor> {
        let src_cs = self
            .colorspace(src)
            .ok_or_else(|| ColorError::ColorSpaceNotFound { name: src.into() })?;
        let dst_cs = self
            .colorspace(dst)
            .ok_or_else(|| ColorError::ColorSpaceNotFound { name: dst.into() })?;

        let mut transforms = Vec::new();
        if let Some(t) = src_cs.to_reference() {
            transforms.push(t.clone());
        }
        if let Some(t) = dst_cs.from_reference() {
            transforms.push(t.clone());
        }

        if transforms.is_empty() {
            return Ok(Processor::new());
        }

        let group = Transform::group(transforms);
        Processor::from_transform(&group, TransformDirection::Forward)
    }
}

// =============================================================================
// Raw YAML mirror types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawConfig {
    profile_version: u32,
    name: Option<String>,
    description: Option<String>,
    roles: Option<BTreeMap<String, String>>,
    colorspaces: Option<Vec<RawColorSpace>>,
}

#[derive(Debug, Deserialize)]
struct RawColorSpace {
    name: String,
    description: Option<String>,
    to_reference: Option<RawTransform>,
    from_reference: Option<RawTransform>,
}

#[derive(Debug, Deserialize)]
struct RawTransform {
    #[serde(rename = "type")]
    transform_type: String,
    direction: Option<String>,
    // matrix
    matrix: Option<Vec<f64>>,
    offset: Option<Vec<f64>>,
    // log_affine
    base: Option<f64>,
    log_side_slope: Option<[f64; 3]>,
    log_side_offset: Option<[f64; 3]>,
    lin_side_slope: Option<[f64; 3]>,
    lin_side_offset: Option<[f64; 3]>,
    // group
    children: Option<Vec<RawTransform>>,
}

fn parse_colorspace(raw: RawColorSpace) -> ColorResult<ColorSpace> {
    let mut builder = ColorSpace::builder(&raw.name);
    if let Some(desc) = raw.description {
        builder = builder.description(desc);
    }
    if let Some(t) = raw.to_reference {
        builder = builder.to_reference(parse_transform(t)?);
    }
    if let Some(t) = raw.from_reference {
        builder = builder.from_reference(parse_transform(t)?);
    }
    Ok(builder.build())
}

fn parse_direction(raw: Option<&str>) -> ColorResult<TransformDirection> {
    match raw {
        None | Some("forward") => Ok(TransformDirection::Forward),
        Some("inverse") => Ok(TransformDirection::Inverse),
        Some(other) => Err(ColorError::invalid_transform(format!(
            "unknown direction '{other}' (expected 'forward' or 'inverse')"
        ))),
    }
}

fn parse_transform(raw: RawTransform) -> ColorResult<Transform> {
    let direction = parse_direction(raw.direction.as_deref())?;

    match raw.transform_type.as_str() {
        "matrix" => {
            let mut t = MatrixTransform {
                direction,
                ..Default::default()
            };
            if let Some(m) = raw.matrix {
                if m.len() != 16 {
                    return Err(ColorError::invalid_transform(format!(
                        "matrix must have 16 entries, got {}",
                        m.len()
                    )));
                }
                t.matrix.copy_from_slice(&m);
            }
            if let Some(o) = raw.offset {
                if o.len() != 4 {
                    return Err(ColorError::invalid_transform(format!(
                        "offset must have 4 entries, got {}",
                        o.len()
                    )));
                }
                t.offset.copy_from_slice(&o);
            }
            Ok(Transform::Matrix(t))
        }

        "log_affine" => Ok(Transform::LogAffine(LogAffineTransform {
            base: raw.base.unwrap_or(2.0),
            log_side_slope: raw.log_side_slope.unwrap_or([1.0; 3]),
            log_side_offset: raw.log_side_offset.unwrap_or([0.0; 3]),
            lin_side_slope: raw.lin_side_slope.unwrap_or([1.0; 3]),
            lin_side_offset: raw.lin_side_offset.unwrap_or([0.0; 3]),
            direction,
        })),

        "group" => {
            let children = raw
                .children
                .unwrap_or_default()
                .into_iter()
                .map(parse_transform)
                .collect::<ColorResult<Vec<_>>>()?;
            Ok(Transform::group(children))
        }

        other => Err(ColorError::invalid_transform(format!(
            "unknown transform type '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const PROFILE: &str = r#"
profile_version: 1
name: test-show
description: Test profile with a Cineon-style log space.
roles:
  scene_linear: linear
  compositing_log: cineon
colorspaces:
  - name: linear
    description: Scene-referred linear working space.
  - name: cineon
    description: Cineon film log.
    to_reference:
      type: log_affine
      direction: inverse
      base: 10.0
      log_side_slope: [0.2932551, 0.2932551, 0.2932551]
      log_side_offset: [0.6695992, 0.6695992, 0.6695992]
      lin_side_slope: [0.9892, 0.9892, 0.9892]
      lin_side_offset: [0.0108, 0.0108, 0.0108]
    from_reference:
      type: log_affine
      base: 10.0
      log_side_slope: [0.2932551, 0.2932551, 0.2932551]
      log_side_offset: [0.6695992, 0.6695992, 0.6695992]
      lin_side_slope: [0.9892, 0.9892, 0.9892]
      lin_side_offset: [0.0108, 0.0108, 0.0108]
"#;

    fn load() -> Config {
        Config::from_yaml_str(PROFILE, PathBuf::from(".")).unwrap()
    }

    #[test]
    fn parse_profile() {
        let config = load();
        assert_eq!(config.name(), "test-show");
        assert!(config.description().contains("Cineon"));
        assert_eq!(config.colorspaces().len(), 2);
        assert_eq!(config.roles().len(), 2);
    }

    #[test]
    fn role_lookup() {
        let config = load();
        assert_eq!(config.colorspace("compositing_log").unwrap().name(), "cineon");
        assert_eq!(config.colorspace("scene_linear").unwrap().name(), "linear");
        assert_eq!(config.colorspace("cineon").unwrap().name(), "cineon");
        assert!(config.colorspace("nope").is_none());
    }

    #[test]
    fn require_role() {
        let config = load();
        assert!(config.require_role("scene_linear").is_ok());
        assert!(matches!(
            config.require_role("color_timing"),
            Err(ColorError::RoleNotDefined { .. })
        ));
    }

    #[test]
    fn processor_round_trip() {
        let config = load();
        let lin_to_log = config.processor("scene_linear", "compositing_log").unwrap();
        let log_to_lin = config.processor("compositing_log", "scene_linear").unwrap();

        let mut px = [[0.18_f32, 0.18, 0.18]];
        lin_to_log.apply_rgb(&mut px);
        assert!(px[0][0] != 0.18);
        log_to_lin.apply_rgb(&mut px);
        assert_relative_eq!(px[0][0], 0.18, max_relative = 1e-4);
    }

    #[test]
    fn identity_when_same_space() {
        let config = load();
        let proc = config.processor("linear", "linear").unwrap();
        assert!(proc.is_identity());
    }

    #[test]
    fn missing_colorspace_errors() {
        let config = load();
        assert!(matches!(
            config.processor("linear", "srgb"),
            Err(ColorError::ColorSpaceNotFound { .. })
        ));
    }

    #[test]
    fn unsupported_version() {
        let yaml = "profile_version: 7\n";
        assert!(matches!(
            Config::from_yaml_str(yaml, PathBuf::from(".")),
            Err(ColorError::UnsupportedVersion { version: 7 })
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.yaml");
        std::fs::write(&path, PROFILE).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.name(), "test-show");
        assert_eq!(config.working_dir(), dir.path());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Config::from_file("/definitely/not/here.yaml"),
            Err(ColorError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn bad_transform_type() {
        let yaml = r#"
profile_version: 1
colorspaces:
  - name: broken
    to_reference:
      type: warp
"#;
        assert!(matches!(
            Config::from_yaml_str(yaml, PathBuf::from(".")),
            Err(ColorError::InvalidTransform { .. })
        ));
    }
}
