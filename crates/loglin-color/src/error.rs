//! Error types for profile parsing and transform processing.
//!
//! This module provides error handling for:
//! - Profile file parsing (YAML)
//! - Color space and role lookup
//! - Transform chain building

use std::path::PathBuf;
use thiserror::Error;

/// Result type for color-management operations.
pub type ColorResult<T> = Result<T, ColorError>;

/// Errors that can occur during color-management operations.
#[derive(Debug, Error)]
pub enum ColorError {
    /// I/O error reading profile files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Profile file not found.
    #[error("profile not found: {path}")]
    ConfigNotFound {
        /// Path that was searched.
        path: PathBuf,
    },

    /// Unsupported profile version.
    #[error("unsupported profile version: {version} (supported: 1)")]
    UnsupportedVersion {
        /// Version from the profile.
        version: u32,
    },

    /// Color space not found in the profile.
    #[error("color space not found: {name}")]
    ColorSpaceNotFound {
        /// Name of the missing color space.
        name: String,
    },

    /// Role not defined in the profile.
    #[error("role not defined: {role}")]
    RoleNotDefined {
        /// Name of the undefined role.
        role: String,
    },

    /// Invalid transform definition.
    #[error("invalid transform: {reason}")]
    InvalidTransform {
        /// Description of what's wrong.
        reason: String,
    },

    /// General validation error.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ColorError {
    /// Creates an [`ColorError::InvalidTransform`] error.
    #[inline]
    pub fn invalid_transform(reason: impl Into<String>) -> Self {
        Self::InvalidTransform {
            reason: reason.into(),
        }
    }
}
