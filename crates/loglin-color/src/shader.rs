//! Fragment shader generation for GPU evaluation.
//!
//! The GPU path draws one full-image pass through a fragment program
//! that samples the baked 3D LUT (see [`crate::Baker`]). This module
//! generates that program's source text. The transform's cache id is
//! embedded in the source, so the text (and therefore the compiled
//! program) changes exactly when the transform changes.

use std::fmt::Write;

/// Target shader language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuLanguage {
    /// GLSL 1.20 (OpenGL 2.1)
    Glsl120,
    /// GLSL 3.30 (OpenGL 3.3)
    #[default]
    Glsl330,
}

impl GpuLanguage {
    /// Returns the version directive for this language.
    pub fn version_directive(&self) -> &'static str {
        match self {
            GpuLanguage::Glsl120 => "#version 120",
            GpuLanguage::Glsl330 => "#version 330 core",
        }
    }
}

/// Generated fragment shader source.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    fragment: String,
    cache_id: u64,
}

impl ShaderSource {
    /// Returns the fragment shader source text.
    pub fn fragment_code(&self) -> &str {
        &self.fragment
    }

    /// Cache id of the transform this shader was generated for.
    pub fn cache_id(&self) -> u64 {
        self.cache_id
    }
}

/// Generates the LUT-sampling fragment program.
///
/// # Arguments
///
/// * `cache_id` - The transform's cache id (embedded in the source)
/// * `lut_edge` - 3D LUT size per dimension
/// * `language` - Target GLSL dialect
pub fn lut_fragment(cache_id: u64, lut_edge: usize, language: GpuLanguage) -> ShaderSource {
    let mut code = String::new();
    let edge = lut_edge as f32;

    writeln!(code, "{}", language.version_directive()).unwrap();
    writeln!(code, "// transform {cache_id:016x}, lut edge {lut_edge}").unwrap();
    writeln!(code).unwrap();

    match language {
        GpuLanguage::Glsl330 => {
            writeln!(code, "in vec2 v_texCoord;").unwrap();
            writeln!(code, "out vec4 fragColor;").unwrap();
        }
        GpuLanguage::Glsl120 => {
            writeln!(code, "varying vec2 v_texCoord;").unwrap();
        }
    }
    writeln!(code, "uniform sampler2D u_image;").unwrap();
    writeln!(code, "uniform sampler3D u_lut3d;").unwrap();
    writeln!(code).unwrap();

    // Sample at texel centers: scale [0,1] into the LUT's valid range.
    writeln!(code, "vec3 lut_apply(vec3 color) {{").unwrap();
    writeln!(
        code,
        "    float scale = {:.8};",
        (edge - 1.0) / edge
    )
    .unwrap();
    writeln!(code, "    float offset = {:.8};", 0.5 / edge).unwrap();
    writeln!(
        code,
        "    vec3 coord = clamp(color, 0.0, 1.0) * scale + offset;"
    )
    .unwrap();
    match language {
        GpuLanguage::Glsl330 => {
            writeln!(code, "    return texture(u_lut3d, coord.bgr).rgb;").unwrap();
        }
        GpuLanguage::Glsl120 => {
            writeln!(code, "    return texture3D(u_lut3d, coord.bgr).rgb;").unwrap();
        }
    }
    writeln!(code, "}}").unwrap();
    writeln!(code).unwrap();

    writeln!(code, "void main() {{").unwrap();
    match language {
        GpuLanguage::Glsl330 => {
            writeln!(code, "    vec4 color = texture(u_image, v_texCoord);").unwrap();
            writeln!(
                code,
                "    fragColor = vec4(lut_apply(color.rgb), color.a);"
            )
            .unwrap();
        }
        GpuLanguage::Glsl120 => {
            writeln!(code, "    vec4 color = texture2D(u_image, v_texCoord);").unwrap();
            writeln!(
                code,
                "    gl_FragColor = vec4(lut_apply(color.rgb), color.a);"
            )
            .unwrap();
        }
    }
    writeln!(code, "}}").unwrap();

    ShaderSource {
        fragment: code,
        cache_id,
    }
}
