//! End-to-end tests of the render dispatcher: CPU and GPU paths,
//! profile loading, caching, and the error contract.

use approx::assert_relative_eq;

use loglin_color::BakedLut3D;
use loglin_core::{BitDepth, PixelBufferView, PixelBufferViewMut, PixelComponents, Window};
use loglin_render::{
    Field, GpuContextCache, GpuDevice, GpuImage, HostImage, HostImageMut, ImageMeta,
    Instance, IsIdentityArgs, Mode, ParamChange, Params, Passthrough, RenderArgs, RenderError,
    RenderImages, RenderResult, RenderScale,
};

fn rgba_image(data: &[f32], bounds: Window) -> HostImage<'_> {
    HostImage {
        view: PixelBufferView::tight(data, bounds, PixelComponents::Rgba).unwrap(),
        meta: ImageMeta::default(),
    }
}

fn rgba_image_mut<'a>(data: &'a mut [f32], bounds: Window) -> HostImageMut<'a> {
    HostImageMut {
        view: PixelBufferViewMut::tight(data, bounds, PixelComponents::Rgba).unwrap(),
        meta: ImageMeta::default(),
    }
}

fn cpu_args<'a>(
    window: Window,
    src: HostImage<'a>,
    dst: HostImageMut<'a>,
    mask: Option<HostImage<'a>>,
) -> RenderArgs<'a> {
    RenderArgs {
        time: 0.0,
        window,
        render_scale: RenderScale::default(),
        field: Field::None,
        images: RenderImages::Cpu {
            src: Some(src),
            dst: Some(dst),
            mask,
        },
    }
}

/// A 4x4 RGBA test pattern spanning the scene-linear range, alpha 1.
fn test_pattern() -> Vec<f32> {
    let mut data = Vec::with_capacity(4 * 4 * 4);
    for i in 0..16 {
        let v = 0.01 + i as f32 * 0.12;
        data.extend_from_slice(&[v, v * 0.5, v * 2.0, 1.0]);
    }
    data
}

#[test]
fn lin_to_log_matches_processor() {
    let bounds = Window::from_size(4, 4);
    let src_data = test_pattern();
    let mut dst_data = vec![0.0f32; src_data.len()];

    let instance = Instance::default();
    instance.update_params(|p| p.mode = Mode::LinToLog);

    instance
        .render(cpu_args(
            bounds,
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut dst_data, bounds),
            None,
        ))
        .unwrap();

    // Every pixel's RGB equals the log encoding of the input; alpha is
    // unchanged.
    let processor = instance
        .current_config()
        .processor("scene_linear", "compositing_log")
        .unwrap();
    for (s, d) in src_data.chunks_exact(4).zip(dst_data.chunks_exact(4)) {
        let mut expect = [[s[0], s[1], s[2]]];
        processor.apply_rgb(&mut expect);
        for c in 0..3 {
            assert_relative_eq!(d[c], expect[0][c], max_relative = 1e-5);
        }
        assert_eq!(d[3], s[3]);
    }
}

#[test]
fn round_trip_reproduces_input() {
    let bounds = Window::from_size(4, 4);
    let src_data = test_pattern();
    let mut log_data = vec![0.0f32; src_data.len()];
    let mut back_data = vec![0.0f32; src_data.len()];

    let instance = Instance::default();

    instance.update_params(|p| p.mode = Mode::LinToLog);
    instance
        .render(cpu_args(
            bounds,
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut log_data, bounds),
            None,
        ))
        .unwrap();

    instance.update_params(|p| p.mode = Mode::LogToLin);
    instance
        .render(cpu_args(
            bounds,
            rgba_image(&log_data, bounds),
            rgba_image_mut(&mut back_data, bounds),
            None,
        ))
        .unwrap();

    for (a, b) in src_data.iter().zip(back_data.iter()) {
        assert_relative_eq!(a, b, max_relative = 1e-3, epsilon = 1e-5);
    }
}

#[test]
fn constant_half_mask_blends_evenly() {
    let bounds = Window::from_size(4, 4);
    let src_data = test_pattern();
    let mask_data = vec![0.5f32; 16];
    let mut masked = vec![0.0f32; src_data.len()];
    let mut full = vec![0.0f32; src_data.len()];

    let instance = Instance::default();
    instance.update_params(|p| p.mode = Mode::LinToLog);

    let mask = HostImage {
        view: PixelBufferView::tight(&mask_data, bounds, PixelComponents::Alpha).unwrap(),
        meta: ImageMeta::default(),
    };
    instance
        .render(cpu_args(
            bounds,
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut masked, bounds),
            Some(mask),
        ))
        .unwrap();
    instance
        .render(cpu_args(
            bounds,
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut full, bounds),
            None,
        ))
        .unwrap();

    // output = 0.5*processed + 0.5*original, per channel.
    for ((m, f), s) in masked.iter().zip(full.iter()).zip(src_data.iter()) {
        assert_relative_eq!(*m, 0.5 * f + 0.5 * s, max_relative = 1e-5);
    }
}

#[test]
fn transform_cache_reused_across_renders() {
    let bounds = Window::from_size(4, 4);
    let src_data = test_pattern();
    let instance = Instance::default();

    for _ in 0..3 {
        let mut dst_data = vec![0.0f32; src_data.len()];
        instance
            .render(cpu_args(
                bounds,
                rgba_image(&src_data, bounds),
                rgba_image_mut(&mut dst_data, bounds),
                None,
            ))
            .unwrap();
    }
    assert_eq!(instance.transform_cache().rebuild_count(), 1);

    // Mode change rebuilds exactly once more.
    instance.update_params(|p| p.mode = Mode::LinToLog);
    let mut dst_data = vec![0.0f32; src_data.len()];
    instance
        .render(cpu_args(
            bounds,
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut dst_data, bounds),
            None,
        ))
        .unwrap();
    assert_eq!(instance.transform_cache().rebuild_count(), 2);
}

#[test]
fn missing_source_is_fatal() {
    let bounds = Window::from_size(4, 4);
    let mut dst_data = vec![0.0f32; 4 * 4 * 4];
    let instance = Instance::default();

    let err = instance
        .render(RenderArgs {
            time: 0.0,
            window: bounds,
            render_scale: RenderScale::default(),
            field: Field::None,
            images: RenderImages::Cpu {
                src: None,
                dst: Some(rgba_image_mut(&mut dst_data, bounds)),
                mask: None,
            },
        })
        .unwrap_err();
    assert!(matches!(err, RenderError::MissingImage { what: "source" }));
}

#[test]
fn scale_mismatch_is_host_contract_error() {
    let bounds = Window::from_size(4, 4);
    let src_data = test_pattern();
    let mut dst_data = vec![0.0f32; src_data.len()];
    let instance = Instance::default();

    let mut src = rgba_image(&src_data, bounds);
    src.meta.render_scale = RenderScale { x: 0.5, y: 0.5 };

    let err = instance
        .render(cpu_args(
            bounds,
            src,
            rgba_image_mut(&mut dst_data, bounds),
            None,
        ))
        .unwrap_err();
    assert!(err.is_host_contract_error());
    assert!(dst_data.iter().all(|&v| v == 0.0));
}

#[test]
fn component_mismatch_writes_nothing() {
    let bounds = Window::from_size(4, 4);
    let src_data = vec![0.5f32; 4 * 4 * 3];
    let mut dst_data = vec![0.0f32; 4 * 4 * 4];
    let instance = Instance::default();

    let src = HostImage {
        view: PixelBufferView::tight(&src_data, bounds, PixelComponents::Rgb).unwrap(),
        meta: ImageMeta::default(),
    };
    let err = instance
        .render(cpu_args(
            bounds,
            src,
            rgba_image_mut(&mut dst_data, bounds),
            None,
        ))
        .unwrap_err();
    assert!(err.is_format_error());
    assert!(dst_data.iter().all(|&v| v == 0.0));
}

#[test]
fn window_outside_bounds_is_value_error() {
    let bounds = Window::from_size(4, 4);
    let src_data = test_pattern();
    let mut dst_data = vec![0.0f32; src_data.len()];
    let instance = Instance::default();

    let err = instance
        .render(cpu_args(
            Window::new(0, 0, 5, 4),
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut dst_data, bounds),
            None,
        ))
        .unwrap_err();
    assert!(matches!(err, RenderError::Value { .. }));
}

#[test]
fn is_identity_contract() {
    let instance = Instance::default();
    let args = IsIdentityArgs {
        time: 0.0,
        window: Window::from_size(8, 8),
        render_scale: RenderScale::default(),
        mask_connected: false,
        mask_rod: None,
    };

    assert_eq!(instance.is_identity(&args), None);

    instance.update_params(|p| p.mix = 0.0);
    assert_eq!(instance.is_identity(&args), Some(Passthrough::Source));
}

// ---------------------------------------------------------------------------
// Profile loading
// ---------------------------------------------------------------------------

const SHOW_PROFILE: &str = r#"
profile_version: 1
name: show
description: an integration-test profile.
roles:
  scene_linear: working-lin
  compositing_log: show-log
colorspaces:
  - name: working-lin
    description: Working linear.
  - name: show-log
    description: Show log encoding.
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

#[test]
fn renders_with_profile_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.yaml");
    std::fs::write(&path, SHOW_PROFILE).unwrap();

    let instance = Instance::new(Params {
        config_path: Some(path),
        mode: Mode::LinToLog,
        ..Params::default()
    });
    assert!(instance.mode_enabled());
    assert!(instance.persistent_message().is_none());

    let bounds = Window::from_size(4, 4);
    let src_data = test_pattern();
    let mut dst_data = vec![0.0f32; src_data.len()];
    instance
        .render(cpu_args(
            bounds,
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut dst_data, bounds),
            None,
        ))
        .unwrap();

    let help = instance.help_text();
    assert!(help.contains("show-log"));
    assert!(help.contains("working-lin"));
}

#[test]
fn unparsable_profile_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "profile_version: [not a version\n").unwrap();

    let instance = Instance::new(Params {
        config_path: Some(path.clone()),
        ..Params::default()
    });
    assert!(!instance.mode_enabled());
    assert!(instance.persistent_message().is_some());

    // Renders still work against the fallback profile.
    let bounds = Window::from_size(4, 4);
    let src_data = test_pattern();
    let mut dst_data = vec![0.0f32; src_data.len()];
    instance
        .render(cpu_args(
            bounds,
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut dst_data, bounds),
            None,
        ))
        .unwrap();

    // Fixing the file and re-notifying recovers.
    std::fs::write(&path, SHOW_PROFILE).unwrap();
    assert!(instance.param_changed(ParamChange::ConfigPath).is_none());
    assert!(instance.mode_enabled());
    assert!(instance.persistent_message().is_none());
    assert_eq!(instance.current_config().name(), "show");
}

#[test]
fn profile_reload_invalidates_transform_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.yaml");
    std::fs::write(&path, SHOW_PROFILE).unwrap();

    let instance = Instance::default();
    let bounds = Window::from_size(4, 4);
    let src_data = test_pattern();

    let mut dst_data = vec![0.0f32; src_data.len()];
    instance
        .render(cpu_args(
            bounds,
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut dst_data, bounds),
            None,
        ))
        .unwrap();
    assert_eq!(instance.transform_cache().rebuild_count(), 1);

    instance.update_params(|p| p.config_path = Some(path));
    instance.param_changed(ParamChange::ConfigPath);

    // Lazy invalidation: the rebuild happens on the next render, not at
    // reload time.
    assert_eq!(instance.transform_cache().rebuild_count(), 1);
    let mut dst_data = vec![0.0f32; src_data.len()];
    instance
        .render(cpu_args(
            bounds,
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut dst_data, bounds),
            None,
        ))
        .unwrap();
    assert_eq!(instance.transform_cache().rebuild_count(), 2);
}

// ---------------------------------------------------------------------------
// GPU path
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CountingDevice {
    next_handle: u32,
    uploads: usize,
    compiles: usize,
    draws: usize,
    released: Vec<u32>,
}

impl GpuDevice for CountingDevice {
    fn upload_lut3d(&mut self, lut: &BakedLut3D) -> RenderResult<u32> {
        assert_eq!(lut.data.len(), lut.size.pow(3) * 3);
        self.uploads += 1;
        self.next_handle += 1;
        Ok(self.next_handle)
    }

    fn compile_fragment(&mut self, source: &str) -> RenderResult<u32> {
        assert!(source.contains("#version"));
        self.compiles += 1;
        self.next_handle += 1;
        Ok(self.next_handle)
    }

    fn release_lut3d(&mut self, handle: u32) {
        self.released.push(handle);
    }

    fn release_program(&mut self, handle: u32) {
        self.released.push(handle);
    }

    fn draw_pass(
        &mut self,
        program: u32,
        lut: u32,
        _src: &GpuImage,
        _dst: &GpuImage,
    ) -> RenderResult<()> {
        assert_ne!(program, 0);
        assert_ne!(lut, 0);
        self.draws += 1;
        Ok(())
    }
}

fn gpu_image(bounds: Window) -> GpuImage {
    GpuImage {
        texture: 7,
        bounds,
        components: PixelComponents::Rgba,
        depth: BitDepth::F32,
        meta: ImageMeta::default(),
    }
}

fn gpu_args<'a>(
    device: &'a mut CountingDevice,
    window: Window,
    bounds: Window,
    context: Option<&'a mut GpuContextCache>,
) -> RenderArgs<'a> {
    RenderArgs {
        time: 0.0,
        window,
        render_scale: RenderScale::default(),
        field: Field::None,
        images: RenderImages::Gpu {
            device,
            src: Some(gpu_image(bounds)),
            dst: Some(gpu_image(bounds)),
            context,
        },
    }
}

#[test]
fn gpu_path_caches_resources_per_context() {
    let bounds = Window::from_size(16, 16);
    let instance = Instance::default();
    let mut device = CountingDevice::default();
    let mut context = instance.context_attached(true).unwrap();

    for _ in 0..3 {
        instance
            .render(gpu_args(&mut device, bounds, bounds, Some(&mut context)))
            .unwrap();
    }
    assert_eq!(device.draws, 3);
    assert_eq!(device.uploads, 1);
    assert_eq!(device.compiles, 1);

    // Mode change -> new transform -> both resources rebuilt.
    instance.update_params(|p| p.mode = Mode::LinToLog);
    instance
        .render(gpu_args(&mut device, bounds, bounds, Some(&mut context)))
        .unwrap();
    assert_eq!(device.uploads, 2);
    assert_eq!(device.compiles, 2);

    instance.context_detached(Some(&mut context), &mut device);
    assert!(context.is_empty());
}

#[test]
fn gpu_fallback_context_for_nonconformant_host() {
    let bounds = Window::from_size(8, 8);
    let instance = Instance::default();
    let mut device = CountingDevice::default();

    // Host never attached a context; the instance-owned fallback is
    // used and resources are still cached across calls.
    for _ in 0..2 {
        instance
            .render(gpu_args(&mut device, bounds, bounds, None))
            .unwrap();
    }
    assert_eq!(device.draws, 2);
    assert_eq!(device.uploads, 1);
    assert_eq!(device.compiles, 1);

    instance.context_detached(None, &mut device);
    assert_eq!(device.released.len(), 2);
}

#[test]
fn gpu_missing_texture_is_fatal() {
    let bounds = Window::from_size(8, 8);
    let instance = Instance::default();
    let mut device = CountingDevice::default();

    let err = instance
        .render(RenderArgs {
            time: 0.0,
            window: bounds,
            render_scale: RenderScale::default(),
            field: Field::None,
            images: RenderImages::Gpu {
                device: &mut device,
                src: None,
                dst: Some(gpu_image(bounds)),
                context: None,
            },
        })
        .unwrap_err();
    assert!(matches!(err, RenderError::MissingImage { what: "source" }));
    assert_eq!(device.draws, 0);
}

#[test]
fn gpu_field_mismatch_is_fatal() {
    let bounds = Window::from_size(8, 8);
    let instance = Instance::default();
    let mut device = CountingDevice::default();

    let mut src = gpu_image(bounds);
    src.meta.field = Field::Lower;
    let err = instance
        .render(RenderArgs {
            time: 0.0,
            window: bounds,
            render_scale: RenderScale::default(),
            field: Field::None,
            images: RenderImages::Gpu {
                device: &mut device,
                src: Some(src),
                dst: Some(gpu_image(bounds)),
                context: None,
            },
        })
        .unwrap_err();
    assert!(err.is_host_contract_error());
    assert_eq!(device.draws, 0);
}

#[test]
fn transform_error_attaches_message_and_cache_retries() {
    // A profile with no compositing_log role: transform resolution
    // fails, the message is attached, and the cache stays empty.
    let yaml = r#"
profile_version: 1
name: no-log
roles:
  scene_linear: lin
colorspaces:
  - name: lin
"#;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-log.yaml");
    std::fs::write(&path, yaml).unwrap();

    let instance = Instance::new(Params {
        config_path: Some(path),
        ..Params::default()
    });
    assert!(instance.mode_enabled());

    let bounds = Window::from_size(4, 4);
    let src_data = test_pattern();
    let mut dst_data = vec![0.0f32; src_data.len()];
    let err = instance
        .render(cpu_args(
            bounds,
            rgba_image(&src_data, bounds),
            rgba_image_mut(&mut dst_data, bounds),
            None,
        ))
        .unwrap_err();
    assert!(matches!(err, RenderError::Transform(_)));
    assert!(instance.persistent_message().is_some());
    assert!(instance.transform_cache().is_empty());
    assert!(dst_data.iter().all(|&v| v == 0.0));
}

#[test]
fn env_var_names_default_profile() {
    // Only checks the constant's identity; actually setting process
    // environment in tests would race with parallel test threads.
    assert_eq!(loglin_render::CONFIG_ENV_VAR, "LOGLIN_CONFIG");
}
