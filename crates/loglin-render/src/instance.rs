//! The conversion-stage instance: parameters, profile state, and the
//! render dispatcher.
//!
//! One [`Instance`] corresponds to one node the host created. It owns
//! everything shared between that node's concurrent render calls: the
//! parameter set, the loaded profile (an `Arc` swapped on reload), the
//! transform cache, the persistent message shown in the host UI, and
//! the fallback GPU context for hosts that never attach one.
//!
//! [`Instance::render`] is the single per-tile entry point. It picks
//! the CPU or GPU path from what the host handed it, re-validates the
//! host's scale/field contract, resolves the cached transform, and
//! dispatches. All of it is safe to call from many threads at once.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tracing::warn;

use loglin_color::{builtin, role_names, Config, Processor};
use loglin_core::PixelComponents;

use crate::cache::{Mode, TransformCache};
use crate::cpu::{self, CpuRenderParams};
use crate::error::{RenderError, RenderResult};
use crate::gpu::{self, GpuContextCache, GpuDevice};
use crate::host::{
    ImagePremult, IsIdentityArgs, Passthrough, RenderArgs, RenderImages,
};
use crate::validate::check_scale_field;

/// Environment variable naming the default profile path.
pub const CONFIG_ENV_VAR: &str = "LOGLIN_CONFIG";

/// Host-visible parameters of one instance.
#[derive(Debug, Clone)]
pub struct Params {
    /// Path of the profile file; `None` uses the `LOGLIN_CONFIG`
    /// environment variable, or the built-in default profile.
    pub config_path: Option<PathBuf>,
    /// Conversion direction.
    pub mode: Mode,
    /// Source color channels are premultiplied by alpha.
    pub premult: bool,
    /// Blend factor between processed and original output.
    pub mix: f64,
    /// Apply the mask input when connected.
    pub mask_apply: bool,
    /// Invert the mask.
    pub mask_invert: bool,
    /// Host GPU render toggle.
    pub gpu_enabled: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            config_path: None,
            mode: Mode::default(),
            premult: false,
            mix: 1.0,
            mask_apply: true,
            mask_invert: false,
            gpu_enabled: false,
        }
    }
}

/// Which parameter a [`Instance::param_changed`] notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamChange {
    /// The profile path changed; reload it.
    ConfigPath,
    /// The user asked for the help/info text.
    Help,
    /// The GPU render toggle changed.
    GpuToggle,
}

/// Instance-owned GPU context for hosts that never attach one.
#[derive(Debug, Default)]
struct FallbackGpuContext {
    cache: GpuContextCache,
    attached: bool,
}

/// One conversion-stage instance.
#[derive(Debug)]
pub struct Instance {
    params: RwLock<Params>,
    config: RwLock<Arc<Config>>,
    /// Path of the profile currently loaded (None = builtin default).
    loaded_path: Mutex<Option<PathBuf>>,
    /// Whether the mode control is usable (false while running on the
    /// fallback profile after a load failure).
    mode_enabled: AtomicBool,
    /// Tile support declaration; off while GPU render is enabled.
    supports_tiles: AtomicBool,
    /// Persistent user-visible message.
    message: Mutex<Option<String>>,
    cache: TransformCache,
    fallback_gpu: Mutex<FallbackGpuContext>,
}

impl Default for Instance {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl Instance {
    /// Creates an instance and loads its initial profile.
    pub fn new(params: Params) -> Self {
        let supports_tiles = !params.gpu_enabled;
        let instance = Self {
            params: RwLock::new(params),
            config: RwLock::new(Arc::new(builtin::default_config())),
            loaded_path: Mutex::new(None),
            mode_enabled: AtomicBool::new(true),
            supports_tiles: AtomicBool::new(supports_tiles),
            message: Mutex::new(None),
            cache: TransformCache::new(),
            fallback_gpu: Mutex::new(FallbackGpuContext::default()),
        };
        instance.reload_config();
        instance
    }

    /// The currently active profile.
    pub fn current_config(&self) -> Arc<Config> {
        Arc::clone(&self.config.read().unwrap())
    }

    /// Snapshot of the current parameters.
    pub fn params(&self) -> Params {
        self.params.read().unwrap().clone()
    }

    /// Mutates the parameters. Follow up with [`Instance::param_changed`]
    /// for parameters that carry side effects.
    pub fn update_params(&self, f: impl FnOnce(&mut Params)) {
        f(&mut self.params.write().unwrap());
    }

    /// The transform cache (exposed for instrumentation).
    pub fn transform_cache(&self) -> &TransformCache {
        &self.cache
    }

    /// Whether the mode control is currently usable.
    pub fn mode_enabled(&self) -> bool {
        self.mode_enabled.load(Ordering::Relaxed)
    }

    /// Whether the instance currently declares tile support.
    pub fn supports_tiles(&self) -> bool {
        self.supports_tiles.load(Ordering::Relaxed)
    }

    /// The persistent message, if one is attached.
    pub fn persistent_message(&self) -> Option<String> {
        self.message.lock().unwrap().clone()
    }

    fn set_message(&self, msg: impl Into<String>) {
        *self.message.lock().unwrap() = Some(msg.into());
    }

    fn clear_message(&self) {
        *self.message.lock().unwrap() = None;
    }

    /// Resolves the profile path: explicit parameter first, then the
    /// environment variable.
    fn requested_path(&self) -> Option<PathBuf> {
        self.params
            .read()
            .unwrap()
            .config_path
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    }

    /// Loads the profile for the current path if it changed.
    ///
    /// On failure the instance degrades rather than failing: the
    /// process-wide default profile takes over, the mode control is
    /// disabled, and a persistent message is attached. Returns `true`
    /// when the active profile is usable (loaded or intentionally
    /// default).
    fn reload_config(&self) -> bool {
        let requested = self.requested_path();
        let mut loaded = self.loaded_path.lock().unwrap();

        match requested {
            None => {
                if loaded.is_some() {
                    *self.config.write().unwrap() = Arc::new(builtin::default_config());
                }
                *loaded = None;
                self.mode_enabled.store(true, Ordering::Relaxed);
                self.clear_message();
                true
            }
            Some(path) => {
                if loaded.as_ref() == Some(&path) {
                    return true;
                }
                match Config::from_file(&path) {
                    Ok(config) => {
                        *self.config.write().unwrap() = Arc::new(config);
                        *loaded = Some(path);
                        self.mode_enabled.store(true, Ordering::Relaxed);
                        self.clear_message();
                        true
                    }
                    Err(err) => {
                        *self.config.write().unwrap() = Arc::new(builtin::default_config());
                        *loaded = None;
                        self.mode_enabled.store(false, Ordering::Relaxed);
                        self.set_message(format!("profile error: {err}"));
                        false
                    }
                }
            }
        }
    }

    /// Resolves the cached processor, attaching a persistent message on
    /// failure.
    fn resolve_processor(&self, mode: Mode, config: &Arc<Config>) -> RenderResult<Arc<Processor>> {
        self.cache.processor_for(mode, config).map_err(|err| {
            self.set_message(err.to_string());
            RenderError::from(err)
        })
    }

    /// Renders one tile/frame request.
    ///
    /// Chooses the GPU path when the host handed over textures, the CPU
    /// path for buffers; the choice is per call. Fails fatally, with no
    /// destination writes, on missing images, scale/field mismatches,
    /// format errors, or transform resolution failures.
    pub fn render(&self, args: RenderArgs<'_>) -> RenderResult<()> {
        let params = self.params();
        let config = self.current_config();

        match args.images {
            RenderImages::Cpu { src, dst, mask } => {
                let src = src.ok_or(RenderError::MissingImage { what: "source" })?;
                let mut dst = dst.ok_or(RenderError::MissingImage { what: "destination" })?;

                check_scale_field(&args.render_scale, args.field, &src.meta, "source")?;
                check_scale_field(&args.render_scale, args.field, &dst.meta, "destination")?;

                let processor = self.resolve_processor(params.mode, &config)?;
                let mask = if params.mask_apply { mask } else { None };

                cpu::render_window(
                    &processor,
                    &args.window,
                    &src,
                    &mut dst,
                    mask.as_ref(),
                    CpuRenderParams {
                        premult: params.premult,
                        mix: params.mix as f32,
                        mask_invert: params.mask_invert,
                    },
                )
            }

            RenderImages::Gpu {
                device,
                src,
                dst,
                context,
            } => {
                let src = src.ok_or(RenderError::MissingImage { what: "source" })?;
                let dst = dst.ok_or(RenderError::MissingImage { what: "destination" })?;

                let processor = self.resolve_processor(params.mode, &config)?;

                match context {
                    Some(ctx) => gpu::render_window(
                        device,
                        ctx,
                        &processor,
                        &args.window,
                        &args.render_scale,
                        args.field,
                        &src,
                        &dst,
                    ),
                    None => {
                        // Non-conformant host: it never attached a
                        // context, so use the instance-owned one and
                        // synthesize the attachment once.
                        let mut fallback = self.fallback_gpu.lock().unwrap();
                        if !fallback.attached {
                            warn!(
                                "GPU render called without context attach; \
                                 synthesizing attachment"
                            );
                            fallback.attached = true;
                        }
                        gpu::render_window(
                            device,
                            &mut fallback.cache,
                            &processor,
                            &args.window,
                            &args.render_scale,
                            args.field,
                            &src,
                            &dst,
                        )
                    }
                }
            }
        }
    }

    /// Returns the passthrough input when processing can be skipped.
    ///
    /// Identity holds when the mix factor is zero, or when masking is
    /// active, not inverted, and the window misses the mask's region of
    /// definition entirely. Runs before any transform resolution and
    /// clears the persistent message, so a host that retries after a
    /// fixed profile is not stuck on stale error state.
    pub fn is_identity(&self, args: &IsIdentityArgs) -> Option<Passthrough> {
        self.clear_message();

        let params = self.params();
        if params.mix == 0.0 {
            return Some(Passthrough::Source);
        }

        if params.mask_apply && args.mask_connected && !params.mask_invert {
            if let Some(rod) = args.mask_rod {
                if !args.window.intersects(&rod) {
                    return Some(Passthrough::Source);
                }
            }
        }

        None
    }

    /// Reacts to a parameter change.
    ///
    /// Returns a message for the host to show the user, when there is
    /// one (help text, or a profile-load failure notice).
    pub fn param_changed(&self, change: ParamChange) -> Option<String> {
        match change {
            ParamChange::ConfigPath => {
                if self.reload_config() {
                    None
                } else {
                    let path = self
                        .requested_path()
                        .unwrap_or_default();
                    Some(format!("Cannot load profile \"{}\"", path.display()))
                }
            }
            ParamChange::Help => Some(self.help_text()),
            ParamChange::GpuToggle => {
                let gpu = self.params.read().unwrap().gpu_enabled;
                // The GPU path processes full images only, so tiles are
                // declared unsupported while it is enabled.
                self.supports_tiles.store(!gpu, Ordering::Relaxed);
                None
            }
        }
    }

    /// Reacts to the source input changing: adopts the source's
    /// declared premultiplication state when it carries alpha.
    pub fn source_changed(&self, components: PixelComponents, premult: ImagePremult) {
        let mut params = self.params.write().unwrap();
        params.premult =
            components == PixelComponents::Rgba && premult == ImagePremult::PreMultiplied;
    }

    /// Builds the help/info text: profile description and the color
    /// spaces the two roles resolve to.
    pub fn help_text(&self) -> String {
        let config = self.current_config();
        let mut msg = String::new();

        writeln!(
            msg,
            "loglin {}: convert between the scene_linear and compositing_log \
             profile roles.",
            env!("CARGO_PKG_VERSION")
        )
        .unwrap();
        writeln!(
            msg,
            "The profile path can be set with the {CONFIG_ENV_VAR} environment variable."
        )
        .unwrap();

        if !config.description().is_empty() {
            writeln!(msg).unwrap();
            writeln!(msg, "This profile is {}", config.description().trim_end()).unwrap();
        }

        for role in [role_names::SCENE_LINEAR, role_names::COMPOSITING_LOG] {
            writeln!(msg).unwrap();
            match config.require_role(role) {
                Ok(cs) => {
                    if cs.description().is_empty() {
                        writeln!(msg, "{role} colorspace: {}", cs.name()).unwrap();
                    } else {
                        writeln!(
                            msg,
                            "{role} colorspace: {} ({})",
                            cs.name(),
                            cs.description().trim_end()
                        )
                        .unwrap();
                    }
                }
                Err(_) => {
                    writeln!(msg, "{role} colorspace: (not defined)").unwrap();
                }
            }
        }

        msg
    }

    /// Host attached a rendering context to this instance.
    ///
    /// Returns the per-context cache when the host asked for context
    /// data; hosts that pass `false` fall back to the instance-owned
    /// context on render.
    pub fn context_attached(&self, create_context_data: bool) -> Option<GpuContextCache> {
        if create_context_data {
            Some(GpuContextCache::new())
        } else {
            let mut fallback = self.fallback_gpu.lock().unwrap();
            fallback.attached = true;
            None
        }
    }

    /// Host is detaching a rendering context; release its resources.
    ///
    /// `data` is the cache returned from [`Instance::context_attached`],
    /// or `None` when the host used the instance-owned fallback.
    pub fn context_detached(&self, data: Option<&mut GpuContextCache>, device: &mut dyn GpuDevice) {
        match data {
            Some(ctx) => ctx.release(device),
            None => {
                let mut fallback = self.fallback_gpu.lock().unwrap();
                fallback.cache.release(device);
                fallback.attached = false;
            }
        }
    }
}
