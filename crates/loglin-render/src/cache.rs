//! Thread-safe transform caching.
//!
//! Building a processor resolves roles and compiles a transform chain,
//! which is far too expensive per tile. [`TransformCache`] memoizes the
//! last processor built, keyed on the conversion mode and the identity
//! of the profile that produced it. A profile reload swaps the shared
//! `Arc<Config>`, which invalidates the cache lazily on the next call;
//! no eager rebuild happens at reload time.
//!
//! The cache is owned by the plugin instance, never process-global, and
//! is safe for concurrent render calls: rebuilds are single-flight
//! behind a mutex, so a cold cache hit by many threads builds exactly
//! once and every caller observes the same shared processor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use loglin_color::{role_names, ColorResult, Config, Processor};

/// Conversion direction between the log and linear roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Compositing-log input to scene-linear output.
    #[default]
    LogToLin,
    /// Scene-linear input to compositing-log output.
    LinToLog,
}

impl Mode {
    /// Display label for the mode.
    pub fn label(&self) -> &'static str {
        match self {
            Self::LogToLin => "Log to Lin",
            Self::LinToLog => "Lin to Log",
        }
    }
}

/// Source and destination roles implied by a mode.
pub fn role_pair(mode: Mode) -> (&'static str, &'static str) {
    match mode {
        Mode::LogToLin => (role_names::COMPOSITING_LOG, role_names::SCENE_LINEAR),
        Mode::LinToLog => (role_names::SCENE_LINEAR, role_names::COMPOSITING_LOG),
    }
}

/// The memoized processor and what it was built from.
#[derive(Debug)]
struct CachedTransform {
    mode: Mode,
    config_id: usize,
    processor: Arc<Processor>,
}

/// Single-slot processor cache.
#[derive(Debug, Default)]
pub struct TransformCache {
    slot: Mutex<Option<CachedTransform>>,
    rebuilds: AtomicUsize,
}

impl TransformCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the processor for `mode` against `config`.
    ///
    /// Reuses the cached processor when both the mode and the profile
    /// reference are unchanged; otherwise rebuilds under the lock. On a
    /// failed rebuild the slot is cleared so the next call retries.
    pub fn processor_for(&self, mode: Mode, config: &Arc<Config>) -> ColorResult<Arc<Processor>> {
        let config_id = Arc::as_ptr(config) as usize;

        let mut slot = self.slot.lock().unwrap();
        if let Some(cached) = slot.as_ref() {
            if cached.mode == mode && cached.config_id == config_id {
                return Ok(Arc::clone(&cached.processor));
            }
        }

        // Rebuild while holding the lock: concurrent callers for the
        // same mode wait here and then hit the fresh slot.
        *slot = None;
        let (src_role, dst_role) = role_pair(mode);
        let src = config.require_role(src_role)?.name().to_owned();
        let dst = config.require_role(dst_role)?.name().to_owned();
        let processor = Arc::new(config.processor(&src, &dst)?);

        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        debug!(
            mode = mode.label(),
            src = %src,
            dst = %dst,
            "rebuilt color transform processor"
        );

        *slot = Some(CachedTransform {
            mode,
            config_id,
            processor: Arc::clone(&processor),
        });
        Ok(processor)
    }

    /// Drops any cached processor.
    pub fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }

    /// Returns `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.slot.lock().unwrap().is_none()
    }

    /// Number of processor rebuilds performed so far.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds.load(Ordering::Relaxed)
    }
}
