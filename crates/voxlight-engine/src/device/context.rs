use std::sync::{Arc, Mutex, OnceLock};

use anyhow::{Context, Result};

use super::error::{GpuError, GpuErrorClass};
use super::GpuInit;

/// Process-wide GPU objects shared by every window.
///
/// wgpu selects one adapter/device for the whole process; surfaces are created
/// per window from the shared instance and configured against this device.
pub struct GpuContext {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    errors: Arc<ErrorSink>,
}

static INSTANCE: OnceLock<wgpu::Instance> = OnceLock::new();

/// `None` inside the lock is a cached terminal failure.
static CONTEXT: OnceLock<Option<Arc<GpuContext>>> = OnceLock::new();

/// Returns the process-wide wgpu instance, creating it on first use.
pub fn instance() -> &'static wgpu::Instance {
    INSTANCE.get_or_init(|| {
        wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        })
    })
}

/// Loads the GPU API once per process.
///
/// The first call requests an adapter and device (compatible with
/// `compatible_surface` when given). The outcome is cached: later calls return
/// the same context, and a failed first attempt is never retried.
pub fn init(config: &GpuInit, compatible_surface: Option<&wgpu::Surface<'_>>) -> Option<Arc<GpuContext>> {
    CONTEXT
        .get_or_init(|| {
            match pollster::block_on(GpuContext::create(config, compatible_surface)) {
                Ok(ctx) => Some(Arc::new(ctx)),
                Err(e) => {
                    log::error!("can't initialize GPU API: {e:#}");
                    None
                }
            }
        })
        .clone()
}

impl GpuContext {
    async fn create(config: &GpuInit, compatible_surface: Option<&wgpu::Surface<'_>>) -> Result<Self> {
        let adapter = instance()
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using GPU adapter \"{}\" ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("voxlight device"),
                required_features: config.required_features,
                required_limits: config.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        // Without a handler wgpu panics on the first validation error.
        let errors = Arc::new(ErrorSink::default());
        let sink = Arc::clone(&errors);
        device.on_uncaptured_error(Arc::new(move |err: wgpu::Error| sink.push(GpuError::from(err))));

        Ok(Self {
            adapter,
            device,
            queue,
            errors,
        })
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the selected adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Whether the adapter meets the given minimum feature level.
    ///
    /// Levels are expressed in OpenGL terms and compared against the adapter's
    /// downlevel shader model.
    pub fn version_supported(&self, major: u32, minor: u32) -> bool {
        let model = self.adapter.get_downlevel_capabilities().shader_model;
        feature_level(model) >= (major, minor)
    }

    /// Drains pending driver errors, logging them against the caller's location.
    #[track_caller]
    pub fn check_error(&self) {
        let caller = std::panic::Location::caller();
        self.check_error_at(&format!("{}:{}", caller.file(), caller.line()));
    }

    /// Drains pending driver errors, logging one line per distinct error.
    pub fn check_error_at(&self, location: &str) -> Vec<GpuError> {
        let errors = self.errors.drain();
        for err in &errors {
            log::warn!("GPU error at {location}: {}: {}", err.class, err.message);
        }
        errors
    }

    /// Runs `f` inside a validation error scope and returns the first
    /// validation error it raised. Errors caught here never reach the sink.
    pub(crate) fn capture_validation<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> (T, Option<GpuError>) {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        let error = pollster::block_on(scope.pop()).map(GpuError::from);
        (value, error)
    }
}

/// Equivalent OpenGL version of a wgpu shader model.
pub(crate) fn feature_level(model: wgpu::ShaderModel) -> (u32, u32) {
    #[allow(unreachable_patterns)]
    match model {
        wgpu::ShaderModel::Sm2 => (2, 1),
        wgpu::ShaderModel::Sm4 => (3, 3),
        wgpu::ShaderModel::Sm5 => (4, 3),
        _ => (4, 3),
    }
}

/// Collects errors reported by the device's uncaptured-error callback.
#[derive(Default)]
pub(crate) struct ErrorSink {
    pending: Mutex<Vec<GpuError>>,
}

impl ErrorSink {
    pub(crate) fn push(&self, err: GpuError) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(err);
        }
    }

    /// Takes all pending errors, collapsing exact duplicates.
    pub(crate) fn drain(&self) -> Vec<GpuError> {
        let Ok(mut pending) = self.pending.lock() else {
            return Vec::new();
        };

        let mut distinct: Vec<GpuError> = Vec::with_capacity(pending.len());
        for err in pending.drain(..) {
            if !distinct.contains(&err) {
                distinct.push(err);
            }
        }
        distinct
    }
}

impl GpuErrorClass {
    /// Classifies a raw wgpu error.
    pub(crate) fn of(err: &wgpu::Error) -> Self {
        #[allow(unreachable_patterns)]
        match err {
            wgpu::Error::OutOfMemory { .. } => GpuErrorClass::OutOfMemory,
            wgpu::Error::Validation { .. } => GpuErrorClass::Validation,
            wgpu::Error::Internal { .. } => GpuErrorClass::Internal,
            _ => GpuErrorClass::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation(msg: &str) -> GpuError {
        GpuError {
            class: GpuErrorClass::Validation,
            message: msg.to_string(),
        }
    }

    #[test]
    fn drain_collapses_duplicates_in_order() {
        let sink = ErrorSink::default();
        sink.push(validation("bad binding"));
        sink.push(GpuError {
            class: GpuErrorClass::OutOfMemory,
            message: "texture".into(),
        });
        sink.push(validation("bad binding"));

        let drained = sink.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], validation("bad binding"));
        assert_eq!(drained[1].class, GpuErrorClass::OutOfMemory);
    }

    #[test]
    fn drain_empties_the_sink() {
        let sink = ErrorSink::default();
        sink.push(validation("x"));
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn shader_model_levels() {
        assert!(feature_level(wgpu::ShaderModel::Sm5) >= (3, 3));
        assert!(feature_level(wgpu::ShaderModel::Sm4) >= (3, 3));
        assert!(feature_level(wgpu::ShaderModel::Sm2) < (3, 3));
    }
}
