use std::fmt;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Broad class of a driver-reported GPU error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GpuErrorClass {
    Validation,
    OutOfMemory,
    Internal,
    Unknown,
}

impl fmt::Display for GpuErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GpuErrorClass::Validation => "Validation error",
            GpuErrorClass::OutOfMemory => "Out of memory",
            GpuErrorClass::Internal => "Internal error",
            GpuErrorClass::Unknown => "Unknown error",
        };
        f.write_str(name)
    }
}

/// A single drained GPU error.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GpuError {
    pub class: GpuErrorClass,
    pub message: String,
}

impl From<wgpu::Error> for GpuError {
    fn from(err: wgpu::Error) -> Self {
        Self {
            class: GpuErrorClass::of(&err),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)
    }
}
