//! GPU device + surface management.
//!
//! This module is responsible for:
//! - loading the GPU API once per process (`context::init`) and caching the outcome
//! - feature-level checks and draining of driver-reported errors
//! - creating & configuring one surface per window
//! - acquiring frames and providing encoders/views for rendering

pub mod context;
mod error;
mod gpu;
mod surface;

pub use context::GpuContext;
pub use error::{GpuError, GpuErrorClass, SurfaceErrorAction};
pub use gpu::{Gpu, GpuFrame, GpuInit};
