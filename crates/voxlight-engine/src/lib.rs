//! Voxlight engine crate.
//!
//! GPU ray-casting of medical volumes with an animatable stack of 1-D
//! transfer functions, plus the platform + GPU runtime pieces the viewer
//! is built on.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod render;
pub mod scene;
pub mod transfer;
pub mod animation;
pub mod session;

pub use session::{Session, SessionError};
