//! Timer-driven camera rotation and transfer-function blending.

mod driver;

pub use driver::{AnimationConfig, AnimationDriver, SPEED_MAX};
