//! Scene contracts consumed by the volume mapper.
//!
//! Responsibilities:
//! - hold scalar volumes with world placement and content stamps
//! - attach the editable transfer-function curve pair to a volume node
//! - provide the perspective camera the mapper derives its matrices from

mod camera;
mod node;
mod volume;

pub use camera::Camera;
pub use node::VolumeNode;
pub use volume::{
    next_stamp, normalize, Bounds, ImageVolume, ScalarData, VolumeError, NORMALIZE_OFFSET,
    NORMALIZE_RANGE,
};
