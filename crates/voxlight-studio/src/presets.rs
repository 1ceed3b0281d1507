//! Ready-made transfer functions for CT intensities (Hounsfield units).

use voxlight_engine::transfer::{ColorFunction, OpacityFunction, TransferFunction};

pub const PRESET_NAMES: &[&str] = &["soft-tissue", "bone", "vessels", "ramp"];

/// Looks a preset up by name.
pub fn preset(name: &str) -> Option<TransferFunction> {
    let tf = match name {
        "soft-tissue" => soft_tissue(),
        "bone" => bone(),
        "vessels" => vessels(),
        "ramp" => ramp(),
        _ => return None,
    };
    Some(tf)
}

/// Skin and muscle faint, bone opaque.
pub fn soft_tissue() -> TransferFunction {
    TransferFunction::new(
        ColorFunction::new()
            .with_point(-1024.0, [0.0, 0.0, 0.0])
            .with_point(-100.0, [0.55, 0.25, 0.15])
            .with_point(40.0, [0.88, 0.60, 0.50])
            .with_point(400.0, [1.0, 0.95, 0.85]),
        OpacityFunction::new()
            .with_point(-300.0, 0.0)
            .with_point(-100.0, 0.02)
            .with_point(80.0, 0.05)
            .with_point(400.0, 0.6),
    )
}

/// Only bone; everything below the threshold is transparent.
pub fn bone() -> TransferFunction {
    TransferFunction::new(
        ColorFunction::new()
            .with_point(200.0, [0.89, 0.85, 0.79])
            .with_point(1500.0, [1.0, 1.0, 0.95]),
        OpacityFunction::new()
            .with_point(200.0, 0.0)
            .with_point(350.0, 0.8)
            .with_point(3071.0, 1.0),
    )
}

/// Contrast-filled structures in red, bone faint.
pub fn vessels() -> TransferFunction {
    TransferFunction::new(
        ColorFunction::new()
            .with_point(150.0, [0.8, 0.1, 0.1])
            .with_point(350.0, [1.0, 0.3, 0.2])
            .with_point(600.0, [0.9, 0.9, 0.9]),
        OpacityFunction::new()
            .with_point(150.0, 0.0)
            .with_point(250.0, 0.7)
            .with_point(450.0, 0.7)
            .with_point(600.0, 0.05),
    )
}

/// Grey ramp over the whole range.
pub fn ramp() -> TransferFunction {
    TransferFunction::new(
        ColorFunction::new()
            .with_point(-1024.0, [0.0, 0.0, 0.0])
            .with_point(3071.0, [1.0, 1.0, 1.0]),
        OpacityFunction::new()
            .with_point(-1000.0, 0.0)
            .with_point(3071.0, 0.3),
    )
}

#[cfg(test)]
mod tests {
    use voxlight_engine::transfer::OpacityCurve;

    use super::*;

    #[test]
    fn every_name_resolves() {
        for name in PRESET_NAMES {
            assert!(preset(name).is_some(), "{name}");
        }
        assert!(preset("unknown").is_none());
    }

    #[test]
    fn air_is_transparent() {
        for name in PRESET_NAMES {
            let tf = preset(name).unwrap();
            assert_eq!(tf.opacity.opacity_at(-1000.0), 0.0, "{name}");
        }
    }
}
