//! Transfer functions: editable curves, sampled lookup tables, and the stacked
//! bank that is animated across and persisted as a PNG strip.
//!
//! A table covers intensities `[INTENSITY_MIN, INTENSITY_MIN + TABLE_WIDTH)`,
//! one RGBA8 premultiplied texel per intensity.

mod bank;
mod codec;
mod curve;
mod error;
mod table;

pub use bank::TransferFunctionBank;
pub use codec::{decode_png, encode_png};
pub use curve::{
    ColorCurve, ColorFunction, ColorPoint, OpacityCurve, OpacityFunction, OpacityPoint,
    TransferFunction,
};
pub use error::TransferError;
pub use table::{decode_column, TransferFunctionTable, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};

/// Texels per table (one per intensity bucket).
pub const TABLE_WIDTH: usize = 4096;

/// Intensity of bucket 0.
pub const INTENSITY_MIN: i32 = -1024;

/// Bytes occupied by one table in a bank or image row.
pub const TABLE_BYTES: usize = TABLE_WIDTH * 4;
