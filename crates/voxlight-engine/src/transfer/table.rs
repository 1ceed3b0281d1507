use std::fmt;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::curve::{ColorCurve, OpacityCurve};
use super::{INTENSITY_MIN, TABLE_BYTES, TABLE_WIDTH};

pub const THUMBNAIL_WIDTH: u32 = 256;
pub const THUMBNAIL_HEIGHT: u32 = 32;

/// Full-resolution strip height before scaling; twice the alpha range.
const STRIP_HEIGHT: u32 = 512;

/// One sampled transfer function: `TABLE_WIDTH` premultiplied RGBA8 texels.
///
/// Captured once from a curve pair and never edited in place.
#[derive(Clone, PartialEq, Eq)]
pub struct TransferFunctionTable {
    texels: Box<[u8]>,
}

impl TransferFunctionTable {
    /// Samples the curves at every bucket intensity, premultiplies and quantizes.
    pub fn sample(color: &impl ColorCurve, opacity: &impl OpacityCurve) -> Self {
        let mut texels = vec![0u8; TABLE_BYTES];
        for (bucket, texel) in texels.chunks_exact_mut(4).enumerate() {
            let x = f64::from(INTENSITY_MIN + bucket as i32);
            texel.copy_from_slice(&premultiply(color.color_at(x), opacity.opacity_at(x)));
        }
        Self {
            texels: texels.into_boxed_slice(),
        }
    }

    /// Wraps one table's worth of raw premultiplied bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        (bytes.len() == TABLE_BYTES).then(|| Self {
            texels: bytes.into(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.texels
    }

    /// Premultiplied texel at column `x`.
    pub fn texel(&self, x: usize) -> Option<[u8; 4]> {
        let t = self.texels.get(x * 4..x * 4 + 4)?;
        Some([t[0], t[1], t[2], t[3]])
    }

    /// Renders the table for list display.
    ///
    /// Each visible column becomes a vertical line of straight color rising
    /// `2 * alpha` pixels from the bottom of a 4096x512 strip, which is then
    /// scaled down to `THUMBNAIL_WIDTH x THUMBNAIL_HEIGHT`.
    pub fn thumbnail(&self) -> RgbaImage {
        let mut strip = RgbaImage::new(TABLE_WIDTH as u32, STRIP_HEIGHT);

        for x in 0..TABLE_WIDTH {
            let Some(rgb) = decode_column(&self.texels, x) else {
                continue;
            };
            let alpha = u32::from(self.texels[x * 4 + 3]);
            let pixel = Rgba([saturate(rgb[0]), saturate(rgb[1]), saturate(rgb[2]), 255]);

            let top = STRIP_HEIGHT - (alpha * 2).min(STRIP_HEIGHT);
            for y in top..STRIP_HEIGHT {
                strip.put_pixel(x as u32, y, pixel);
            }
        }

        imageops::resize(&strip, THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Triangle)
    }
}

impl fmt::Debug for TransferFunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferFunctionTable")
            .field("len", &self.texels.len())
            .finish_non_exhaustive()
    }
}

/// Un-premultiplies column `x` of a packed RGBA8 buffer for display.
///
/// Returns `None` for fully transparent (or out-of-range) columns. Channels
/// are `255 * c / a` with integer division and are not clamped, so hand-made
/// images with `c > a` yield values above 255.
pub fn decode_column(buffer: &[u8], x: usize) -> Option<[u32; 3]> {
    let t = buffer.get(x * 4..x * 4 + 4)?;
    let a = u32::from(t[3]);
    if a == 0 {
        return None;
    }
    Some([0, 1, 2].map(|i| 255 * u32::from(t[i]) / a))
}

fn premultiply(rgb: [f64; 3], opacity: f64) -> [u8; 4] {
    let a = opacity.clamp(0.0, 1.0);
    let [r, g, b] = rgb.map(|c| quantize(c.clamp(0.0, 1.0) * a));
    [r, g, b, quantize(a)]
}

fn quantize(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn saturate(v: u32) -> u8 {
    v.min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{ColorFunction, OpacityFunction};

    fn ramp() -> (ColorFunction, OpacityFunction) {
        let color = ColorFunction::new()
            .with_point(-1024.0, [0.0, 0.0, 0.0])
            .with_point(3071.0, [1.0, 1.0, 1.0]);
        let opacity = OpacityFunction::new().with_point(0.0, 1.0);
        (color, opacity)
    }

    // ── sampling ──────────────────────────────────────────────────────────

    #[test]
    fn sample_has_one_texel_per_bucket() {
        let (c, o) = ramp();
        let t = TransferFunctionTable::sample(&c, &o);
        assert_eq!(t.as_bytes().len(), TABLE_BYTES);
        assert_eq!(t.texel(0), Some([0, 0, 0, 255]));
        assert_eq!(t.texel(TABLE_WIDTH - 1), Some([255, 255, 255, 255]));
        assert_eq!(t.texel(TABLE_WIDTH), None);
    }

    #[test]
    fn bucket_maps_to_offset_intensity() {
        // Opaque only at intensity 0, i.e. bucket 1024.
        let color = |_x: f64| [1.0, 1.0, 1.0];
        let opacity = |x: f64| if x == 0.0 { 1.0 } else { 0.0 };
        let t = TransferFunctionTable::sample(&color, &opacity);
        assert_eq!(t.texel(1023), Some([0, 0, 0, 0]));
        assert_eq!(t.texel(1024), Some([255, 255, 255, 255]));
        assert_eq!(t.texel(1025), Some([0, 0, 0, 0]));
    }

    #[test]
    fn color_is_premultiplied_then_rounded() {
        let color = |_x: f64| [1.0, 0.5, 0.0];
        let opacity = |_x: f64| 0.5;
        let t = TransferFunctionTable::sample(&color, &opacity);
        // 1.0 * 0.5 * 255 = 127.5 -> 128; 0.5 * 0.5 * 255 = 63.75 -> 64
        assert_eq!(t.texel(10), Some([128, 64, 0, 128]));
    }

    #[test]
    fn out_of_range_curves_are_clamped() {
        let color = |_x: f64| [2.0, -1.0, 0.5];
        let opacity = |_x: f64| 4.0;
        let t = TransferFunctionTable::sample(&color, &opacity);
        assert_eq!(t.texel(0), Some([255, 0, 128, 255]));
    }

    #[test]
    fn from_bytes_requires_exact_length() {
        assert!(TransferFunctionTable::from_bytes(&[0; TABLE_BYTES]).is_some());
        assert!(TransferFunctionTable::from_bytes(&[0; TABLE_BYTES - 4]).is_none());
    }

    // ── display decode ────────────────────────────────────────────────────

    #[test]
    fn decode_skips_transparent_columns() {
        let buf = [10, 20, 30, 0];
        assert_eq!(decode_column(&buf, 0), None);
    }

    #[test]
    fn decode_divides_by_alpha() {
        let buf = [0, 0, 0, 255, 64, 32, 0, 128];
        assert_eq!(decode_column(&buf, 0), Some([0, 0, 0]));
        assert_eq!(decode_column(&buf, 1), Some([127, 63, 0]));
    }

    #[test]
    fn decode_does_not_clamp() {
        let buf = [200, 0, 0, 100];
        assert_eq!(decode_column(&buf, 0), Some([510, 0, 0]));
    }

    // ── thumbnail ─────────────────────────────────────────────────────────

    #[test]
    fn thumbnail_has_list_size() {
        let (c, o) = ramp();
        let thumb = TransferFunctionTable::sample(&c, &o).thumbnail();
        assert_eq!(thumb.dimensions(), (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT));
    }

    #[test]
    fn transparent_table_gives_empty_thumbnail() {
        let t = TransferFunctionTable::from_bytes(&[0; TABLE_BYTES]).unwrap();
        let thumb = t.thumbnail();
        assert!(thumb.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn opaque_table_fills_bottom_row() {
        let color = |_x: f64| [1.0, 0.0, 0.0];
        let opacity = |_x: f64| 1.0;
        let thumb = TransferFunctionTable::sample(&color, &opacity).thumbnail();
        let bottom = thumb.get_pixel(THUMBNAIL_WIDTH / 2, THUMBNAIL_HEIGHT - 1);
        assert!(bottom.0[0] > 200);
        assert!(bottom.0[3] > 200);
    }
}
