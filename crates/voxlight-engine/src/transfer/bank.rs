use image::RgbaImage;

use super::curve::{ColorCurve, OpacityCurve};
use super::table::TransferFunctionTable;
use super::{TransferError, TABLE_BYTES, TABLE_WIDTH};

/// Ordered stack of transfer-function tables in one contiguous buffer.
///
/// The buffer holds exactly `len() * TABLE_BYTES` bytes and is empty iff the
/// bank is. Every mutation builds a new buffer and swaps it in whole, so a
/// reader between mutations always sees complete tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferFunctionBank {
    data: Vec<u8>,
}

impl TransferFunctionBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len() / TABLE_BYTES
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Packed premultiplied RGBA8 rows, one per table, in append order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn table(&self, index: usize) -> Option<&[u8]> {
        if index >= self.len() {
            return None;
        }
        let start = index * TABLE_BYTES;
        self.data.get(start..start + TABLE_BYTES)
    }

    pub fn tables(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(TABLE_BYTES)
    }

    /// Samples a curve pair and appends it as the last table.
    ///
    /// Returns the new table's index.
    pub fn append(&mut self, color: &impl ColorCurve, opacity: &impl OpacityCurve) -> usize {
        self.push_table(&TransferFunctionTable::sample(color, opacity))
    }

    /// Appends an already-sampled table; returns its index.
    pub fn push_table(&mut self, table: &TransferFunctionTable) -> usize {
        let mut data = Vec::with_capacity(self.data.len() + TABLE_BYTES);
        data.extend_from_slice(&self.data);
        data.extend_from_slice(table.as_bytes());
        self.data = data;
        self.len() - 1
    }

    /// Removes the table at `index`, shifting later tables down.
    ///
    /// Out-of-range indices leave the bank untouched and return `false`.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }

        let start = index * TABLE_BYTES;
        let end = start + TABLE_BYTES;
        let mut data = Vec::with_capacity(self.data.len() - TABLE_BYTES);
        data.extend_from_slice(&self.data[..start]);
        data.extend_from_slice(&self.data[end..]);
        self.data = data;
        true
    }

    /// Replaces the whole bank with the rows of a `TABLE_WIDTH`-wide RGBA8 image.
    ///
    /// Bytes are taken verbatim as premultiplied values; `height` becomes the
    /// table count. Nothing changes on error.
    pub fn load_from_image(&mut self, bytes: &[u8], width: u32, height: u32) -> Result<(), TransferError> {
        if width as usize != TABLE_WIDTH {
            return Err(TransferError::WrongWidth { width });
        }
        let expected = TABLE_BYTES * height as usize;
        if bytes.len() != expected {
            return Err(TransferError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        self.data = bytes.to_vec();
        Ok(())
    }

    /// Replaces the bank from a decoded image.
    pub fn load_image(&mut self, image: &RgbaImage) -> Result<(), TransferError> {
        self.load_from_image(image.as_raw(), image.width(), image.height())
    }

    /// Exports the bank as a `TABLE_WIDTH x len()` premultiplied RGBA8 image.
    pub fn save_to_image(&self) -> Result<RgbaImage, TransferError> {
        if self.is_empty() {
            return Err(TransferError::EmptyBank);
        }
        RgbaImage::from_raw(TABLE_WIDTH as u32, self.len() as u32, self.data.clone()).ok_or(
            TransferError::SizeMismatch {
                expected: TABLE_BYTES * self.len(),
                actual: self.data.len(),
            },
        )
    }

    /// Decodes PNG bytes and replaces the bank with them.
    pub fn load_png(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        let image = super::decode_png(bytes)?;
        self.load_image(&image)
    }

    pub fn to_png(&self) -> Result<Vec<u8>, TransferError> {
        super::encode_png(&self.save_to_image()?)
    }

    /// Advances an animation cursor by `step` tables, wrapping modulo `len()`.
    ///
    /// Unchanged when `step` is zero or fewer than two tables exist. The wrap
    /// is `i - floor(i / n) * n`; negative steps are not exercised.
    pub fn advance_index(&self, index: f64, step: f64) -> f64 {
        let count = self.len();
        if step == 0.0 || count < 2 {
            return index;
        }
        let count = count as f64;
        let index = index + step;
        index - (index / count).floor() * count
    }

    pub fn thumbnail(&self, index: usize) -> Option<RgbaImage> {
        let table = TransferFunctionTable::from_bytes(self.table(index)?)?;
        Some(table.thumbnail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{ColorFunction, OpacityFunction};

    fn gray(level: f64) -> (impl Fn(f64) -> [f64; 3], impl Fn(f64) -> f64) {
        (move |_x: f64| [level; 3], |_x: f64| 1.0)
    }

    fn bank_of(levels: &[f64]) -> TransferFunctionBank {
        let mut bank = TransferFunctionBank::new();
        for &l in levels {
            let (c, o) = gray(l);
            bank.append(&c, &o);
        }
        bank
    }

    // ── append / remove ───────────────────────────────────────────────────

    #[test]
    fn new_bank_is_empty() {
        let bank = TransferFunctionBank::new();
        assert!(bank.is_empty());
        assert_eq!(bank.len(), 0);
        assert!(bank.as_bytes().is_empty());
    }

    #[test]
    fn append_puts_sampled_table_last() {
        let mut bank = bank_of(&[0.0, 0.5]);
        let color = ColorFunction::new()
            .with_point(-1024.0, [0.0, 0.0, 1.0])
            .with_point(3071.0, [1.0, 0.0, 0.0]);
        let opacity = OpacityFunction::new().with_point(0.0, 0.2).with_point(1000.0, 0.9);

        let before = bank.as_bytes().to_vec();
        let index = bank.append(&color, &opacity);

        assert_eq!(index, 2);
        assert_eq!(bank.len(), 3);
        assert_eq!(&bank.as_bytes()[..before.len()], &before[..]);
        let direct = TransferFunctionTable::sample(&color, &opacity);
        assert_eq!(bank.table(2), Some(direct.as_bytes()));
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut bank = bank_of(&[0.1, 0.2]);
        let before = bank.clone();
        assert!(!bank.remove_at(2));
        assert!(!bank.remove_at(usize::MAX));
        assert_eq!(bank, before);
    }

    #[test]
    fn remove_shifts_later_tables_down() {
        let mut bank = bank_of(&[0.1, 0.2, 0.3, 0.4]);
        let old: Vec<Vec<u8>> = bank.tables().map(<[u8]>::to_vec).collect();

        assert!(bank.remove_at(1));
        assert_eq!(bank.len(), 3);
        assert_eq!(bank.table(0), Some(&old[0][..]));
        assert_eq!(bank.table(1), Some(&old[2][..]));
        assert_eq!(bank.table(2), Some(&old[3][..]));
        assert_eq!(bank.as_bytes().len(), 3 * TABLE_BYTES);
    }

    #[test]
    fn removing_last_table_empties_buffer() {
        let mut bank = bank_of(&[0.5]);
        assert!(bank.remove_at(0));
        assert!(bank.is_empty());
        assert!(bank.as_bytes().is_empty());
    }

    // ── image import / export ─────────────────────────────────────────────

    #[test]
    fn save_empty_bank_fails() {
        let err = TransferFunctionBank::new().save_to_image().unwrap_err();
        assert!(matches!(err, TransferError::EmptyBank));
    }

    #[test]
    fn wrong_width_leaves_bank_untouched() {
        let mut bank = bank_of(&[0.3]);
        let before = bank.clone();
        let bytes = vec![0u8; 4095 * 4];
        let err = bank.load_from_image(&bytes, 4095, 1).unwrap_err();
        assert!(matches!(err, TransferError::WrongWidth { width: 4095 }));
        assert_eq!(bank, before);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut bank = TransferFunctionBank::new();
        let err = bank.load_from_image(&[0u8; TABLE_BYTES], 4096, 2).unwrap_err();
        assert!(matches!(
            err,
            TransferError::SizeMismatch {
                expected,
                actual: TABLE_BYTES
            } if expected == 2 * TABLE_BYTES
        ));
        assert!(bank.is_empty());
    }

    #[test]
    fn load_replaces_whole_bank() {
        let mut bank = bank_of(&[0.1, 0.2, 0.3]);
        let other = bank_of(&[0.9]);
        let image = other.save_to_image().unwrap();
        bank.load_image(&image).unwrap();
        assert_eq!(bank, other);
    }

    #[test]
    fn image_round_trip_is_exact() {
        let bank = bank_of(&[0.0, 0.25, 1.0]);
        let image = bank.save_to_image().unwrap();
        assert_eq!(image.dimensions(), (4096, 3));

        let mut reloaded = TransferFunctionBank::new();
        reloaded.load_image(&image).unwrap();
        assert_eq!(reloaded, bank);
    }

    #[test]
    fn linear_ramp_png_is_stable() {
        let color = |x: f64| {
            let t = (x + 1024.0) / 4095.0;
            [t, t, t]
        };
        let opacity = |_x: f64| 1.0;
        let mut bank = TransferFunctionBank::new();
        bank.append(&color, &opacity);

        let image = bank.save_to_image().unwrap();
        assert_eq!(image.dimensions(), (4096, 1));
        assert!(image.pixels().all(|p| p.0[3] == 255));

        let png = bank.to_png().unwrap();
        let mut reloaded = TransferFunctionBank::new();
        reloaded.load_png(&png).unwrap();
        assert_eq!(reloaded.to_png().unwrap(), png);
    }

    // ── animation index ───────────────────────────────────────────────────

    #[test]
    fn index_wraps_modulo_count() {
        let bank = bank_of(&[0.1, 0.2, 0.3, 0.4]);
        assert!((bank.advance_index(3.5, 1.0) - 0.5).abs() < 1e-12);
        assert!((bank.advance_index(1.0, 0.25) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn index_holds_with_zero_step_or_single_table() {
        assert_eq!(bank_of(&[0.1, 0.2]).advance_index(1.5, 0.0), 1.5);
        assert_eq!(bank_of(&[0.1]).advance_index(0.0, 0.5), 0.0);
        assert_eq!(TransferFunctionBank::new().advance_index(0.0, 0.5), 0.0);
    }

    #[test]
    fn thumbnails_only_for_existing_tables() {
        let bank = bank_of(&[0.5]);
        assert!(bank.thumbnail(0).is_some());
        assert!(bank.thumbnail(1).is_none());
    }

    #[test]
    fn huge_indices_find_no_table() {
        let bank = bank_of(&[0.5]);
        assert!(bank.table(usize::MAX / 1000).is_none());
        assert!(bank.table(usize::MAX).is_none());
        assert!(bank.thumbnail(usize::MAX).is_none());
        assert!(TransferFunctionBank::new().table(0).is_none());
    }
}
