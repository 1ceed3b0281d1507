use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use super::TransferError;

/// Encodes a transfer-function strip as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, TransferError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Decodes PNG bytes into RGBA8, converting other channel layouts.
///
/// Pixel values are taken verbatim; no alpha premultiplication is applied.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, TransferError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    Ok(image.to_rgba8())
}
