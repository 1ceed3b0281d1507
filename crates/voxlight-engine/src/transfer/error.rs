use std::fmt;

use super::TABLE_WIDTH;

/// Failure to import or export a transfer-function stack.
///
/// Every variant is raised before the bank is touched; a failed load leaves
/// the previous contents in place.
#[derive(Debug)]
pub enum TransferError {
    /// The image is not exactly `TABLE_WIDTH` pixels wide.
    WrongWidth { width: u32 },
    /// The byte buffer does not match the declared image size.
    SizeMismatch { expected: usize, actual: usize },
    /// Saving requires at least one table.
    EmptyBank,
    /// PNG encode/decode failure.
    Codec(image::ImageError),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::WrongWidth { width } => write!(
                f,
                "transfer function images are expected to be exactly {TABLE_WIDTH} pixels wide, got {width}"
            ),
            TransferError::SizeMismatch { expected, actual } => write!(
                f,
                "transfer function image holds {actual} bytes, expected {expected}"
            ),
            TransferError::EmptyBank => f.write_str("no transfer functions to save"),
            TransferError::Codec(e) => write!(f, "transfer function image codec error: {e}"),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for TransferError {
    fn from(e: image::ImageError) -> Self {
        TransferError::Codec(e)
    }
}
