//! QR image encoding
//!
//! The check-in service only needs `text -> image bytes`; the trait keeps
//! the encoder swappable and the shipped implementation renders SVG.

use qrcode::render::svg;
use qrcode::QrCode;

use crate::utils::errors::{GatherlyError, Result};

/// Two-dimensional barcode encoder
pub trait QrEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u8>>;
}

/// SVG-rendering encoder
#[derive(Debug, Clone, Default)]
pub struct SvgQrEncoder {
    size: u32,
}

impl SvgQrEncoder {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    fn dimensions(&self) -> u32 {
        if self.size == 0 {
            300
        } else {
            self.size
        }
    }
}

impl QrEncoder for SvgQrEncoder {
    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let code = QrCode::new(text.as_bytes())
            .map_err(|e| GatherlyError::QrEncoding(e.to_string()))?;
        let dim = self.dimensions();
        let image = code
            .render::<svg::Color>()
            .min_dimensions(dim, dim)
            .build();
        Ok(image.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_token_to_svg() {
        let encoder = SvgQrEncoder::new(300);
        let bytes = encoder.encode("482913").unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_zero_size_falls_back_to_default() {
        let encoder = SvgQrEncoder::default();
        assert!(encoder.encode("123456").is_ok());
    }
}
