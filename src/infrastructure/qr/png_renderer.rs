use image::{DynamicImage, Luma};
use qrcode::QrCode;
use std::io::Cursor;

use crate::domain::integrity::{IntegrityError, QrRenderer};

/// Renders verification URLs as grayscale PNG QR codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngQrRenderer;

impl PngQrRenderer {
  pub fn new() -> Self {
    Self
  }
}

impl QrRenderer for PngQrRenderer {
  fn render_png(&self, data: &str) -> Result<Vec<u8>, IntegrityError> {
    let code = QrCode::new(data).map_err(|e| IntegrityError::QrRendering(e.to_string()))?;
    let image = code.render::<Luma<u8>>().build();

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image)
      .write_to(&mut buffer, image::ImageOutputFormat::Png)
      .map_err(|e| IntegrityError::QrRendering(e.to_string()))?;

    Ok(buffer.into_inner())
  }
}
