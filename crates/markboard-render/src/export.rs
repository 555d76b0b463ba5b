//! PNG export encoding and image-import decoding.

use crate::renderer::RenderError;
use markboard_core::shapes::ImageFormat;

/// Result of rasterizing a scene for export: raw RGBA pixels plus
/// dimensions. Producing the pixels is the shell's job (it owns the GPU
/// surface); encoding is handled here.
#[derive(Debug)]
pub struct PngRenderResult {
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba_data: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl PngRenderResult {
    /// Encode the pixels as a PNG file.
    pub fn encode(&self) -> Result<Vec<u8>, RenderError> {
        if self.rgba_data.len() != (self.width as usize) * (self.height as usize) * 4 {
            return Err(RenderError::Encode(format!(
                "pixel buffer size {} does not match {}x{}",
                self.rgba_data.len(),
                self.width,
                self.height
            )));
        }
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder
                .write_header()
                .map_err(|e| RenderError::Encode(e.to_string()))?;
            writer
                .write_image_data(&self.rgba_data)
                .map_err(|e| RenderError::Encode(e.to_string()))?;
        }
        Ok(out)
    }
}

/// Decode an imported image payload to measure its intrinsic size. Returns
/// None when the bytes cannot be decoded; the caller then inserts nothing.
pub fn decode_image_info(data: &[u8]) -> Option<(u32, u32, ImageFormat)> {
    let format = ImageFormat::from_magic_bytes(data)?;
    let decoded = image::load_from_memory(data).ok()?;
    Some((decoded.width(), decoded.height(), format))
}
