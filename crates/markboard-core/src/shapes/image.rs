//! Image shape for embedding raster images.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{BezPath, Point, Rect, RoundedRect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Image format for stored image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// An image shape that displays a raster image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    /// Original image width in pixels.
    pub source_width: u32,
    /// Original image height in pixels.
    pub source_height: u32,
    /// Image format.
    pub format: ImageFormat,
    /// Opaque encoded-bitmap payload as a base64 string (JSON-friendly).
    pub data_base64: String,
    /// Corner radius used to clip the drawn bitmap.
    #[serde(default)]
    pub corner_radius: f64,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    /// Suppresses direct move/resize/rotate/delete interactions.
    #[serde(default)]
    pub locked: bool,
    /// Style properties (stroke used for an optional border).
    pub style: ShapeStyle,
}

impl Image {
    /// Create a new image shape from raw encoded image bytes.
    pub fn new(
        position: Point,
        data: &[u8],
        source_width: u32,
        source_height: u32,
        format: ImageFormat,
    ) -> Self {
        use base64::{Engine, engine::general_purpose::STANDARD};

        Self {
            id: Uuid::new_v4(),
            position,
            width: source_width as f64,
            height: source_height as f64,
            source_width,
            source_height,
            format,
            data_base64: STANDARD.encode(data),
            corner_radius: 0.0,
            rotation: 0.0,
            locked: false,
            style: ShapeStyle::default(),
        }
    }

    /// Shrink the display size proportionally so neither dimension exceeds
    /// `max_dim`. Images already within the cap are left at intrinsic size.
    pub fn capped_to(mut self, max_dim: f64) -> Self {
        let w = self.source_width as f64;
        let h = self.source_height as f64;
        let largest = w.max(h);
        if largest > max_dim && largest > 0.0 {
            let scale = max_dim / largest;
            self.width = w * scale;
            self.height = h * scale;
        }
        self
    }

    /// Get the raw image data (decoded from base64).
    pub fn data(&self) -> Option<Vec<u8>> {
        use base64::{Engine, engine::general_purpose::STANDARD};
        STANDARD.decode(&self.data_base64).ok()
    }

    /// Get the bounding rectangle.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    /// The corner radius clamped to half the shorter side.
    pub fn effective_radius(&self) -> f64 {
        self.corner_radius
            .clamp(0.0, self.width.min(self.height) / 2.0)
    }
}

impl ShapeTrait for Image {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.as_rect().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        let radius = self.effective_radius();
        if radius > 0.0 {
            RoundedRect::from_rect(self.as_rect(), radius).to_path(0.1)
        } else {
            self.as_rect().to_path(0.1)
        }
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_extension("png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("webp"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_extension("gif"), None);
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_magic_bytes(&[0x00, 0x01]), None);
    }

    #[test]
    fn test_capped_to_downscales_proportionally() {
        let data = vec![0u8; 10];
        let img = Image::new(Point::ZERO, &data, 1000, 500, ImageFormat::Png).capped_to(400.0);
        assert!((img.width - 400.0).abs() < 0.01);
        assert!((img.height - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_capped_to_keeps_small_images() {
        let data = vec![0u8; 10];
        let img = Image::new(Point::ZERO, &data, 300, 200, ImageFormat::Png).capped_to(400.0);
        assert!((img.width - 300.0).abs() < 0.01);
        assert!((img.height - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_data_roundtrip() {
        let data = vec![1u8, 2, 3, 4, 5];
        let img = Image::new(Point::ZERO, &data, 10, 10, ImageFormat::Png);
        assert_eq!(img.data(), Some(data));
    }
}
