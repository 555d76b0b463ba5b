//! Text shape and attached shape labels.

use super::{SerializableColor, ShapeId, ShapeStyle, ShapeTrait};
use crate::layout;
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Font family options, resolved to generic families by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    /// Get display name for UI.
    pub fn display_name(&self) -> &'static str {
        match self {
            FontFamily::Sans => "Sans",
            FontFamily::Serif => "Serif",
            FontFamily::Mono => "Mono",
        }
    }

    /// Get all available font families.
    pub fn all() -> &'static [FontFamily] {
        &[FontFamily::Sans, FontFamily::Serif, FontFamily::Mono]
    }
}

/// Horizontal text alignment within the wrap box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Text attached inside a closed shape (rectangle, ellipse, diamond).
/// Wrapped at draw time against the shape's inner width with the same
/// layout routine as standalone text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeLabel {
    /// The text content.
    pub content: String,
    /// Font size in document units.
    pub font_size: f64,
    /// Font family.
    #[serde(default)]
    pub font_family: FontFamily,
    /// Horizontal alignment.
    #[serde(default)]
    pub align: TextAlign,
    /// Text color.
    pub color: SerializableColor,
}

impl ShapeLabel {
    pub fn new(content: String) -> Self {
        Self {
            content,
            font_size: Text::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            align: TextAlign::Center,
            color: SerializableColor::black(),
        }
    }
}

/// A standalone text shape. The box width is the wrap limit; the height is
/// always derived from the wrapped line count, which is why text exposes no
/// top/bottom resize handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Top-left corner of the text box.
    pub position: Point,
    /// Wrap width of the text box.
    pub width: f64,
    /// The text content.
    pub content: String,
    /// Font size in document units.
    pub font_size: f64,
    /// Font family.
    #[serde(default)]
    pub font_family: FontFamily,
    /// Horizontal alignment.
    #[serde(default)]
    pub align: TextAlign,
    /// Rotation angle in radians (around center).
    #[serde(default)]
    pub rotation: f64,
    /// Suppresses direct move/resize/rotate/delete interactions.
    #[serde(default)]
    pub locked: bool,
    /// Style properties (stroke color doubles as the text color).
    pub style: ShapeStyle,
}

impl Text {
    /// Default font size.
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;
    /// Default wrap width for newly created text boxes.
    pub const DEFAULT_WIDTH: f64 = 240.0;
    /// Narrowest allowed text box.
    pub const MIN_WIDTH: f64 = 20.0;
    /// Smallest/largest font sizes reachable through resizing.
    pub const MIN_FONT_SIZE: f64 = 6.0;
    pub const MAX_FONT_SIZE: f64 = 400.0;

    /// Create a new text shape at a position.
    pub fn new(position: Point, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width: Self::DEFAULT_WIDTH,
            content,
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            align: TextAlign::default(),
            rotation: 0.0,
            locked: false,
            style: ShapeStyle::default(),
        }
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Set the wrap width.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width.max(Self::MIN_WIDTH);
        self
    }

    /// The wrapped lines of the content at the current width and font size.
    /// The renderer must draw exactly these lines so the persisted box always
    /// matches what is shown.
    pub fn wrapped_lines(&self) -> Vec<String> {
        layout::wrap_text(&self.content, self.width, self.font_size)
    }

    /// Height derived from the wrapped line count.
    pub fn height(&self) -> f64 {
        layout::wrapped_height(self.wrapped_lines().len(), self.font_size)
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height(),
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        // Bounding box path, used only for selection affordances
        let bounds = self.bounds();
        let mut path = BezPath::new();
        path.move_to(Point::new(bounds.x0, bounds.y0));
        path.line_to(Point::new(bounds.x1, bounds.y0));
        path.line_to(Point::new(bounds.x1, bounds.y1));
        path.line_to(Point::new(bounds.x0, bounds.y1));
        path.close_path();
        path
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
    fn test_text_creation() {
        let text = Text::new(Point::new(100.0, 100.0), "Hello".to_string());
        assert_eq!(text.content, "Hello");
        assert!((text.font_size - Text::DEFAULT_FONT_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_narrow_box_wraps_and_grows() {
        let text = Text::new(Point::ZERO, "hello world".to_string()).with_width(60.0);
        assert_eq!(text.wrapped_lines().len(), 2);
        let two_line_height = text.height();

        // Widening the box re-wraps to one line and the height shrinks
        let wide = text.with_width(200.0);
        assert_eq!(wide.wrapped_lines().len(), 1);
        assert!(wide.height() < two_line_height);
    }

    #[test]
    fn test_bounds_track_wrap_height() {
        let text = Text::new(Point::new(10.0, 20.0), "one two three four".to_string())
            .with_width(60.0);
        let bounds = text.bounds();
        assert!((bounds.x1 - bounds.x0 - 60.0).abs() < f64::EPSILON);
        let lines = text.wrapped_lines().len();
        assert!(
            (bounds.height() - layout::wrapped_height(lines, text.font_size)).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn test_hit_test() {
        let text = Text::new(Point::new(100.0, 100.0), "Hello World".to_string());
        let center = text.bounds().center();
        assert!(text.hit_test(center, 0.0));
        assert!(!text.hit_test(Point::new(0.0, 0.0), 0.0));
    }
}
