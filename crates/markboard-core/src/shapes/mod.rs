//! Shape definitions for the whiteboard.

mod connector;
mod diamond;
mod ellipse;
mod freehand;
mod image;
mod rectangle;
mod text;

pub use connector::{Connector, EndCap, LineStyle};
pub use diamond::Diamond;
pub use ellipse::Ellipse;
pub use freehand::Freehand;
pub use image::{Image, ImageFormat};
pub use rectangle::Rectangle;
pub use text::{FontFamily, ShapeLabel, Text, TextAlign};

use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke style for shape outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Dash pattern for this style, scaled to the stroke width.
    /// Returns None for solid strokes.
    pub fn dash_pattern(&self, stroke_width: f64) -> Option<[f64; 2]> {
        let w = stroke_width.max(1.0);
        match self {
            StrokeStyle::Solid => None,
            StrokeStyle::Dashed => Some([w * 4.0, w * 2.5]),
            StrokeStyle::Dotted => Some([w, w * 2.0]),
        }
    }

    /// Cycle to the next stroke style.
    pub fn next(self) -> Self {
        match self {
            StrokeStyle::Solid => StrokeStyle::Dashed,
            StrokeStyle::Dashed => StrokeStyle::Dotted,
            StrokeStyle::Dotted => StrokeStyle::Solid,
        }
    }
}

/// Style properties shared by all shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Stroke width.
    pub stroke_width: f64,
    /// Stroke style (solid, dashed, dotted).
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl ShapeStyle {
    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Get the stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Color {
        apply_opacity(self.stroke_color.into(), self.opacity)
    }

    /// Get the fill color as a peniko Color.
    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(|c| c.into())
    }

    /// Get the fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Option<Color> {
        self.fill_color.map(|c| apply_opacity(c.into(), self.opacity))
    }
}

/// Multiply a color's alpha channel by an opacity factor.
pub fn apply_opacity(color: Color, opacity: f64) -> Color {
    let rgba = color.to_rgba8();
    let alpha = (rgba.a as f64 * opacity.clamp(0.0, 1.0)) as u8;
    Color::from_rgba8(rgba.r, rgba.g, rgba.b, alpha)
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::default(),
            fill_color: None,
            opacity: 1.0,
        }
    }
}

/// Rotate a point around a center by an angle in radians.
pub fn rotate_about(point: Point, center: Point, angle: f64) -> Point {
    let (sin_a, cos_a) = angle.sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos_a - dy * sin_a,
        center.y + dx * sin_a + dy * cos_a,
    )
}

/// Closest point on the segment a->b to the given point.
pub fn closest_point_on_segment(point: Point, a: Point, b: Point) -> Point {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return a;
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    Point::new(a.x + t * seg.x, a.y + t * seg.y)
}

/// Distance from a point to a line segment (a->b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    point.distance(closest_point_on_segment(point, a, b))
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Common trait for all shapes. Hit tests receive points already mapped into
/// the shape's local (unrotated) frame by `Shape::hit_test`.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Get the axis-aligned bounding box (ignoring rotation).
    fn bounds(&self) -> Rect;

    /// Check if a local-frame point hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Get the path representation for rendering (local frame).
    fn to_path(&self) -> BezPath;

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;

    /// Move the shape rigidly by a delta.
    fn translate(&mut self, delta: Vec2);
}

/// Enum wrapper for all shape types (closed tag set, exhaustive dispatch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Diamond(Diamond),
    Line(Connector),
    Arrow(Connector),
    Freehand(Freehand),
    Text(Text),
    Image(Image),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Rectangle($s) => $body,
            Shape::Ellipse($s) => $body,
            Shape::Diamond($s) => $body,
            Shape::Line($s) => $body,
            Shape::Arrow($s) => $body,
            Shape::Freehand($s) => $body,
            Shape::Text($s) => $body,
            Shape::Image($s) => $body,
        }
    };
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        dispatch!(self, s => s.id())
    }

    /// Axis-aligned bounding box in document space (ignoring rotation).
    pub fn bounds(&self) -> Rect {
        dispatch!(self, s => s.bounds())
    }

    /// Rotation-aware point-in-shape test: the probe point is inverse-rotated
    /// into the shape's local frame about the bounds center, then tested
    /// against the shape's geometry with the given tolerance.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = self.to_local(point);
        dispatch!(self, s => s.hit_test(local, tolerance))
    }

    /// Map a document-space point into this shape's unrotated local frame.
    pub fn to_local(&self, point: Point) -> Point {
        let rotation = self.rotation();
        if rotation == 0.0 {
            return point;
        }
        rotate_about(point, self.bounds().center(), -rotation)
    }

    pub fn to_path(&self) -> BezPath {
        dispatch!(self, s => s.to_path())
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => s.style())
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => s.style_mut())
    }

    /// Move the shape rigidly by a delta. Freehand strokes translate every
    /// stored point so the path moves with its bounding box.
    pub fn translate(&mut self, delta: Vec2) {
        dispatch!(self, s => s.translate(delta))
    }

    /// Get the rotation angle in radians (0 for shapes that don't rotate).
    pub fn rotation(&self) -> f64 {
        match self {
            Shape::Rectangle(r) => r.rotation,
            Shape::Ellipse(e) => e.rotation,
            Shape::Diamond(d) => d.rotation,
            Shape::Text(t) => t.rotation,
            Shape::Image(i) => i.rotation,
            Shape::Line(_) | Shape::Arrow(_) | Shape::Freehand(_) => 0.0,
        }
    }

    /// Set the rotation angle in radians. No-op for shapes that don't rotate.
    pub fn set_rotation(&mut self, rotation: f64) {
        match self {
            Shape::Rectangle(r) => r.rotation = rotation,
            Shape::Ellipse(e) => e.rotation = rotation,
            Shape::Diamond(d) => d.rotation = rotation,
            Shape::Text(t) => t.rotation = rotation,
            Shape::Image(i) => i.rotation = rotation,
            Shape::Line(_) | Shape::Arrow(_) | Shape::Freehand(_) => {}
        }
    }

    /// Check if this shape supports rotation.
    pub fn supports_rotation(&self) -> bool {
        matches!(
            self,
            Shape::Rectangle(_)
                | Shape::Ellipse(_)
                | Shape::Diamond(_)
                | Shape::Text(_)
                | Shape::Image(_)
        )
    }

    /// Whether direct move/resize/rotate/delete interactions are suppressed.
    pub fn locked(&self) -> bool {
        dispatch!(self, s => s.locked)
    }

    pub fn set_locked(&mut self, locked: bool) {
        dispatch!(self, s => s.locked = locked)
    }

    /// Check if this shape is a connector (line or arrow).
    pub fn is_connector(&self) -> bool {
        matches!(self, Shape::Line(_) | Shape::Arrow(_))
    }

    /// Get the connector if this shape is a line or arrow.
    pub fn as_connector(&self) -> Option<&Connector> {
        match self {
            Shape::Line(c) | Shape::Arrow(c) => Some(c),
            _ => None,
        }
    }

    /// Get the mutable connector if this shape is a line or arrow.
    pub fn as_connector_mut(&mut self) -> Option<&mut Connector> {
        match self {
            Shape::Line(c) | Shape::Arrow(c) => Some(c),
            _ => None,
        }
    }

    /// Get the attached text label of a closed shape, if any.
    pub fn label(&self) -> Option<&ShapeLabel> {
        match self {
            Shape::Rectangle(r) => r.label.as_ref(),
            Shape::Ellipse(e) => e.label.as_ref(),
            Shape::Diamond(d) => d.label.as_ref(),
            _ => None,
        }
    }

    /// Attach or replace the text label of a closed shape. No-op for shapes
    /// that cannot carry text.
    pub fn set_label(&mut self, label: Option<ShapeLabel>) {
        match self {
            Shape::Rectangle(r) => r.label = label,
            Shape::Ellipse(e) => e.label = label,
            Shape::Diamond(d) => d.label = label,
            _ => {}
        }
    }

    /// Regenerate the shape's ID with a new unique identifier.
    /// Used when duplicating or pasting shapes.
    pub fn regenerate_id(&mut self) {
        let new_id = Uuid::new_v4();
        dispatch!(self, s => s.id = new_id);
    }

    /// Test if this shape intersects a selection rectangle.
    /// Connectors and freehand check their segments against the rect so a
    /// marquee catches diagonal strokes whose bbox merely overlaps.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        match self {
            Shape::Line(c) | Shape::Arrow(c) => {
                segments_intersect_rect(&c.shaft_points(), rect)
            }
            Shape::Freehand(f) => segments_intersect_rect(&f.points, rect),
            _ => {
                let bounds = self.bounds();
                rect.intersect(bounds.inflate(1.0, 1.0)).area() > 0.0
            }
        }
    }
}

/// Test if any segment of a polyline intersects or is inside a rectangle.
fn segments_intersect_rect(points: &[Point], rect: Rect) -> bool {
    if points.iter().any(|p| rect.contains(*p)) {
        return true;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    let edges = [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ];
    for w in points.windows(2) {
        for &(c, d) in &edges {
            if segments_intersect(w[0], w[1], c, d) {
                return true;
            }
        }
    }
    false
}

/// Test if two line segments (a-b) and (c-d) intersect.
fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let cross =
        |o: Point, p: Point, q: Point| (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x);
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    // Collinear cases: endpoint lies on the other segment
    let on_segment = |p: Point, q: Point, r: Point| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1.abs() < 1e-10 && on_segment(c, d, a))
        || (d2.abs() < 1e-10 && on_segment(c, d, b))
        || (d3.abs() < 1e-10 && on_segment(a, b, c))
        || (d4.abs() < 1e-10 && on_segment(a, b, d))
}
