//! Selection handles and manipulation geometry.

use crate::shapes::{Shape, rotate_about};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels (visual).
pub const HANDLE_SIZE: f64 = 8.0;
/// Handle hit tolerance in screen pixels; divide by the camera zoom before
/// testing in document space.
pub const HANDLE_HIT_TOLERANCE: f64 = 10.0;
/// Distance from the shape's top edge to the rotation handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;
/// Hit radius of the lock badge, in screen pixels.
pub const LOCK_BADGE_RADIUS: f64 = 10.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge handles. Only text exposes these (left/right): text height is derived
/// from wrapped content, so there is deliberately no top/bottom handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Left,
    Right,
}

/// Connector handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineHandle {
    Start,
    End,
    Control,
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
    Endpoint(LineHandle),
    Rotate,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in document coordinates.
    pub position: Point,
    /// Handle type.
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a document-space point hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// The rotated corner positions of a shape's bounding box.
fn rotated_corners(bounds: Rect, rotation: f64) -> [Point; 4] {
    let center = bounds.center();
    [
        rotate_about(Point::new(bounds.x0, bounds.y0), center, rotation),
        rotate_about(Point::new(bounds.x1, bounds.y0), center, rotation),
        rotate_about(Point::new(bounds.x0, bounds.y1), center, rotation),
        rotate_about(Point::new(bounds.x1, bounds.y1), center, rotation),
    ]
}

/// Position of the rotation handle: above the top-center, in the rotated
/// frame.
pub fn rotation_handle_position(bounds: Rect, rotation: f64) -> Point {
    let center = bounds.center();
    let above = Point::new(center.x, bounds.y0 - ROTATE_HANDLE_OFFSET);
    rotate_about(above, center, rotation)
}

/// Position of the lock badge: just outside the top-right corner, in the
/// rotated frame.
pub fn lock_badge_position(bounds: Rect, rotation: f64) -> Point {
    let center = bounds.center();
    let corner = Point::new(bounds.x1 + 10.0, bounds.y0 - 10.0);
    rotate_about(corner, center, rotation)
}

/// Get the selection handles for a shape (for rendering and hit tests).
pub fn get_handles(shape: &Shape) -> Vec<Handle> {
    match shape {
        Shape::Line(c) | Shape::Arrow(c) => vec![
            Handle::new(c.start, HandleKind::Endpoint(LineHandle::Start)),
            Handle::new(c.end, HandleKind::Endpoint(LineHandle::End)),
            Handle::new(
                c.control_or_midpoint(),
                HandleKind::Endpoint(LineHandle::Control),
            ),
        ],
        Shape::Text(t) => {
            let bounds = shape.bounds();
            let center = bounds.center();
            let [tl, tr, bl, br] = rotated_corners(bounds, t.rotation);
            vec![
                Handle::new(tl, HandleKind::Corner(Corner::TopLeft)),
                Handle::new(tr, HandleKind::Corner(Corner::TopRight)),
                Handle::new(bl, HandleKind::Corner(Corner::BottomLeft)),
                Handle::new(br, HandleKind::Corner(Corner::BottomRight)),
                Handle::new(
                    rotate_about(Point::new(bounds.x0, center.y), center, t.rotation),
                    HandleKind::Edge(Edge::Left),
                ),
                Handle::new(
                    rotate_about(Point::new(bounds.x1, center.y), center, t.rotation),
                    HandleKind::Edge(Edge::Right),
                ),
                Handle::new(
                    rotation_handle_position(bounds, t.rotation),
                    HandleKind::Rotate,
                ),
            ]
        }
        Shape::Freehand(_) => {
            let bounds = shape.bounds();
            let [tl, tr, bl, br] = rotated_corners(bounds, 0.0);
            vec![
                Handle::new(tl, HandleKind::Corner(Corner::TopLeft)),
                Handle::new(tr, HandleKind::Corner(Corner::TopRight)),
                Handle::new(bl, HandleKind::Corner(Corner::BottomLeft)),
                Handle::new(br, HandleKind::Corner(Corner::BottomRight)),
            ]
        }
        Shape::Rectangle(_) | Shape::Ellipse(_) | Shape::Diamond(_) | Shape::Image(_) => {
            let bounds = shape.bounds();
            let rotation = shape.rotation();
            let [tl, tr, bl, br] = rotated_corners(bounds, rotation);
            vec![
                Handle::new(tl, HandleKind::Corner(Corner::TopLeft)),
                Handle::new(tr, HandleKind::Corner(Corner::TopRight)),
                Handle::new(bl, HandleKind::Corner(Corner::BottomLeft)),
                Handle::new(br, HandleKind::Corner(Corner::BottomRight)),
                Handle::new(
                    rotation_handle_position(bounds, rotation),
                    HandleKind::Rotate,
                ),
            ]
        }
    }
}

/// Test the resize handles (corners, plus left/right edges for text).
/// Total: None when nothing is hit.
pub fn resize_handle_at(shape: &Shape, point: Point, tolerance: f64) -> Option<HandleKind> {
    get_handles(shape).into_iter().find_map(|handle| {
        match handle.kind {
            HandleKind::Corner(_) | HandleKind::Edge(_) if handle.hit_test(point, tolerance) => {
                Some(handle.kind)
            }
            _ => None,
        }
    })
}

/// Test the rotation handle hotspot.
pub fn rotation_handle_at(shape: &Shape, point: Point, tolerance: f64) -> bool {
    if !shape.supports_rotation() {
        return false;
    }
    let pos = rotation_handle_position(shape.bounds(), shape.rotation());
    (point - pos).hypot2() <= tolerance * tolerance
}

/// Test the start/end/control handles of a connector.
pub fn line_handle_at(shape: &Shape, point: Point, tolerance: f64) -> Option<LineHandle> {
    let connector = shape.as_connector()?;
    let candidates = [
        (connector.start, LineHandle::Start),
        (connector.end, LineHandle::End),
        (connector.control_or_midpoint(), LineHandle::Control),
    ];
    candidates
        .into_iter()
        .find(|(pos, _)| (point - *pos).hypot2() <= tolerance * tolerance)
        .map(|(_, handle)| handle)
}

/// Test the lock badge hotspot of a locked shape.
pub fn lock_badge_at(shape: &Shape, point: Point, tolerance: f64) -> bool {
    if !shape.locked() {
        return false;
    }
    let pos = lock_badge_position(shape.bounds(), shape.rotation());
    (point - pos).hypot2() <= tolerance * tolerance
}

/// Displace one corner of a box by a delta, keeping the opposite corner
/// fixed, and normalize so the result has non-negative size.
fn resized_box(bounds: Rect, corner: Corner, delta: Vec2, keep_aspect: bool) -> Rect {
    let (new_x0, new_y0, new_x1, new_y1) = match corner {
        Corner::TopLeft => (bounds.x0 + delta.x, bounds.y0 + delta.y, bounds.x1, bounds.y1),
        Corner::TopRight => (bounds.x0, bounds.y0 + delta.y, bounds.x1 + delta.x, bounds.y1),
        Corner::BottomLeft => (bounds.x0 + delta.x, bounds.y0, bounds.x1, bounds.y1 + delta.y),
        Corner::BottomRight => (bounds.x0, bounds.y0, bounds.x1 + delta.x, bounds.y1 + delta.y),
    };

    // Normalize: position adjusted, dimensions non-negative
    let (x0, x1) = if new_x0 <= new_x1 { (new_x0, new_x1) } else { (new_x1, new_x0) };
    let (y0, y1) = if new_y0 <= new_y1 { (new_y0, new_y1) } else { (new_y1, new_y0) };

    if keep_aspect && bounds.height() > f64::EPSILON {
        let aspect = bounds.width() / bounds.height();
        let width = (x1 - x0).max(1.0);
        let height = (y1 - y0).max(1.0);
        let (w, h) = if width / aspect >= height {
            (width, width / aspect)
        } else {
            (height * aspect, height)
        };
        Rect::new(x0, y0, x0 + w, y0 + h)
    } else {
        Rect::new(x0, y0, x1, y1)
    }
}

/// Apply a corner-resize to a shape, returning the resized copy. The original
/// is passed each frame so the gesture accumulates against a stable base.
/// `keep_aspect` preserves the aspect ratio (shift held).
pub fn apply_corner_resize(
    original: &Shape,
    corner: Corner,
    delta: Vec2,
    keep_aspect: bool,
) -> Shape {
    let mut shape = original.clone();
    let new_box = resized_box(original.bounds(), corner, delta, keep_aspect);

    match &mut shape {
        Shape::Rectangle(rect) => {
            rect.position = new_box.origin();
            rect.width = new_box.width();
            rect.height = new_box.height();
        }
        Shape::Diamond(diamond) => {
            diamond.position = new_box.origin();
            diamond.width = new_box.width();
            diamond.height = new_box.height();
        }
        Shape::Ellipse(ellipse) => {
            ellipse.center = new_box.center();
            ellipse.radius_x = new_box.width() / 2.0;
            ellipse.radius_y = new_box.height() / 2.0;
        }
        Shape::Image(image) => {
            image.position = new_box.origin();
            image.width = new_box.width();
            image.height = new_box.height();
        }
        Shape::Freehand(freehand) => {
            let old = original.bounds();
            let scale_x = new_box.width() / old.width().max(1e-9);
            let scale_y = new_box.height() / old.height().max(1e-9);
            for point in &mut freehand.points {
                point.x = new_box.x0 + (point.x - old.x0) * scale_x;
                point.y = new_box.y0 + (point.y - old.y0) * scale_y;
            }
        }
        Shape::Text(text) => {
            // Corner handles scale the font with the height delta; width
            // scales along so the wrap is unchanged.
            let old = original.bounds();
            let grow_down = matches!(corner, Corner::BottomLeft | Corner::BottomRight);
            let new_height = if grow_down {
                old.height() + delta.y
            } else {
                old.height() - delta.y
            }
            .max(1.0);
            let scale = new_height / old.height().max(1e-9);
            let new_font = (text.font_size * scale)
                .clamp(crate::shapes::Text::MIN_FONT_SIZE, crate::shapes::Text::MAX_FONT_SIZE);
            let applied = new_font / text.font_size;
            text.font_size = new_font;
            text.width = (text.width * applied).max(crate::shapes::Text::MIN_WIDTH);
            // Keep the anchor corner fixed
            let new_size = Vec2::new(text.width, text.height());
            text.position = match corner {
                Corner::BottomRight => old.origin(),
                Corner::BottomLeft => Point::new(old.x1 - new_size.x, old.y0),
                Corner::TopRight => Point::new(old.x0, old.y1 - new_size.y),
                Corner::TopLeft => Point::new(old.x1 - new_size.x, old.y1 - new_size.y),
            };
        }
        Shape::Line(_) | Shape::Arrow(_) => {}
    }

    shape
}

/// Apply a left/right edge-resize to a text shape: width changes directly,
/// font size stays fixed, height re-derives from re-wrapping.
pub fn apply_edge_resize(original: &Shape, edge: Edge, delta: Vec2) -> Shape {
    let mut shape = original.clone();
    if let Shape::Text(text) = &mut shape {
        let old = original.bounds();
        match edge {
            Edge::Right => {
                text.width = (old.width() + delta.x).max(crate::shapes::Text::MIN_WIDTH);
            }
            Edge::Left => {
                text.width = (old.width() - delta.x).max(crate::shapes::Text::MIN_WIDTH);
                text.position.x = old.x1 - text.width;
            }
        }
    }
    shape
}

/// Tolerance for snapping rotation to the four cardinal angles, in radians
/// (~5 degrees).
pub const CARDINAL_SNAP_TOLERANCE: f64 = 5.0 * std::f64::consts::PI / 180.0;

/// Shortest signed angular difference a-b, in (-PI, PI].
fn angle_difference(a: f64, b: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let mut diff = (a - b) % TAU;
    if diff > PI {
        diff -= TAU;
    } else if diff <= -PI {
        diff += TAU;
    }
    diff
}

/// Rotation angle for a cursor position about a center: `atan2 + 90°` so the
/// handle above the shape reads as 0°, snapped to the four cardinal angles
/// within the tolerance (checked against all four, with wraparound).
pub fn rotation_from_cursor(center: Point, cursor: Point) -> f64 {
    let raw = (cursor.y - center.y).atan2(cursor.x - center.x) + std::f64::consts::FRAC_PI_2;
    for k in 0..4 {
        let cardinal = k as f64 * std::f64::consts::FRAC_PI_2;
        if angle_difference(raw, cardinal).abs() < CARDINAL_SNAP_TOLERANCE {
            return cardinal;
        }
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Connector, Rectangle, Text};

    #[test]
    fn test_rectangle_handles() {
        let rect = Shape::Rectangle(Rectangle::new(Point::ZERO, 100.0, 50.0));
        let handles = get_handles(&rect);
        assert_eq!(handles.len(), 5);
        assert!(matches!(handles[4].kind, HandleKind::Rotate));
    }

    #[test]
    fn test_text_has_side_handles_but_no_top_bottom() {
        let text = Shape::Text(Text::new(Point::ZERO, "hi".to_string()));
        let handles = get_handles(&text);
        let edges: Vec<_> = handles
            .iter()
            .filter(|h| matches!(h.kind, HandleKind::Edge(_)))
            .collect();
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_connector_handles() {
        let line = Shape::Line(Connector::new_line(Point::ZERO, Point::new(100.0, 0.0)));
        let handles = get_handles(&line);
        assert_eq!(handles.len(), 3);
        assert_eq!(
            line_handle_at(&line, Point::new(50.0, 1.0), 5.0),
            Some(LineHandle::Control)
        );
        assert_eq!(
            line_handle_at(&line, Point::new(99.0, 0.0), 5.0),
            Some(LineHandle::End)
        );
        assert_eq!(line_handle_at(&line, Point::new(30.0, 20.0), 5.0), None);
    }

    #[test]
    fn test_resize_handle_at() {
        let rect = Shape::Rectangle(Rectangle::new(Point::ZERO, 100.0, 100.0));
        assert_eq!(
            resize_handle_at(&rect, Point::new(99.0, 99.0), 5.0),
            Some(HandleKind::Corner(Corner::BottomRight))
        );
        assert_eq!(resize_handle_at(&rect, Point::new(50.0, 50.0), 5.0), None);
    }

    #[test]
    fn test_corner_resize_grows() {
        let rect = Shape::Rectangle(Rectangle::new(Point::ZERO, 100.0, 100.0));
        let resized =
            apply_corner_resize(&rect, Corner::BottomRight, Vec2::new(50.0, 30.0), false);
        let bounds = resized.bounds();
        assert!((bounds.width() - 150.0).abs() < 1e-9);
        assert!((bounds.height() - 130.0).abs() < 1e-9);
        assert_eq!(bounds.origin(), Point::ZERO);
    }

    #[test]
    fn test_corner_resize_normalizes_cross_over() {
        // Dragging the bottom-right corner past the top-left flips the box;
        // the committed result must have non-negative dimensions.
        let rect = Shape::Rectangle(Rectangle::new(Point::ZERO, 100.0, 100.0));
        let resized =
            apply_corner_resize(&rect, Corner::BottomRight, Vec2::new(-150.0, -150.0), false);
        let bounds = resized.bounds();
        assert!(bounds.width() >= 0.0);
        assert!(bounds.height() >= 0.0);
        assert!((bounds.x0 - (-50.0)).abs() < 1e-9);
    }

    #[test]
    fn test_aspect_ratio_resize() {
        let rect = Shape::Rectangle(Rectangle::new(Point::ZERO, 100.0, 50.0));
        let resized =
            apply_corner_resize(&rect, Corner::BottomRight, Vec2::new(100.0, 100.0), true);
        let bounds = resized.bounds();
        assert!((bounds.width() / bounds.height() - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_freehand_resize_scales_points() {
        let freehand = Shape::Freehand(crate::shapes::Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(50.0, 50.0),
        ]));
        let resized =
            apply_corner_resize(&freehand, Corner::BottomRight, Vec2::new(50.0, 50.0), false);
        let bounds = resized.bounds();
        assert!((bounds.width() - 100.0).abs() < 0.1);
        assert!((bounds.height() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_text_corner_resize_scales_font() {
        let text = Text::new(Point::ZERO, "hello".to_string());
        let original_font = text.font_size;
        let shape = Shape::Text(text);
        let original_height = shape.bounds().height();

        let resized = apply_corner_resize(
            &shape,
            Corner::BottomRight,
            Vec2::new(0.0, original_height),
            false,
        );
        let Shape::Text(resized) = resized else {
            panic!("expected text");
        };
        // Height doubled, so the font roughly doubles
        assert!((resized.font_size / original_font - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_text_edge_resize_keeps_font() {
        let text = Text::new(Point::ZERO, "hello world".to_string()).with_width(60.0);
        let font = text.font_size;
        let shape = Shape::Text(text);
        let tall = shape.bounds().height();

        let resized = apply_edge_resize(&shape, Edge::Right, Vec2::new(140.0, 0.0));
        let Shape::Text(resized) = resized else {
            panic!("expected text");
        };
        assert!((resized.font_size - font).abs() < f64::EPSILON);
        assert!((resized.width - 200.0).abs() < 1e-9);
        // Re-wrapping at the wider box shrinks the height
        assert!(Shape::Text(resized).bounds().height() < tall);
    }

    #[test]
    fn test_rotation_snaps_to_cardinals() {
        let center = Point::new(50.0, 50.0);
        // Cursor straight above: raw angle 0, snapped 0
        let angle = rotation_from_cursor(center, Point::new(50.0, 0.0));
        assert!(angle.abs() < 1e-9);
        // Slightly off vertical (within 5°): still snapped to 0
        let angle = rotation_from_cursor(center, Point::new(53.0, 0.0));
        assert!(angle.abs() < 1e-9);
        // Straight right: 90°
        let angle = rotation_from_cursor(center, Point::new(100.0, 50.0));
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        // 45° off: not snapped
        let angle = rotation_from_cursor(center, Point::new(100.0, 0.0));
        assert!((angle - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_snap_wraparound() {
        let center = Point::ZERO;
        // Just past 360° (cursor a hair counterclockwise of straight up)
        let angle = rotation_from_cursor(center, Point::new(-2.0, -100.0));
        assert!(angle.abs() < 1e-9, "wraparound near 0 should snap, got {angle}");
    }

    #[test]
    fn test_lock_badge_only_when_locked() {
        let mut rect = Rectangle::new(Point::ZERO, 100.0, 100.0);
        rect.locked = true;
        let shape = Shape::Rectangle(rect);
        let badge = lock_badge_position(shape.bounds(), 0.0);
        assert!(lock_badge_at(&shape, badge, 5.0));

        let mut unlocked = shape.clone();
        unlocked.set_locked(false);
        assert!(!lock_badge_at(&unlocked, badge, 5.0));
    }
}
