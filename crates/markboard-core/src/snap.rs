//! Endpoint snapping for connector editing.

use crate::canvas::CanvasDocument;
use crate::shapes::{Shape, ShapeId, closest_point_on_segment};
use kurbo::{Point, Rect};

/// Default snap attraction radius in document units.
pub const SNAP_RADIUS: f64 = 10.0;

/// Kind of snap anchor, for visual feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// A bounding-box corner.
    Corner,
    /// The midpoint of a bounding-box edge.
    EdgeMidpoint,
    /// The nearest point on a bounding-box edge.
    Edge,
}

/// A successful snap: the snapped point and the shape that owns it.
#[derive(Debug, Clone, Copy)]
pub struct SnapHit {
    /// The snapped coordinate.
    pub point: Point,
    /// The shape the point belongs to (recorded as the soft connection).
    pub target: ShapeId,
    /// What was snapped to.
    pub kind: AnchorKind,
}

/// The 8 discrete anchor points of a bounding box: 4 corners plus 4 edge
/// midpoints.
pub fn anchor_points(bounds: Rect) -> [(Point, AnchorKind); 8] {
    let cx = (bounds.x0 + bounds.x1) / 2.0;
    let cy = (bounds.y0 + bounds.y1) / 2.0;
    [
        (Point::new(bounds.x0, bounds.y0), AnchorKind::Corner),
        (Point::new(bounds.x1, bounds.y0), AnchorKind::Corner),
        (Point::new(bounds.x1, bounds.y1), AnchorKind::Corner),
        (Point::new(bounds.x0, bounds.y1), AnchorKind::Corner),
        (Point::new(cx, bounds.y0), AnchorKind::EdgeMidpoint),
        (Point::new(bounds.x1, cy), AnchorKind::EdgeMidpoint),
        (Point::new(cx, bounds.y1), AnchorKind::EdgeMidpoint),
        (Point::new(bounds.x0, cy), AnchorKind::EdgeMidpoint),
    ]
}

/// The 4 edges of a bounding box as segments.
fn edges(bounds: Rect) -> [(Point, Point); 4] {
    let tl = Point::new(bounds.x0, bounds.y0);
    let tr = Point::new(bounds.x1, bounds.y0);
    let br = Point::new(bounds.x1, bounds.y1);
    let bl = Point::new(bounds.x0, bounds.y1);
    [(tl, tr), (tr, br), (br, bl), (bl, tl)]
}

/// Find the snap target for a dragged connector endpoint.
///
/// Scans every closed shape (connectors and freehand strokes are not snap
/// targets) other than `exclude`. With `exact` (modifier held) the candidates
/// are the 8 discrete anchor points; otherwise the nearest clamped projection
/// of `point` onto each of the 4 bounding-box edges. The globally nearest
/// candidate within `radius` wins. Total: returns None when nothing is in
/// range.
pub fn snap_point(
    doc: &CanvasDocument,
    point: Point,
    exclude: Option<ShapeId>,
    exact: bool,
    radius: f64,
) -> Option<SnapHit> {
    let mut best: Option<SnapHit> = None;
    let mut best_dist_sq = radius * radius;

    for id in doc.z_order.iter().rev() {
        if Some(*id) == exclude {
            continue;
        }
        let Some(shape) = doc.get_shape(*id) else {
            continue;
        };
        if matches!(shape, Shape::Line(_) | Shape::Arrow(_) | Shape::Freehand(_)) {
            continue;
        }
        let bounds = shape.bounds();

        if exact {
            for (candidate, kind) in anchor_points(bounds) {
                let dist_sq = (point - candidate).hypot2();
                if dist_sq < best_dist_sq {
                    best_dist_sq = dist_sq;
                    best = Some(SnapHit {
                        point: candidate,
                        target: *id,
                        kind,
                    });
                }
            }
        } else {
            for (a, b) in edges(bounds) {
                let candidate = closest_point_on_segment(point, a, b);
                let dist_sq = (point - candidate).hypot2();
                if dist_sq < best_dist_sq {
                    best_dist_sq = dist_sq;
                    best = Some(SnapHit {
                        point: candidate,
                        target: *id,
                        kind: AnchorKind::Edge,
                    });
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Connector, Rectangle};

    fn doc_with_rect() -> (CanvasDocument, ShapeId) {
        let mut doc = CanvasDocument::new();
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        let id = rect.id;
        doc.add_shape(Shape::Rectangle(rect));
        (doc, id)
    }

    #[test]
    fn test_snaps_to_nearest_edge_projection() {
        let (doc, id) = doc_with_rect();
        // Just right of the right edge, off-center: projects onto the edge
        let hit = snap_point(&doc, Point::new(106.0, 37.0), None, false, SNAP_RADIUS)
            .expect("within radius");
        assert_eq!(hit.target, id);
        assert_eq!(hit.kind, AnchorKind::Edge);
        assert!((hit.point.x - 100.0).abs() < 1e-9);
        assert!((hit.point.y - 37.0).abs() < 1e-9);
    }

    #[test]
    fn test_exact_mode_uses_discrete_anchors() {
        let (doc, _) = doc_with_rect();
        // Near the right edge at y=37: free mode would give (100, 37), but
        // exact mode pulls to the nearest of corner/midpoint anchors
        let hit = snap_point(&doc, Point::new(104.0, 42.0), None, true, 20.0)
            .expect("within radius");
        assert_eq!(hit.point, Point::new(100.0, 50.0));
        assert_eq!(hit.kind, AnchorKind::EdgeMidpoint);
    }

    #[test]
    fn test_out_of_range_returns_none() {
        let (doc, _) = doc_with_rect();
        assert!(snap_point(&doc, Point::new(300.0, 300.0), None, false, SNAP_RADIUS).is_none());
        assert!(snap_point(&doc, Point::new(300.0, 300.0), None, true, SNAP_RADIUS).is_none());
    }

    #[test]
    fn test_exclude_and_connector_targets_skipped() {
        let (mut doc, rect_id) = doc_with_rect();
        let line = Connector::new_line(Point::new(200.0, 0.0), Point::new(200.0, 100.0));
        doc.add_shape(Shape::Line(line));

        // The line is right next to the probe but is never a snap target
        assert!(snap_point(&doc, Point::new(201.0, 50.0), None, false, SNAP_RADIUS).is_none());

        // Excluding the rectangle leaves nothing to snap to
        assert!(
            snap_point(&doc, Point::new(101.0, 50.0), Some(rect_id), false, SNAP_RADIUS)
                .is_none()
        );
    }

    #[test]
    fn test_nearest_shape_wins() {
        let (mut doc, _) = doc_with_rect();
        let near = Rectangle::new(Point::new(108.0, 0.0), 50.0, 100.0);
        let near_id = near.id;
        doc.add_shape(Shape::Rectangle(near));

        // Probe between the two: 104 is 4 from both edges, nudge toward the
        // second rect
        let hit = snap_point(&doc, Point::new(105.0, 50.0), None, false, SNAP_RADIUS)
            .expect("within radius");
        assert_eq!(hit.target, near_id);
        assert!((hit.point.x - 108.0).abs() < 1e-9);
    }
}
