//! Freehand drawing shape.

use super::{ShapeId, ShapeStyle, ShapeTrait, point_to_polyline_dist};
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A freehand stroke (ordered series of points). The bounding box is always
/// the min/max envelope of the points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Freehand {
    pub(crate) id: ShapeId,
    /// Points in the freehand path.
    pub points: Vec<Point>,
    /// Suppresses direct move/resize/rotate/delete interactions.
    #[serde(default)]
    pub locked: bool,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Freehand {
    /// Create a new empty freehand stroke.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            points: Vec::new(),
            locked: false,
            style: ShapeStyle::default(),
        }
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            locked: false,
            style: ShapeStyle::default(),
        }
    }

    /// Add a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Simplify the path by removing redundant points
    /// (Ramer-Douglas-Peucker).
    pub fn simplify(&mut self, tolerance: f64) {
        if self.points.len() < 3 {
            return;
        }
        self.points = rdp_simplify(&self.points, tolerance);
    }
}

impl Default for Freehand {
    fn default() -> Self {
        Self::new()
    }
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        // Combine, removing the duplicate point at the junction
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

/// Perpendicular distance from point to the infinite line through start/end.
fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;
    let line_len_sq = dx * dx + dy * dy;
    if line_len_sq < f64::EPSILON {
        return point.distance(line_start);
    }
    let area2 = ((point.x - line_start.x) * dy - (point.y - line_start.y) * dx).abs();
    area2 / line_len_sq.sqrt()
}

impl ShapeTrait for Freehand {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::ZERO;
        }
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for point in &self.points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        Rect::new(min_x, min_y, max_x, max_y)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        match self.points.len() {
            0 => false,
            1 => point.distance(self.points[0]) <= tolerance + self.style.stroke_width / 2.0,
            _ => {
                point_to_polyline_dist(point, &self.points)
                    <= tolerance + self.style.stroke_width / 2.0
            }
        }
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some(first) = self.points.first() {
            path.move_to(*first);
            for point in self.points.iter().skip(1) {
                path.line_to(*point);
            }
        }
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_is_point_envelope() {
        let freehand = Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(50.0, 100.0),
        ]);
        let bounds = freehand.bounds();
        assert!(bounds.x0.abs() < f64::EPSILON);
        assert!(bounds.y0.abs() < f64::EPSILON);
        assert!((bounds.x1 - 100.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_translate_moves_every_point() {
        let mut freehand =
            Freehand::from_points(vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]);
        freehand.translate(Vec2::new(5.0, -2.0));
        assert_eq!(freehand.points[0], Point::new(5.0, -2.0));
        assert_eq!(freehand.points[1], Point::new(15.0, 8.0));
        let bounds = freehand.bounds();
        assert!((bounds.x0 - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_simplify() {
        let mut freehand = Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.1),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.1),
            Point::new(4.0, 0.0),
        ]);
        freehand.simplify(0.5);
        assert!(freehand.len() < 5);
    }

    #[test]
    fn test_hit_test() {
        let freehand = Freehand::from_points(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]);
        assert!(freehand.hit_test(Point::new(50.0, 0.0), 5.0));
        assert!(!freehand.hit_test(Point::new(50.0, 20.0), 5.0));
    }
}
