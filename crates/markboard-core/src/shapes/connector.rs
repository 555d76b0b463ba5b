//! Connector shape: lines and arrows with straight, elbow or curve routing.

use super::{ShapeId, ShapeStyle, ShapeTrait, point_to_polyline_dist};
use kurbo::{BezPath, ParamCurve, Point, QuadBez, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Routing style for connectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    /// A single straight segment.
    #[default]
    Straight,
    /// Two straight segments meeting at the control point.
    Elbow,
    /// A quadratic bezier through the control point.
    Curve,
}

/// Terminal decoration at a connector endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndCap {
    #[default]
    None,
    Arrowhead,
    Dot,
}

/// Number of samples used to flatten a curved shaft for hit tests and bounds.
const CURVE_SAMPLES: usize = 16;

/// A line or arrow. The two shape variants share this struct; they differ
/// only in their default end caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connector {
    pub(crate) id: ShapeId,
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    /// Control point for elbow/curve routing. Absent implies a straight
    /// segment (the midpoint stands in when a handle is needed).
    #[serde(default)]
    pub control_point: Option<Point>,
    /// Routing style.
    #[serde(default)]
    pub line_style: LineStyle,
    /// Terminal decoration at the start.
    #[serde(default)]
    pub cap_start: EndCap,
    /// Terminal decoration at the end.
    #[serde(default)]
    pub cap_end: EndCap,
    /// Soft back-reference to the shape the start is snapped to.
    /// Non-owning; a lookup miss means the connection is simply lost.
    #[serde(default)]
    pub start_connection: Option<ShapeId>,
    /// Soft back-reference to the shape the end is snapped to.
    #[serde(default)]
    pub end_connection: Option<ShapeId>,
    /// Size of arrowhead/dot terminals.
    pub head_size: f64,
    /// Suppresses direct move/resize/rotate/delete interactions.
    #[serde(default)]
    pub locked: bool,
    /// Style properties.
    pub style: ShapeStyle,
}

impl Connector {
    /// Default terminal size.
    pub const DEFAULT_HEAD_SIZE: f64 = 12.0;

    fn new(start: Point, end: Point, cap_start: EndCap, cap_end: EndCap) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            control_point: None,
            line_style: LineStyle::default(),
            cap_start,
            cap_end,
            start_connection: None,
            end_connection: None,
            head_size: Self::DEFAULT_HEAD_SIZE,
            locked: false,
            style: ShapeStyle::default(),
        }
    }

    /// Create a plain line (no terminals).
    pub fn new_line(start: Point, end: Point) -> Self {
        Self::new(start, end, EndCap::None, EndCap::None)
    }

    /// Create an arrow (arrowhead at the end).
    pub fn new_arrow(start: Point, end: Point) -> Self {
        Self::new(start, end, EndCap::None, EndCap::Arrowhead)
    }

    /// The control point, or the segment midpoint when none is set.
    pub fn control_or_midpoint(&self) -> Point {
        self.control_point.unwrap_or(self.midpoint())
    }

    /// Midpoint of the straight start-end segment.
    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// Length of the straight start-end segment.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Shaft vertices for straight/elbow routing. For curve routing this is
    /// the control polygon, not the rendered path; use `flattened_points`.
    pub fn shaft_points(&self) -> Vec<Point> {
        match (self.line_style, self.control_point) {
            (LineStyle::Straight, _) | (_, None) => vec![self.start, self.end],
            (LineStyle::Elbow | LineStyle::Curve, Some(ctrl)) => {
                vec![self.start, ctrl, self.end]
            }
        }
    }

    /// Shaft polyline with curves sampled into line segments, suitable for
    /// hit tests, marquee intersection and bounds.
    pub fn flattened_points(&self) -> Vec<Point> {
        match (self.line_style, self.control_point) {
            (LineStyle::Curve, Some(ctrl)) => {
                let quad = QuadBez::new(self.start, ctrl, self.end);
                (0..=CURVE_SAMPLES)
                    .map(|i| quad.eval(i as f64 / CURVE_SAMPLES as f64))
                    .collect()
            }
            _ => self.shaft_points(),
        }
    }

    /// Unit direction of travel leaving the start point.
    pub fn start_tangent(&self) -> Vec2 {
        let toward = match (self.line_style, self.control_point) {
            (LineStyle::Straight, _) | (_, None) => self.end,
            (_, Some(ctrl)) => ctrl,
        };
        unit_dir(self.start, toward)
    }

    /// Unit direction of travel arriving at the end point. For elbow/curve
    /// routing this follows the control-to-end segment, not the straight
    /// start-end direction.
    pub fn end_tangent(&self) -> Vec2 {
        let from = match (self.line_style, self.control_point) {
            (LineStyle::Straight, _) | (_, None) => self.start,
            (_, Some(ctrl)) => ctrl,
        };
        unit_dir(from, self.end)
    }

    /// Build the shaft path (terminals are drawn separately by the renderer).
    pub fn shaft_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if self.start == self.end {
            return path;
        }
        path.move_to(self.start);
        match (self.line_style, self.control_point) {
            (LineStyle::Straight, _) | (_, None) => path.line_to(self.end),
            (LineStyle::Elbow, Some(ctrl)) => {
                path.line_to(ctrl);
                path.line_to(self.end);
            }
            (LineStyle::Curve, Some(ctrl)) => path.quad_to(ctrl, self.end),
        }
        path
    }
}

fn unit_dir(from: Point, to: Point) -> Vec2 {
    let d = Vec2::new(to.x - from.x, to.y - from.y);
    let len = d.hypot();
    if len < f64::EPSILON {
        Vec2::new(1.0, 0.0)
    } else {
        d / len
    }
}

impl ShapeTrait for Connector {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let points = self.flattened_points();
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for p in &points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x, max_y)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let points = self.flattened_points();
        if points.len() >= 2 {
            let dist = point_to_polyline_dist(point, &points);
            if dist <= tolerance + self.style.stroke_width / 2.0 {
                return true;
            }
        }
        // Terminals extend the hit area at capped tips
        for (tip, cap) in [(self.start, self.cap_start), (self.end, self.cap_end)] {
            if cap != EndCap::None && point.distance(tip) <= tolerance + self.head_size * 0.6 {
                return true;
            }
        }
        false
    }

    fn to_path(&self) -> BezPath {
        self.shaft_path()
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
        if let Some(ctrl) = &mut self.control_point {
            *ctrl += delta;
        }
    }
}
