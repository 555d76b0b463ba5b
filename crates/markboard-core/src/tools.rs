//! Tool system: the active tool and in-progress creation gestures.

use crate::shapes::{Connector, Diamond, Ellipse, Freehand, Rectangle, Shape, ShapeStyle};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Creation gestures smaller than this (in document units) are accidental
/// clicks and are discarded. Freehand and text always commit.
pub const MIN_SHAPE_SIZE: f64 = 4.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Hand,
    Rectangle,
    Ellipse,
    Diamond,
    Line,
    Arrow,
    Text,
    Freehand,
    Eraser,
    Laser,
}

impl ToolKind {
    /// Single-key tool shortcut mapping.
    pub fn from_shortcut(key: &str) -> Option<Self> {
        match key {
            "v" => Some(ToolKind::Select),
            "h" => Some(ToolKind::Hand),
            "r" => Some(ToolKind::Rectangle),
            "o" => Some(ToolKind::Ellipse),
            "d" => Some(ToolKind::Diamond),
            "a" => Some(ToolKind::Arrow),
            "l" => Some(ToolKind::Line),
            "t" => Some(ToolKind::Text),
            "p" => Some(ToolKind::Freehand),
            "e" => Some(ToolKind::Eraser),
            "k" => Some(ToolKind::Laser),
            _ => None,
        }
    }

    /// Whether this tool creates shapes by dragging.
    pub fn is_drawing_tool(&self) -> bool {
        matches!(
            self,
            ToolKind::Rectangle
                | ToolKind::Ellipse
                | ToolKind::Diamond
                | ToolKind::Line
                | ToolKind::Arrow
                | ToolKind::Freehand
        )
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, Default)]
pub enum ToolState {
    /// Tool is idle, waiting for interaction.
    #[default]
    Idle,
    /// Tool is actively being used (e.g., drawing a shape).
    Active {
        /// Starting point of the interaction.
        start: Point,
        /// Current point of the interaction.
        current: Point,
    },
}

/// Manages the current tool and its creation state.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current state of the tool.
    pub state: ToolState,
    /// Accumulated points for freehand drawing.
    freehand_points: Vec<Point>,
    /// Current style to apply to new shapes.
    pub current_style: ShapeStyle,
    /// Corner radius for new rectangles (0 = sharp corners).
    pub corner_radius: f64,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self {
            current_tool: ToolKind::default(),
            state: ToolState::default(),
            freehand_points: Vec::new(),
            current_style: ShapeStyle::default(),
            corner_radius: 0.0,
        }
    }
}

impl ToolManager {
    /// Create a new tool manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current tool, cancelling any in-progress gesture.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.current_tool = tool;
        self.state = ToolState::Idle;
        self.freehand_points.clear();
    }

    /// Begin a creation gesture.
    pub fn begin(&mut self, point: Point) {
        if self.current_tool == ToolKind::Freehand {
            self.freehand_points.clear();
            self.freehand_points.push(point);
        }
        self.state = ToolState::Active {
            start: point,
            current: point,
        };
    }

    /// Update the current gesture.
    pub fn update(&mut self, point: Point) {
        if let ToolState::Active { current, .. } = &mut self.state {
            *current = point;
            if self.current_tool == ToolKind::Freehand {
                self.freehand_points.push(point);
            }
        }
    }

    /// End the current gesture and return the created shape, if any.
    /// Gestures below the minimum size are discarded (freehand always
    /// commits).
    pub fn end(&mut self, point: Point) -> Option<Shape> {
        let ToolState::Active { start, .. } = self.state else {
            return None;
        };
        self.state = ToolState::Idle;

        if self.current_tool == ToolKind::Freehand {
            let points = std::mem::take(&mut self.freehand_points);
            let mut freehand = Freehand::from_points(points);
            freehand.style = self.current_style.clone();
            return Some(Shape::Freehand(freehand));
        }

        if (point.x - start.x).abs() < MIN_SHAPE_SIZE && (point.y - start.y).abs() < MIN_SHAPE_SIZE
        {
            return None;
        }

        self.create_shape(start, point)
    }

    /// Cancel the current gesture.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
        self.freehand_points.clear();
    }

    /// Check if a gesture is active.
    pub fn is_active(&self) -> bool {
        matches!(self.state, ToolState::Active { .. })
    }

    /// Get the preview shape for the current gesture.
    pub fn preview_shape(&self) -> Option<Shape> {
        let ToolState::Active { start, current } = self.state else {
            return None;
        };
        if self.current_tool == ToolKind::Freehand {
            if self.freehand_points.len() < 2 {
                return None;
            }
            let mut freehand = Freehand::from_points(self.freehand_points.clone());
            freehand.style = self.current_style.clone();
            return Some(Shape::Freehand(freehand));
        }
        self.create_shape(start, current)
    }

    /// Create a shape from the gesture's anchor and current point.
    fn create_shape(&self, start: Point, end: Point) -> Option<Shape> {
        let mut shape = match self.current_tool {
            ToolKind::Rectangle => {
                let mut rect = Rectangle::from_corners(start, end);
                rect.corner_radius = self.corner_radius;
                Some(Shape::Rectangle(rect))
            }
            ToolKind::Ellipse => {
                let rect = Rect::new(
                    start.x.min(end.x),
                    start.y.min(end.y),
                    start.x.max(end.x),
                    start.y.max(end.y),
                );
                Some(Shape::Ellipse(Ellipse::from_rect(rect)))
            }
            ToolKind::Diamond => Some(Shape::Diamond(Diamond::from_corners(start, end))),
            ToolKind::Line => Some(Shape::Line(Connector::new_line(start, end))),
            ToolKind::Arrow => Some(Shape::Arrow(Connector::new_arrow(start, end))),
            ToolKind::Select
            | ToolKind::Hand
            | ToolKind::Text
            | ToolKind::Freehand
            | ToolKind::Eraser
            | ToolKind::Laser => None,
        };

        if let Some(ref mut s) = shape {
            *s.style_mut() = self.current_style.clone();
        }
        shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_shortcuts() {
        assert_eq!(ToolKind::from_shortcut("v"), Some(ToolKind::Select));
        assert_eq!(ToolKind::from_shortcut("r"), Some(ToolKind::Rectangle));
        assert_eq!(ToolKind::from_shortcut("e"), Some(ToolKind::Eraser));
        assert_eq!(ToolKind::from_shortcut("x"), None);
    }

    #[test]
    fn test_rectangle_gesture() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::Rectangle);

        tm.begin(Point::new(0.0, 0.0));
        assert!(tm.is_active());
        tm.update(Point::new(50.0, 50.0));
        assert!(tm.preview_shape().is_some());

        let shape = tm.end(Point::new(100.0, 80.0)).expect("shape created");
        let bounds = shape.bounds();
        assert!((bounds.width() - 100.0).abs() < 1e-9);
        assert!((bounds.height() - 80.0).abs() < 1e-9);
        assert!(!tm.is_active());
    }

    #[test]
    fn test_degenerate_click_discarded() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::Ellipse);
        tm.begin(Point::new(10.0, 10.0));
        assert!(tm.end(Point::new(11.0, 12.0)).is_none());
    }

    #[test]
    fn test_freehand_always_commits() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::Freehand);
        tm.begin(Point::new(10.0, 10.0));
        tm.update(Point::new(11.0, 10.0));
        let shape = tm.end(Point::new(11.0, 10.0)).expect("freehand commits");
        assert!(matches!(shape, Shape::Freehand(_)));
    }

    #[test]
    fn test_select_tool_creates_nothing() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::Select);
        tm.begin(Point::new(0.0, 0.0));
        assert!(tm.end(Point::new(100.0, 100.0)).is_none());
    }

    #[test]
    fn test_cancel() {
        let mut tm = ToolManager::new();
        tm.set_tool(ToolKind::Rectangle);
        tm.begin(Point::new(0.0, 0.0));
        tm.cancel();
        assert!(!tm.is_active());
        assert!(tm.end(Point::new(100.0, 100.0)).is_none());
    }
}
