//! Renderer trait abstraction.

use kurbo::Size;
use markboard_core::Editor;
use peniko::Color;
use std::time::Instant;
use thiserror::Error;

/// Grid cell size in document units.
pub const GRID_SIZE: f64 = 20.0;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Encoding failed: {0}")]
    Encode(String),
    #[error("Render failed: {0}")]
    Render(String),
}

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    /// No grid (plain background).
    None,
    /// Full grid lines.
    #[default]
    Lines,
    /// Cell-corner dots.
    Dots,
}

impl GridStyle {
    /// Cycle to the next grid style.
    pub fn next(self) -> Self {
        match self {
            GridStyle::None => GridStyle::Lines,
            GridStyle::Lines => GridStyle::Dots,
            GridStyle::Dots => GridStyle::None,
        }
    }
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The editor to render.
    pub editor: &'a Editor,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Background color.
    pub background_color: Color,
    /// Grid display style.
    pub grid_style: GridStyle,
    /// Selection accent color.
    pub selection_color: Color,
    /// Frame time, used for overlay fade-out.
    pub now: Instant,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(editor: &'a Editor, viewport_size: Size) -> Self {
        Self {
            editor,
            viewport_size,
            scale_factor: 1.0,
            background_color: Color::from_rgba8(250, 250, 250, 255),
            grid_style: GridStyle::default(),
            selection_color: Color::from_rgba8(59, 130, 246, 255),
            now: Instant::now(),
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the grid style.
    pub fn with_grid(mut self, style: GridStyle) -> Self {
        self.grid_style = style;
        self
    }

    /// Set the frame time.
    pub fn at(mut self, now: Instant) -> Self {
        self.now = now;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Build the scene/command buffer for a frame. Called once per frame;
    /// prepares all drawing commands.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
