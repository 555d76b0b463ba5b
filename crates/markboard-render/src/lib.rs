//! Markboard Render Library
//!
//! Renderer abstraction and the vello-based scene builder: per-type shape
//! rendering, grid, selection affordances, transient overlays and PNG
//! export.

mod export;
mod renderer;
mod scene;
mod text;

pub use export::{PngRenderResult, decode_image_info};
pub use renderer::{GridStyle, RenderContext, RenderError, Renderer, GRID_SIZE};
pub use scene::SceneRenderer;
