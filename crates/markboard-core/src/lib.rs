//! Markboard Core Library
//!
//! Platform-agnostic data structures and editor logic for the Markboard
//! whiteboard: the shape model, hit testing, the pointer-driven interaction
//! state machine, undo history, text layout, snapping, and document
//! persistence. Rendering lives in `markboard-render`.

pub mod camera;
pub mod canvas;
pub mod editor;
pub mod history;
pub mod input;
pub mod layout;
pub mod overlay;
pub mod selection;
pub mod shapes;
pub mod shortcuts;
pub mod snap;
pub mod storage;
pub mod tools;
pub mod workspace;

pub use camera::Camera;
pub use canvas::CanvasDocument;
pub use editor::{Editor, Mode};
pub use history::History;
pub use input::{Modifiers, MouseButton, PointerEvent};
pub use overlay::{OverlayConfig, OverlayState};
pub use selection::{Corner, Edge, Handle, HandleKind, LineHandle};
pub use shapes::{Shape, ShapeId};
pub use shortcuts::EditorAction;
pub use snap::{SnapHit, snap_point};
pub use tools::{ToolKind, ToolManager};
pub use workspace::Workspace;
