//! The pointer-driven interaction state machine.
//!
//! All mutation of the element list flows through the editor: pointer and
//! keyboard events transition an explicit `Mode` and mutate the document,
//! and every gesture that produced a net change commits exactly one snapshot
//! to history on the transition back to `Idle`. The editor is fully testable
//! without a render surface.

use crate::camera::Camera;
use crate::canvas::CanvasDocument;
use crate::history::History;
use crate::input::Modifiers;
use crate::overlay::{OverlayConfig, OverlayState};
use crate::selection::{
    self, HandleKind, LineHandle, HANDLE_HIT_TOLERANCE, LOCK_BADGE_RADIUS,
};
use crate::shapes::{Image, ImageFormat, Shape, ShapeId, ShapeLabel, ShapeTrait, Text};
use crate::shortcuts::{self, EditorAction};
use crate::snap::{self, SNAP_RADIUS};
use crate::tools::{ToolKind, ToolManager};
use kurbo::{Point, Rect, Size, Vec2};
use std::time::Instant;

/// Offset applied to pasted/duplicated shapes.
pub const PASTE_OFFSET: f64 = 12.0;
/// Largest dimension of an imported image, in document units.
pub const MAX_IMPORT_DIM: f64 = 400.0;

/// The active interaction mode. Erasing and laser are sub-modes of drawing,
/// gated by the active tool.
#[derive(Debug, Clone)]
pub enum Mode {
    Idle,
    /// Dragging the canvas with the hand tool (screen-space anchor).
    Panning { last: Point },
    /// A shape-creation gesture is in progress (see `ToolManager`).
    Drawing,
    /// Dragging the selected shapes.
    Moving { last: Point, moved: bool },
    /// Dragging a resize handle of the sole selected shape.
    Resizing {
        id: ShapeId,
        handle: HandleKind,
        original: Shape,
        start: Point,
        changed: bool,
    },
    /// Dragging the rotation handle of the sole selected shape.
    Rotating { id: ShapeId, changed: bool },
    /// Dragging an endpoint or control handle of the sole selected connector.
    EditingLine {
        id: ShapeId,
        handle: LineHandle,
        changed: bool,
    },
    /// Dragging out a marquee-selection rectangle.
    AreaSelecting { origin: Point },
    /// Collecting pending erasures under the eraser cursor.
    Erasing { last: Point },
    /// Recording a laser-pointer stroke.
    Lasering,
}

/// The whiteboard editor: one document plus all interaction state.
pub struct Editor {
    /// The document being edited.
    pub document: CanvasDocument,
    /// Camera for the view transform.
    pub camera: Camera,
    /// Tool manager.
    pub tools: ToolManager,
    /// Currently selected shape IDs, in selection order. The single source of
    /// truth for selection; the first entry is the primary shape.
    pub selection: Vec<ShapeId>,
    /// Undo/redo history.
    pub history: History,
    /// Transient overlay state (marquee, laser, eraser trail).
    pub overlay: OverlayState,
    /// Overlay tuning parameters.
    pub overlay_config: OverlayConfig,
    /// Viewport size in screen pixels.
    pub viewport_size: Size,
    /// Shape under the cursor while idle (drives the lock-badge highlight).
    pub hovered: Option<ShapeId>,
    /// Shape currently in inline text editing, if any.
    pub text_editing: Option<ShapeId>,
    mode: Mode,
    clipboard: Vec<Shape>,
    dirty: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Create an editor with an empty document.
    pub fn new() -> Self {
        Self::with_document(CanvasDocument::new())
    }

    /// Create an editor for an existing document.
    pub fn with_document(document: CanvasDocument) -> Self {
        let history = History::new(document.snapshot());
        Self {
            document,
            camera: Camera::new(),
            tools: ToolManager::new(),
            selection: Vec::new(),
            history,
            overlay: OverlayState::new(),
            overlay_config: OverlayConfig::default(),
            viewport_size: Size::new(1280.0, 800.0),
            hovered: None,
            text_editing: None,
            mode: Mode::Idle,
            clipboard: Vec::new(),
            dirty: false,
        }
    }

    /// Swap in a different document, resetting history, selection and view.
    pub fn load_document(&mut self, document: CanvasDocument, camera: Camera) {
        self.history.reset(document.snapshot());
        self.document = document;
        self.camera = camera;
        self.selection.clear();
        self.overlay = OverlayState::new();
        self.text_editing = None;
        self.hovered = None;
        self.mode = Mode::Idle;
    }

    /// The current interaction mode.
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
    }

    /// Set the current tool, terminating any in-progress gesture.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.finish_text_editing();
        self.tools.set_tool(tool);
        self.mode = Mode::Idle;
        self.overlay.clear_gesture();
    }

    /// Whether there are unsaved changes since the last `take_dirty`.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.selection.contains(&id)
    }

    /// The primary selected shape (first in selection order).
    pub fn primary_selection(&self) -> Option<ShapeId> {
        self.selection.first().copied()
    }

    /// Aggregate bounding box of the selection.
    pub fn selection_bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for id in &self.selection {
            if let Some(shape) = self.document.get_shape(*id) {
                let bounds = shape.bounds();
                result = Some(match result {
                    Some(r) => r.union(bounds),
                    None => bounds,
                });
            }
        }
        result
    }

    fn commit(&mut self) {
        self.history.commit(self.document.snapshot());
        self.dirty = true;
    }

    // ------------------------------------------------------------------
    // Pointer surface
    // ------------------------------------------------------------------

    /// Pointer-down in screen coordinates.
    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) {
        let world = self.camera.screen_to_world(screen);
        match self.tools.current_tool {
            ToolKind::Select => self.select_pointer_down(world, modifiers),
            ToolKind::Hand => self.mode = Mode::Panning { last: screen },
            ToolKind::Text => {
                self.finish_text_editing();
                let text = Text::new(world, String::new());
                let id = text.id();
                self.document.add_shape(Shape::Text(text));
                self.selection = vec![id];
                self.text_editing = Some(id);
            }
            ToolKind::Eraser => {
                self.overlay.push_eraser_point(world, Instant::now());
                Self::mark_erased(
                    &self.document,
                    &mut self.overlay,
                    self.overlay_config.eraser_radius,
                    world,
                );
                self.mode = Mode::Erasing { last: world };
            }
            ToolKind::Laser => {
                self.overlay.begin_laser(world, Instant::now());
                self.mode = Mode::Lasering;
            }
            _ => {
                self.finish_text_editing();
                self.selection.clear();
                self.tools.begin(world);
                self.mode = Mode::Drawing;
            }
        }
    }

    /// Select-tool pointer-down priority: connector handles, then the
    /// rotation handle, then resize handles, then the lock badge, then the
    /// shape body, then marquee on empty space.
    fn select_pointer_down(&mut self, world: Point, modifiers: Modifiers) {
        let tolerance = HANDLE_HIT_TOLERANCE / self.camera.zoom;

        // Handles only apply to a sole, unlocked selection
        if let [id] = self.selection[..] {
            if let Some(shape) = self.document.get_shape(id) {
                if !shape.locked() {
                    let shape = shape.clone();
                    if shape.is_connector() {
                        if let Some(handle) = selection::line_handle_at(&shape, world, tolerance) {
                            self.mode = Mode::EditingLine {
                                id,
                                handle,
                                changed: false,
                            };
                            return;
                        }
                    }
                    if selection::rotation_handle_at(&shape, world, tolerance) {
                        self.mode = Mode::Rotating { id, changed: false };
                        return;
                    }
                    if let Some(handle) = selection::resize_handle_at(&shape, world, tolerance) {
                        self.mode = Mode::Resizing {
                            id,
                            handle,
                            original: shape,
                            start: world,
                            changed: false,
                        };
                        return;
                    }
                }
            }
        }

        // Lock badge of a locked shape: unlock immediately, no mode change
        let badge_tolerance = LOCK_BADGE_RADIUS / self.camera.zoom;
        let badge_hit = self.document.z_order.iter().rev().copied().find(|id| {
            self.document
                .get_shape(*id)
                .is_some_and(|s| selection::lock_badge_at(s, world, badge_tolerance))
        });
        if let Some(id) = badge_hit {
            if let Some(shape) = self.document.get_shape_mut(id) {
                shape.set_locked(false);
            }
            self.commit();
            return;
        }

        // Shape body
        if let Some(id) = self.document.top_shape_at(world, 0.0) {
            if self.text_editing != Some(id) {
                self.finish_text_editing();
            }
            if modifiers.shift {
                // Toggle membership, no drag
                if let Some(pos) = self.selection.iter().position(|&s| s == id) {
                    self.selection.remove(pos);
                } else {
                    self.selection.push(id);
                }
                return;
            }
            if !self.selection.contains(&id) {
                self.selection = vec![id];
            }
            // A multi-selection is preserved so the whole group drags
            self.mode = Mode::Moving {
                last: world,
                moved: false,
            };
            return;
        }

        // Empty space: clear selection, begin marquee
        self.finish_text_editing();
        if !modifiers.shift {
            self.selection.clear();
        }
        self.overlay.marquee = Some(Rect::from_origin_size(world, Size::ZERO));
        self.mode = Mode::AreaSelecting { origin: world };
    }

    /// Pointer-move in screen coordinates.
    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) {
        let world = self.camera.screen_to_world(screen);
        match &mut self.mode {
            Mode::Idle => {
                self.hovered = self.document.top_shape_at(world, 0.0);
            }
            Mode::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                self.camera.pan(delta);
            }
            Mode::Drawing => self.tools.update(world),
            Mode::Moving { last, moved } => {
                let delta = world - *last;
                *last = world;
                if delta.hypot2() > 0.0 {
                    let mut any = false;
                    for id in self.selection.clone() {
                        if let Some(shape) = self.document.get_shape_mut(id) {
                            if !shape.locked() {
                                shape.translate(delta);
                                any = true;
                            }
                        }
                    }
                    if any {
                        *moved = true;
                    }
                }
            }
            Mode::Resizing {
                id,
                handle,
                original,
                start,
                changed,
            } => {
                let delta = world - *start;
                let resized = match *handle {
                    HandleKind::Corner(corner) => Some(selection::apply_corner_resize(
                        original,
                        corner,
                        delta,
                        modifiers.shift,
                    )),
                    HandleKind::Edge(edge) => {
                        Some(selection::apply_edge_resize(original, edge, delta))
                    }
                    _ => None,
                };
                if let Some(resized) = resized {
                    *changed = true;
                    let id = *id;
                    self.document.shapes.insert(id, resized);
                    self.document.touch();
                }
            }
            Mode::Rotating { id, changed } => {
                let id = *id;
                if let Some(shape) = self.document.get_shape_mut(id) {
                    let center = shape.bounds().center();
                    let angle = selection::rotation_from_cursor(center, world);
                    shape.set_rotation(angle);
                    *changed = true;
                }
            }
            Mode::EditingLine { id, handle, changed } => {
                let id = *id;
                let handle = *handle;
                *changed = true;
                let snapped = match handle {
                    LineHandle::Control => None,
                    _ => snap::snap_point(
                        &self.document,
                        world,
                        Some(id),
                        modifiers.ctrl,
                        SNAP_RADIUS,
                    ),
                };
                if let Some(connector) =
                    self.document.get_shape_mut(id).and_then(|s| s.as_connector_mut())
                {
                    match handle {
                        LineHandle::Start => {
                            connector.start = snapped.map_or(world, |s| s.point);
                            connector.start_connection = snapped.map(|s| s.target);
                        }
                        LineHandle::End => {
                            connector.end = snapped.map_or(world, |s| s.point);
                            connector.end_connection = snapped.map(|s| s.target);
                        }
                        LineHandle::Control => {
                            connector.control_point = Some(world);
                        }
                    }
                }
            }
            Mode::AreaSelecting { origin } => {
                let rect = Rect::from_points(*origin, world);
                self.overlay.marquee = Some(rect);
                self.selection = self.document.shapes_in_rect(rect);
            }
            Mode::Erasing { last } => {
                let from = *last;
                *last = world;
                self.overlay.push_eraser_point(world, Instant::now());
                // Interpolate sub-steps so fast motion cannot jump over thin
                // shapes
                let dist = from.distance(world);
                let steps = (dist / self.overlay_config.eraser_step).ceil().max(1.0) as usize;
                for i in 1..=steps {
                    let t = i as f64 / steps as f64;
                    let probe = Point::new(
                        from.x + (world.x - from.x) * t,
                        from.y + (world.y - from.y) * t,
                    );
                    Self::mark_erased(
                        &self.document,
                        &mut self.overlay,
                        self.overlay_config.eraser_radius,
                        probe,
                    );
                }
            }
            Mode::Lasering => {
                self.overlay.push_laser_point(world, Instant::now());
            }
        }
    }

    /// Pointer-up in screen coordinates. Releasing the pointer outside the
    /// canvas must be routed here as well so every mode terminates.
    pub fn pointer_up(&mut self, screen: Point, _modifiers: Modifiers) {
        let world = self.camera.screen_to_world(screen);
        let mode = std::mem::replace(&mut self.mode, Mode::Idle);
        match mode {
            Mode::Idle | Mode::Panning { .. } => {}
            Mode::Drawing => {
                if let Some(shape) = self.tools.end(world) {
                    let id = shape.id();
                    self.document.add_shape(shape);
                    self.selection = vec![id];
                    self.commit();
                }
            }
            Mode::Moving { moved, .. } => {
                if moved {
                    self.commit();
                }
            }
            Mode::Resizing { changed, .. }
            | Mode::Rotating { changed, .. }
            | Mode::EditingLine { changed, .. } => {
                if changed {
                    self.commit();
                }
            }
            Mode::AreaSelecting { .. } => {
                if let Some(rect) = self.overlay.marquee.take() {
                    self.selection = self.document.shapes_in_rect(rect);
                }
            }
            Mode::Erasing { .. } => {
                let pending: Vec<ShapeId> = self.overlay.pending_erase.drain().collect();
                let mut any = false;
                for id in pending {
                    if self.document.remove_shape(id).is_some() {
                        self.selection.retain(|&s| s != id);
                        any = true;
                    }
                }
                if any {
                    self.commit();
                }
            }
            Mode::Lasering => self.overlay.finish_laser(),
        }
    }

    /// Mark every unlocked shape under the eraser probe as pending erasure.
    fn mark_erased(
        document: &CanvasDocument,
        overlay: &mut OverlayState,
        radius: f64,
        probe: Point,
    ) {
        for id in document.shapes_at_point(probe, radius) {
            if document.get_shape(id).is_some_and(|s| !s.locked()) {
                overlay.pending_erase.insert(id);
            }
        }
    }

    /// Wheel input: pan, ctrl/cmd = zoom about the cursor, shift =
    /// horizontal pan.
    pub fn scroll(&mut self, screen: Point, delta: Vec2, modifiers: Modifiers) {
        if modifiers.command() {
            let factor = (-delta.y * 0.0015).exp();
            self.camera.zoom_at(screen, factor);
        } else if modifiers.shift {
            self.camera.pan(Vec2::new(-delta.y, 0.0));
        } else {
            self.camera.pan(Vec2::new(-delta.x, -delta.y));
        }
    }

    // ------------------------------------------------------------------
    // Keyboard surface
    // ------------------------------------------------------------------

    /// Handle a key press outside inline text editing. Returns true if the
    /// key was consumed.
    pub fn key_pressed(&mut self, key: &str, modifiers: Modifiers) -> bool {
        if self.text_editing.is_some() {
            // Only Escape leaves the inline edit; everything else is text
            if key == "escape" {
                self.escape();
                return true;
            }
            return false;
        }
        match shortcuts::action_for(key, modifiers) {
            Some(action) => {
                self.handle_action(action);
                true
            }
            None => false,
        }
    }

    /// Apply an editor action.
    pub fn handle_action(&mut self, action: EditorAction) {
        match action {
            EditorAction::SetTool(tool) => self.set_tool(tool),
            EditorAction::InsertImage => {} // shell opens its picker and calls insert_image
            EditorAction::DeleteSelection => self.delete_selection(),
            EditorAction::Undo => self.undo(),
            EditorAction::Redo => self.redo(),
            EditorAction::Copy => self.copy_selection(),
            EditorAction::Paste => self.paste(),
            EditorAction::Duplicate => self.duplicate_selection(),
            EditorAction::SelectAll => self.select_all(),
            EditorAction::Escape => self.escape(),
            EditorAction::BringToFront => self.reorder_selection(|doc, id| {
                doc.bring_to_front(id);
                true
            }),
            EditorAction::SendToBack => self.reorder_selection(|doc, id| {
                doc.send_to_back(id);
                true
            }),
            EditorAction::BringForward => {
                self.reorder_selection(|doc, id| doc.bring_forward(id))
            }
            EditorAction::SendBackward => {
                self.reorder_selection(|doc, id| doc.send_backward(id))
            }
        }
    }

    /// Escape: exit inline text editing and clear the selection. An
    /// in-progress creation gesture is abandoned.
    pub fn escape(&mut self) {
        self.finish_text_editing();
        if matches!(self.mode, Mode::Drawing) {
            self.tools.cancel();
            self.mode = Mode::Idle;
        }
        self.selection.clear();
        self.overlay.clear_gesture();
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Undo. Selection is cleared so it never references ids that the
    /// restored snapshot may lack.
    pub fn undo(&mut self) {
        if let Some(snapshot) = self.history.undo() {
            let snapshot = snapshot.clone();
            self.document.restore(&snapshot);
            self.selection.clear();
            self.dirty = true;
        }
    }

    /// Redo; no-op at the newest snapshot.
    pub fn redo(&mut self) {
        if let Some(snapshot) = self.history.redo() {
            let snapshot = snapshot.clone();
            self.document.restore(&snapshot);
            self.selection.clear();
            self.dirty = true;
        }
    }

    // ------------------------------------------------------------------
    // Selection operations
    // ------------------------------------------------------------------

    /// Delete the selected shapes (locked shapes are skipped).
    pub fn delete_selection(&mut self) {
        let ids: Vec<ShapeId> = self
            .selection
            .iter()
            .copied()
            .filter(|id| {
                self.document
                    .get_shape(*id)
                    .is_some_and(|s| !s.locked())
            })
            .collect();
        if ids.is_empty() {
            return;
        }
        for id in &ids {
            self.document.remove_shape(*id);
        }
        self.selection.retain(|id| !ids.contains(id));
        self.commit();
    }

    pub fn select_all(&mut self) {
        self.selection = self.document.z_order.clone();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Copy the selected shapes to the internal clipboard, in z-order.
    pub fn copy_selection(&mut self) {
        self.clipboard = self
            .document
            .z_order
            .iter()
            .filter(|id| self.selection.contains(id))
            .filter_map(|id| self.document.get_shape(*id).cloned())
            .collect();
    }

    /// Paste the clipboard: fresh ids, fixed offset, the new copies become
    /// the selection.
    pub fn paste(&mut self) {
        if self.clipboard.is_empty() {
            return;
        }
        let mut new_ids = Vec::with_capacity(self.clipboard.len());
        for shape in self.clipboard.clone() {
            let mut copy = shape;
            copy.regenerate_id();
            copy.translate(Vec2::new(PASTE_OFFSET, PASTE_OFFSET));
            new_ids.push(copy.id());
            self.document.add_shape(copy);
        }
        self.selection = new_ids;
        self.commit();
    }

    /// Duplicate the selection in place (copy + paste without touching the
    /// clipboard).
    pub fn duplicate_selection(&mut self) {
        let source: Vec<Shape> = self
            .document
            .z_order
            .iter()
            .filter(|id| self.selection.contains(id))
            .filter_map(|id| self.document.get_shape(*id).cloned())
            .collect();
        if source.is_empty() {
            return;
        }
        let mut new_ids = Vec::with_capacity(source.len());
        for mut copy in source {
            copy.regenerate_id();
            copy.translate(Vec2::new(PASTE_OFFSET, PASTE_OFFSET));
            new_ids.push(copy.id());
            self.document.add_shape(copy);
        }
        self.selection = new_ids;
        self.commit();
    }

    fn reorder_selection(&mut self, op: impl Fn(&mut CanvasDocument, ShapeId) -> bool) {
        let mut any = false;
        for id in self.selection.clone() {
            any |= op(&mut self.document, id);
        }
        if any {
            self.commit();
        }
    }

    /// Lock the selected shapes.
    pub fn lock_selection(&mut self) {
        let mut any = false;
        for id in self.selection.clone() {
            if let Some(shape) = self.document.get_shape_mut(id) {
                if !shape.locked() {
                    shape.set_locked(true);
                    any = true;
                }
            }
        }
        if any {
            self.commit();
        }
    }

    // ------------------------------------------------------------------
    // Text editing
    // ------------------------------------------------------------------

    /// Replace the content of the shape under inline text editing. For text
    /// shapes the box re-wraps immediately; for closed shapes this edits the
    /// attached label.
    pub fn set_editing_text(&mut self, content: &str) {
        let Some(id) = self.text_editing else { return };
        if let Some(shape) = self.document.get_shape_mut(id) {
            match shape {
                Shape::Text(text) => text.content = content.to_string(),
                _ => {
                    let mut label = shape
                        .label()
                        .cloned()
                        .unwrap_or_else(|| ShapeLabel::new(String::new()));
                    label.content = content.to_string();
                    shape.set_label(Some(label));
                }
            }
        }
    }

    /// Begin inline text editing on a shape (text shape or shape label).
    pub fn start_text_editing(&mut self, id: ShapeId) {
        if self.document.get_shape(id).is_some() {
            self.finish_text_editing();
            self.selection = vec![id];
            self.text_editing = Some(id);
        }
    }

    /// Finish inline text editing, committing the result. Text always
    /// commits, even when empty.
    pub fn finish_text_editing(&mut self) {
        if self.text_editing.take().is_some() {
            self.commit();
        }
    }

    // ------------------------------------------------------------------
    // Image import
    // ------------------------------------------------------------------

    /// Insert an image element from already-decoded metadata. The display
    /// size is capped proportionally; the element lands at `at` (a drop
    /// point) or centered on the viewport.
    pub fn insert_image(
        &mut self,
        data: &[u8],
        source_width: u32,
        source_height: u32,
        format: ImageFormat,
        at: Option<Point>,
    ) -> ShapeId {
        let image =
            Image::new(Point::ZERO, data, source_width, source_height, format).capped_to(MAX_IMPORT_DIM);
        let size = Vec2::new(image.width, image.height);
        let center = at.unwrap_or_else(|| {
            self.camera.screen_to_world(Point::new(
                self.viewport_size.width / 2.0,
                self.viewport_size.height / 2.0,
            ))
        });
        let mut image = image;
        image.position = center - size / 2.0;
        let id = image.id();
        self.document.add_shape(Shape::Image(image));
        self.selection = vec![id];
        self.commit();
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Connector, LineStyle, Rectangle};

    fn no_mods() -> Modifiers {
        Modifiers::default()
    }

    fn shift() -> Modifiers {
        Modifiers {
            shift: true,
            ..Default::default()
        }
    }

    /// Drag helper: down, move, up through the pointer surface.
    fn drag(editor: &mut Editor, from: Point, to: Point, modifiers: Modifiers) {
        editor.pointer_down(from, modifiers);
        editor.pointer_move(to, modifiers);
        editor.pointer_up(to, modifiers);
    }

    #[test]
    fn test_create_drag_undo_scenario() {
        let mut editor = Editor::new();
        editor.set_tool(ToolKind::Rectangle);

        // Create a rectangle at (0,0) dragged to (100,80)
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(100.0, 80.0), no_mods());
        assert_eq!(editor.document.len(), 1);
        let id = editor.primary_selection().expect("new shape selected");
        let bounds = editor.document.get_shape(id).unwrap().bounds();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 100.0, 80.0));

        // Drag it by (+20, -10): size unchanged, position moved
        editor.set_tool(ToolKind::Select);
        editor.selection = vec![id];
        drag(&mut editor, Point::new(50.0, 40.0), Point::new(70.0, 30.0), no_mods());
        let bounds = editor.document.get_shape(id).unwrap().bounds();
        assert_eq!(bounds, Rect::new(20.0, -10.0, 120.0, 70.0));

        // Undo restores the original position
        editor.undo();
        let bounds = editor.document.get_shape(id).unwrap().bounds();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 100.0, 80.0));

        // Undo again: the element list is empty
        editor.undo();
        assert!(editor.document.is_empty());

        // And a further undo is a no-op
        editor.undo();
        assert!(editor.document.is_empty());
    }

    #[test]
    fn test_degenerate_click_commits_nothing() {
        let mut editor = Editor::new();
        editor.set_tool(ToolKind::Rectangle);
        drag(&mut editor, Point::new(10.0, 10.0), Point::new(11.0, 11.0), no_mods());
        assert!(editor.document.is_empty());
        assert!(!editor.history.can_undo());
    }

    #[test]
    fn test_exactly_one_commit_per_gesture() {
        let mut editor = Editor::new();
        editor.set_tool(ToolKind::Rectangle);
        editor.pointer_down(Point::new(0.0, 0.0), no_mods());
        // Many move events, still a single snapshot on release
        for i in 1..20 {
            editor.pointer_move(Point::new(i as f64 * 10.0, 50.0), no_mods());
        }
        editor.pointer_up(Point::new(200.0, 100.0), no_mods());
        assert_eq!(editor.history.len(), 2); // initial + one commit
    }

    #[test]
    fn test_selection_replace_and_shift_toggle() {
        let mut editor = Editor::new();
        let a = Rectangle::new(Point::new(0.0, 0.0), 50.0, 50.0);
        let b = Rectangle::new(Point::new(100.0, 0.0), 50.0, 50.0);
        let (ia, ib) = (a.id, b.id);
        editor.document.add_shape(Shape::Rectangle(a));
        editor.document.add_shape(Shape::Rectangle(b));

        // Plain click selects
        editor.pointer_down(Point::new(25.0, 25.0), no_mods());
        editor.pointer_up(Point::new(25.0, 25.0), no_mods());
        assert_eq!(editor.selection, vec![ia]);

        // Shift-click adds the second
        editor.pointer_down(Point::new(125.0, 25.0), shift());
        editor.pointer_up(Point::new(125.0, 25.0), shift());
        assert_eq!(editor.selection, vec![ia, ib]);

        // Shift-click removes it again
        editor.pointer_down(Point::new(125.0, 25.0), shift());
        editor.pointer_up(Point::new(125.0, 25.0), shift());
        assert_eq!(editor.selection, vec![ia]);

        // Click on empty space clears
        editor.pointer_down(Point::new(400.0, 400.0), no_mods());
        editor.pointer_up(Point::new(400.0, 400.0), no_mods());
        assert!(editor.selection.is_empty());
    }

    #[test]
    fn test_multi_selection_drags_together() {
        let mut editor = Editor::new();
        let a = Rectangle::new(Point::new(0.0, 0.0), 50.0, 50.0);
        let b = Rectangle::new(Point::new(100.0, 0.0), 50.0, 50.0);
        let (ia, ib) = (a.id, b.id);
        editor.document.add_shape(Shape::Rectangle(a));
        editor.document.add_shape(Shape::Rectangle(b));
        editor.selection = vec![ia, ib];

        // Clicking inside one member preserves the group and drags both
        drag(&mut editor, Point::new(25.0, 25.0), Point::new(35.0, 45.0), no_mods());
        assert_eq!(editor.selection, vec![ia, ib]);
        assert_eq!(
            editor.document.get_shape(ia).unwrap().bounds().origin(),
            Point::new(10.0, 20.0)
        );
        assert_eq!(
            editor.document.get_shape(ib).unwrap().bounds().origin(),
            Point::new(110.0, 20.0)
        );
    }

    #[test]
    fn test_marquee_selection() {
        let mut editor = Editor::new();
        let a = Rectangle::new(Point::new(0.0, 0.0), 50.0, 50.0);
        let b = Rectangle::new(Point::new(200.0, 200.0), 50.0, 50.0);
        let ia = a.id;
        editor.document.add_shape(Shape::Rectangle(a));
        editor.document.add_shape(Shape::Rectangle(b));

        editor.pointer_down(Point::new(-10.0, -10.0), no_mods());
        editor.pointer_move(Point::new(80.0, 80.0), no_mods());
        assert!(editor.overlay.marquee.is_some());
        editor.pointer_up(Point::new(80.0, 80.0), no_mods());

        assert_eq!(editor.selection, vec![ia]);
        assert!(editor.overlay.marquee.is_none());
        // Selection changes alone never enter history
        assert!(!editor.history.can_undo());
    }

    #[test]
    fn test_locked_shape_ignores_drag_until_unlocked() {
        let mut editor = Editor::new();
        let mut rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        rect.locked = true;
        let id = rect.id;
        editor.document.add_shape(Shape::Rectangle(rect));
        editor.selection = vec![id];

        // Attempt to drag: position unchanged
        drag(&mut editor, Point::new(50.0, 50.0), Point::new(90.0, 90.0), no_mods());
        assert_eq!(
            editor.document.get_shape(id).unwrap().bounds().origin(),
            Point::ZERO
        );

        // Click the lock badge: it unlocks
        let badge = selection::lock_badge_position(
            editor.document.get_shape(id).unwrap().bounds(),
            0.0,
        );
        editor.pointer_down(badge, no_mods());
        editor.pointer_up(badge, no_mods());
        assert!(!editor.document.get_shape(id).unwrap().locked());

        // Subsequent drag moves it
        drag(&mut editor, Point::new(50.0, 50.0), Point::new(70.0, 60.0), no_mods());
        assert_eq!(
            editor.document.get_shape(id).unwrap().bounds().origin(),
            Point::new(20.0, 10.0)
        );
    }

    #[test]
    fn test_resize_via_handle_commits_normalized() {
        let mut editor = Editor::new();
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        let id = rect.id;
        editor.document.add_shape(Shape::Rectangle(rect));
        editor.selection = vec![id];

        drag(&mut editor, Point::new(100.0, 100.0), Point::new(150.0, 130.0), no_mods());
        let bounds = editor.document.get_shape(id).unwrap().bounds();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 150.0, 130.0));
        assert!(bounds.width() >= 0.0 && bounds.height() >= 0.0);
        assert_eq!(editor.history.len(), 2);
    }

    #[test]
    fn test_rotation_via_handle() {
        let mut editor = Editor::new();
        let rect = Rectangle::new(Point::new(0.0, 0.0), 100.0, 100.0);
        let id = rect.id;
        editor.document.add_shape(Shape::Rectangle(rect));
        editor.selection = vec![id];

        // Grab the rotation handle above the shape, drag to the right side
        let handle = selection::rotation_handle_position(Rect::new(0.0, 0.0, 100.0, 100.0), 0.0);
        editor.pointer_down(handle, no_mods());
        editor.pointer_move(Point::new(200.0, 50.0), no_mods());
        editor.pointer_up(Point::new(200.0, 50.0), no_mods());

        let rotation = editor.document.get_shape(id).unwrap().rotation();
        assert!((rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_elbow_control_point_scenario() {
        let mut editor = Editor::new();
        let mut arrow = Connector::new_arrow(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        arrow.line_style = LineStyle::Elbow;
        let id = arrow.id;
        editor.document.add_shape(Shape::Arrow(arrow));
        editor.selection = vec![id];

        // Drag the control handle (at the midpoint) to (50, 50)
        drag(&mut editor, Point::new(50.0, 0.0), Point::new(50.0, 50.0), no_mods());

        let shape = editor.document.get_shape(id).unwrap();
        let connector = shape.as_connector().unwrap();
        assert_eq!(connector.control_point, Some(Point::new(50.0, 50.0)));
        assert_eq!(
            connector.shaft_points(),
            vec![Point::new(0.0, 0.0), Point::new(50.0, 50.0), Point::new(100.0, 0.0)]
        );
        // Arrowhead direction derives from control -> end, not start -> end
        let tangent = connector.end_tangent();
        assert!(tangent.y < 0.0);
    }

    #[test]
    fn test_endpoint_drag_records_connection() {
        let mut editor = Editor::new();
        let target = Rectangle::new(Point::new(200.0, -50.0), 100.0, 100.0);
        let target_id = target.id;
        editor.document.add_shape(Shape::Rectangle(target));

        let arrow = Connector::new_arrow(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let id = arrow.id;
        editor.document.add_shape(Shape::Arrow(arrow));
        editor.selection = vec![id];

        // Drag the end near the target's left edge: it snaps and records the
        // soft connection
        drag(&mut editor, Point::new(100.0, 0.0), Point::new(195.0, 0.0), no_mods());
        let connector = editor
            .document
            .get_shape(id)
            .unwrap()
            .as_connector()
            .unwrap();
        assert_eq!(connector.end_connection, Some(target_id));
        assert!((connector.end.x - 200.0).abs() < 1e-9);

        // Dragging away clears it
        drag(&mut editor, Point::new(200.0, 0.0), Point::new(100.0, 80.0), no_mods());
        let connector = editor
            .document
            .get_shape(id)
            .unwrap()
            .as_connector()
            .unwrap();
        assert_eq!(connector.end_connection, None);
    }

    #[test]
    fn test_eraser_batch_deletes_in_one_commit() {
        let mut editor = Editor::new();
        let a = Rectangle::new(Point::new(0.0, 0.0), 40.0, 40.0);
        let b = Rectangle::new(Point::new(60.0, 0.0), 40.0, 40.0);
        editor.document.add_shape(Shape::Rectangle(a));
        editor.document.add_shape(Shape::Rectangle(b));
        editor.history.reset(editor.document.snapshot());

        editor.set_tool(ToolKind::Eraser);
        // One pass across both shapes; interpolation covers the gap
        editor.pointer_down(Point::new(5.0, 20.0), no_mods());
        editor.pointer_move(Point::new(95.0, 20.0), no_mods());
        assert_eq!(editor.overlay.pending_erase.len(), 2);
        editor.pointer_up(Point::new(95.0, 20.0), no_mods());

        assert!(editor.document.is_empty());
        assert_eq!(editor.history.len(), 2); // one batch commit

        // Undo restores both
        editor.undo();
        assert_eq!(editor.document.len(), 2);
    }

    #[test]
    fn test_eraser_skips_locked() {
        let mut editor = Editor::new();
        let mut rect = Rectangle::new(Point::new(0.0, 0.0), 40.0, 40.0);
        rect.locked = true;
        editor.document.add_shape(Shape::Rectangle(rect));

        editor.set_tool(ToolKind::Eraser);
        drag(&mut editor, Point::new(5.0, 20.0), Point::new(35.0, 20.0), no_mods());
        assert_eq!(editor.document.len(), 1);
    }

    #[test]
    fn test_laser_stroke_fades_not_committed() {
        let mut editor = Editor::new();
        editor.set_tool(ToolKind::Laser);
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(50.0, 50.0), no_mods());
        assert!(editor.overlay.is_animating());
        assert!(editor.document.is_empty());
        assert!(!editor.history.can_undo());
    }

    #[test]
    fn test_copy_paste_law() {
        let mut editor = Editor::new();
        let a = Rectangle::new(Point::new(0.0, 0.0), 50.0, 50.0);
        let b = Rectangle::new(Point::new(100.0, 0.0), 50.0, 50.0);
        let (ia, ib) = (a.id, b.id);
        editor.document.add_shape(Shape::Rectangle(a));
        editor.document.add_shape(Shape::Rectangle(b));
        editor.selection = vec![ia, ib];

        editor.copy_selection();
        editor.paste();

        // N new elements with fresh ids, offset by the paste delta, and the
        // new set is exactly the selection
        assert_eq!(editor.document.len(), 4);
        assert_eq!(editor.selection.len(), 2);
        assert!(!editor.selection.contains(&ia));
        assert!(!editor.selection.contains(&ib));
        for (new_id, src_id) in editor.selection.clone().into_iter().zip([ia, ib]) {
            let src = editor.document.get_shape(src_id).unwrap().bounds();
            let copy = editor.document.get_shape(new_id).unwrap().bounds();
            assert!((copy.x0 - src.x0 - PASTE_OFFSET).abs() < 1e-9);
            assert!((copy.y0 - src.y0 - PASTE_OFFSET).abs() < 1e-9);
        }
    }

    #[test]
    fn test_text_tool_creates_and_edits_inline() {
        let mut editor = Editor::new();
        editor.set_tool(ToolKind::Text);
        editor.pointer_down(Point::new(30.0, 40.0), no_mods());
        editor.pointer_up(Point::new(30.0, 40.0), no_mods());

        let id = editor.text_editing.expect("inline edit active");
        assert_eq!(editor.selection, vec![id]);

        editor.set_editing_text("hello world");
        editor.finish_text_editing();

        let Shape::Text(text) = editor.document.get_shape(id).unwrap() else {
            panic!("expected text");
        };
        assert_eq!(text.content, "hello world");
        // Text always commits, even a click-without-drag creation
        assert!(editor.history.can_undo());
    }

    #[test]
    fn test_escape_clears_selection_and_exits_editing() {
        let mut editor = Editor::new();
        editor.set_tool(ToolKind::Text);
        editor.pointer_down(Point::new(0.0, 0.0), no_mods());
        editor.pointer_up(Point::new(0.0, 0.0), no_mods());
        assert!(editor.text_editing.is_some());

        editor.key_pressed("escape", no_mods());
        assert!(editor.text_editing.is_none());
        assert!(editor.selection.is_empty());
    }

    #[test]
    fn test_undo_clears_selection() {
        let mut editor = Editor::new();
        editor.set_tool(ToolKind::Rectangle);
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(50.0, 50.0), no_mods());
        assert!(!editor.selection.is_empty());
        editor.undo();
        assert!(editor.selection.is_empty());
    }

    #[test]
    fn test_delete_skips_locked() {
        let mut editor = Editor::new();
        let mut locked = Rectangle::new(Point::new(0.0, 0.0), 40.0, 40.0);
        locked.locked = true;
        let plain = Rectangle::new(Point::new(100.0, 0.0), 40.0, 40.0);
        let (il, ip) = (locked.id, plain.id);
        editor.document.add_shape(Shape::Rectangle(locked));
        editor.document.add_shape(Shape::Rectangle(plain));
        editor.selection = vec![il, ip];

        editor.delete_selection();
        assert!(editor.document.get_shape(il).is_some());
        assert!(editor.document.get_shape(ip).is_none());
    }

    #[test]
    fn test_insert_image_capped_and_centered() {
        let mut editor = Editor::new();
        let data = vec![0u8; 16];
        let id = editor.insert_image(&data, 1000, 500, ImageFormat::Png, None);
        let bounds = editor.document.get_shape(id).unwrap().bounds();
        assert!((bounds.width() - MAX_IMPORT_DIM).abs() < 1e-9);
        assert!((bounds.height() - MAX_IMPORT_DIM / 2.0).abs() < 1e-9);
        // Centered on the default viewport
        let center = editor.camera.screen_to_world(Point::new(640.0, 400.0));
        assert!((bounds.center().x - center.x).abs() < 1e-9);
        assert_eq!(editor.selection, vec![id]);
    }

    #[test]
    fn test_scroll_zoom_about_cursor() {
        let mut editor = Editor::new();
        let cmd = Modifiers {
            ctrl: true,
            ..Default::default()
        };
        let cursor = Point::new(100.0, 100.0);
        let world_before = editor.camera.screen_to_world(cursor);
        editor.scroll(cursor, Vec2::new(0.0, -400.0), cmd);
        assert!(editor.camera.zoom > 1.0);
        let world_after = editor.camera.screen_to_world(cursor);
        assert!((world_before - world_after).hypot() < 1e-6);
    }

    #[test]
    fn test_layer_reorder_commits() {
        let mut editor = Editor::new();
        let a = Rectangle::new(Point::new(0.0, 0.0), 50.0, 50.0);
        let b = Rectangle::new(Point::new(10.0, 10.0), 50.0, 50.0);
        let (ia, ib) = (a.id, b.id);
        editor.document.add_shape(Shape::Rectangle(a));
        editor.document.add_shape(Shape::Rectangle(b));

        editor.selection = vec![ia];
        editor.handle_action(EditorAction::BringToFront);
        assert_eq!(editor.document.z_order, vec![ib, ia]);
        assert!(editor.history.can_undo());
    }
}
