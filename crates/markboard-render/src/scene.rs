//! Vello scene construction for the whiteboard.

use crate::renderer::{GRID_SIZE, GridStyle, RenderContext, Renderer};
use crate::text::draw_text_block;
use kurbo::{Affine, BezPath, Circle, Line, Point, Rect, Shape as KurboShape, Stroke, Vec2};
use markboard_core::layout;
use markboard_core::overlay::fade_fraction;
use markboard_core::selection::{self, Handle, HandleKind};
use markboard_core::shapes::{
    Connector, EndCap, Shape, ShapeStyle, ShapeTrait, apply_opacity, rotate_about,
};
use parley::{FontContext, LayoutContext};
use peniko::{Brush, Color, Fill, Mix};
use std::collections::HashMap;
use vello::Scene;

/// Opacity multiplier for shapes marked for erasure.
const PENDING_ERASE_OPACITY: f64 = 0.35;

/// Vello-based scene builder.
pub struct SceneRenderer {
    /// The scene being built.
    scene: Scene,
    /// Font context (system fonts, cached across frames).
    font_cx: FontContext,
    /// Layout context for text shaping.
    layout_cx: LayoutContext<Brush>,
    /// Current zoom level (for zoom-independent affordances).
    zoom: f64,
    /// Decoded-bitmap cache, keyed by the encoded payload. Append-only,
    /// never evicted within a session.
    image_cache: HashMap<String, peniko::ImageData>,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer {
    /// Create a new scene renderer.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
            zoom: 1.0,
            image_cache: HashMap::new(),
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets the internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Build a standalone scene of a whole document for PNG export at the
    /// given scale: white background, no grid or affordances. Returns the
    /// scene and the content bounds (None for an empty document).
    pub fn build_export_scene(
        &mut self,
        document: &markboard_core::CanvasDocument,
        scale: f64,
    ) -> (Scene, Option<Rect>) {
        const MARGIN: f64 = 16.0;
        self.scene.reset();
        self.zoom = scale;

        let Some(bounds) = document.bounds() else {
            return (self.take_scene(), None);
        };
        let bounds = bounds.inflate(MARGIN, MARGIN);

        let size = Rect::from_origin_size(
            Point::ZERO,
            kurbo::Size::new(bounds.width() * scale, bounds.height() * scale),
        );
        self.scene.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            Color::WHITE,
            None,
            &size,
        );

        let transform =
            Affine::scale(scale) * Affine::translate(Vec2::new(-bounds.x0, -bounds.y0));
        for shape in document.shapes_ordered() {
            self.render_shape(shape, transform, 1.0);
        }

        (self.take_scene(), Some(bounds))
    }

    // ------------------------------------------------------------------
    // Shapes
    // ------------------------------------------------------------------

    /// Rotation-aware transform for a shape.
    fn shape_transform(base: Affine, shape: &Shape) -> Affine {
        let rotation = shape.rotation();
        if rotation == 0.0 {
            return base;
        }
        let center = shape.bounds().center();
        base * Affine::translate(center.to_vec2())
            * Affine::rotate(rotation)
            * Affine::translate(-center.to_vec2())
    }

    /// Stroke with the style's width and dash pattern.
    fn stroke_for(style: &ShapeStyle) -> Stroke {
        let stroke = Stroke::new(style.stroke_width);
        match style.stroke_style.dash_pattern(style.stroke_width) {
            Some(pattern) => stroke.with_dashes(0.0, pattern),
            None => stroke,
        }
    }

    /// Render one shape, with an extra opacity factor (pending erasure).
    fn render_shape(&mut self, shape: &Shape, base: Affine, extra_opacity: f64) {
        let transform = Self::shape_transform(base, shape);
        let style = shape.style();
        let stroke_color = apply_opacity(style.stroke(), style.opacity * extra_opacity);
        let fill_color = style
            .fill()
            .map(|c| apply_opacity(c, style.opacity * extra_opacity));

        match shape {
            Shape::Rectangle(_) | Shape::Ellipse(_) | Shape::Diamond(_) => {
                let path = shape.to_path();
                if let Some(fill) = fill_color {
                    self.scene.fill(Fill::NonZero, transform, fill, None, &path);
                }
                self.scene
                    .stroke(&Self::stroke_for(style), transform, stroke_color, None, &path);
                if let Some(label) = shape.label() {
                    self.render_label(shape, label, transform, extra_opacity);
                }
            }
            Shape::Line(c) | Shape::Arrow(c) => {
                self.render_connector(c, transform, stroke_color, style);
            }
            Shape::Freehand(f) => {
                if f.points.len() >= 2 {
                    self.scene.stroke(
                        &Self::stroke_for(style),
                        transform,
                        stroke_color,
                        None,
                        &shape.to_path(),
                    );
                }
            }
            Shape::Text(t) => {
                let lines = t.wrapped_lines();
                draw_text_block(
                    &mut self.scene,
                    &mut self.font_cx,
                    &mut self.layout_cx,
                    &lines,
                    t.position,
                    t.width,
                    t.font_size,
                    t.font_family,
                    t.align,
                    stroke_color,
                    transform,
                );
            }
            Shape::Image(img) => {
                self.render_image(img, transform, extra_opacity);
            }
        }
    }

    /// Render text attached inside a closed shape, wrapped against the inner
    /// width and centered vertically.
    fn render_label(
        &mut self,
        shape: &Shape,
        label: &markboard_core::shapes::ShapeLabel,
        transform: Affine,
        extra_opacity: f64,
    ) {
        const INSET: f64 = 8.0;
        let bounds = shape.bounds();
        let inner_width = (bounds.width() - INSET * 2.0).max(layout::char_width('m', label.font_size));
        let lines = layout::wrap_text(&label.content, inner_width, label.font_size);
        let block_height = layout::wrapped_height(lines.len(), label.font_size);
        let origin = Point::new(
            bounds.x0 + INSET,
            bounds.y0 + ((bounds.height() - block_height) / 2.0).max(0.0),
        );
        let color = apply_opacity(label.color.into(), shape.style().opacity * extra_opacity);
        draw_text_block(
            &mut self.scene,
            &mut self.font_cx,
            &mut self.layout_cx,
            &lines,
            origin,
            inner_width,
            label.font_size,
            label.font_family,
            label.align,
            color,
            transform,
        );
    }

    /// Render a connector: shaft plus terminal decorations oriented by the
    /// local tangent at each end.
    fn render_connector(
        &mut self,
        connector: &Connector,
        transform: Affine,
        color: Color,
        style: &ShapeStyle,
    ) {
        self.scene.stroke(
            &Self::stroke_for(style),
            transform,
            color,
            None,
            &connector.shaft_path(),
        );
        self.render_cap(
            connector.end,
            connector.end_tangent(),
            connector.head_size,
            connector.cap_end,
            color,
            transform,
        );
        self.render_cap(
            connector.start,
            -connector.start_tangent(),
            connector.head_size,
            connector.cap_start,
            color,
            transform,
        );
    }

    /// Render a terminal decoration. `dir` points out of the shaft at the
    /// tip.
    fn render_cap(
        &mut self,
        tip: Point,
        dir: Vec2,
        size: f64,
        cap: EndCap,
        color: Color,
        transform: Affine,
    ) {
        match cap {
            EndCap::None => {}
            EndCap::Arrowhead => {
                let back = tip - dir * size;
                let perp = Vec2::new(-dir.y, dir.x) * (size * 0.5);
                let mut path = BezPath::new();
                path.move_to(tip);
                path.line_to(back + perp);
                path.line_to(back - perp);
                path.close_path();
                self.scene.fill(Fill::NonZero, transform, color, None, &path);
            }
            EndCap::Dot => {
                let dot = Circle::new(tip, size * 0.35);
                self.scene.fill(Fill::NonZero, transform, color, None, &dot);
            }
        }
    }

    /// Render an image with its decoded bitmap, clipped to the corner
    /// radius. The decode cache is keyed by the encoded payload so repeated
    /// frames (and copies of the same image) never re-decode.
    fn render_image(
        &mut self,
        image: &markboard_core::shapes::Image,
        transform: Affine,
        extra_opacity: f64,
    ) {
        use std::sync::Arc;

        let image_data = if let Some(cached) = self.image_cache.get(&image.data_base64) {
            cached.clone()
        } else if let Some(raw) = image.data() {
            match ::image::load_from_memory(&raw) {
                Ok(decoded) => {
                    let rgba = decoded.to_rgba8();
                    let (width, height) = rgba.dimensions();
                    let blob = peniko::Blob::new(Arc::new(rgba.into_vec()));
                    let data = peniko::ImageData {
                        data: blob,
                        format: peniko::ImageFormat::Rgba8,
                        width,
                        height,
                        alpha_type: peniko::ImageAlphaType::Alpha,
                    };
                    self.image_cache
                        .insert(image.data_base64.clone(), data.clone());
                    data
                }
                Err(e) => {
                    log::debug!("image decode failed: {e}");
                    self.render_image_placeholder(image, transform);
                    return;
                }
            }
        } else {
            self.render_image_placeholder(image, transform);
            return;
        };

        let bounds = image.bounds();
        let clip = image.to_path();
        let alpha = (image.style.opacity * extra_opacity) as f32;
        self.scene.push_layer(Mix::Normal, alpha, transform, &clip);

        let scale_x = bounds.width() / image_data.width as f64;
        let scale_y = bounds.height() / image_data.height as f64;
        let image_transform = transform
            * Affine::translate((bounds.x0, bounds.y0))
            * Affine::scale_non_uniform(scale_x, scale_y);
        self.scene.draw_image(&image_data.into(), image_transform);
        self.scene.pop_layer();
    }

    /// Render a placeholder for images that couldn't be decoded.
    fn render_image_placeholder(
        &mut self,
        image: &markboard_core::shapes::Image,
        transform: Affine,
    ) {
        let bounds = image.bounds();
        let rect_path = bounds.to_path(0.1);
        self.scene.fill(
            Fill::NonZero,
            transform,
            Color::from_rgba8(220, 220, 220, 255),
            None,
            &rect_path,
        );
        let stroke = Stroke::new(2.0);
        let mut x_path = BezPath::new();
        x_path.move_to(Point::new(bounds.x0, bounds.y0));
        x_path.line_to(Point::new(bounds.x1, bounds.y1));
        x_path.move_to(Point::new(bounds.x1, bounds.y0));
        x_path.line_to(Point::new(bounds.x0, bounds.y1));
        self.scene.stroke(
            &stroke,
            transform,
            Color::from_rgba8(150, 150, 150, 255),
            None,
            &x_path,
        );
        self.scene.stroke(
            &stroke,
            transform,
            Color::from_rgba8(120, 120, 120, 255),
            None,
            &rect_path,
        );
    }

    // ------------------------------------------------------------------
    // Grid
    // ------------------------------------------------------------------

    fn render_grid(&mut self, ctx: &RenderContext, transform: Affine, style: GridStyle) {
        let camera = &ctx.editor.camera;
        let top_left = camera.screen_to_world(Point::ZERO);
        let bottom_right = camera.screen_to_world(Point::new(
            ctx.viewport_size.width,
            ctx.viewport_size.height,
        ));
        let x0 = (top_left.x / GRID_SIZE).floor() * GRID_SIZE;
        let y0 = (top_left.y / GRID_SIZE).floor() * GRID_SIZE;
        let color = Color::from_rgba8(0, 0, 0, 18);

        match style {
            GridStyle::None => {}
            GridStyle::Lines => {
                let stroke = Stroke::new(1.0 / self.zoom);
                let mut path = BezPath::new();
                let mut x = x0;
                while x <= bottom_right.x {
                    path.move_to(Point::new(x, top_left.y));
                    path.line_to(Point::new(x, bottom_right.y));
                    x += GRID_SIZE;
                }
                let mut y = y0;
                while y <= bottom_right.y {
                    path.move_to(Point::new(top_left.x, y));
                    path.line_to(Point::new(bottom_right.x, y));
                    y += GRID_SIZE;
                }
                self.scene.stroke(&stroke, transform, color, None, &path);
            }
            GridStyle::Dots => {
                let radius = 1.2 / self.zoom;
                let mut x = x0;
                while x <= bottom_right.x {
                    let mut y = y0;
                    while y <= bottom_right.y {
                        let dot = Circle::new(Point::new(x, y), radius);
                        self.scene.fill(Fill::NonZero, transform, color, None, &dot);
                        y += GRID_SIZE;
                    }
                    x += GRID_SIZE;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Selection affordances
    // ------------------------------------------------------------------

    fn render_selection(&mut self, ctx: &RenderContext, transform: Affine) {
        let editor = ctx.editor;
        let accent = ctx.selection_color;

        match editor.selection.len() {
            0 => {}
            1 => {
                let id = editor.selection[0];
                let Some(shape) = editor.document.get_shape(id) else {
                    return;
                };
                if shape.is_connector() {
                    self.render_connector_selection(shape, transform, accent);
                } else {
                    self.render_single_selection(shape, transform, accent);
                }
            }
            _ => {
                // Aggregate box with corner markers, no per-element handles
                if let Some(bounds) = editor.selection_bounds() {
                    self.render_dashed_rect(bounds, 0.0, transform, accent);
                    for corner in [
                        Point::new(bounds.x0, bounds.y0),
                        Point::new(bounds.x1, bounds.y0),
                        Point::new(bounds.x0, bounds.y1),
                        Point::new(bounds.x1, bounds.y1),
                    ] {
                        self.render_square_handle(corner, transform, accent);
                    }
                }
            }
        }
    }

    /// Dashed outline of a (possibly rotated) bounding box.
    fn render_dashed_rect(&mut self, bounds: Rect, rotation: f64, transform: Affine, color: Color) {
        let center = bounds.center();
        let corners = [
            Point::new(bounds.x0, bounds.y0),
            Point::new(bounds.x1, bounds.y0),
            Point::new(bounds.x1, bounds.y1),
            Point::new(bounds.x0, bounds.y1),
        ]
        .map(|p| rotate_about(p, center, rotation));

        let mut path = BezPath::new();
        path.move_to(corners[0]);
        for corner in &corners[1..] {
            path.line_to(*corner);
        }
        path.close_path();

        let dash = 4.0 / self.zoom;
        let stroke = Stroke::new(1.5 / self.zoom).with_dashes(0.0, [dash, dash]);
        self.scene.stroke(&stroke, transform, color, None, &path);
    }

    /// Single-selection affordances: dashed outline plus the shape's
    /// handles.
    fn render_single_selection(&mut self, shape: &Shape, transform: Affine, accent: Color) {
        self.render_dashed_rect(shape.bounds(), shape.rotation(), transform, accent);

        for handle in selection::get_handles(shape) {
            match handle.kind {
                HandleKind::Corner(_) | HandleKind::Edge(_) => {
                    self.render_square_handle(handle.position, transform, accent);
                }
                HandleKind::Rotate => self.render_rotate_handle(shape, &handle, transform, accent),
                HandleKind::Endpoint(_) => {}
            }
        }
    }

    /// Connector affordances: circular endpoint handles plus a dashed guide
    /// through the control point.
    fn render_connector_selection(&mut self, shape: &Shape, transform: Affine, accent: Color) {
        let Some(connector) = shape.as_connector() else {
            return;
        };

        let dash = 4.0 / self.zoom;
        let guide = Stroke::new(1.0 / self.zoom).with_dashes(0.0, [dash, dash]);
        let control = connector.control_or_midpoint();
        let mut guide_path = BezPath::new();
        guide_path.move_to(connector.start);
        guide_path.line_to(control);
        guide_path.line_to(connector.end);
        self.scene.stroke(
            &guide,
            transform,
            apply_opacity(accent, 0.6),
            None,
            &guide_path,
        );

        for (pos, radius) in [
            (connector.start, selection::HANDLE_SIZE / 2.0),
            (connector.end, selection::HANDLE_SIZE / 2.0),
            (control, selection::HANDLE_SIZE / 2.5),
        ] {
            let circle = Circle::new(pos, radius / self.zoom);
            self.scene
                .fill(Fill::NonZero, transform, Color::WHITE, None, &circle);
            self.scene.stroke(
                &Stroke::new(1.5 / self.zoom),
                transform,
                accent,
                None,
                &circle,
            );
        }
    }

    fn render_square_handle(&mut self, position: Point, transform: Affine, accent: Color) {
        let half = selection::HANDLE_SIZE / 2.0 / self.zoom;
        let rect = Rect::new(
            position.x - half,
            position.y - half,
            position.x + half,
            position.y + half,
        );
        self.scene
            .fill(Fill::NonZero, transform, Color::WHITE, None, &rect);
        self.scene.stroke(
            &Stroke::new(1.5 / self.zoom),
            transform,
            accent,
            None,
            &rect,
        );
    }

    fn render_rotate_handle(
        &mut self,
        shape: &Shape,
        handle: &Handle,
        transform: Affine,
        accent: Color,
    ) {
        // Stem from the top edge to the handle
        let bounds = shape.bounds();
        let center = bounds.center();
        let top = rotate_about(
            Point::new(center.x, bounds.y0),
            center,
            shape.rotation(),
        );
        let stem = Line::new(top, handle.position);
        self.scene.stroke(
            &Stroke::new(1.0 / self.zoom),
            transform,
            apply_opacity(accent, 0.6),
            None,
            &stem,
        );

        let circle = Circle::new(handle.position, selection::HANDLE_SIZE / 2.0 / self.zoom);
        self.scene
            .fill(Fill::NonZero, transform, Color::WHITE, None, &circle);
        self.scene.stroke(
            &Stroke::new(1.5 / self.zoom),
            transform,
            accent,
            None,
            &circle,
        );
    }

    /// Lock badges render on every locked shape regardless of selection,
    /// with a hover highlight.
    fn render_lock_badges(&mut self, ctx: &RenderContext, transform: Affine) {
        for shape in ctx.editor.document.shapes_ordered() {
            if !shape.locked() {
                continue;
            }
            let hovered = ctx.editor.hovered == Some(shape.id());
            let pos = selection::lock_badge_position(shape.bounds(), shape.rotation());
            let radius = selection::LOCK_BADGE_RADIUS / self.zoom;

            let badge = Circle::new(pos, radius);
            let fill = if hovered {
                Color::from_rgba8(255, 237, 160, 255)
            } else {
                Color::from_rgba8(243, 244, 246, 230)
            };
            self.scene.fill(Fill::NonZero, transform, fill, None, &badge);
            self.scene.stroke(
                &Stroke::new(1.0 / self.zoom),
                transform,
                Color::from_rgba8(107, 114, 128, 255),
                None,
                &badge,
            );

            // Tiny padlock: body + shackle
            let dark = Color::from_rgba8(55, 65, 81, 255);
            let body = Rect::new(
                pos.x - radius * 0.45,
                pos.y - radius * 0.05,
                pos.x + radius * 0.45,
                pos.y + radius * 0.55,
            );
            self.scene.fill(Fill::NonZero, transform, dark, None, &body);
            let shackle = Circle::new(Point::new(pos.x, pos.y - radius * 0.1), radius * 0.3);
            self.scene.stroke(
                &Stroke::new(radius * 0.18),
                transform,
                dark,
                None,
                &shackle,
            );
        }
    }

    // ------------------------------------------------------------------
    // Transient overlays
    // ------------------------------------------------------------------

    fn render_marquee(&mut self, ctx: &RenderContext, transform: Affine) {
        let Some(rect) = ctx.editor.overlay.marquee else {
            return;
        };
        let fill = apply_opacity(ctx.selection_color, 0.1);
        self.scene.fill(Fill::NonZero, transform, fill, None, &rect);
        let dash = 4.0 / self.zoom;
        let stroke = Stroke::new(1.0 / self.zoom).with_dashes(0.0, [dash, dash]);
        self.scene
            .stroke(&stroke, transform, ctx.selection_color, None, &rect);
    }

    fn render_laser(&mut self, ctx: &RenderContext, transform: Affine) {
        let lifetime = ctx.editor.overlay_config.laser_lifetime;
        let base = Color::from_rgba8(239, 68, 68, 255);

        for stroke in &ctx.editor.overlay.laser_strokes {
            for pair in stroke.points.windows(2) {
                let fade = fade_fraction(&pair[1], ctx.now, lifetime);
                if fade <= 0.0 {
                    continue;
                }
                let segment = Line::new(pair[0].pos, pair[1].pos);
                // Glow pass: wide and translucent
                self.scene.stroke(
                    &Stroke::new((8.0 * fade + 2.0) / self.zoom),
                    transform,
                    apply_opacity(base, 0.18 * fade),
                    None,
                    &segment,
                );
                // Core pass: age-based width and opacity falloff
                self.scene.stroke(
                    &Stroke::new((3.0 * fade + 0.5) / self.zoom),
                    transform,
                    apply_opacity(base, fade),
                    None,
                    &segment,
                );
            }
        }
    }

    fn render_eraser_trail(&mut self, ctx: &RenderContext, transform: Affine) {
        let lifetime = ctx.editor.overlay_config.eraser_trail_lifetime;
        let base = Color::from_rgba8(156, 163, 175, 255);

        for pair in ctx.editor.overlay.eraser_trail.windows(2) {
            let fade = fade_fraction(&pair[1], ctx.now, lifetime);
            if fade <= 0.0 {
                continue;
            }
            let segment = Line::new(pair[0].pos, pair[1].pos);
            self.scene.stroke(
                &Stroke::new((6.0 * fade + 1.0) / self.zoom),
                transform,
                apply_opacity(base, 0.8 * fade),
                None,
                &segment,
            );
        }
    }
}

impl Renderer for SceneRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();
        self.zoom = ctx.editor.camera.zoom;

        // Background
        let viewport = Rect::from_origin_size(Point::ZERO, ctx.viewport_size);
        self.scene.fill(
            Fill::NonZero,
            Affine::scale(ctx.scale_factor),
            ctx.background_color,
            None,
            &viewport,
        );

        let transform = Affine::scale(ctx.scale_factor) * ctx.editor.camera.transform();

        self.render_grid(ctx, transform, ctx.grid_style);

        // Elements in z-order; pending erasures at reduced opacity
        for shape in ctx.editor.document.shapes_ordered() {
            let extra = if ctx.editor.overlay.pending_erase.contains(&shape.id()) {
                PENDING_ERASE_OPACITY
            } else {
                1.0
            };
            self.render_shape(shape, transform, extra);
        }

        // In-progress creation preview
        if let Some(preview) = ctx.editor.tools.preview_shape() {
            self.render_shape(&preview, transform, 1.0);
        }

        self.render_selection(ctx, transform);
        self.render_lock_badges(ctx, transform);
        self.render_marquee(ctx, transform);
        self.render_laser(ctx, transform);
        self.render_eraser_trail(ctx, transform);
    }
}
