//! Glyph-run drawing for wrapped text.
//!
//! Line splitting always comes from `markboard_core::layout`; parley only
//! shapes one already-wrapped line at a time, so the drawn text matches the
//! persisted bounding box exactly.

use kurbo::{Affine, Point};
use markboard_core::layout::{LINE_HEIGHT_FACTOR, TEXT_TOP_PADDING};
use markboard_core::shapes::{FontFamily, TextAlign};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext, StyleProperty};
use peniko::{Brush, Color, Fill};
use vello::Scene;

/// Resolve a shape font family to a parley generic family.
fn generic_family(family: FontFamily) -> parley::GenericFamily {
    match family {
        FontFamily::Sans => parley::GenericFamily::SansSerif,
        FontFamily::Serif => parley::GenericFamily::Serif,
        FontFamily::Mono => parley::GenericFamily::Monospace,
    }
}

/// Draw a block of pre-wrapped lines. `origin` is the top-left of the text
/// box and `box_width` its wrap width; alignment offsets each line inside
/// that box.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_text_block(
    scene: &mut Scene,
    font_cx: &mut FontContext,
    layout_cx: &mut LayoutContext<Brush>,
    lines: &[String],
    origin: Point,
    box_width: f64,
    font_size: f64,
    family: FontFamily,
    align: TextAlign,
    color: Color,
    transform: Affine,
) {
    let brush = Brush::Solid(color);
    let line_height = font_size * LINE_HEIGHT_FACTOR;

    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }

        let mut builder = layout_cx.ranged_builder(font_cx, line, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font_size as f32));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Single(
            parley::FontFamily::Generic(generic_family(family)),
        )));
        let mut layout = builder.build(line);
        layout.break_all_lines(None);
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());

        let line_width = layout.width() as f64;
        let x_offset = match align {
            TextAlign::Left => 0.0,
            TextAlign::Center => ((box_width - line_width) / 2.0).max(0.0),
            TextAlign::Right => (box_width - line_width).max(0.0),
        };
        let line_transform = transform
            * Affine::translate((
                origin.x + x_offset,
                origin.y + TEXT_TOP_PADDING + index as f64 * line_height,
            ));

        for layout_line in layout.lines() {
            for item in layout_line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let font = run.font();
                let run_font_size = run.font_size();
                let synthesis = run.synthesis();
                let glyph_xform = synthesis
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();

                if !glyphs.is_empty() {
                    scene
                        .draw_glyphs(font)
                        .brush(&brush)
                        .hint(true)
                        .transform(line_transform)
                        .glyph_transform(glyph_xform)
                        .font_size(run_font_size)
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }
    }
}
