//! Greedy word-wrap text layout.
//!
//! The same routine is used for live auto-sizing while typing, draw-time line
//! splitting and resize-driven re-wrap, so the persisted bounding box always
//! matches what is rendered.

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;
/// Fixed padding above the first line.
pub const TEXT_TOP_PADDING: f64 = 4.0;

/// Approximate advance width of a single character.
///
/// A small per-class table rather than real font metrics: the renderer draws
/// with the same estimate, which keeps measurement and drawing in agreement
/// without shipping a shaping engine in core.
pub fn char_width(c: char, font_size: f64) -> f64 {
    let factor = match c {
        'i' | 'l' | 'j' | 'f' | 't' | '!' | '\'' | '.' | ',' | ':' | ';' | '|' | '(' | ')' => 0.30,
        'm' | 'w' | '@' => 0.85,
        'M' | 'W' => 0.92,
        ' ' => 0.30,
        c if c.is_ascii_uppercase() => 0.66,
        _ => 0.55,
    };
    font_size * factor
}

/// Measured width of a string at a font size.
pub fn text_width(s: &str, font_size: f64) -> f64 {
    s.chars().map(|c| char_width(c, font_size)).sum()
}

/// Height of a wrapped block with the given line count.
pub fn wrapped_height(line_count: usize, font_size: f64) -> f64 {
    line_count.max(1) as f64 * font_size * LINE_HEIGHT_FACTOR + TEXT_TOP_PADDING
}

/// Greedy word wrap.
///
/// Explicit newlines split first (empty lines are preserved as blank visual
/// lines). Within a paragraph, words accumulate while the measured width
/// stays within `max_width`; a single word wider than the box falls back to
/// character-by-character breaking.
pub fn wrap_text(content: &str, max_width: f64, font_size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in content.split('\n') {
        wrap_paragraph(paragraph, max_width, font_size, &mut lines);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_paragraph(paragraph: &str, max_width: f64, font_size: f64, out: &mut Vec<String>) {
    if paragraph.trim().is_empty() {
        out.push(String::new());
        return;
    }

    let mut current = String::new();
    for word in paragraph.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, font_size) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if text_width(word, font_size) <= max_width {
            current = word.to_string();
        } else {
            // The word alone exceeds the box: break mid-word
            current = break_word(word, max_width, font_size, out);
        }
    }
    out.push(current);
}

/// Emit full-width chunks of an overlong word; returns the trailing partial
/// chunk for the caller to continue with.
fn break_word(word: &str, max_width: f64, font_size: f64, out: &mut Vec<String>) -> String {
    let mut chunk = String::new();
    let mut chunk_width = 0.0;
    for c in word.chars() {
        let w = char_width(c, font_size);
        // Always keep at least one character per chunk to guarantee progress
        if !chunk.is_empty() && chunk_width + w > max_width {
            out.push(std::mem::take(&mut chunk));
            chunk_width = 0.0;
        }
        chunk.push(c);
        chunk_width += w;
    }
    chunk
}
