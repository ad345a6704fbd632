use std::fmt::Write as _;

use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{LyricError, LyricResult};
use crate::model::verse::{Align, Verse, VerseStyle};
use crate::raster::fonts::{FontBook, font_resolver};
use crate::raster::frame::VerseFrame;

/// Horizontal inset of left/right anchored text.
pub const SIDE_MARGIN_PX: f32 = 100.0;
/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.4;

/// Renders verse text into full-canvas RGBA frames.
///
/// Text is laid out as an SVG document and rendered through `usvg`/`resvg`, so shaping, face
/// selection and stroking match the rest of the pipeline on every host with the same fonts.
#[derive(Clone, Debug)]
pub struct TextRasterizer {
    canvas: Canvas,
    fonts: FontBook,
}

impl TextRasterizer {
    /// Create a rasterizer for `canvas` using `fonts`.
    pub fn new(canvas: Canvas, fonts: FontBook) -> Self {
        Self { canvas, fonts }
    }

    /// Canvas every frame covers.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Fonts used for face selection.
    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Rasterize a verse. `verse_index` is only used for error context.
    pub fn rasterize_verse(
        &self,
        verse_index: usize,
        verse: &Verse,
        fill: Option<Rgba8>,
    ) -> LyricResult<VerseFrame> {
        self.rasterize(verse_index, &verse.lines(), &verse.style, fill)
    }

    /// Rasterize `lines` with `style`.
    ///
    /// `fill` paints the whole canvas first; pass `None` to keep the background transparent (the
    /// frame is then composited over background media). Blank text yields a blank frame.
    pub fn rasterize(
        &self,
        verse_index: usize,
        lines: &[&str],
        style: &VerseStyle,
        fill: Option<Rgba8>,
    ) -> LyricResult<VerseFrame> {
        let has_text = lines.iter().any(|l| !l.trim().is_empty());
        if !has_text {
            return Ok(match fill {
                Some(c) => VerseFrame::solid(self.canvas, c),
                None => VerseFrame::transparent(self.canvas),
            });
        }

        let family = self.fonts.resolve_family(&style.font_family).ok_or_else(|| {
            LyricError::rasterization(verse_index, "no font faces available to render text")
        })?;

        let svg = build_svg(self.canvas, lines, style, fill, &family);
        let opts = usvg::Options {
            fontdb: self.fonts.database(),
            font_resolver: font_resolver(),
            font_family: family.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts)
            .map_err(|e| LyricError::rasterization(verse_index, format!("svg layout: {e}")))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(self.canvas.width, self.canvas.height)
            .ok_or_else(|| {
                LyricError::rasterization(
                    verse_index,
                    format!(
                        "cannot allocate {}x{} pixmap",
                        self.canvas.width, self.canvas.height
                    ),
                )
            })?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );

        let mut rgba8 = Vec::with_capacity(self.canvas.rgba_len());
        for px in pixmap.pixels() {
            let c = px.demultiply();
            rgba8.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        tracing::trace!(verse_index, family = %family, lines = lines.len(), "verse rasterized");

        Ok(VerseFrame {
            width: self.canvas.width,
            height: self.canvas.height,
            rgba8,
        })
    }
}

/// Baseline-independent vertical centers of each line of a block of `n` lines.
///
/// The block as a whole is centered on the canvas midpoint.
pub(crate) fn line_centers(canvas: Canvas, font_size: u32, n: usize) -> Vec<f32> {
    let lh = font_size as f32 * LINE_HEIGHT_FACTOR;
    let top = canvas.height as f32 / 2.0 - n as f32 * lh / 2.0;
    (0..n).map(|i| top + (i as f32 + 0.5) * lh).collect()
}

fn anchor(canvas: Canvas, align: Align) -> (f32, &'static str) {
    match align {
        Align::Left => (SIDE_MARGIN_PX, "start"),
        Align::Center => (canvas.width as f32 / 2.0, "middle"),
        Align::Right => (canvas.width as f32 - SIDE_MARGIN_PX, "end"),
    }
}

pub(crate) fn build_svg(
    canvas: Canvas,
    lines: &[&str],
    style: &VerseStyle,
    fill: Option<Rgba8>,
    family: &str,
) -> String {
    let (w, h) = (canvas.width, canvas.height);
    let mut svg = String::with_capacity(512 + lines.len() * 256);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    if let Some(bg) = fill {
        let _ = write!(
            svg,
            r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{}"{}/>"#,
            bg.to_hex_rgb(),
            opacity_attr("fill-opacity", bg),
        );
    }

    let (x, text_anchor) = anchor(canvas, style.align);
    let mut text_attrs = format!(
        r#"font-family="{}" font-size="{}" font-weight="{}" font-style="{}" text-anchor="{text_anchor}" dominant-baseline="central" fill="{}"{}"#,
        escape_xml(&quote_family(family)),
        style.font_size,
        if style.bold { "bold" } else { "normal" },
        if style.italic { "italic" } else { "normal" },
        style.color.to_hex_rgb(),
        opacity_attr("fill-opacity", style.color),
    );
    if style.stroke_width > 0.0 {
        let _ = write!(
            text_attrs,
            r#" stroke="{}" stroke-width="{}" stroke-linejoin="round" paint-order="stroke"{}"#,
            style.stroke_color.to_hex_rgb(),
            style.stroke_width,
            opacity_attr("stroke-opacity", style.stroke_color),
        );
    }
    if style.underline {
        text_attrs.push_str(r#" text-decoration="underline""#);
    }

    for (line, y) in lines
        .iter()
        .zip(line_centers(canvas, style.font_size, lines.len()))
    {
        if line.trim().is_empty() {
            continue;
        }
        let _ = write!(
            svg,
            r#"<text x="{x}" y="{y}" xml:space="preserve" {text_attrs}>{}</text>"#,
            escape_xml(line)
        );
    }
    svg.push_str("</svg>");
    svg
}

fn opacity_attr(name: &str, c: Rgba8) -> String {
    if c.is_opaque() {
        String::new()
    } else {
        format!(r#" {name}="{:.4}""#, c.opacity())
    }
}

fn quote_family(family: &str) -> String {
    format!("'{}'", family.replace('\'', ""))
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/raster/text.rs"]
mod tests;
