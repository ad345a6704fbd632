//! Text rasterizer: verse text and style in, full-canvas RGBA frame out.

/// Font database and family fallback.
pub mod fonts;
/// Rasterized frames and their PNG form.
pub mod frame;
/// SVG text layout and rendering.
pub mod text;
