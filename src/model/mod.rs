//! Request-side data model: verses, their styling, and render requests.

/// Splitting pasted lyrics into verses.
pub mod lyrics;
/// Render requests and output naming.
pub mod request;
/// Verses and verse styling.
pub mod verse;
