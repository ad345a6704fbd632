//! Cross-cutting primitives: canvas and color types, timestamps, errors, cancellation.

/// Cooperative cancellation.
pub mod cancel;
/// Canvas and color primitives.
pub mod core;
/// Error taxonomy.
pub mod error;
/// Timestamp parsing.
pub mod time;
