//! Render job controller: job lifecycle, observers, asset resolution and the submitting service.

/// Asset id resolution.
pub mod assets;
/// Per-job pipeline: rasterize, build the timeline, assemble.
pub mod controller;
/// Caller-side job handles.
pub mod handle;
/// Render service entry point.
pub mod service;
/// Job ids, states, events and observers.
pub mod state;
