//! Timeline compositor: decides which verse frame is visible at a given time, and how opaque.

/// Cue scheduling, overlap resolution and fade envelopes.
pub mod compositor;
