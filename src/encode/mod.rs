//! Media assembler: streams the lyric overlay into `ffmpeg`, composites it over the background,
//! muxes the audio and publishes the MP4.

/// ffmpeg invocation and atomic output publishing.
pub mod ffmpeg;
/// Overlay frame sources.
pub mod overlay;
/// ffprobe queries and tool availability.
pub mod probe;
