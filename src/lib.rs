//! lyrivid turns time-synced lyrics into an MP4 lyric video.
//!
//! A [`RenderRequest`] (verses with timing and styling, an audio track, an optional background)
//! is submitted to a [`RenderService`], which runs it as a background job:
//!
//! - Rasterize every verse into a full-canvas RGBA frame ([`TextRasterizer`])
//! - Decide per output frame which verse is visible and how opaque ([`Timeline`])
//! - Stream the overlay into `ffmpeg`, composite it over the background and mux the audio
//!
//! Progress and completion are reported through a [`JobHandle`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Deployment configuration.
pub mod config;
/// Media assembler.
pub mod encode;
/// Listing of published videos.
pub mod exports;
/// Shared primitives and errors.
pub mod foundation;
/// Render job controller.
pub mod job;
/// Request data model.
pub mod model;
/// Text rasterizer.
pub mod raster;
/// Timeline compositor.
pub mod timeline;

pub use crate::config::{EncodePolicy, FontConfig, RenderConfig, ToolPaths};
pub use crate::exports::{ExportEntry, list_exports};
pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{Canvas, Rgba8};
pub use crate::foundation::error::{ErrorKind, LyricError, LyricResult};
pub use crate::foundation::time::parse_timestamp;

pub use crate::encode::ffmpeg::{AssemblyPlan, Background, assemble};
pub use crate::encode::probe::{MediaInfo, is_ffmpeg_on_path, probe_media};
pub use crate::job::assets::{AssetResolver, FsAssetResolver};
pub use crate::job::handle::{JobHandle, JobOutcome};
pub use crate::job::service::RenderService;
pub use crate::job::state::{ChannelObserver, JobEvent, JobFailure, JobId, JobObserver, JobStatus};
pub use crate::model::lyrics::split_lyrics;
pub use crate::model::request::{RenderRequest, sanitize_filename};
pub use crate::model::verse::{Align, Transition, TransitionKind, Verse, VerseStyle};
pub use crate::raster::fonts::FontBook;
pub use crate::raster::frame::VerseFrame;
pub use crate::raster::text::TextRasterizer;
pub use crate::timeline::compositor::{Cue, OverlaySample, Segment, Timeline};
