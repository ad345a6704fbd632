use std::path::PathBuf;

use crate::foundation::core::Canvas;
use crate::foundation::error::{LyricError, LyricResult};
use crate::raster::frame::VerseFrame;
use crate::timeline::compositor::Timeline;

/// Source of overlay frames streamed into the encoder.
///
/// Frames are straight-alpha RGBA8 covering the whole canvas, requested in increasing order.
pub trait OverlaySource {
    /// Number of output frames.
    fn frame_count(&self) -> u64;

    /// Pixels of output frame `n`.
    fn frame(&mut self, n: u64) -> LyricResult<&[u8]>;
}

/// Lazily loaded verse frames, indexed by verse index.
///
/// Only the most recently used frame is kept in memory; the timeline visits verses in order, so
/// each frame is decoded about once.
#[derive(Debug)]
pub struct FrameStore {
    canvas: Canvas,
    paths: Vec<PathBuf>,
    cached: Option<(usize, VerseFrame)>,
}

impl FrameStore {
    /// Store over `paths[i]` = PNG of verse `i`.
    pub fn new(canvas: Canvas, paths: Vec<PathBuf>) -> Self {
        Self {
            canvas,
            paths,
            cached: None,
        }
    }

    /// Number of verse frames.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Return `true` when the store holds no frames.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Frame of verse `index`.
    pub fn get(&mut self, index: usize) -> LyricResult<&VerseFrame> {
        let hit = matches!(&self.cached, Some((i, _)) if *i == index);
        if !hit {
            let path = self.paths.get(index).ok_or_else(|| {
                LyricError::assembly(format!("no rasterized frame for verse {index}"))
            })?;
            let frame = VerseFrame::read_png(path, self.canvas)?;
            self.cached = Some((index, frame));
        }
        match &self.cached {
            Some((_, frame)) => Ok(frame),
            None => Err(LyricError::assembly("frame cache empty after load")),
        }
    }
}

/// Realizes a [`Timeline`] as a per-output-frame RGBA stream.
#[derive(Debug)]
pub struct OverlayStream<'a> {
    timeline: &'a Timeline,
    store: FrameStore,
    fps: u32,
    buf: Vec<u8>,
    shown: Option<Option<(usize, u32)>>,
}

impl<'a> OverlayStream<'a> {
    /// Stream `timeline` at `fps` using frames from `store`.
    pub fn new(timeline: &'a Timeline, store: FrameStore, fps: u32) -> Self {
        let len = store.canvas.rgba_len();
        Self {
            timeline,
            store,
            fps,
            buf: vec![0; len],
            shown: None,
        }
    }
}

impl OverlaySource for OverlayStream<'_> {
    fn frame_count(&self) -> u64 {
        self.timeline.frame_count(self.fps)
    }

    fn frame(&mut self, n: u64) -> LyricResult<&[u8]> {
        let sample = self.timeline.sample(n, self.fps);
        let key = sample.map(|s| (s.index, s.alpha.to_bits()));
        if self.shown == Some(key) {
            return Ok(&self.buf);
        }

        match sample {
            None => self.buf.fill(0),
            Some(s) => {
                let frame = self.store.get(s.index)?;
                apply_opacity(&mut self.buf, &frame.rgba8, s.alpha);
            }
        }
        self.shown = Some(key);
        Ok(&self.buf)
    }
}

/// Copy straight-alpha `src` into `dst`, scaling alpha by `opacity`.
pub(crate) fn apply_opacity(dst: &mut [u8], src: &[u8], opacity: f32) {
    let k = opacity.clamp(0.0, 1.0);
    if k >= 1.0 {
        dst.copy_from_slice(src);
        return;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        d[..3].copy_from_slice(&s[..3]);
        d[3] = (f32::from(s[3]) * k).round() as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/overlay.rs"]
mod tests;
