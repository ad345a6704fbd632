use crate::foundation::time::frames_for;
use crate::model::verse::Verse;

/// Timing of one verse on the timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cue {
    /// Index of the verse in the request's original list order (also its frame index).
    pub index: usize,
    /// Start of the visible window in seconds (inclusive).
    pub start: f64,
    /// End of the visible window in seconds (exclusive).
    pub end: f64,
    /// Requested fade ramp in seconds; `0` is a hard cut.
    pub fade: f64,
}

impl Cue {
    /// Build the cue for `verse` at `index`.
    pub fn from_verse(index: usize, verse: &Verse) -> Self {
        Self {
            index,
            start: verse.start_time,
            end: verse.end_time,
            fade: verse.style.transition.fade_duration(),
        }
    }

    /// Length of the visible window.
    pub fn len(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Return `true` when the window has zero length.
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }

    /// Return `true` when `t` lies in `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// Effective ramp length: the requested fade, shrunk to half the window when it doesn't fit
    /// twice.
    pub fn ramp(&self) -> f64 {
        self.fade.max(0.0).min(self.len() / 2.0)
    }

    /// Opacity envelope on the closed window `[start, end]`, `0` outside.
    ///
    /// With a ramp the opacity is `0` at both ends and rises/falls linearly.
    pub fn opacity_at(&self, t: f64) -> f32 {
        if t < self.start || t > self.end || self.is_empty() {
            return 0.0;
        }
        let d = self.ramp();
        if d <= 0.0 {
            return 1.0;
        }
        let rise = (t - self.start) / d;
        let fall = (self.end - t) / d;
        rise.min(fall).clamp(0.0, 1.0) as f32
    }
}

/// What to overlay at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlaySample {
    /// Frame (verse) index to show.
    pub index: usize,
    /// Opacity in `(0, 1]`.
    pub alpha: f32,
}

/// One interval of the resolved visibility schedule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Interval start in seconds (inclusive).
    pub from: f64,
    /// Interval end in seconds (exclusive).
    pub to: f64,
    /// Verse index visible throughout the interval.
    pub index: usize,
}

/// Ordered verse schedule over `[0, total_duration)`.
///
/// Cues are sorted by start time with a stable sort. When windows overlap the cue that started
/// last wins; on equal start times the cue later in the original list wins. At most one cue is
/// visible at any instant.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    cues: Vec<Cue>,
    total_duration: f64,
}

impl Timeline {
    /// Schedule `verses`; the total duration covers both the last verse and the audio track.
    pub fn new(verses: &[Verse], audio_duration: f64) -> Self {
        let cues = verses
            .iter()
            .enumerate()
            .map(|(i, v)| Cue::from_verse(i, v))
            .collect();
        Self::from_cues(cues, audio_duration)
    }

    /// Schedule prebuilt cues.
    pub fn from_cues(mut cues: Vec<Cue>, audio_duration: f64) -> Self {
        cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        let last_end = cues.iter().map(|c| c.end).fold(0.0, f64::max);
        let audio = if audio_duration.is_finite() {
            audio_duration.max(0.0)
        } else {
            0.0
        };
        Self {
            cues,
            total_duration: last_end.max(audio),
        }
    }

    /// Cues in schedule order.
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Output duration in seconds.
    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    /// Number of output frames at `fps`.
    pub fn frame_count(&self, fps: u32) -> u64 {
        frames_for(self.total_duration, fps)
    }

    fn winner(&self, t: f64) -> Option<&Cue> {
        self.cues.iter().rev().find(|c| c.contains(t))
    }

    /// Overlay at time `t`, or `None` when nothing is visible.
    pub fn frame_at(&self, t: f64) -> Option<OverlaySample> {
        if !(0.0..self.total_duration).contains(&t) {
            return None;
        }
        let cue = self.winner(t)?;
        let alpha = cue.opacity_at(t);
        (alpha > 0.0).then_some(OverlaySample {
            index: cue.index,
            alpha,
        })
    }

    /// Overlay for output frame `n` at `fps`.
    pub fn sample(&self, n: u64, fps: u32) -> Option<OverlaySample> {
        self.frame_at(n as f64 / f64::from(fps))
    }

    /// Resolved schedule as non-overlapping intervals, in time order.
    ///
    /// Gaps where no verse is scheduled are omitted. Fade envelopes are not reflected.
    pub fn segments(&self) -> Vec<Segment> {
        let mut bounds: Vec<f64> = self
            .cues
            .iter()
            .flat_map(|c| [c.start, c.end])
            .filter(|t| (0.0..=self.total_duration).contains(t))
            .chain([0.0, self.total_duration])
            .collect();
        bounds.sort_by(f64::total_cmp);
        bounds.dedup();

        let mut out: Vec<Segment> = Vec::new();
        for w in bounds.windows(2) {
            let (from, to) = (w[0], w[1]);
            let Some(cue) = self.winner(from) else {
                continue;
            };
            if let Some(last) = out.last_mut()
                && last.index == cue.index
                && last.to == from
            {
                last.to = to;
                continue;
            }
            out.push(Segment {
                from,
                to,
                index: cue.index,
            });
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/compositor.rs"]
mod tests;
