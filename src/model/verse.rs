use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{LyricError, LyricResult};
use crate::foundation::time::de_seconds;

/// One timed, styled block of lyric text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    /// Opaque identifier, unique within a project.
    pub id: String,
    /// Display text; lines are separated by `\n`.
    #[serde(default)]
    pub text: String,
    /// Start of the visible window in seconds.
    #[serde(deserialize_with = "de_seconds")]
    pub start_time: f64,
    /// End of the visible window in seconds.
    #[serde(deserialize_with = "de_seconds")]
    pub end_time: f64,
    /// Text styling.
    #[serde(default)]
    pub style: VerseStyle,
}

impl Verse {
    /// Display lines in order. A trailing `\r` is stripped from each line.
    pub fn lines(&self) -> Vec<&str> {
        self.text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect()
    }

    /// Return `true` when no line has visible characters.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length of the visible window in seconds.
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    /// Check timing and style invariants. `index` is only used for error context.
    pub fn validate(&self, index: usize) -> LyricResult<()> {
        let ctx = || format!("verse {index} ('{}')", self.id);
        if !self.start_time.is_finite() || !self.end_time.is_finite() {
            return Err(LyricError::invalid_request(format!(
                "{}: timestamps must be finite",
                ctx()
            )));
        }
        if self.start_time > self.end_time {
            return Err(LyricError::invalid_request(format!(
                "{}: startTime {} is after endTime {}",
                ctx(),
                self.start_time,
                self.end_time
            )));
        }
        self.style
            .validate()
            .map_err(|e| LyricError::invalid_request(format!("{}: {e}", ctx())))
    }
}

/// Horizontal text anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Anchored at the left margin.
    Left,
    /// Anchored at the horizontal midpoint.
    #[default]
    Center,
    /// Anchored at the right margin.
    Right,
}

/// Per-verse text styling.
///
/// Missing JSON fields take the defaults the lyric editor assigns to new verses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerseStyle {
    /// Requested font family; unresolvable families fall back to the configured default.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: u32,
    /// Fill color.
    pub color: Rgba8,
    /// Outline color.
    pub stroke_color: Rgba8,
    /// Outline width in pixels; `0` disables the outline.
    pub stroke_width: f32,
    /// Bold face.
    pub bold: bool,
    /// Italic face.
    pub italic: bool,
    /// Underline decoration.
    pub underline: bool,
    /// Horizontal anchor.
    pub align: Align,
    /// Transition applied at the verse boundaries.
    pub transition: Transition,
}

impl Default for VerseStyle {
    fn default() -> Self {
        Self {
            font_family: "Montserrat".to_owned(),
            font_size: 40,
            color: Rgba8::WHITE,
            stroke_color: Rgba8::BLACK,
            stroke_width: 2.0,
            bold: false,
            italic: false,
            underline: false,
            align: Align::Center,
            transition: Transition::fade(0.5),
        }
    }
}

impl VerseStyle {
    fn validate(&self) -> Result<(), String> {
        if self.font_size == 0 {
            return Err("fontSize must be > 0".to_owned());
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err("strokeWidth must be finite and >= 0".to_owned());
        }
        if !self.transition.duration.is_finite() || self.transition.duration < 0.0 {
            return Err("transition.duration must be finite and >= 0".to_owned());
        }
        Ok(())
    }
}

/// Transition kind at verse boundaries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TransitionKind {
    /// Hard cut.
    #[default]
    None,
    /// Linear opacity ramp in and out.
    Fade,
    /// A kind this renderer does not implement; rendered as a hard cut.
    Other(String),
}

impl TransitionKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Fade => "fade",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl Serialize for TransitionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransitionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "cut" => Self::None,
            "fade" => Self::Fade,
            _ => Self::Other(s),
        })
    }
}

/// Verse boundary transition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transition {
    /// Transition kind.
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    /// Ramp length in seconds.
    pub duration: f64,
}

impl Transition {
    /// Fade with a ramp of `duration` seconds.
    pub fn fade(duration: f64) -> Self {
        Self {
            kind: TransitionKind::Fade,
            duration,
        }
    }

    /// Hard cut.
    pub fn none() -> Self {
        Self::default()
    }

    /// Ramp length in seconds when this transition fades, `0` otherwise.
    pub fn fade_duration(&self) -> f64 {
        match self.kind {
            TransitionKind::Fade if self.duration.is_finite() => self.duration.max(0.0),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/verse.rs"]
mod tests;
