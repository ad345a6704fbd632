use serde::Deserialize;

use crate::foundation::error::{LyricError, LyricResult};

/// Number of whole frames at `fps` needed to cover `duration_sec`.
pub fn frames_for(duration_sec: f64, fps: u32) -> u64 {
    let n = duration_sec * f64::from(fps);
    (n - 1e-9).ceil().max(0.0) as u64
}

/// Parse a verse timestamp into seconds.
///
/// Accepted forms: `ss[.fff]`, `mm:ss[.fff]` and `hh:mm:ss[.fff]`. Minutes and seconds in the
/// colon forms may exceed 59 only in the leading field.
pub fn parse_timestamp(s: &str) -> LyricResult<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Err(LyricError::invalid_request("timestamp must be non-empty"));
    }

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() > 3 {
        return Err(LyricError::invalid_request(format!(
            "timestamp \"{s}\" has too many ':' fields"
        )));
    }

    let mut secs = 0.0f64;
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        let v: f64 = part.trim().parse().map_err(|_| {
            LyricError::invalid_request(format!("invalid timestamp field \"{part}\" in \"{s}\""))
        })?;
        if !v.is_finite() || v < 0.0 {
            return Err(LyricError::invalid_request(format!(
                "timestamp \"{s}\" must be finite and non-negative"
            )));
        }
        if i != last && v.fract() != 0.0 {
            return Err(LyricError::invalid_request(format!(
                "only the seconds field of \"{s}\" may be fractional"
            )));
        }
        if i > 0 && v >= 60.0 {
            return Err(LyricError::invalid_request(format!(
                "timestamp \"{s}\" has a minutes/seconds field >= 60"
            )));
        }
        secs = secs * 60.0 + v;
    }
    Ok(secs)
}

/// Serde adapter: accept a JSON number of seconds or a timestamp string.
pub(crate) fn de_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Secs(f64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Secs(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Repr::Secs(v) => Err(serde::de::Error::custom(format!(
            "timestamp {v} must be finite and non-negative"
        ))),
        Repr::Text(s) => parse_timestamp(&s).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/time.rs"]
mod tests;
