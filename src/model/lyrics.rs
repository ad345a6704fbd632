use crate::model::verse::{Verse, VerseStyle};

/// Lines per verse when pasted lyrics carry no blank-line stanza breaks.
pub const LINES_PER_VERSE: usize = 4;

/// Split pasted lyrics into untimed verses.
///
/// Stanzas separated by blank lines become verses. When the text has a single stanza it is
/// chunked into verses of [`LINES_PER_VERSE`] non-empty lines. Verses get ids `verse-1`,
/// `verse-2`, ..., zero timing and the default style.
pub fn split_lyrics(text: &str) -> Vec<Verse> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut stanzas = stanzas(text);
    if stanzas.len() == 1 {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        stanzas = lines
            .chunks(LINES_PER_VERSE)
            .map(|chunk| chunk.join("\n"))
            .collect();
    }

    stanzas
        .into_iter()
        .enumerate()
        .map(|(i, body)| Verse {
            id: format!("verse-{}", i + 1),
            text: body,
            start_time: 0.0,
            end_time: 0.0,
            style: VerseStyle::default(),
        })
        .collect()
}

fn stanzas(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        current.push(line.trim_end());
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/model/lyrics.rs"]
mod tests;
