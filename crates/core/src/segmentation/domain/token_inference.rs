use crate::shared::transcript::{Segment, WordToken};

pub const DEFAULT_MIN_WORD_SEC: f64 = 0.04;

/// Whitespace tokenization with punctuation left attached to words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Derive word-level timing from segment-level transcription output.
///
/// Segment duration is distributed across its tokens proportionally to
/// character length, with a per-word floor of `min_duration_sec`.
/// Intermediate word ends never pass the segment end; the last word always
/// lands exactly on it. The segment's speaker label is carried onto every
/// token.
pub fn infer_word_tokens(segments: &[Segment], min_duration_sec: f64) -> Vec<WordToken> {
    let mut words = Vec::new();

    for seg in segments {
        let tokens = tokenize(&seg.text);
        if tokens.is_empty() {
            continue;
        }

        let seg_duration = seg.duration_sec();
        let lengths: Vec<usize> = tokens.iter().map(|t| t.chars().count()).collect();
        let total_chars: usize = lengths.iter().sum();

        let last = tokens.len() - 1;
        let mut cursor = seg.start_sec;
        for (i, token) in tokens.into_iter().enumerate() {
            let end = if i == last {
                seg.end_sec
            } else {
                let share = seg_duration * lengths[i] as f64 / total_chars as f64;
                (cursor + share.max(min_duration_sec)).min(seg.end_sec)
            };
            words.push(WordToken {
                text: token,
                start_sec: cursor,
                end_sec: end,
                speaker: seg.speaker.clone(),
            });
            cursor = end;
        }
    }

    words
}
