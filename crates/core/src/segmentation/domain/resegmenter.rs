use crate::shared::transcript::{Segment, WordToken};

pub const DEFAULT_PAUSE_THRESHOLD_MS: f64 = 250.0;
pub const DEFAULT_MAX_SEGMENT_MS: f64 = 1500.0;

/// Regroups word tokens into output segments.
///
/// Words are the source of truth; segment boundaries are re-derived from
/// speaker changes, inter-word pauses, a duration cap, and sentence-final
/// punctuation. A single forward scan, no backtracking.
pub struct Resegmenter {
    pause_threshold_ms: f64,
    max_segment_ms: f64,
    split_on_punctuation: bool,
}

impl Resegmenter {
    pub fn new(pause_threshold_ms: f64, max_segment_ms: f64, split_on_punctuation: bool) -> Self {
        Self {
            pause_threshold_ms,
            max_segment_ms,
            split_on_punctuation,
        }
    }

    pub fn resegment(&self, words: &[WordToken]) -> Vec<Segment> {
        if words.is_empty() {
            return Vec::new();
        }

        let pause_threshold_sec = self.pause_threshold_ms / 1000.0;
        let max_segment_sec = self.max_segment_ms / 1000.0;

        let mut segments = Vec::new();
        let mut current: Vec<&WordToken> = Vec::new();
        let mut segment_start = 0.0f64;

        for word in words {
            let mut should_split = false;
            if let Some(prev) = current.last() {
                // A label change splits only when at least one side is
                // labeled, so unlabeled continuation words stay attached.
                if word.speaker != prev.speaker
                    && (word.speaker.is_some() || prev.speaker.is_some())
                {
                    should_split = true;
                }
                if word.start_sec - prev.end_sec >= pause_threshold_sec {
                    should_split = true;
                }
                if word.end_sec - segment_start >= max_segment_sec {
                    should_split = true;
                }
                if self.split_on_punctuation
                    && prev.text.trim_end().ends_with(['.', '?', '!'])
                {
                    should_split = true;
                }
            }

            if should_split {
                flush(&mut current, &mut segments);
            }
            if current.is_empty() {
                segment_start = word.start_sec;
            }
            current.push(word);
        }
        flush(&mut current, &mut segments);

        log::info!(
            "Resegmented {} words into {} segments",
            words.len(),
            segments.len()
        );
        segments
    }
}

impl Default for Resegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_PAUSE_THRESHOLD_MS, DEFAULT_MAX_SEGMENT_MS, true)
    }
}

fn flush(current: &mut Vec<&WordToken>, segments: &mut Vec<Segment>) {
    if current.is_empty() {
        return;
    }

    let text = current
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    segments.push(Segment {
        start_sec: current[0].start_sec,
        end_sec: current[current.len() - 1].end_sec,
        text: text.trim().to_string(),
        speaker: majority_speaker(current),
    });
    current.clear();
}

/// Majority label among labeled words; ties go to the first label seen.
/// Unlabeled words cast no vote.
fn majority_speaker(words: &[&WordToken]) -> Option<String> {
    let mut votes: Vec<(&str, usize)> = Vec::new();
    for word in words {
        let Some(label) = word.speaker.as_deref() else {
            continue;
        };
        match votes.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => votes.push((label, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in votes {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.to_string())
}
