use std::collections::HashMap;

use crate::shared::transcript::Segment;

/// Rewrite raw model speaker labels (`A`, `B`, ...) to `Speaker 1`,
/// `Speaker 2`, ... in first-seen order. Unlabeled segments are left
/// unlabeled.
pub fn normalize_speaker_labels(segments: &mut [Segment]) {
    let mut mapping: HashMap<String, String> = HashMap::new();
    let mut next_speaker = 1usize;

    for segment in segments.iter_mut() {
        let Some(raw) = segment.speaker.clone() else {
            continue;
        };
        let canonical = mapping
            .entry(raw)
            .or_insert_with(|| {
                let label = format!("Speaker {next_speaker}");
                next_speaker += 1;
                label
            })
            .clone();
        segment.speaker = Some(canonical);
    }
}

/// Render a readable diarized transcript, one line per speaker turn.
/// Adjacent segments from the same speaker are merged into one line;
/// unlabeled segments render as `Unknown`.
pub fn format_diarized_transcript(segments: &[Segment]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current_speaker: Option<&str> = None;
    let mut current_texts: Vec<&str> = Vec::new();

    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }
        let speaker = segment.speaker.as_deref().unwrap_or("Unknown");

        if current_speaker == Some(speaker) {
            current_texts.push(text);
        } else {
            if let Some(prev) = current_speaker.take() {
                lines.push(format!("{}: {}", prev, current_texts.join(" ")));
            }
            current_speaker = Some(speaker);
            current_texts = vec![text];
        }
    }
    if let Some(prev) = current_speaker {
        lines.push(format!("{}: {}", prev, current_texts.join(" ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str, speaker: Option<&str>) -> Segment {
        Segment {
            start_sec: 0.0,
            end_sec: 1.0,
            text: text.to_string(),
            speaker: speaker.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_assigns_numbers_in_first_seen_order() {
        let mut segments = vec![
            segment("first", Some("B")),
            segment("second", Some("A")),
            segment("third", Some("B")),
        ];
        normalize_speaker_labels(&mut segments);

        assert_eq!(segments[0].speaker.as_deref(), Some("Speaker 1"));
        assert_eq!(segments[1].speaker.as_deref(), Some("Speaker 2"));
        assert_eq!(segments[2].speaker.as_deref(), Some("Speaker 1"));
    }

    #[test]
    fn test_normalize_leaves_unlabeled_alone() {
        let mut segments = vec![segment("quiet", None), segment("loud", Some("A"))];
        normalize_speaker_labels(&mut segments);

        assert_eq!(segments[0].speaker, None);
        assert_eq!(segments[1].speaker.as_deref(), Some("Speaker 1"));
    }

    #[test]
    fn test_format_merges_adjacent_same_speaker() {
        let segments = vec![
            segment("Hello there.", Some("Speaker 1")),
            segment("How are you?", Some("Speaker 1")),
            segment("Fine, thanks.", Some("Speaker 2")),
        ];
        assert_eq!(
            format_diarized_transcript(&segments),
            "Speaker 1: Hello there. How are you?\nSpeaker 2: Fine, thanks."
        );
    }

    #[test]
    fn test_format_renders_unlabeled_as_unknown() {
        let segments = vec![segment("who said this", None)];
        assert_eq!(
            format_diarized_transcript(&segments),
            "Unknown: who said this"
        );
    }

    #[test]
    fn test_format_skips_blank_text() {
        let segments = vec![
            segment("   ", Some("Speaker 1")),
            segment("kept", Some("Speaker 2")),
        ];
        assert_eq!(format_diarized_transcript(&segments), "Speaker 2: kept");
    }

    #[test]
    fn test_format_empty_input() {
        assert_eq!(format_diarized_transcript(&[]), "");
    }
}
