use serde::{Deserialize, Serialize};

/// A single transcribed word with timing and an optional diarization label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    pub text: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub speaker: Option<String>,
}

impl WordToken {
    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }
}

/// A group of words rendered as one output segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_sec: f64,
    pub end_sec: f64,
    pub text: String,
    pub speaker: Option<String>,
}

impl Segment {
    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_word_token_fields() {
        let w = WordToken {
            text: "hello".to_string(),
            start_sec: 1.0,
            end_sec: 1.5,
            speaker: Some("A".to_string()),
        };
        assert_eq!(w.text, "hello");
        assert_relative_eq!(w.duration_sec(), 0.5, epsilon = 0.001);
    }

    #[test]
    fn test_segment_duration() {
        let s = Segment {
            start_sec: 2.0,
            end_sec: 3.2,
            text: "hello world".to_string(),
            speaker: None,
        };
        assert_relative_eq!(s.duration_sec(), 1.2, epsilon = 0.001);
    }
}
