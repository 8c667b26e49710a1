pub mod resegmenter;
pub mod speaker_labels;
pub mod token_inference;
