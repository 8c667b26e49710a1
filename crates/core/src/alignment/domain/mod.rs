pub mod energy_profile;
pub mod word_aligner;
