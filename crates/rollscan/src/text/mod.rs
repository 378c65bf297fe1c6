//! Bengali text handling: normalization, fuzzy matching, record extraction.

pub mod extract;
pub mod matching;
pub mod normalize;

pub use extract::{extract_voter_blocks, extract_voter_blocks_with_boxes};
pub use matching::{fuzzy_match, similarity_ratio, token_set_ratio};
pub use normalize::normalize;
