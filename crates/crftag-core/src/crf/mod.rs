pub mod layer;
pub mod viterbi;

pub use layer::{Crf, IMPOSSIBLE};
pub use viterbi::ViterbiDecoder;
