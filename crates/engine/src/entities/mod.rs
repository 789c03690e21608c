//! Entity modules - operations on the board, the pair memo and the
//! generative services.

pub mod board;
pub mod combination;
pub mod overlap;
pub mod pair_memo;

pub use board::Board;
pub use combination::Combination;
pub use overlap::{AabbOverlapDetector, OverlapCandidate, OverlapDetector, OverlapPolicy};
pub use pair_memo::PairMemo;
