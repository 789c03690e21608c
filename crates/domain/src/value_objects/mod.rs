//! Value objects - Immutable objects defined by their attributes

mod geometry;
mod names;
mod pair_key;
mod visual;

pub use geometry::{Bounds, Vec2};
pub use names::ElementName;
pub use pair_key::PairKey;
pub use visual::{ElementImage, Tint};
