//! Domain entities - Core objects with identity

mod token;

pub use token::{DragStyle, ElementToken, TokenState};
