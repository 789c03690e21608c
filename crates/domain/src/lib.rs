//! WhatIf Alchemy domain.
//!
//! Pure types with no I/O: validated element names, pair keys, board
//! geometry and the token interaction state machine.

extern crate self as alchemy_domain;

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{DragStyle, ElementToken, TokenState};
pub use error::DomainError;
pub use ids::{MergeId, TokenId};
pub use value_objects::{Bounds, ElementImage, ElementName, PairKey, Tint, Vec2};
