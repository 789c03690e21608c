//! Pair of element names used as a memo key.
//!
//! The pair keeps the order it was created with. Lookups treat it as
//! unordered by probing the key and then its reverse; no sorting happens.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::names::ElementName;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub first: ElementName,
    pub second: ElementName,
}

impl PairKey {
    pub fn new(first: ElementName, second: ElementName) -> Self {
        Self { first, second }
    }

    /// The same pair with its members swapped.
    pub fn reversed(&self) -> Self {
        Self {
            first: self.second.clone(),
            second: self.first.clone(),
        }
    }

    /// Exact order first, then reversed.
    pub fn both_orders(&self) -> [PairKey; 2] {
        [self.clone(), self.reversed()]
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.first, self.second)
    }
}
