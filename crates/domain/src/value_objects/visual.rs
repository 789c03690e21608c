//! Opaque image payloads and display tints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Encoded image bytes (PNG in practice), cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct ElementImage(Arc<[u8]>);

impl ElementImage {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ElementImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for ElementImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementImage({} bytes)", self.0.len())
    }
}

/// RGBA multiplier applied to a token sprite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Tint {
    pub const WHITE: Tint = Tint::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Dimmed, half-transparent tint used for placeholders.
    pub const fn dimmed() -> Self {
        Self::rgba(0.5, 0.5, 0.5, 0.6)
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_clone_shares_bytes() {
        let image = ElementImage::new(vec![1, 2, 3]);
        let copy = image.clone();
        assert_eq!(copy.as_bytes(), &[1, 2, 3]);
        assert_eq!(format!("{:?}", copy), "ElementImage(3 bytes)");
    }
}
