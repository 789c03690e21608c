//! External service port traits: generative services, element storage, UI catalogue.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use alchemy_domain::{ElementImage, ElementName, PairKey};

use super::error::{GenerationError, StoreError};

// =============================================================================
// Generative Services
// =============================================================================

/// Proposes the element produced by combining two elements.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NameProposalPort: Send + Sync {
    /// `Ok(None)` means the two elements do not react.
    async fn propose_name(
        &self,
        first: &ElementName,
        second: &ElementName,
    ) -> Result<Option<ElementName>, GenerationError>;
}

/// Draws an image for a named element, guided by reference images.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageSynthesisPort: Send + Sync {
    async fn synthesize_image(
        &self,
        name: &ElementName,
        references: &[ElementImage],
    ) -> Result<ElementImage, GenerationError>;
}

/// Strips the background from a synthesized image.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackgroundRemovalPort: Send + Sync {
    async fn remove_background(&self, image: &ElementImage)
        -> Result<ElementImage, GenerationError>;
}

// =============================================================================
// Element Storage
// =============================================================================

/// One resolved pair, stored under the exact order it was recorded with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairMemoEntry {
    #[serde(flatten)]
    pub key: PairKey,
    pub result: ElementName,
}

impl PairMemoEntry {
    pub fn new(key: PairKey, result: ElementName) -> Self {
        Self { key, result }
    }
}

/// Durable storage for one session: element list, pair memo, one image per
/// element name, and the generative-service credential.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ElementStorePort: Send + Sync {
    async fn load_element_names(&self) -> Result<Vec<ElementName>, StoreError>;
    async fn save_element_names(&self, names: &[ElementName]) -> Result<(), StoreError>;

    async fn load_pair_memo(&self) -> Result<Vec<PairMemoEntry>, StoreError>;
    async fn save_pair_memo(&self, entries: &[PairMemoEntry]) -> Result<(), StoreError>;

    /// Overwrites any image already stored under `name`.
    async fn save_image(&self, name: &ElementName, image: &ElementImage) -> Result<(), StoreError>;
    async fn load_image(&self, name: &ElementName) -> Result<Option<ElementImage>, StoreError>;
    async fn has_image(&self, name: &ElementName) -> Result<bool, StoreError>;

    /// Delete every save file of the session.
    async fn clear(&self) -> Result<(), StoreError>;

    async fn load_credential(&self) -> Result<Option<String>, StoreError>;
    async fn save_credential(&self, credential: &str) -> Result<(), StoreError>;
}

// =============================================================================
// UI Catalogue
// =============================================================================

/// The palette the player re-selects discovered elements from.
#[cfg_attr(test, mockall::automock)]
pub trait CataloguePort: Send + Sync {
    fn register_element(&self, name: &ElementName, image: &ElementImage);
}
