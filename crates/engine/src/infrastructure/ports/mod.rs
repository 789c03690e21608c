//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Generative services (could swap fal.ai -> other hosts)
//! - Element storage (could swap files -> a bucket prefix)
//! - Rendering and the UI catalogue (owned by the host game engine)

mod error;
mod external;
mod render;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    BackgroundRemovalPort, CataloguePort, ElementStorePort, ImageSynthesisPort,
    NameProposalPort, PairMemoEntry,
};

// =============================================================================
// Presentation Ports
// =============================================================================
pub use render::{RenderPort, TokenTemplate, TokenVisual};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{
    MockBackgroundRemovalPort, MockCataloguePort, MockElementStorePort, MockImageSynthesisPort,
    MockNameProposalPort,
};

#[cfg(test)]
pub use render::MockRenderPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{BoardError, GenerationError, StoreError};
