//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.
//! Use cases orchestrate across entity modules to fulfill user stories.

pub mod interaction;
pub mod merge;
pub mod session;

// Re-export main types
pub use interaction::{DropOutcome, InteractionConfig, TokenInteraction};
pub use merge::{MergeConfig, MergeError, MergeEvent, MergeHandle, MergeOrchestrator, MergeOutcome};
pub use session::SessionUseCases;
