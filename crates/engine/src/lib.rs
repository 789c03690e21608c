//! WhatIf Alchemy engine library.
//!
//! Everything behind the board of an element-merging game: token
//! interaction, the merge pipeline, the pair memo and its persistence.
//!
//! ## Structure
//!
//! - `entities/` - Board, pair memo, overlap detection and generative services
//! - `use_cases/` - User story orchestration across entities
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition

pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod use_cases;

/// Test fixtures module for integration testing.
#[cfg(test)]
pub mod test_fixtures;

pub use app::AlchemySession;
