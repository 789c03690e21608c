//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod app_settings;
pub mod fal;
pub mod file_store;
pub mod headless;
pub mod ports;
pub mod transitions;
