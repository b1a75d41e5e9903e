//! # rc-core
//!
//! Core types, traits, and utilities for ReportCreator RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types and the field-path keyed `ValidationErrors`
//! - Result type aliases
//! - Core traits (Entity, Identifiable, Timestamped)
//! - Shared enums (entity source, review status)
//! - Configuration types

pub mod error;
pub mod result;
pub mod traits;
pub mod types;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
