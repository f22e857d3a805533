//! Type definitions module.
//!
//! Contains shared types used across the application.

pub mod underlying;

pub use underlying::*;
