//! Business logic services module.

pub mod underlying;

pub use underlying::{select_accessor, UnderlyingResolver};
