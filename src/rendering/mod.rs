//! # Rendering Module
//!
//! Text output for generated maps. Anything richer consumes the placement
//! notifications or the JSON form of [`crate::GeneratedMap`] instead.

pub mod ascii;

pub use ascii::*;
