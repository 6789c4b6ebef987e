//! Layout algorithms that recompute table positions.
//!
//! Engines never mutate the document; they return one new top-left
//! position per table, which the store applies as a single batch.

mod engines;

pub use engines::{EngineBuilder, LayoutKind, TableEngine};
