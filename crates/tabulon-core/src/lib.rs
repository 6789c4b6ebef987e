//! Tabulon Core Types and Definitions
//!
//! This crate provides the foundational types for the Tabulon
//! entity-relationship diagram engine. It includes:
//!
//! - **Geometry**: Basic geometric value types ([`geometry`] module)
//! - **Model**: The diagram document model: tables, typed fields,
//!   relationships, notes and the viewport ([`model`] module)
//! - **Routing**: Table measurement, connection anchors and curved
//!   relationship paths ([`routing`] module)
//!
//! Everything in this crate is pure data and pure functions; the mutable
//! editing surface lives in the `tabulon` crate.

pub mod geometry;
pub mod model;
pub mod routing;
