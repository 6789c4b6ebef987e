//! Tabulon - An entity-relationship diagram editor core.
//!
//! Document state, undo/redo history, layout engines and JSON persistence
//! for entity-relationship diagrams. The geometry and routing primitives
//! live in `tabulon-core` and are re-exported here.
//!
//! # Examples
//!
//! ```rust
//! use tabulon::{DiagramStore, LayoutKind};
//!
//! let mut store = DiagramStore::new();
//! let users = store.add_table(0.0, 0.0);
//! let orders = store.add_table(300.0, 0.0);
//!
//! store
//!     .add_relationship(&orders.id, &orders.fields[0].id, &users.id, &users.fields[0].id)
//!     .expect("both endpoints exist");
//! store.apply_layout(LayoutKind::Grid);
//!
//! let json = tabulon::document::to_json_string_pretty(store.document())
//!     .expect("document serializes");
//! assert!(json.contains("sourceFieldId"));
//! ```

pub mod config;
pub mod document;
pub mod layout;
pub mod store;

mod error;

pub use tabulon_core::{geometry, model, routing};

pub use error::TabulonError;
pub use layout::LayoutKind;
pub use store::DiagramStore;
