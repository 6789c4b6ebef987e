//! Layout engine factory module
//!
//! This module provides a system for selecting and using different layout
//! engines based on the layout kind requested by the caller. Engines are
//! created lazily and cached per kind, configured through a builder.

mod force;
mod grid;

use std::collections::HashMap;

use serde::Deserialize;

use tabulon_core::geometry::Point;
use tabulon_core::model::{Diagram, EntityId};

use crate::config::LayoutConfig;

/// Selects which algorithm [`crate::store::DiagramStore::apply_layout`] runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Square-ish grid: columns = ceil(sqrt(table count)).
    #[default]
    Grid,
    /// Row-based placement with a fixed column count. This is a layout
    /// shape, not a dependency ordering.
    Hierarchical,
    /// Deterministic force-directed simulation seeded by current positions.
    Force,
}

/// Interface implemented by every table layout engine.
pub trait TableEngine {
    /// Compute a new top-left position for every table in the diagram.
    ///
    /// The returned list covers each table exactly once; engines read the
    /// diagram but never mutate it.
    fn calculate(&self, diagram: &Diagram) -> Vec<(EntityId, Point)>;
}

/// Builder for creating and configuring layout engines.
///
/// Engines with the same configuration are cached and reused across
/// layout passes.
pub struct EngineBuilder {
    engines: HashMap<LayoutKind, Box<dyn TableEngine>>,

    // Configuration options
    gap: f32,
    hierarchical_columns: usize,
    force: crate::config::ForceConfig,
}

impl EngineBuilder {
    /// Create a new engine builder with default configuration.
    pub fn new() -> Self {
        Self::from_config(&LayoutConfig::default())
    }

    /// Create a new engine builder from a layout configuration section.
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            engines: HashMap::new(),
            gap: config.gap(),
            hierarchical_columns: config.hierarchical_columns(),
            force: *config.force(),
        }
    }

    /// Set the gap between tables for grid and hierarchical placement.
    pub fn with_gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    /// Set the fixed column count of the hierarchical layout.
    pub fn with_hierarchical_columns(mut self, columns: usize) -> Self {
        self.hierarchical_columns = columns;
        self
    }

    /// Set the force-directed simulation parameters.
    pub fn with_force_config(mut self, force: crate::config::ForceConfig) -> Self {
        self.force = force;
        self
    }

    /// Get the engine for the specified layout kind, creating it on first use.
    pub fn engine(&mut self, kind: LayoutKind) -> &dyn TableEngine {
        let gap = self.gap;
        let hierarchical_columns = self.hierarchical_columns;
        let force = self.force;
        let engine = self.engines.entry(kind).or_insert_with(|| {
            let engine: Box<dyn TableEngine> = match kind {
                LayoutKind::Grid => Box::new(grid::Engine::new(gap, None)),
                LayoutKind::Hierarchical => {
                    Box::new(grid::Engine::new(gap, Some(hierarchical_columns)))
                }
                LayoutKind::Force => Box::new(force::Engine::from_config(&force)),
            };
            engine
        });
        &**engine
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
