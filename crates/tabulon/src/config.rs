//! Configuration types for the Tabulon engine.
//!
//! This module provides configuration structures that control layout
//! behavior and history depth. All types implement [`serde::Deserialize`]
//! for flexible loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and history settings.
//! - [`LayoutConfig`] - Spacing and column settings for the layout engines.
//! - [`ForceConfig`] - Parameters of the force-directed simulation.
//! - [`HistoryConfig`] - Undo/redo stack depth.
//!
//! # Example
//!
//! ```
//! use tabulon::config::AppConfig;
//!
//! let config = AppConfig::default();
//! assert_eq!(config.history().limit(), 50);
//! ```

use serde::Deserialize;

/// Top-level configuration combining layout and history settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// History configuration section.
    #[serde(default)]
    history: HistoryConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified sections.
    pub fn new(layout: LayoutConfig, history: HistoryConfig) -> Self {
        Self { layout, history }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the history configuration.
    pub fn history(&self) -> &HistoryConfig {
        &self.history
    }
}

/// Spacing and column settings shared by the layout engines.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap between tables in grid and hierarchical placement.
    gap: f32,

    /// Fixed column count of the hierarchical layout.
    hierarchical_columns: usize,

    /// Force-directed simulation parameters.
    force: ForceConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            gap: 48.0,
            hierarchical_columns: 3,
            force: ForceConfig::default(),
        }
    }
}

impl LayoutConfig {
    /// Returns the gap between tables.
    pub fn gap(&self) -> f32 {
        self.gap
    }

    /// Returns the fixed column count of the hierarchical layout.
    pub fn hierarchical_columns(&self) -> usize {
        self.hierarchical_columns
    }

    /// Returns the force-directed simulation parameters.
    pub fn force(&self) -> &ForceConfig {
        &self.force
    }
}

/// Parameters of the force-directed simulation.
///
/// The simulation always runs for the full `iterations` budget; there is
/// no convergence-based early exit, which keeps the output reproducible
/// for a given input graph.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Fixed number of simulation iterations.
    iterations: usize,

    /// Spring constant for attraction along relationship edges.
    spring_constant: f32,

    /// Strength of the inverse-square repulsion between tables.
    repulsion_constant: f32,

    /// Multiplicative velocity damping applied every iteration.
    damping_factor: f32,

    /// Distance floor that avoids singularities between coincident tables.
    min_distance: f32,

    /// Strength of the pull toward the centroid of all table centers.
    centering_strength: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            spring_constant: 0.05,
            repulsion_constant: 20_000.0,
            damping_factor: 0.85,
            min_distance: 30.0,
            centering_strength: 0.01,
        }
    }
}

impl ForceConfig {
    /// Returns the fixed iteration count.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Returns the spring constant.
    pub fn spring_constant(&self) -> f32 {
        self.spring_constant
    }

    /// Returns the repulsion constant.
    pub fn repulsion_constant(&self) -> f32 {
        self.repulsion_constant
    }

    /// Returns the damping factor.
    pub fn damping_factor(&self) -> f32 {
        self.damping_factor
    }

    /// Returns the minimum distance floor.
    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    /// Returns the centering strength.
    pub fn centering_strength(&self) -> f32 {
        self.centering_strength
    }
}

/// Undo/redo stack depth.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of undo snapshots kept; the oldest entry is
    /// discarded once the bound is exceeded.
    limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { limit: 50 }
    }
}

impl HistoryConfig {
    /// Returns the history depth bound.
    pub fn limit(&self) -> usize {
        self.limit
    }
}
