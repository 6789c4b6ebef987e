//! Force-directed table layout engine
//!
//! This module implements a force-directed layout for the table graph.
//! Each table is treated as a point mass at its geometric center; a
//! physics simulation applies inverse-square repulsion between every pair,
//! linear spring attraction along relationship edges, and a weak pull
//! toward the centroid. The simulation is seeded only by the current table
//! positions and runs a fixed iteration count, so identical inputs produce
//! identical output.

use std::collections::HashMap;

use log::debug;

use tabulon_core::geometry::Point;
use tabulon_core::model::{Diagram, EntityId};
use tabulon_core::routing::table_size;

use crate::config::ForceConfig;
use crate::layout::engines::TableEngine;

/// Force-directed layout engine for the table graph.
pub struct Engine {
    iterations: usize,
    spring_constant: f32,
    repulsion_constant: f32,
    damping_factor: f32,
    min_distance: f32,
    centering_strength: f32,
}

impl Engine {
    /// Create an engine from the force configuration section.
    pub fn from_config(config: &ForceConfig) -> Self {
        Self {
            iterations: config.iterations(),
            spring_constant: config.spring_constant(),
            repulsion_constant: config.repulsion_constant(),
            damping_factor: config.damping_factor(),
            min_distance: config.min_distance(),
            centering_strength: config.centering_strength(),
        }
    }

    /// Project every relationship to a pair of table indices, skipping
    /// self-referencing edges and edges whose tables are not present.
    fn edges(&self, diagram: &Diagram, index_of: &HashMap<&str, usize>) -> Vec<(usize, usize)> {
        diagram
            .relationships
            .iter()
            .filter_map(|relationship| {
                let source = *index_of.get(relationship.source_table_id.as_str())?;
                let target = *index_of.get(relationship.target_table_id.as_str())?;
                (!relationship.is_self_referencing()).then_some((source, target))
            })
            .collect()
    }

    fn run_simulation(&self, centers: &mut [Point], edges: &[(usize, usize)]) {
        let count = centers.len();
        let mut velocities = vec![Point::default(); count];

        for _ in 0..self.iterations {
            let mut forces = vec![Point::default(); count];

            // Inverse-square repulsion between every pair, applied equal
            // and opposite.
            for i in 0..count {
                for j in (i + 1)..count {
                    let trans = centers[i].sub_point(centers[j]);
                    // Distance floor avoids the singularity at coincident centers.
                    let distance = trans.hypot().max(self.min_distance);
                    let magnitude = self.repulsion_constant / (distance * distance);
                    let push = trans.scale(magnitude / distance);
                    forces[i] = forces[i].add_point(push);
                    forces[j] = forces[j].sub_point(push);
                }
            }

            // Spring attraction along relationship edges, linear in distance.
            for &(source, target) in edges {
                let trans = centers[source].sub_point(centers[target]);
                let pull = trans.scale(self.spring_constant);
                forces[source] = forces[source].sub_point(pull);
                forces[target] = forces[target].add_point(pull);
            }

            // Weak centering toward the centroid of all centers.
            let centroid = centers
                .iter()
                .fold(Point::default(), |sum, &center| sum.add_point(center))
                .scale(1.0 / count as f32);
            for i in 0..count {
                let toward = centroid.sub_point(centers[i]);
                forces[i] = forces[i].add_point(toward.scale(self.centering_strength));
            }

            // Damped velocity integration with a unit timestep.
            for i in 0..count {
                velocities[i] = velocities[i]
                    .add_point(forces[i])
                    .scale(self.damping_factor);
                centers[i] = centers[i].add_point(velocities[i]);
            }
        }
    }
}

impl TableEngine for Engine {
    fn calculate(&self, diagram: &Diagram) -> Vec<(EntityId, Point)> {
        // Nothing to arrange with fewer than two tables.
        if diagram.tables.len() < 2 {
            return diagram
                .tables
                .iter()
                .map(|table| (table.id.clone(), table.position()))
                .collect();
        }

        let index_of: HashMap<&str, usize> = diagram
            .tables
            .iter()
            .enumerate()
            .map(|(index, table)| (table.id.as_str(), index))
            .collect();
        let edges = self.edges(diagram, &index_of);

        let half_sizes: Vec<Point> = diagram
            .tables
            .iter()
            .map(|table| {
                let size = table_size(table);
                Point::new(size.width() / 2.0, size.height() / 2.0)
            })
            .collect();

        let mut centers: Vec<Point> = diagram
            .tables
            .iter()
            .zip(&half_sizes)
            .map(|(table, half)| table.position().add_point(*half))
            .collect();

        self.run_simulation(&mut centers, &edges);

        debug!(
            tables = centers.len(),
            edges = edges.len(),
            iterations = self.iterations;
            "Force simulation finished"
        );

        diagram
            .tables
            .iter()
            .zip(centers)
            .zip(half_sizes)
            .map(|((table, center), half)| (table.id.clone(), center.sub_point(half)))
            .collect()
    }
}
