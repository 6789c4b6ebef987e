//! Row-based grid placement
//!
//! One engine serves both the grid and hierarchical layouts: the grid
//! derives its column count from the table count, the hierarchical layout
//! pins it. Rows advance by the tallest table in the row plus the gap,
//! columns by each table's actual computed width plus the gap.

use log::debug;

use tabulon_core::geometry::Point;
use tabulon_core::model::{Diagram, EntityId};
use tabulon_core::routing::table_size;

use crate::layout::engines::TableEngine;

// Offset of the first table from the canvas origin.
const START_OFFSET: f32 = 40.0;

/// Grid / hierarchical layout engine.
pub struct Engine {
    gap: f32,
    // A pinned column count; derived from the table count when absent.
    columns: Option<usize>,
}

impl Engine {
    /// Create a new row-based engine with the given gap and an optional
    /// fixed column count.
    pub fn new(gap: f32, columns: Option<usize>) -> Self {
        Self { gap, columns }
    }
}

impl TableEngine for Engine {
    fn calculate(&self, diagram: &Diagram) -> Vec<(EntityId, Point)> {
        let count = diagram.tables.len();
        if count == 0 {
            return Vec::new();
        }

        let columns = self
            .columns
            .unwrap_or_else(|| (count as f32).sqrt().ceil() as usize)
            .max(1);

        let mut positions = Vec::with_capacity(count);
        let mut x = START_OFFSET;
        let mut y = START_OFFSET;
        let mut row_tallest = 0.0f32;
        let mut column = 0;

        for table in &diagram.tables {
            let size = table_size(table);
            positions.push((table.id.clone(), Point::new(x, y)));

            row_tallest = row_tallest.max(size.height());
            x += size.width() + self.gap;
            column += 1;
            if column == columns {
                column = 0;
                x = START_OFFSET;
                y += row_tallest + self.gap;
                row_tallest = 0.0;
            }
        }

        debug!(tables = count, columns = columns; "Calculated row-based layout");
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::engines::tests_support::{diagram, table};

    #[test]
    fn grid_uses_square_ish_column_count() {
        let tables: Vec<_> = (0..5)
            .map(|i| table(&format!("t{i}"), 0.0, 0.0, 1))
            .collect();
        let d = diagram(tables, vec![]);

        // ceil(sqrt(5)) = 3 columns, so the fourth table starts a new row.
        let positions = Engine::new(48.0, None).calculate(&d);
        assert_eq!(positions[3].1.x(), START_OFFSET);
        assert!(positions[3].1.y() > positions[0].1.y());
        assert_eq!(positions[0].1.y(), positions[2].1.y());
    }

    #[test]
    fn hierarchical_pins_three_columns() {
        let tables: Vec<_> = (0..4)
            .map(|i| table(&format!("t{i}"), 0.0, 0.0, 1))
            .collect();
        let d = diagram(tables, vec![]);

        let positions = Engine::new(48.0, Some(3)).calculate(&d);
        assert_eq!(positions[0].1.y(), positions[2].1.y());
        assert_eq!(positions[3].1.x(), START_OFFSET);
        assert!(positions[3].1.y() > positions[2].1.y());
    }

    #[test]
    fn row_height_follows_tallest_table() {
        let short = table("short", 0.0, 0.0, 1);
        let tall = table("tall", 0.0, 0.0, 8);
        let next = table("next", 0.0, 0.0, 1);
        let d = diagram(vec![short, tall, next], vec![]);

        // Two columns for three tables; "next" starts the second row below
        // the tallest table of the first.
        let positions = Engine::new(10.0, None).calculate(&d);
        let tall_height = tabulon_core::routing::table_size(&d.tables[1]).height();
        assert_eq!(positions[2].1.y(), START_OFFSET + tall_height + 10.0);
    }

    #[test]
    fn column_advance_uses_actual_widths() {
        let mut wide = table("wide", 0.0, 0.0, 1);
        wide.fields[0].name = "an_extremely_long_identifier_column".to_string();
        let narrow = table("n", 0.0, 0.0, 1);
        let d = diagram(vec![wide, narrow], vec![]);

        let positions = Engine::new(10.0, None).calculate(&d);
        let wide_width = table_size(&d.tables[0]).width();
        assert_eq!(positions[1].1.x(), START_OFFSET + wide_width + 10.0);
    }

    #[test]
    fn layout_is_deterministic() {
        let tables: Vec<_> = (0..7)
            .map(|i| table(&format!("t{i}"), i as f32 * 3.0, 0.0, i + 1))
            .collect();
        let d = diagram(tables, vec![]);

        let engine = Engine::new(48.0, None);
        assert_eq!(engine.calculate(&d), engine.calculate(&d));
    }

    #[test]
    fn empty_diagram_yields_no_positions() {
        let d = diagram(vec![], vec![]);
        assert!(Engine::new(48.0, None).calculate(&d).is_empty());
    }
}
