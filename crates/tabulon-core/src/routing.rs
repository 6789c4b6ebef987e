//! Table measurement, connection anchors, and relationship routing.
//!
//! Everything here is a pure function of table data: identical inputs
//! always yield identical outputs, and nothing consults mutable state.
//! Text is measured with a fixed average-character-width heuristic rather
//! than real font metrics; the renderer draws with a monospace-leaning
//! font so the approximation stays close enough for sizing.

use crate::geometry::{Point, Size};
use crate::model::Table;

/// Minimum table width regardless of content.
pub const MIN_TABLE_WIDTH: f32 = 120.0;
/// Height of the table header band.
pub const HEADER_HEIGHT: f32 = 32.0;
/// Height of one field row.
pub const ROW_HEIGHT: f32 = 26.0;
/// Average character width used to estimate text extents.
pub const CHAR_WIDTH: f32 = 7.5;
/// Horizontal gap between the field-name column and the type column.
pub const COLUMN_GAP: f32 = 24.0;
/// Length of the arrowhead along the approach direction.
pub const ARROW_LENGTH: f32 = 12.0;
/// Half-width of the arrowhead base.
pub const ARROW_HALF_WIDTH: f32 = 5.0;

// Floor applied before normalizing a direction vector.
const MIN_DIRECTION_LENGTH: f32 = 1e-4;

/// One of the four sides of a table's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// All sides in the fixed evaluation order used by [`best_side`].
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];
}

fn text_width(text: &str) -> f32 {
    text.chars().count() as f32 * CHAR_WIDTH
}

/// Computes the visual size of a table from its content.
///
/// Width is the largest of [`MIN_TABLE_WIDTH`], the header text width, and
/// the widest `name + gap + type` row; height is the header plus one row
/// per field.
pub fn table_size(table: &Table) -> Size {
    let widest_row = table
        .fields
        .iter()
        .map(|field| text_width(&field.name) + COLUMN_GAP + text_width(field.ty.as_str()))
        .fold(0.0f32, f32::max);
    let width = MIN_TABLE_WIDTH.max(text_width(&table.name)).max(widest_row);
    let height = HEADER_HEIGHT + ROW_HEIGHT * table.fields.len() as f32;
    Size::new(width, height)
}

/// Geometric center of a table's bounding box.
pub fn table_center(table: &Table) -> Point {
    let size = table_size(table);
    Point::new(table.x + size.width() / 2.0, table.y + size.height() / 2.0)
}

/// Connection point for the field at `field_index` on the given side.
///
/// Left and right anchors sit at the field row's vertical center; top and
/// bottom anchors sit at the table's horizontal center on the respective
/// edge.
pub fn field_anchor(table: &Table, field_index: usize, side: Side) -> Point {
    let size = table_size(table);
    let row_center_y = table.y + HEADER_HEIGHT + ROW_HEIGHT * (field_index as f32 + 0.5);
    match side {
        Side::Left => Point::new(table.x, row_center_y),
        Side::Right => Point::new(table.x + size.width(), row_center_y),
        Side::Top => Point::new(table.x + size.width() / 2.0, table.y),
        Side::Bottom => Point::new(table.x + size.width() / 2.0, table.y + size.height()),
    }
}

/// Midpoint of the given side of a table's bounding box.
pub fn side_anchor(table: &Table, side: Side) -> Point {
    let size = table_size(table);
    match side {
        Side::Left => Point::new(table.x, table.y + size.height() / 2.0),
        Side::Right => Point::new(table.x + size.width(), table.y + size.height() / 2.0),
        Side::Top => Point::new(table.x + size.width() / 2.0, table.y),
        Side::Bottom => Point::new(table.x + size.width() / 2.0, table.y + size.height()),
    }
}

/// Picks the side of `table` whose midpoint anchor is closest (by squared
/// Euclidean distance) to `toward`. Ties resolve in the fixed order of
/// [`Side::ALL`], keeping the selection deterministic.
pub fn best_side(table: &Table, toward: Point) -> Side {
    let mut best = Side::Left;
    let mut best_distance = f32::MAX;
    for side in Side::ALL {
        let distance = side_anchor(table, side).distance_sq(toward);
        if distance < best_distance {
            best = side;
            best_distance = distance;
        }
    }
    best
}

/// A routed relationship: one cubic Bezier plus an arrowhead polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationshipPath {
    start: Point,
    control1: Point,
    control2: Point,
    end: Point,
    arrowhead: [Point; 3],
}

impl RelationshipPath {
    /// Curve start point on the source table's chosen side.
    pub fn start(&self) -> Point {
        self.start
    }

    /// First Bezier control point.
    pub fn control1(&self) -> Point {
        self.control1
    }

    /// Second Bezier control point.
    pub fn control2(&self) -> Point {
        self.control2
    }

    /// Curve end point, shortened by [`ARROW_LENGTH`] from the anchor.
    pub fn end(&self) -> Point {
        self.end
    }

    /// Arrowhead triangle; the first vertex is the tip at the true anchor.
    pub fn arrowhead(&self) -> [Point; 3] {
        self.arrowhead
    }
}

/// Average of the field anchors for the given indices on one side.
///
/// On the left/right sides this collapses compound keys to the midpoint of
/// the participating field y-coordinates; on top/bottom the anchors already
/// coincide. An empty index list falls back to the side midpoint.
fn group_anchor(table: &Table, field_indices: &[usize], side: Side) -> Point {
    if field_indices.is_empty() {
        return side_anchor(table, side);
    }
    let sum = field_indices
        .iter()
        .map(|&index| field_anchor(table, index, side))
        .fold(Point::default(), Point::add_point);
    sum.scale(1.0 / field_indices.len() as f32)
}

/// Routes a relationship between two tables as a single cubic Bezier.
///
/// Each table's side is chosen independently by [`best_side`] toward the
/// other table's center. Compound relationships collapse to one
/// representative path through the averaged anchors. The curve stops
/// [`ARROW_LENGTH`] short of the target anchor along the straight approach
/// direction, where the arrowhead triangle takes over.
pub fn relationship_path(
    source: &Table,
    source_field_indices: &[usize],
    target: &Table,
    target_field_indices: &[usize],
) -> RelationshipPath {
    let source_side = best_side(source, table_center(target));
    let target_side = best_side(target, table_center(source));

    let start = group_anchor(source, source_field_indices, source_side);
    let anchor = group_anchor(target, target_field_indices, target_side);

    // Coincident anchors would give a zero-length direction; floor the
    // length before normalizing.
    let approach = anchor.sub_point(start);
    let length = approach.hypot().max(MIN_DIRECTION_LENGTH);
    let direction = approach.scale(1.0 / length);

    let end = anchor.sub_point(direction.scale(ARROW_LENGTH));

    // Bias the control points along the dominant displacement axis so the
    // curve reads as an orthogonal connector.
    let delta = end.sub_point(start);
    let (control1, control2) = if delta.x().abs() >= delta.y().abs() {
        let lead = delta.x() / 2.0;
        (
            start.add_point(Point::new(lead, 0.0)),
            end.sub_point(Point::new(lead, 0.0)),
        )
    } else {
        let lead = delta.y() / 2.0;
        (
            start.add_point(Point::new(0.0, lead)),
            end.sub_point(Point::new(0.0, lead)),
        )
    };

    // The arrowhead base coincides with the shortened curve end.
    let perpendicular = Point::new(-direction.y(), direction.x());
    let arrowhead = [
        anchor,
        end.add_point(perpendicular.scale(ARROW_HALF_WIDTH)),
        end.sub_point(perpendicular.scale(ARROW_HALF_WIDTH)),
    ];

    RelationshipPath {
        start,
        control1,
        control2,
        end,
        arrowhead,
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::tests_support::arb_table;
    use super::*;

    proptest! {
        #[test]
        fn table_size_is_finite_and_bounded_below(table in arb_table()) {
            let size = table_size(&table);
            prop_assert!(size.width().is_finite());
            prop_assert!(size.height().is_finite());
            prop_assert!(size.width() >= MIN_TABLE_WIDTH);
            prop_assert!(size.height() >= HEADER_HEIGHT);
        }

        #[test]
        fn anchors_lie_on_the_bounding_box(table in arb_table(), side_index in 0usize..4) {
            let side = Side::ALL[side_index];
            let size = table_size(&table);
            for index in 0..table.fields.len() {
                let anchor = field_anchor(&table, index, side);
                match side {
                    Side::Left => prop_assert_eq!(anchor.x(), table.x),
                    Side::Right => prop_assert_eq!(anchor.x(), table.x + size.width()),
                    Side::Top => prop_assert_eq!(anchor.y(), table.y),
                    Side::Bottom => prop_assert_eq!(anchor.y(), table.y + size.height()),
                }
            }
        }

        #[test]
        fn routed_paths_are_always_finite(source in arb_table(), target in arb_table()) {
            let source_indices: Vec<usize> = (0..source.fields.len()).collect();
            let target_indices: Vec<usize> = (0..target.fields.len()).collect();
            let path = relationship_path(&source, &source_indices, &target, &target_indices);
            prop_assert!(path.start().is_finite());
            prop_assert!(path.control1().is_finite());
            prop_assert!(path.control2().is_finite());
            prop_assert!(path.end().is_finite());
            for corner in path.arrowhead() {
                prop_assert!(corner.is_finite());
            }
        }
    }
}
