use crate::domain::model::{Cell, Row};

pub const SCALE_FACTOR: f64 = 2.0;

/// Scales every numeric cell by `factor`; every other cell passes through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowTransformer {
    factor: f64,
}

impl Default for RowTransformer {
    fn default() -> Self {
        Self {
            factor: SCALE_FACTOR,
        }
    }
}

impl RowTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform_cell(&self, cell: Cell) -> Cell {
        match cell {
            Cell::Number(value) => Cell::Number(value * self.factor),
            other => other,
        }
    }

    pub fn transform(&self, row: Row) -> Row {
        Row {
            cells: row
                .cells
                .into_iter()
                .map(|cell| self.transform_cell(cell))
                .collect(),
            ..row
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_are_doubled() {
        let row = Row::new(1, vec![Cell::Number(1.0), Cell::Number(4.0), Cell::Number(100.0)]);
        let result = RowTransformer::new().transform(row);
        assert_eq!(
            result.cells,
            vec![Cell::Number(2.0), Cell::Number(8.0), Cell::Number(200.0)]
        );
        assert_eq!(result.index, 1);
    }

    #[test]
    fn test_non_numbers_pass_through() {
        let row = Row::new(
            2,
            vec![Cell::text("a"), Cell::Empty, Cell::Number(-1.5), Cell::text("")],
        );
        let result = RowTransformer::new().transform(row);
        assert_eq!(
            result.cells,
            vec![Cell::text("a"), Cell::Empty, Cell::Number(-3.0), Cell::text("")]
        );
    }

    #[test]
    fn test_empty_row() {
        let result = RowTransformer::new().transform(Row::new(5, vec![]));
        assert!(result.cells.is_empty());
        assert_eq!(result.index, 5);
    }
}
