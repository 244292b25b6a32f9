use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header of the output table, one label per column.
pub const OUTPUT_HEADER: [&str; 5] = ["序号", "平方", "价格", "每平价格", "时间戳"];

/// Number of source columns copied into an output record.
pub const OUTPUT_DATA_COLUMNS: usize = 4;

/// Column that receives the capture timestamp.
pub const TIMESTAMP_COLUMN: usize = 4;

/// `yyyy/MM/dd HH:mm:ss`
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// 三個預設格寬，每格 8 個字元
pub const TIMESTAMP_COLUMN_WIDTH: u16 = 3 * 8;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    General,
    Center,
}

/// Cosmetic only; nothing downstream reads it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellStyle {
    pub horizontal: Alignment,
    pub vertical: Alignment,
}

impl CellStyle {
    pub fn centered() -> Self {
        Self {
            horizontal: Alignment::Center,
            vertical: Alignment::Center,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    /// Zero-based position in the table the row was loaded from.
    pub index: usize,
    pub cells: Vec<Cell>,
    pub style: Option<CellStyle>,
}

impl Row {
    pub fn new(index: usize, cells: Vec<Cell>) -> Self {
        Self {
            index,
            cells,
            style: None,
        }
    }

    pub fn is_header(&self) -> bool {
        self.index == 0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Row>,
    /// Display widths in characters, keyed by column.
    pub column_widths: BTreeMap<usize, u16>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新的輸出表，只有表頭
    pub fn with_output_header() -> Self {
        let mut table = Self::new();
        table.append_row(OUTPUT_HEADER.iter().map(|label| Cell::text(*label)).collect());
        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last_row_index(&self) -> Option<usize> {
        self.rows.last().map(|row| row.index)
    }

    /// Appends at `last_row_index + 1` and returns the new row's index.
    pub fn append_row(&mut self, cells: Vec<Cell>) -> usize {
        let index = self.last_row_index().map_or(0, |last| last + 1);
        self.rows.push(Row::new(index, cells));
        index
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.iter_mut().find(|row| row.index == index)
    }

    pub fn set_column_width(&mut self, column: usize, width: u16) {
        self.column_widths.insert(column, width);
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|row| !row.is_header())
    }
}

/// A data row after the numeric transform; moved through the queue by value.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRow {
    pub source: String,
    pub row: Row,
}

impl TransformedRow {
    pub fn new(source: impl Into<String>, row: Row) -> Self {
        Self {
            source: source.into(),
            row,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.row.cells
    }
}

/// One row of the output table: copied data cells plus the capture timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub cells: Vec<Cell>,
}

impl OutputRecord {
    pub fn from_row(row: &TransformedRow, captured_at: &str) -> Self {
        let mut cells = vec![Cell::Empty; TIMESTAMP_COLUMN + 1];
        for (column, cell) in row.cells().iter().take(OUTPUT_DATA_COLUMNS).enumerate() {
            cells[column] = match cell {
                Cell::Number(value) => Cell::Number(*value),
                Cell::Text(value) => Cell::Text(value.clone()),
                Cell::Empty => Cell::Empty,
            };
        }
        cells[TIMESTAMP_COLUMN] = Cell::text(captured_at);
        Self { cells }
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.cells.get(TIMESTAMP_COLUMN).and_then(Cell::as_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_header_table() {
        let table = Table::with_output_header();
        assert_eq!(table.len(), 1);
        assert!(table.rows[0].is_header());
        assert_eq!(table.rows[0].cells.len(), 5);
        assert_eq!(table.rows[0].cells[4], Cell::text("时间戳"));
    }

    #[test]
    fn test_append_row_uses_last_index() {
        let mut table = Table::with_output_header();
        assert_eq!(table.append_row(vec![Cell::Number(1.0)]), 1);
        assert_eq!(table.append_row(vec![Cell::Number(2.0)]), 2);
        assert_eq!(table.last_row_index(), Some(2));
        assert_eq!(table.data_rows().count(), 2);
    }

    #[test]
    fn test_output_record_layout() {
        let row = TransformedRow::new(
            "x1.csv",
            Row::new(
                3,
                vec![Cell::Number(2.0), Cell::text("a"), Cell::Empty, Cell::Number(8.0)],
            ),
        );
        let record = OutputRecord::from_row(&row, "2026/10/19 08:00:00");

        assert_eq!(record.cells.len(), 5);
        assert_eq!(record.cells[0], Cell::Number(2.0));
        assert_eq!(record.cells[1], Cell::text("a"));
        assert!(record.cells[2].is_empty());
        assert_eq!(record.cells[3], Cell::Number(8.0));
        assert_eq!(record.timestamp(), Some("2026/10/19 08:00:00"));
    }

    #[test]
    fn test_output_record_pads_short_and_truncates_wide_rows() {
        let short = TransformedRow::new("x1.csv", Row::new(1, vec![Cell::Number(2.0)]));
        let record = OutputRecord::from_row(&short, "t");
        assert_eq!(record.cells.len(), 5);
        assert!(record.cells[1..4].iter().all(Cell::is_empty));

        let wide = TransformedRow::new(
            "x1.csv",
            Row::new(1, (0..7).map(|i| Cell::Number(i as f64)).collect()),
        );
        let record = OutputRecord::from_row(&wide, "t");
        assert_eq!(record.cells.len(), 5);
        assert_eq!(record.cells[3], Cell::Number(3.0));
        assert_eq!(record.timestamp(), Some("t"));
    }
}
