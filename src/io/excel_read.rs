use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};

use crate::error::{Result, ToolError};
use crate::sheet::{CellValue, DEFAULT_COL_WIDTH, MergeRegion, SheetSnapshot};

/// Longest column width the content-based estimate will produce.
const MAX_ESTIMATED_WIDTH: f64 = 64.0;

/// Reads the first worksheet of `path` into a structural snapshot.
///
/// Cell values and merged regions come straight from the file. Stored column
/// widths are not surfaced by the reader, so widths are estimated from the
/// rendered content instead; the snapshot owns them from here on.
pub fn read_first_sheet(path: &Path) -> Result<SheetSnapshot> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    workbook.load_merged_regions()?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("no worksheets in {}", path.display())))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(ToolError::from)?;

    let merges = workbook
        .merged_regions_by_sheet(&sheet_name)
        .into_iter()
        .map(|(_, _, dimensions)| MergeRegion {
            first_row: dimensions.start.0,
            first_col: dimensions.start.1 as u16,
            last_row: dimensions.end.0,
            last_col: dimensions.end.1 as u16,
        })
        .collect();

    let cells = materialize_grid(&range);
    let col_widths = estimate_column_widths(&cells);

    Ok(SheetSnapshot {
        cells,
        merges,
        col_widths,
    })
}

/// Expands the used range into a dense grid anchored at A1, so snapshot
/// coordinates equal worksheet coordinates.
fn materialize_grid(range: &calamine::Range<Data>) -> Vec<Vec<CellValue>> {
    let Some((first_row, first_col)) = range.start() else {
        return Vec::new();
    };
    let (height, width) = range.get_size();
    let total_rows = first_row as usize + height;
    let total_cols = first_col as usize + width;

    let mut grid = vec![vec![CellValue::Empty; total_cols]; total_rows];
    for (row_offset, row) in range.rows().enumerate() {
        for (col_offset, value) in row.iter().enumerate() {
            grid[first_row as usize + row_offset][first_col as usize + col_offset] = to_cell(value);
        }
    }
    grid
}

fn to_cell(value: &Data) -> CellValue {
    match value {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Float(number) => CellValue::Number(*number),
        Data::Int(number) => CellValue::Number(*number as f64),
        Data::DateTime(serial) => CellValue::Number(serial.as_f64()),
        Data::Bool(flag) => CellValue::Bool(*flag),
        other => CellValue::Text(other.to_string()),
    }
}

fn estimate_column_widths(cells: &[Vec<CellValue>]) -> Vec<f64> {
    let cols = cells.first().map_or(0, Vec::len);
    (0..cols)
        .map(|col| {
            let longest = cells
                .iter()
                .map(|row| display_width(&row[col]))
                .max()
                .unwrap_or(0);
            (longest as f64 + 1.0).clamp(DEFAULT_COL_WIDTH, MAX_ESTIMATED_WIDTH)
        })
        .collect()
}

fn display_width(value: &CellValue) -> usize {
    match value {
        CellValue::Empty => 0,
        CellValue::Text(text) => text.chars().count(),
        CellValue::Number(number) => format!("{number}").chars().count(),
        CellValue::Bool(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_estimate_tracks_longest_cell_and_stays_bounded() {
        let cells = vec![
            vec![
                CellValue::Text("a".repeat(20)),
                CellValue::Text("x".to_string()),
                CellValue::Text("y".repeat(200)),
            ],
            vec![CellValue::Text("bb".to_string()), CellValue::Empty, CellValue::Empty],
        ];
        let widths = estimate_column_widths(&cells);
        assert_eq!(widths[0], 21.0);
        assert_eq!(widths[1], DEFAULT_COL_WIDTH);
        assert_eq!(widths[2], MAX_ESTIMATED_WIDTH);
    }
}
