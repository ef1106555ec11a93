use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::error::Result;
use crate::sheet::{CellValue, SheetSnapshot};

/// A snapshot paired with its final destination sheet name.
#[derive(Debug, Clone)]
pub struct NamedSheet {
    pub name: String,
    pub sheet: SheetSnapshot,
}

/// Writes the resolved sheets into one workbook at `path`, in order.
///
/// The workbook is built fully in memory and only persisted here, so a crash
/// mid-merge never leaves a partial file behind.
pub fn write_consolidated(path: &Path, sheets: &[NamedSheet]) -> Result<()> {
    let mut workbook = Workbook::new();

    for named in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&named.name)?;
        write_sheet(worksheet, &named.sheet)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &SheetSnapshot) -> Result<()> {
    let centered = Format::new().set_align(FormatAlign::Center);

    for (row_idx, row) in sheet.cells.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let row_num = row_idx as u32;
            let col_num = col_idx as u16;
            if sheet.merges.iter().any(|m| m.contains(row_num, col_num)) {
                continue;
            }
            write_value(worksheet, row_num, col_num, value, None)?;
        }
    }

    // A merged area carries its top-left value: declare the merge first,
    // then write the value over the anchor cell.
    for merge in &sheet.merges {
        if merge.is_single_cell() {
            continue;
        }
        worksheet.merge_range(
            merge.first_row,
            merge.first_col,
            merge.last_row,
            merge.last_col,
            "",
            &centered,
        )?;
        if let Some(value) = sheet.value(merge.first_row as usize, merge.first_col as usize) {
            write_value(worksheet, merge.first_row, merge.first_col, value, Some(&centered))?;
        }
    }

    for (col_idx, width) in sheet.col_widths.iter().enumerate() {
        worksheet.set_column_width(col_idx as u16, *width)?;
    }

    Ok(())
}

fn write_value(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: Option<&Format>,
) -> Result<()> {
    match (value, format) {
        (CellValue::Empty, _) => {}
        (CellValue::Text(text), None) => {
            worksheet.write_string(row, col, text)?;
        }
        (CellValue::Text(text), Some(format)) => {
            worksheet.write_string_with_format(row, col, text, format)?;
        }
        (CellValue::Number(number), None) => {
            worksheet.write_number(row, col, *number)?;
        }
        (CellValue::Number(number), Some(format)) => {
            worksheet.write_number_with_format(row, col, *number, format)?;
        }
        (CellValue::Bool(flag), None) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
        (CellValue::Bool(flag), Some(format)) => {
            worksheet.write_boolean_with_format(row, col, *flag, format)?;
        }
    }
    Ok(())
}
