//! Header repair for plain Budget Comparison sheets.
//!
//! The portal exports the budget comparison without the MTD column its header
//! band implies. After the sheet is copied, the repair inserts the derived
//! column and re-spans the banner title merges so the sheet keeps its look.
//! Cosmetic only: it never fails the surrounding consolidation.

use tracing::debug;

use crate::sheet::{MergeRegion, SheetSnapshot};

/// Bounded search region for the Annual/Notes header row.
const HEADER_SEARCH_ROWS: usize = 20;
const HEADER_SEARCH_COLS: usize = 80;

/// Banner title rows whose merges are re-spanned after the insert.
const BANNER_ROWS: [usize; 3] = [0, 1, 2];
const BANNER_SCAN_COLS: usize = 60;

/// Outcome of the cosmetic header repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRepair {
    /// The MTD column was inserted and the banners re-spanned.
    Applied,
    /// No Annual/Notes header row inside the search region; the sheet is
    /// left untouched.
    HeaderNotFound,
}

/// Inserts the derived MTD column into a budget comparison header band.
///
/// Looks for the header row holding both an `Annual` cell and a
/// `Note`/`Notes` cell, inserts one column at the Notes position labelled
/// `MTD`, renames the shifted Notes column to `YTD`, copies the shifted
/// column's width onto the new one (width only, never values), and re-spans
/// the top banner merges so each one keeps its left edge and reaches the new
/// rightmost used column.
pub fn add_mtd_column(sheet: &mut SheetSnapshot) -> HeaderRepair {
    let Some((header_row, note_col)) = find_header(sheet) else {
        return HeaderRepair::HeaderNotFound;
    };

    sheet.insert_column(note_col);
    sheet.set_text(header_row, note_col, "MTD");
    sheet.set_text(header_row, note_col + 1, "YTD");
    sheet.col_widths[note_col] = sheet.col_widths[note_col + 1];

    let last_col = last_used_col(sheet, header_row);
    for row in BANNER_ROWS {
        extend_banner(sheet, row, last_col);
    }

    debug!(header_row, note_col, "inserted MTD column into budget comparison header");
    HeaderRepair::Applied
}

/// Finds the header row containing both an `Annual` label and the
/// `Note`/`Notes` column, inside the bounded top region.
fn find_header(sheet: &SheetSnapshot) -> Option<(usize, usize)> {
    for row in 0..sheet.rows().min(HEADER_SEARCH_ROWS) {
        let mut has_annual = false;
        let mut note_col = None;
        for col in 0..sheet.cols().min(HEADER_SEARCH_COLS) {
            let Some(text) = sheet.text(row, col) else {
                continue;
            };
            let trimmed = text.trim();
            if trimmed == "Annual" {
                has_annual = true;
            }
            if note_col.is_none()
                && (trimmed.eq_ignore_ascii_case("note") || trimmed.eq_ignore_ascii_case("notes"))
            {
                note_col = Some(col);
            }
        }
        if has_annual {
            if let Some(col) = note_col {
                return Some((row, col));
            }
        }
    }
    None
}

/// Rightmost column of `row` holding a non-blank value.
fn last_used_col(sheet: &SheetSnapshot, row: usize) -> usize {
    (0..sheet.cols())
        .rev()
        .find(|&col| sheet.value(row, col).is_some_and(|v| !v.is_blank()))
        .unwrap_or(0)
}

/// Re-spans the banner merge on `row`: the left edge of the existing title
/// merge (or the row's first non-blank cell) is preserved, the right edge
/// extends to `last_col`. Merges conflicting with the new span are dropped.
fn extend_banner(sheet: &mut SheetSnapshot, row: usize, last_col: usize) {
    let scan_cols = sheet.cols().min(BANNER_SCAN_COLS).min(last_col + 1);
    let Some(start_col) =
        (0..scan_cols).find(|&col| sheet.value(row, col).is_some_and(|v| !v.is_blank()))
    else {
        return;
    };

    let row_num = row as u32;
    let left_col = sheet
        .merges
        .iter()
        .find(|m| m.contains(row_num, start_col as u16))
        .map(|m| m.first_col)
        .unwrap_or(start_col as u16);
    let last_col = last_col as u16;
    if last_col <= left_col {
        return;
    }

    sheet.merges.retain(|m| {
        !(m.first_row <= row_num
            && row_num <= m.last_row
            && m.first_col <= last_col
            && left_col <= m.last_col)
    });
    sheet.merges.push(MergeRegion {
        first_row: row_num,
        first_col: left_col,
        last_row: row_num,
        last_col,
    });
}
