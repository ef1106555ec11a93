//! Per-target orchestration: plan the sections, resolve each one to its
//! freshest source file, merge the copied sheets and save the workbook.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{Result, ToolError};
use crate::io::excel_read;
use crate::io::excel_write::{self, NamedSheet};
use crate::model::{Period, ReportKind, ReportRecord, Target};
use crate::plan;
use crate::repair::{self, HeaderRepair};
use crate::resolve::ReportIndex;
use crate::scan;
use crate::sheet::SheetSnapshot;

/// Output subdirectory created under the input folder by default.
pub const OUTPUT_SUBDIR: &str = "Consolidated";

/// Worksheet-name length limit of the destination format.
const MAX_SHEET_NAME: usize = 31;

/// Options for one consolidation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Folder holding the downloaded report files.
    pub input: PathBuf,
    /// Output folder; `<input>/Consolidated` when unset.
    pub output: Option<PathBuf>,
    /// Restrict the run to one period.
    pub period: Option<Period>,
}

/// Counters reported after a run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    /// Recognised report files in the folder.
    pub records: usize,
    /// Targets derived from them (after sub-code suppression).
    pub targets: usize,
    /// Output workbooks written, in target order.
    pub written: Vec<PathBuf>,
    /// Targets skipped because no section resolved to a file.
    pub skipped_empty: usize,
    /// Targets that failed to save.
    pub failed: usize,
}

/// Inventory of a report folder, as produced by the `scan` command.
#[derive(Debug, Serialize)]
pub struct Inventory {
    pub records: Vec<ReportRecord>,
    pub targets: Vec<Target>,
}

/// Scans the folder and lists the recognised records and derived targets
/// without writing anything.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn inventory(input: &Path, period: Option<&Period>) -> Result<Inventory> {
    if !input.is_dir() {
        return Err(ToolError::MissingInput(input.to_path_buf()));
    }
    let records = scan::scan_reports(input)?;
    let targets = scan::collect_targets(&records, period);
    info!(records = records.len(), targets = targets.len(), "folder scanned");
    Ok(Inventory { records, targets })
}

/// Runs the consolidation engine over a report folder.
///
/// Every target is attempted regardless of earlier failures; failures stay
/// isolated to their section or target and are reported through the returned
/// summary and the log.
#[instrument(level = "info", skip_all, fields(input = %options.input.display()))]
pub fn consolidate_folder(options: &RunOptions) -> Result<RunSummary> {
    if !options.input.is_dir() {
        return Err(ToolError::MissingInput(options.input.clone()));
    }

    let records = scan::scan_reports(&options.input)?;
    let mut summary = RunSummary {
        records: records.len(),
        ..RunSummary::default()
    };
    if records.is_empty() {
        info!("no report files found");
        return Ok(summary);
    }

    let targets = scan::collect_targets(&records, options.period.as_ref());
    summary.targets = targets.len();
    let index = ReportIndex::new(&records);

    let out_dir = options
        .output
        .clone()
        .unwrap_or_else(|| options.input.join(OUTPUT_SUBDIR));
    fs::create_dir_all(&out_dir)?;

    for target in &targets {
        match consolidate_target(&index, target, &out_dir) {
            Ok(Some(path)) => {
                info!(code = %target.code, period = %target.period, output = %path.display(), "workbook written");
                summary.written.push(path);
            }
            Ok(None) => {
                warn!(code = %target.code, period = %target.period, "no sections resolved, skipping output");
                summary.skipped_empty += 1;
            }
            Err(err) => {
                error!(code = %target.code, period = %target.period, %err, "target failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        written = summary.written.len(),
        skipped = summary.skipped_empty,
        failed = summary.failed,
        "consolidation run finished"
    );
    Ok(summary)
}

/// Builds one consolidated workbook.
///
/// Returns the written path, or `None` when no section resolved to a file —
/// an empty consolidated workbook is never produced. A section whose source
/// cannot be copied is logged and dropped, exactly as if it had no
/// candidates.
#[instrument(level = "debug", skip_all, fields(code = %target.code, period = %target.period))]
pub fn consolidate_target(
    index: &ReportIndex<'_>,
    target: &Target,
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    let category = target.category();
    let sections = plan::sequence_for(category, &target.code);
    debug!(?category, planned = sections.len(), "sections planned");

    let mut sheets: Vec<NamedSheet> = Vec::new();
    for section in &sections {
        let Some(record) = index.resolve(section, &target.period) else {
            debug!(kind = %section.kind, lookup = %section.lookup_code, "section absent");
            continue;
        };
        let Some(sheet) = copy_section_sheet(record, section.kind) else {
            continue;
        };

        let title = format!(
            "{:02} {}{}",
            sheets.len() + 1,
            section.kind.label(),
            section.label_suffix.as_deref().unwrap_or("")
        );
        let name = unique_sheet_name(&title, &sheets);
        sheets.push(NamedSheet { name, sheet });
    }

    if sheets.is_empty() {
        return Ok(None);
    }

    let out_name = sanitize_filename(&format!(
        "{}_Mgmt Report_{}_Sent.xlsx",
        target.code,
        target.period.dotted()
    ));
    let out_path = unique_output_path(out_dir, &out_name);
    excel_write::write_consolidated(&out_path, &sheets)?;
    Ok(Some(out_path))
}

/// Snapshots the first sheet of the section's source file, applying the
/// header repair to plain budget comparisons. Read failures are logged and
/// collapse into "no candidate".
fn copy_section_sheet(record: &ReportRecord, kind: ReportKind) -> Option<SheetSnapshot> {
    let mut sheet = match excel_read::read_first_sheet(&record.path) {
        Ok(sheet) => sheet,
        Err(err) => {
            warn!(file = %record.path.display(), %err, "failed to copy section source");
            return None;
        }
    };

    if kind == ReportKind::BudgetComparison
        && repair::add_mtd_column(&mut sheet) == HeaderRepair::HeaderNotFound
    {
        debug!(file = %record.path.display(), "budget comparison header not found, copied as is");
    }

    Some(sheet)
}

/// Truncates a sheet title to the 31-character worksheet limit and
/// disambiguates it against names already taken in this workbook.
fn unique_sheet_name(title: &str, existing: &[NamedSheet]) -> String {
    let name: String = title.chars().take(MAX_SHEET_NAME).collect();
    if !existing.iter().any(|s| s.name == name) {
        return name;
    }
    let mut counter = 2;
    loop {
        let suffix = format!(" {counter}");
        let stem: String = title
            .chars()
            .take(MAX_SHEET_NAME - suffix.chars().count())
            .collect();
        let candidate = format!("{stem}{suffix}");
        if !existing.iter().any(|s| s.name == candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Replaces characters the destination filesystem rejects.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Appends `(n)` before the extension until the name is free in `dir`.
fn unique_output_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
        None => (filename.to_string(), String::new()),
    };
    let mut counter = 1;
    loop {
        let candidate = dir.join(format!("{stem}({counter}){ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> NamedSheet {
        NamedSheet {
            name: name.to_string(),
            sheet: SheetSnapshot::default(),
        }
    }

    #[test]
    fn sheet_names_are_truncated_to_the_worksheet_limit() {
        let title = "05 Affordable Receivable Aging Summary (Exclude Affordable)";
        let name = unique_sheet_name(title, &[]);
        assert_eq!(name.chars().count(), 31);
        assert!(title.starts_with(&name));
    }

    #[test]
    fn colliding_sheet_names_get_a_counter_within_the_limit() {
        let title = "05 Affordable Rent Roll with Lease Charges (X1)";
        let first = unique_sheet_name(title, &[]);
        let existing = vec![named(&first)];
        let second = unique_sheet_name(title, &existing);

        assert_ne!(first, second);
        assert!(second.ends_with(" 2"));
        assert!(second.chars().count() <= 31);
    }

    #[test]
    fn short_names_pass_through_unchanged() {
        assert_eq!(unique_sheet_name("01 Legal", &[]), "01 Legal");
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(
            sanitize_filename("A/B_Mgmt Report_08.2025_Sent.xlsx"),
            "A_B_Mgmt Report_08.2025_Sent.xlsx"
        );
        assert_eq!(sanitize_filename("X1^Y2_ok"), "X1^Y2_ok");
    }

    #[test]
    fn output_paths_are_uniquified_with_a_counter() {
        let dir = tempfile::tempdir().unwrap();
        let name = "ABC_Mgmt Report_08.2025_Sent.xlsx";

        let first = unique_output_path(dir.path(), name);
        assert_eq!(first.file_name().unwrap().to_str().unwrap(), name);
        std::fs::write(&first, b"x").unwrap();

        let second = unique_output_path(dir.path(), name);
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "ABC_Mgmt Report_08.2025_Sent(1).xlsx"
        );
        std::fs::write(&second, b"x").unwrap();

        let third = unique_output_path(dir.path(), name);
        assert_eq!(
            third.file_name().unwrap().to_str().unwrap(),
            "ABC_Mgmt Report_08.2025_Sent(2).xlsx"
        );
    }
}
