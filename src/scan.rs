//! Input-folder scanning and filename parsing.
//!
//! The report folder is shared with the download tooling and with our own
//! consolidated outputs, so everything that does not parse as a report file
//! is dropped without comment. The folder is re-read in full on every run;
//! nothing is cached between runs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::Result;
use crate::model::{Category, Period, ReportKind, ReportRecord, Target, sub_codes};

/// Filename shape of a downloaded report, extension already stripped:
/// `<code>_<date>_<suffix>[dup]`. `date` is `MM-YYYY` or `MM-DD-YYYY`;
/// `suffix` is one or two uppercase alphanumeric tokens, optionally followed
/// by a duplicate-download digit group.
static REPORT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<code>.+?)_(?P<date>\d{2}-(?:\d{2}-)?\d{4})_(?P<suffix>[A-Z0-9]+(?:_[A-Z0-9]+)?)(?P<dup>\d+)?$",
    )
    .expect("report name pattern")
});

/// Consolidated workbooks we deposited back into the folder ourselves.
fn is_own_output(name: &str) -> bool {
    name.contains("_Mgmt Report_") || name.contains("_CONSOLIDATED")
}

/// Parses a base filename (no extension) into its code, date and kind.
fn parse_base_name(base: &str) -> Option<(String, String, ReportKind)> {
    let caps = REPORT_NAME.captures(base)?;
    let kind = ReportKind::from_suffix(&caps["suffix"])?;
    Some((caps["code"].to_string(), caps["date"].to_string(), kind))
}

/// Scans `folder` for report files and parses them into records.
///
/// Unparsable names, unknown kinds and our own outputs are skipped, never
/// errors. Only IO failures surface.
pub fn scan_reports(folder: &Path) -> Result<Vec<ReportRecord>> {
    let mut records = Vec::new();

    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
        {
            continue;
        }
        if is_own_output(name) {
            trace!(name, "skipping consolidated output");
            continue;
        }
        let Some(base) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some((code, date, kind)) = parse_base_name(base) else {
            trace!(name, "unrecognised report filename");
            continue;
        };
        let Some(period) = Period::from_date_token(&date) else {
            continue;
        };
        let modified = entry.metadata()?.modified()?;

        records.push(ReportRecord {
            code,
            date,
            period,
            kind,
            path,
            modified,
        });
    }

    debug!(folder = %folder.display(), record_count = records.len(), "scanned report folder");
    Ok(records)
}

/// Derives the consolidation targets from scanned records: the distinct
/// `(code, period)` pairs in lexical order, optionally filtered to one
/// period.
///
/// A non-composite code that is a sub-code of a composite code observed in
/// the same period is suppressed; the composite workbook is authoritative
/// for it and a standalone output would be redundant.
pub fn collect_targets(records: &[ReportRecord], period: Option<&Period>) -> Vec<Target> {
    let targets: BTreeSet<Target> = records
        .iter()
        .filter(|r| period.is_none_or(|p| &r.period == p))
        .map(|r| Target {
            code: r.code.clone(),
            period: r.period.clone(),
        })
        .collect();

    let mut subs_by_period: BTreeMap<Period, BTreeSet<String>> = BTreeMap::new();
    for target in &targets {
        if target.category() == Category::Composite {
            subs_by_period
                .entry(target.period.clone())
                .or_default()
                .extend(sub_codes(&target.code).into_iter().map(str::to_string));
        }
    }

    targets
        .into_iter()
        .filter(|target| {
            target.category() == Category::Composite
                || !subs_by_period
                    .get(&target.period)
                    .is_some_and(|subs| subs.contains(&target.code))
        })
        .collect()
}
