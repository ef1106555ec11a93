//! Candidate lookup and freshest-version selection.

use std::collections::BTreeMap;

use crate::model::{Period, ReportKind, ReportRecord};
use crate::plan::Section;

/// Index of scanned records, keyed the way planned sections look them up.
///
/// Suffix variants (`TB1`, `PR2`, the legacy `ARR` alias) already collapsed
/// to their kind at parse time, so kind-level lookup covers the looser
/// historical naming conventions without special cases.
pub struct ReportIndex<'a> {
    by_section: BTreeMap<(&'a str, &'a Period, ReportKind), Vec<&'a ReportRecord>>,
}

impl<'a> ReportIndex<'a> {
    pub fn new(records: &'a [ReportRecord]) -> Self {
        let mut by_section: BTreeMap<_, Vec<&ReportRecord>> = BTreeMap::new();
        for record in records {
            by_section
                .entry((record.code.as_str(), &record.period, record.kind))
                .or_default()
                .push(record);
        }
        Self { by_section }
    }

    /// Picks the candidate for one planned section: among the records
    /// matching the section's lookup code, the target period and the
    /// section's kind, the one with the greatest `(modified, path)` — the
    /// freshest file, with the lexically greatest path deciding ties so
    /// selection never depends on directory enumeration order. `None` means
    /// the section is absent and drops out of the workbook.
    pub fn resolve(&self, section: &Section, period: &Period) -> Option<&'a ReportRecord> {
        let candidates = self
            .by_section
            .get(&(section.lookup_code.as_str(), period, section.kind))?;
        candidates
            .iter()
            .copied()
            .max_by(|a, b| (a.modified, &a.path).cmp(&(b.modified, &b.path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::plan::sequence_for;
    use std::time::{Duration, SystemTime};

    fn record(code: &str, kind: ReportKind, path: &str, age_secs: u64) -> ReportRecord {
        ReportRecord {
            code: code.to_string(),
            date: "08-2025".to_string(),
            period: Period::parse("08-2025").unwrap(),
            kind,
            path: path.into(),
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(age_secs),
        }
    }

    fn section_for(kind: ReportKind, code: &str) -> Section {
        sequence_for(Category::of(code), code)
            .into_iter()
            .find(|s| s.kind == kind)
            .unwrap()
    }

    #[test]
    fn freshest_candidate_wins() {
        let records = vec![
            record("ABC", ReportKind::TrialBalance, "ABC_08-2025_TB.xlsx", 100),
            record("ABC", ReportKind::TrialBalance, "ABC_08-2025_TB1.xlsx", 200),
        ];
        let index = ReportIndex::new(&records);
        let section = section_for(ReportKind::TrialBalance, "ABC");
        let period = Period::parse("08-2025").unwrap();

        let chosen = index.resolve(&section, &period).unwrap();
        assert_eq!(chosen.path.to_str(), Some("ABC_08-2025_TB1.xlsx"));
    }

    #[test]
    fn equal_mtimes_break_by_path_order() {
        let records = vec![
            record("ABC", ReportKind::TrialBalance, "a.xlsx", 100),
            record("ABC", ReportKind::TrialBalance, "b.xlsx", 100),
        ];
        let index = ReportIndex::new(&records);
        let section = section_for(ReportKind::TrialBalance, "ABC");
        let period = Period::parse("08-2025").unwrap();

        let chosen = index.resolve(&section, &period).unwrap();
        assert_eq!(chosen.path.to_str(), Some("b.xlsx"));

        // Insertion order does not change the pick.
        let reversed: Vec<ReportRecord> = records.into_iter().rev().collect();
        let index = ReportIndex::new(&reversed);
        let chosen = index.resolve(&section, &period).unwrap();
        assert_eq!(chosen.path.to_str(), Some("b.xlsx"));
    }

    #[test]
    fn absent_sections_resolve_to_none() {
        let records = vec![record("ABC", ReportKind::TrialBalance, "tb.xlsx", 100)];
        let index = ReportIndex::new(&records);
        let period = Period::parse("08-2025").unwrap();

        let absent = section_for(ReportKind::GeneralLedger, "ABC");
        assert!(index.resolve(&absent, &period).is_none());

        let other_period = Period::parse("07-2025").unwrap();
        let present = section_for(ReportKind::TrialBalance, "ABC");
        assert!(index.resolve(&present, &other_period).is_none());
    }

    #[test]
    fn lookup_is_scoped_to_the_section_code() {
        let records = vec![
            record("X1", ReportKind::AffordableRentRoll, "x1.xlsx", 100),
            record("Y2", ReportKind::AffordableRentRoll, "y2.xlsx", 100),
        ];
        let index = ReportIndex::new(&records);
        let period = Period::parse("08-2025").unwrap();
        let plan = sequence_for(Category::Composite, "X1^Y2");

        let rent_rolls: Vec<&str> = plan
            .iter()
            .filter(|s| s.kind == ReportKind::AffordableRentRoll)
            .filter_map(|s| index.resolve(s, &period))
            .map(|r| r.path.to_str().unwrap())
            .collect();
        assert_eq!(rent_rolls, vec!["x1.xlsx", "y2.xlsx"]);
    }
}
