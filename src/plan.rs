//! Section sequencing: which report sheets one consolidated workbook must
//! contain, and in what order.

use crate::model::{Category, ReportKind, sub_codes};
use crate::model::ReportKind::{
    AffordableRentRoll, BalanceSheet, BudgetComparison, BudgetComparisonPtd, GeneralLedger,
    IncomeStatement, Legal, ReceivableAgingExclude, ReceivableAgingInclude, RentRoll,
    TrialBalance, TwelveMonthStatement,
};

/// One planned slot in the output workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Report kind the slot is bound to.
    pub kind: ReportKind,
    /// Property code the resolver looks the kind up under.
    pub lookup_code: String,
    /// Disambiguating sheet-label suffix for per-sub-property slots.
    pub label_suffix: Option<String>,
}

impl Section {
    fn plain(kind: ReportKind, code: &str) -> Section {
        Section {
            kind,
            lookup_code: code.to_string(),
            label_suffix: None,
        }
    }

    fn for_sub(kind: ReportKind, sub: &str) -> Section {
        Section {
            kind,
            lookup_code: sub.to_string(),
            label_suffix: Some(format!(" ({sub})")),
        }
    }
}

const SEQUENCE_SINGLE: [ReportKind; 9] = [
    BudgetComparison,
    TrialBalance,
    BalanceSheet,
    IncomeStatement,
    ReceivableAgingInclude,
    ReceivableAgingExclude,
    AffordableRentRoll,
    GeneralLedger,
    Legal,
];

const SEQUENCE_NUMBERED: [ReportKind; 10] = [
    BudgetComparison,
    TrialBalance,
    BalanceSheet,
    IncomeStatement,
    ReceivableAgingInclude,
    ReceivableAgingExclude,
    RentRoll,
    GeneralLedger,
    TwelveMonthStatement,
    Legal,
];

const COMPOSITE_HEAD: [ReportKind; 6] = [
    BudgetComparisonPtd,
    TrialBalance,
    BalanceSheet,
    IncomeStatement,
    ReceivableAgingInclude,
    ReceivableAgingExclude,
];

const COMPOSITE_TAIL: [ReportKind; 2] = [GeneralLedger, Legal];

/// Returns the ordered sections for one target.
///
/// The plan depends only on the category and the code, never on which files
/// are actually present; absent sections are dropped later by the resolver.
/// For composites, the head and tail run under the composite code itself,
/// with one rent-roll slot and one budget-comparison slot per sub-property
/// in between, in the sub-codes' left-to-right order.
pub fn sequence_for(category: Category, code: &str) -> Vec<Section> {
    match category {
        Category::Single => SEQUENCE_SINGLE
            .iter()
            .map(|&kind| Section::plain(kind, code))
            .collect(),
        Category::Numbered => SEQUENCE_NUMBERED
            .iter()
            .map(|&kind| Section::plain(kind, code))
            .collect(),
        Category::Composite => {
            let subs = sub_codes(code);
            let mut plan: Vec<Section> = COMPOSITE_HEAD
                .iter()
                .map(|&kind| Section::plain(kind, code))
                .collect();
            plan.extend(subs.iter().map(|sub| Section::for_sub(AffordableRentRoll, sub)));
            plan.extend(subs.iter().map(|sub| Section::for_sub(BudgetComparison, sub)));
            plan.extend(COMPOSITE_TAIL.iter().map(|&kind| Section::plain(kind, code)));
            plan
        }
    }
}
