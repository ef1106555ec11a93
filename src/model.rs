//! Core data model: report kinds, property-code categories, periods and the
//! records produced by scanning the report folder.

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// Separator joining the sub-properties of a composite property code.
pub const COMPOSITE_SEPARATOR: char = '^';

/// The closed vocabulary of report kinds recognised in filename suffixes.
///
/// Every downloaded report file carries one of these suffix codes; anything
/// else in the folder is noise and never enters the candidate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    BudgetComparison,
    BudgetComparisonPtd,
    TrialBalance,
    BalanceSheet,
    IncomeStatement,
    ReceivableAgingInclude,
    ReceivableAgingExclude,
    AffordableRentRoll,
    RentRoll,
    GeneralLedger,
    Legal,
    TwelveMonthStatement,
}

impl ReportKind {
    /// All kinds ordered by suffix length, longest first, so that codes
    /// sharing a prefix resolve unambiguously.
    pub const MATCH_ORDER: [ReportKind; 12] = [
        ReportKind::BudgetComparisonPtd,
        ReportKind::ReceivableAgingInclude,
        ReportKind::ReceivableAgingExclude,
        ReportKind::TwelveMonthStatement,
        ReportKind::TrialBalance,
        ReportKind::BalanceSheet,
        ReportKind::IncomeStatement,
        ReportKind::AffordableRentRoll,
        ReportKind::RentRoll,
        ReportKind::GeneralLedger,
        ReportKind::BudgetComparison,
        ReportKind::Legal,
    ];

    /// The filename suffix code identifying this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ReportKind::BudgetComparison => "BC",
            ReportKind::BudgetComparisonPtd => "BC_PTD",
            ReportKind::TrialBalance => "TB",
            ReportKind::BalanceSheet => "BS",
            ReportKind::IncomeStatement => "IS",
            ReportKind::ReceivableAgingInclude => "ARR_I",
            ReportKind::ReceivableAgingExclude => "ARR_E",
            ReportKind::AffordableRentRoll => "AR",
            ReportKind::RentRoll => "PR",
            ReportKind::GeneralLedger => "GL",
            ReportKind::Legal => "L",
            ReportKind::TwelveMonthStatement => "MS12",
        }
    }

    /// Human label used for output sheet names.
    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::BudgetComparison => "Budget Comparison",
            ReportKind::BudgetComparisonPtd => "Budget Comparison (with PTD)",
            ReportKind::TrialBalance => "Trial Balance",
            ReportKind::BalanceSheet => "Balance Sheet",
            ReportKind::IncomeStatement => "Income Statement",
            ReportKind::ReceivableAgingInclude => "Affordable Receivable Aging Summary",
            ReportKind::ReceivableAgingExclude => {
                "Affordable Receivable Aging Summary (Exclude Affordable)"
            }
            ReportKind::AffordableRentRoll => "Affordable Rent Roll with Lease Charges",
            ReportKind::RentRoll => "Rent Roll with Lease Charges",
            ReportKind::GeneralLedger => "General Ledger",
            ReportKind::Legal => "Legal",
            ReportKind::TwelveMonthStatement => "12 month Statement",
        }
    }

    /// Resolves a filename suffix to its kind.
    ///
    /// A suffix matches a kind when it equals the kind's code exactly or the
    /// code followed by one or more digits (`TB`, `TB1` and `TB2` are all
    /// freshness-variants of the trial balance). Codes are tried longest
    /// first. The historical `ARR` suffix is kept as an alias of the
    /// affordable rent roll. Unknown suffixes resolve to `None` and the file
    /// is dropped from the candidate pool.
    pub fn from_suffix(suffix: &str) -> Option<ReportKind> {
        let normalized = suffix.to_ascii_uppercase();
        for kind in ReportKind::MATCH_ORDER {
            let code = kind.code();
            if normalized == code {
                return Some(kind);
            }
            if let Some(rest) = normalized.strip_prefix(code) {
                if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                    return Some(kind);
                }
            }
        }
        if normalized == "ARR" {
            return Some(ReportKind::AffordableRentRoll);
        }
        None
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Consolidation category of a property code. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Plain code, no numeric suffix, no composite separator.
    Single,
    /// Code ending in digits: a multi-section variant of the base property.
    Numbered,
    /// Code joining several sub-properties with [`COMPOSITE_SEPARATOR`].
    Composite,
}

impl Category {
    /// Classifies a property code. Purely syntactic on the code string; the
    /// reports actually present play no part.
    pub fn of(code: &str) -> Category {
        if code.contains(COMPOSITE_SEPARATOR) {
            Category::Composite
        } else if code.ends_with(|c: char| c.is_ascii_digit()) {
            Category::Numbered
        } else {
            Category::Single
        }
    }
}

/// Splits a composite code into its sub-codes, left-to-right order preserved.
pub fn sub_codes(code: &str) -> Vec<&str> {
    code.split(COMPOSITE_SEPARATOR).collect()
}

/// Normalized month-year key grouping records of one reporting cycle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(String);

impl Period {
    /// Parses a strict `MM-YYYY` key, as accepted by the CLI period filter.
    pub fn parse(value: &str) -> Result<Period, ToolError> {
        let bytes = value.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[2] == b'-'
            && bytes[..2].iter().all(u8::is_ascii_digit)
            && bytes[3..].iter().all(u8::is_ascii_digit);
        if well_formed {
            Ok(Period(value.to_string()))
        } else {
            Err(ToolError::InvalidPeriod(value.to_string()))
        }
    }

    /// Normalizes a filename date token, `MM-YYYY` or `MM-DD-YYYY`, by
    /// keeping only the month and year parts.
    pub fn from_date_token(token: &str) -> Option<Period> {
        let parts: Vec<&str> = token.split('-').collect();
        match parts.as_slice() {
            [month, year] => Some(Period(format!("{month}-{year}"))),
            [month, _day, year] => Some(Period(format!("{month}-{year}"))),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `MM.YYYY` form used in output workbook names.
    pub fn dotted(&self) -> String {
        self.0.replace('-', ".")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Period {
    type Err = ToolError;

    fn from_str(value: &str) -> Result<Period, ToolError> {
        Period::parse(value)
    }
}

/// One recognised report file discovered in the input folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Property code as written in the filename, possibly composite.
    pub code: String,
    /// Raw date token from the filename, `MM-YYYY` or `MM-DD-YYYY`.
    pub date: String,
    /// Normalized month-year grouping key derived from `date`.
    pub period: Period,
    /// Report kind resolved from the filename suffix.
    pub kind: ReportKind,
    /// Location of the file on disk.
    pub path: PathBuf,
    /// Filesystem modification time; the freshest candidate wins.
    pub modified: SystemTime,
}

/// One `(code, period)` pair for which a consolidated workbook is produced.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    pub code: String,
    pub period: Period,
}

impl Target {
    pub fn category(&self) -> Category {
        Category::of(&self.code)
    }
}
