//! Fiscal period types.
//!
//! Periods are owned by the period-management subsystem; the engine only
//! reads their state.

use chrono::NaiveDate;
use docflow_shared::types::FiscalPeriodId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a fiscal or AP period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodState {
    /// Period is open for postings.
    Open,
    /// Period is closed, no new postings allowed.
    Closed,
    /// Period is temporarily on hold.
    Hold,
}

impl PeriodState {
    /// Returns the string representation of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Hold => "hold",
        }
    }

    /// Parses a state from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            "hold" => Some(Self::Hold),
            _ => None,
        }
    }
}

impl fmt::Display for PeriodState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fiscal or AP period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalPeriod {
    /// Unique identifier.
    pub id: FiscalPeriodId,
    /// Period name (e.g., "January 2026").
    pub name: String,
    /// Start date of the period.
    pub start_date: NaiveDate,
    /// End date of the period (inclusive).
    pub end_date: NaiveDate,
    /// Current state.
    pub state: PeriodState,
}

impl FiscalPeriod {
    /// Creates an open period.
    #[must_use]
    pub fn open(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: FiscalPeriodId::new(),
            name: name.into(),
            start_date,
            end_date,
            state: PeriodState::Open,
        }
    }

    /// Returns true if documents dated in this period can be posted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == PeriodState::Open
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}
