//! Trailing report windows

use crate::types::{BizdashError, Transaction};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Selectable trailing window for a report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ReportPeriod {
    #[serde(rename = "1m")]
    OneMonth,
    #[default]
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl ReportPeriod {
    pub fn months(&self) -> u32 {
        match self {
            ReportPeriod::OneMonth => 1,
            ReportPeriod::ThreeMonths => 3,
            ReportPeriod::OneYear => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::OneMonth => "1m",
            ReportPeriod::ThreeMonths => "3m",
            ReportPeriod::OneYear => "1y",
        }
    }

    /// Inclusive `[start, today]` range. Month subtraction clamps to the
    /// last day of the target month (Mar 31 - 1 month = Feb 29).
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }

    /// Keep only transactions dated inside the window
    pub fn filter(&self, transactions: Vec<Transaction>, today: NaiveDate) -> Vec<Transaction> {
        let (start, end) = self.window(today);
        transactions
            .into_iter()
            .filter(|tx| tx.date >= start && tx.date <= end)
            .collect()
    }
}

impl FromStr for ReportPeriod {
    type Err = BizdashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" | "month" => Ok(ReportPeriod::OneMonth),
            "3m" | "quarter" => Ok(ReportPeriod::ThreeMonths),
            "1y" | "12m" | "year" => Ok(ReportPeriod::OneYear),
            other => Err(BizdashError::Parse(format!(
                "unknown period {:?} (expected 1m, 3m or 1y)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
