//! Report types produced by the aggregator

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ClientType, Transaction};

/// Revenue/profit totals for one grouping key (service, category, duration)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Rollup {
    pub key: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub count: u64,
}

impl Rollup {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, tx: &Transaction) {
        self.revenue += tx.selling_price;
        self.cost += tx.cost_at_sale;
        self.profit += tx.profit();
        self.count = self.count.saturating_add(1);
    }

    /// Profit as a percentage of revenue, 0 when there is no revenue
    pub fn margin(&self) -> f64 {
        margin_pct(self.profit, self.revenue)
    }
}

pub fn margin_pct(profit: f64, revenue: f64) -> f64 {
    if revenue == 0.0 {
        0.0
    } else {
        profit / revenue * 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientTypeRollup {
    pub client_type: ClientType,
    /// Catalog clients of this type, whether or not they bought anything
    pub clients: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSpend {
    pub client_id: String,
    pub name: String,
    pub client_type: ClientType,
    pub spend: f64,
    pub profit: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    /// e.g. "Mar 2024"
    pub label: String,
    pub revenue: f64,
    pub profit: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Absolute relative change in percent, never negative
    pub percentage: f64,
}

impl Trend {
    pub fn stable() -> Self {
        Self {
            direction: TrendDirection::Stable,
            percentage: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LowMarginAlert {
    pub service: String,
    pub revenue: f64,
    pub profit: f64,
    pub margin: f64,
}

/// Snapshot of business metrics over one date window. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub period: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub transaction_count: u64,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    pub average_profit_margin: f64,
    pub services: Vec<Rollup>,
    pub top_services: Vec<Rollup>,
    pub categories: Vec<Rollup>,
    pub durations: Vec<Rollup>,
    pub client_types: Vec<ClientTypeRollup>,
    pub top_clients: Vec<ClientSpend>,
    pub monthly: Vec<MonthlyPoint>,
    pub trend: Trend,
    pub low_margin_services: Vec<LowMarginAlert>,
}
