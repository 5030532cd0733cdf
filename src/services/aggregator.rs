//! Aggregator service for computing sales report metrics

use crate::services::ReportPeriod;
use crate::types::{
    margin_pct, Client, ClientSpend, ClientType, ClientTypeRollup, LowMarginAlert, MonthlyPoint,
    Report, Rollup, Service, Transaction, Trend, TrendDirection,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Grouping key used when a transaction's service or field cannot be resolved
pub const UNKNOWN_KEY: &str = "Unknown";

/// Tunables for report computation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AggregatorOptions {
    pub top_services: usize,
    pub top_clients: usize,
    /// Margin percentage below which a service is flagged
    pub low_margin_threshold: f64,
    pub low_margin_limit: usize,
    /// Relative change in percent needed to call a trend up or down
    pub trend_threshold: f64,
    /// Months compared on each side of the trend
    pub trend_window: usize,
    pub series_months: usize,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            top_services: 5,
            top_clients: 5,
            low_margin_threshold: 15.0,
            low_margin_limit: 3,
            trend_threshold: 5.0,
            trend_window: 3,
            series_months: 12,
        }
    }
}

/// Totals over a transaction set
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub margin: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy)]
enum ServiceField {
    Name,
    Category,
    Duration,
}

/// Service catalog indexed by id
struct ServiceCatalog<'a> {
    by_id: HashMap<&'a str, &'a Service>,
}

impl<'a> ServiceCatalog<'a> {
    fn new(services: &'a [Service]) -> Self {
        Self {
            by_id: services.iter().map(|s| (s.id.as_str(), s)).collect(),
        }
    }

    /// Nested join first, then the catalog row for `service_id`, else "Unknown"
    fn resolve(&self, tx: &'a Transaction, field: ServiceField) -> &'a str {
        let nested = tx.service.as_ref().and_then(|s| match field {
            ServiceField::Name => s.product_service.as_deref(),
            ServiceField::Category => s.category.as_deref(),
            ServiceField::Duration => s.duration.as_deref(),
        });

        nested
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                let service: &'a Service = tx
                    .service_id
                    .as_deref()
                    .and_then(|id| self.by_id.get(id).copied())?;
                match field {
                    ServiceField::Name => Some(service.product_service.as_str()),
                    ServiceField::Category => service.category.as_deref(),
                    ServiceField::Duration => service.duration.as_deref(),
                }
                .filter(|v| !v.trim().is_empty())
            })
            .unwrap_or(UNKNOWN_KEY)
    }
}

/// Aggregator for computing sales report metrics
pub struct Aggregator;

impl Aggregator {
    /// Build the full report. `transactions` must already be limited to the
    /// period window; `services` and `clients` are the full catalogs.
    pub fn report(
        period: ReportPeriod,
        today: NaiveDate,
        transactions: &[Transaction],
        services: &[Service],
        clients: &[Client],
        options: &AggregatorOptions,
    ) -> Report {
        let (window_start, window_end) = period.window(today);
        let totals = Self::totals(transactions);

        let service_rollups = Self::by_service(transactions, services);
        let top_services = service_rollups
            .iter()
            .take(options.top_services)
            .cloned()
            .collect();
        let low_margin_services = Self::low_margin(
            &service_rollups,
            options.low_margin_threshold,
            options.low_margin_limit,
        );

        let monthly = Self::monthly(transactions, today, options.series_months);
        let trend = Self::trend(&monthly, options.trend_window, options.trend_threshold);

        Report {
            period: period.as_str().to_string(),
            window_start,
            window_end,
            generated_at: Utc::now(),
            transaction_count: totals.count,
            total_revenue: totals.revenue,
            total_cost: totals.cost,
            total_profit: totals.profit,
            average_profit_margin: totals.margin,
            top_services,
            services: service_rollups,
            categories: Self::by_category(transactions, services),
            durations: Self::by_duration(transactions, services),
            client_types: Self::by_client_type(transactions, clients),
            top_clients: Self::top_clients(transactions, clients, options.top_clients),
            monthly,
            trend,
            low_margin_services,
        }
    }

    /// Revenue, cost and profit over all entries. Profit is derived from the
    /// two sums so `profit == revenue - cost` holds exactly.
    pub fn totals(transactions: &[Transaction]) -> Totals {
        let mut totals = Totals::default();
        for tx in transactions {
            totals.revenue += tx.selling_price;
            totals.cost += tx.cost_at_sale;
            totals.count = totals.count.saturating_add(1);
        }
        totals.profit = totals.revenue - totals.cost;
        totals.margin = margin_pct(totals.profit, totals.revenue);
        totals
    }

    /// Aggregate by service name (sorted by revenue descending)
    pub fn by_service(transactions: &[Transaction], services: &[Service]) -> Vec<Rollup> {
        let catalog = ServiceCatalog::new(services);
        Self::rollup_by(transactions, |tx| catalog.resolve(tx, ServiceField::Name))
    }

    /// Aggregate by service category (sorted by revenue descending)
    pub fn by_category(transactions: &[Transaction], services: &[Service]) -> Vec<Rollup> {
        let catalog = ServiceCatalog::new(services);
        Self::rollup_by(transactions, |tx| catalog.resolve(tx, ServiceField::Category))
    }

    /// Aggregate by subscription duration (sorted by revenue descending)
    pub fn by_duration(transactions: &[Transaction], services: &[Service]) -> Vec<Rollup> {
        let catalog = ServiceCatalog::new(services);
        Self::rollup_by(transactions, |tx| catalog.resolve(tx, ServiceField::Duration))
    }

    fn rollup_by<'a, F>(transactions: &'a [Transaction], key: F) -> Vec<Rollup>
    where
        F: Fn(&'a Transaction) -> &'a str,
    {
        let mut groups: HashMap<&str, Rollup> = HashMap::new();
        for tx in transactions {
            let k = key(tx);
            groups.entry(k).or_insert_with(|| Rollup::new(k)).add(tx);
        }

        let mut result: Vec<Rollup> = groups.into_values().collect();
        result.sort_by(|a, b| {
            b.revenue
                .total_cmp(&a.revenue)
                .then_with(|| a.key.cmp(&b.key))
        });
        result
    }

    /// Client count and revenue per client type. Both types are always present.
    pub fn by_client_type(
        transactions: &[Transaction],
        clients: &[Client],
    ) -> Vec<ClientTypeRollup> {
        let types_by_id: HashMap<&str, ClientType> = clients
            .iter()
            .map(|c| (c.id.as_str(), c.client_type))
            .collect();

        let mut revenue: HashMap<ClientType, f64> = HashMap::new();
        for tx in transactions {
            let client_type = tx
                .client_id
                .as_deref()
                .and_then(|id| types_by_id.get(id).copied())
                .or_else(|| tx.client.as_ref().and_then(|c| c.client_type));
            if let Some(t) = client_type {
                *revenue.entry(t).or_default() += tx.selling_price;
            }
        }

        ClientType::ALL
            .iter()
            .map(|&client_type| ClientTypeRollup {
                client_type,
                clients: clients
                    .iter()
                    .filter(|c| c.client_type == client_type)
                    .count() as u64,
                revenue: revenue.get(&client_type).copied().unwrap_or(0.0),
            })
            .collect()
    }

    /// Catalog clients with nonzero spend, highest spend first
    pub fn top_clients(
        transactions: &[Transaction],
        clients: &[Client],
        limit: usize,
    ) -> Vec<ClientSpend> {
        let mut spend: HashMap<&str, ClientSpend> = clients
            .iter()
            .map(|c| {
                (
                    c.id.as_str(),
                    ClientSpend {
                        client_id: c.id.clone(),
                        name: c.name.clone(),
                        client_type: c.client_type,
                        spend: 0.0,
                        profit: 0.0,
                        count: 0,
                    },
                )
            })
            .collect();

        for tx in transactions {
            let Some(entry) = tx.client_id.as_deref().and_then(|id| spend.get_mut(id)) else {
                continue;
            };
            entry.spend += tx.selling_price;
            entry.profit += tx.profit();
            entry.count = entry.count.saturating_add(1);
        }

        let mut result: Vec<ClientSpend> = spend.into_values().filter(|c| c.spend != 0.0).collect();
        result.sort_by(|a, b| b.spend.total_cmp(&a.spend).then_with(|| a.name.cmp(&b.name)));
        result.truncate(limit);
        result
    }

    /// Trailing calendar months ending with the month of `today`, oldest first.
    /// Months without sales are zero-filled.
    pub fn monthly(transactions: &[Transaction], today: NaiveDate, months: usize) -> Vec<MonthlyPoint> {
        let mut series: Vec<MonthlyPoint> = (0..months)
            .rev()
            .map(|back| {
                let (year, month) = months_back(today.year(), today.month(), back as u32);
                MonthlyPoint {
                    year,
                    month,
                    label: month_label(year, month),
                    revenue: 0.0,
                    profit: 0.0,
                    count: 0,
                }
            })
            .collect();

        let index: HashMap<(i32, u32), usize> = series
            .iter()
            .enumerate()
            .map(|(i, p)| ((p.year, p.month), i))
            .collect();

        for tx in transactions {
            if let Some(&i) = index.get(&(tx.date.year(), tx.date.month())) {
                let point = &mut series[i];
                point.revenue += tx.selling_price;
                point.profit += tx.profit();
                point.count = point.count.saturating_add(1);
            }
        }

        series
    }

    /// Compare the average profit of the last `window` months with the
    /// `window` months before them.
    ///
    /// The change is taken relative to the absolute previous average, so a
    /// shrinking loss (say -100 to -50) reads as up 50% rather than down.
    pub fn trend(monthly: &[MonthlyPoint], window: usize, threshold: f64) -> Trend {
        if window == 0 || monthly.len() < window * 2 {
            return Trend::stable();
        }

        let avg = |points: &[MonthlyPoint]| {
            points.iter().map(|p| p.profit).sum::<f64>() / points.len() as f64
        };
        let recent_start = monthly.len() - window;
        let recent = avg(&monthly[recent_start..]);
        let previous = avg(&monthly[recent_start - window..recent_start]);

        if previous == 0.0 {
            return Trend::stable();
        }

        // Dividing by |previous| keeps the sign of the change meaningful
        // when the earlier period ran at a loss.
        let change = (recent - previous) / previous.abs() * 100.0;
        let direction = if change > threshold {
            TrendDirection::Up
        } else if change < -threshold {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        };

        Trend {
            direction,
            percentage: change.abs(),
        }
    }

    /// Services below the margin threshold with some revenue, worst first
    pub fn low_margin(services: &[Rollup], threshold: f64, limit: usize) -> Vec<LowMarginAlert> {
        let mut alerts: Vec<LowMarginAlert> = services
            .iter()
            .filter(|s| s.revenue > 0.0 && s.margin() < threshold)
            .map(|s| LowMarginAlert {
                service: s.key.clone(),
                revenue: s.revenue,
                profit: s.profit,
                margin: s.margin(),
            })
            .collect();

        alerts.sort_by(|a, b| {
            a.margin
                .total_cmp(&b.margin)
                .then_with(|| a.service.cmp(&b.service))
        });
        alerts.truncate(limit);
        alerts
    }
}

/// (year, month) that lies `back` months before the given one
fn months_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|| format!("{:02}/{}", month, year))
}
