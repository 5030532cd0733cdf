//! Sales data loading for reports
//!
//! The three collections are fetched in parallel, then the aggregator runs
//! synchronously over the window's transactions. A failed fetch never yields a
//! partial report.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::services::{Aggregator, AggregatorOptions, ReportPeriod};
use crate::types::{BizdashError, Client, Report, Result, Service, Transaction};

/// Read-only query interface of the sales database
pub trait SalesStore: Send + Sync {
    /// Transactions dated within `[start, end]`, with joined service/client rows
    fn transactions_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Transaction>>;

    fn services(&self) -> Result<Vec<Service>>;

    fn clients(&self) -> Result<Vec<Client>>;
}

/// Store backed by `transactions.json`, `services.json` and `clients.json`
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub const TRANSACTIONS_FILE: &'static str = "transactions.json";
    pub const SERVICES_FILE: &'static str = "services.json";
    pub const CLIENTS_FILE: &'static str = "clients.json";

    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn read_rows<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.data_dir.join(file);
        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| BizdashError::Parse(format!("{}: {}", path.display(), e)))
    }
}

impl SalesStore for JsonFileStore {
    fn transactions_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Transaction>> {
        let rows: Vec<Transaction> = self.read_rows(Self::TRANSACTIONS_FILE)?;
        Ok(rows
            .into_iter()
            .filter(|tx| tx.date >= start && tx.date <= end)
            .collect())
    }

    fn services(&self) -> Result<Vec<Service>> {
        self.read_rows(Self::SERVICES_FILE)
    }

    fn clients(&self) -> Result<Vec<Client>> {
        self.read_rows(Self::CLIENTS_FILE)
    }
}

/// Loads sales data and builds reports
pub struct DataLoaderService<S: SalesStore> {
    store: S,
    options: AggregatorOptions,
}

impl<S: SalesStore> DataLoaderService<S> {
    pub fn new(store: S, options: AggregatorOptions) -> Self {
        Self { store, options }
    }

    /// Fetch transactions, services and clients in parallel
    pub fn fetch(
        &self,
        period: ReportPeriod,
        today: NaiveDate,
    ) -> Result<(Vec<Transaction>, Vec<Service>, Vec<Client>)> {
        let (start, end) = period.window(today);
        let (transactions, (services, clients)) = rayon::join(
            || self.store.transactions_between(start, end),
            || rayon::join(|| self.store.services(), || self.store.clients()),
        );
        Ok((transactions?, services?, clients?))
    }

    pub fn load(&self, period: ReportPeriod, today: NaiveDate) -> Result<Report> {
        let (transactions, services, clients) = self.fetch(period, today)?;
        // Guard against stores that ignore the date range.
        let transactions = period.filter(transactions, today);

        let report = Aggregator::report(
            period,
            today,
            &transactions,
            &services,
            &clients,
            &self.options,
        );
        info!(
            period = %period,
            transactions = report.transaction_count,
            services = services.len(),
            clients = clients.len(),
            "report computed"
        );
        Ok(report)
    }

    /// Like `load`, but a failure is logged and turned into the empty state
    pub fn load_or_empty(&self, period: ReportPeriod, today: NaiveDate) -> Option<Report> {
        match self.load(period, today) {
            Ok(report) => Some(report),
            Err(e) => {
                error!(period = %period, "failed to load report data: {}", e);
                None
            }
        }
    }
}
