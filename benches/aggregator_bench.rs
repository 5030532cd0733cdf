//! Criterion benchmarks for the report aggregator

use bizdash::services::{Aggregator, AggregatorOptions, ReportPeriod};
use bizdash::types::{Client, ClientType, Service, Transaction};
use chrono::{Days, NaiveDate};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

const SERVICES: usize = 40;
const CLIENTS: usize = 500;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MIN)
}

fn catalog() -> (Vec<Service>, Vec<Client>) {
    let services = (0..SERVICES)
        .map(|i| Service {
            id: format!("s{}", i),
            product_service: format!("Service {}", i),
            category: Some(format!("Category {}", i % 6)),
            duration: Some(format!("{} month", 1 + i % 3)),
        })
        .collect();
    let clients = (0..CLIENTS)
        .map(|i| Client {
            id: format!("c{}", i),
            name: format!("Client {}", i),
            client_type: if i % 5 == 0 {
                ClientType::Reseller
            } else {
                ClientType::Client
            },
        })
        .collect();
    (services, clients)
}

/// Deterministic synthetic sales spread over the last year
fn transactions(count: usize) -> Vec<Transaction> {
    (0..count)
        .map(|i| {
            let price = 5.0 + (i % 97) as f64;
            Transaction {
                id: format!("t{}", i),
                date: today() - Days::new((i % 365) as u64),
                selling_price: price,
                cost_at_sale: price * (0.5 + (i % 7) as f64 * 0.06),
                client_id: Some(format!("c{}", i % CLIENTS)),
                service_id: Some(format!("s{}", i % SERVICES)),
                service: None,
                client: None,
            }
        })
        .collect()
}

fn bench_report(c: &mut Criterion) {
    let (services, clients) = catalog();
    let options = AggregatorOptions::default();

    let mut group = c.benchmark_group("aggregator");
    for count in [1_000usize, 10_000, 100_000] {
        let txs = transactions(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("report", count), &txs, |b, txs| {
            b.iter(|| {
                Aggregator::report(
                    ReportPeriod::OneYear,
                    today(),
                    black_box(txs),
                    &services,
                    &clients,
                    &options,
                )
            });
        });
    }
    group.finish();
}

fn bench_monthly(c: &mut Criterion) {
    let txs = transactions(100_000);

    let mut group = c.benchmark_group("aggregator");
    group.throughput(Throughput::Elements(txs.len() as u64));
    group.bench_function("monthly_series", |b| {
        b.iter(|| Aggregator::monthly(black_box(&txs), today(), 12));
    });
    group.finish();
}

criterion_group!(benches, bench_report, bench_monthly);
criterion_main!(benches);
