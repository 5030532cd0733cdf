//! End-to-end report tests over the JSON fixtures

use bizdash::services::{AggregatorOptions, DataLoaderService, JsonFileStore, ReportPeriod};
use bizdash::types::{ClientType, Report};
use chrono::NaiveDate;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
}

fn load(period: ReportPeriod) -> Report {
    let loader = DataLoaderService::new(
        JsonFileStore::new(fixtures_dir()),
        AggregatorOptions::default(),
    );
    loader.load(period, today()).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_one_month_window() {
    let report = load(ReportPeriod::OneMonth);

    // t01, t02, t03 fall on or after 2024-05-20
    assert_eq!(report.transaction_count, 3);
    assert!(close(report.total_revenue, 360.0));
    assert!(close(report.total_cost, 240.0));
    assert!(close(report.total_profit, 120.0));
    assert!(close(report.average_profit_margin, 120.0 / 360.0 * 100.0));
}

#[test]
fn test_one_year_excludes_old_sales() {
    let report = load(ReportPeriod::OneYear);

    assert_eq!(report.transaction_count, 7);
    assert!(close(report.total_revenue, 765.0));
    assert!(close(report.total_profit, report.total_revenue - report.total_cost));
}

#[test]
fn test_monthly_series_has_twelve_points() {
    let report = load(ReportPeriod::OneYear);

    assert_eq!(report.monthly.len(), 12);
    let last = report.monthly.last().unwrap();
    assert_eq!((last.year, last.month), (2024, 6));
    assert_eq!(last.label, "Jun 2024");
    assert!(close(last.revenue, 300.0));

    let march = report
        .monthly
        .iter()
        .find(|p| p.year == 2024 && p.month == 3)
        .unwrap();
    assert_eq!(march.count, 0);
    assert!(close(march.revenue, 0.0));
}

#[test]
fn test_grouping_sums_match_totals() {
    let report = load(ReportPeriod::OneYear);

    let by_service: f64 = report.services.iter().map(|s| s.revenue).sum();
    let by_category: f64 = report.categories.iter().map(|c| c.revenue).sum();
    let by_duration: f64 = report.durations.iter().map(|d| d.revenue).sum();
    assert!(close(by_service, report.total_revenue));
    assert!(close(by_category, report.total_revenue));
    assert!(close(by_duration, report.total_revenue));

    // Nested service row wins; unknown catalog ids fall back to "Unknown"
    assert!(report.services.iter().any(|s| s.key == "Disney Plus"));
    assert!(report.services.iter().any(|s| s.key == "Unknown"));
    assert!(report.categories.iter().any(|c| c.key == "Unknown"));

    let video = report.categories.iter().find(|c| c.key == "Video").unwrap();
    assert!(close(video.revenue, 255.0));
    assert_eq!(video.count, 3);
}

#[test]
fn test_client_types_and_top_clients() {
    let report = load(ReportPeriod::OneYear);

    assert_eq!(report.client_types.len(), 2);
    let reseller = report
        .client_types
        .iter()
        .find(|t| t.client_type == ClientType::Reseller)
        .unwrap();
    assert_eq!(reseller.clients, 1);
    assert!(close(reseller.revenue, 380.0));

    assert_eq!(report.top_clients[0].name, "StreamHub");
    assert!(close(report.top_clients[0].spend, 380.0));
}

#[test]
fn test_low_margin_alerts() {
    let report = load(ReportPeriod::OneYear);

    // Office 365: 10 / 200 = 5%
    assert_eq!(report.low_margin_services[0].service, "Office 365");
    assert!(close(report.low_margin_services[0].margin, 5.0));
    assert!(report
        .low_margin_services
        .windows(2)
        .all(|w| w[0].margin <= w[1].margin));
}

#[test]
fn test_report_serializes_to_json() {
    let report = load(ReportPeriod::ThreeMonths);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["period"], "3m");
    assert_eq!(json["window_start"], "2024-03-20");
    assert!(json["monthly"].as_array().unwrap().len() == 12);
}
