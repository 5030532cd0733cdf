//! Plain-text rendering of reports for the terminal

use crate::types::Report;
use std::fmt::Write;

/// Render a report as a fixed-width text summary
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Sales report ({}): {} to {}",
        report.period, report.window_start, report.window_end
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "  Revenue        {:>12.2}", report.total_revenue);
    let _ = writeln!(out, "  Cost           {:>12.2}", report.total_cost);
    let _ = writeln!(out, "  Profit         {:>12.2}", report.total_profit);
    let _ = writeln!(out, "  Avg margin     {:>11.1}%", report.average_profit_margin);
    let _ = writeln!(out, "  Transactions   {:>12}", report.transaction_count);
    let _ = writeln!(
        out,
        "  Trend          {:>12} ({:.1}%)",
        report.trend.direction.as_str(),
        report.trend.percentage
    );

    section(&mut out, "Top services");
    for s in &report.top_services {
        let _ = writeln!(
            out,
            "  {:<24} {:>10.2} {:>10.2} {:>6.1}% {:>5}",
            s.key,
            s.revenue,
            s.profit,
            s.margin(),
            s.count
        );
    }

    section(&mut out, "Categories");
    for c in &report.categories {
        let _ = writeln!(out, "  {:<24} {:>10.2} {:>5}", c.key, c.revenue, c.count);
    }

    section(&mut out, "Durations");
    for d in &report.durations {
        let _ = writeln!(out, "  {:<24} {:>10.2} {:>5}", d.key, d.revenue, d.count);
    }

    section(&mut out, "Client types");
    for t in &report.client_types {
        let _ = writeln!(
            out,
            "  {:<24} {:>10.2} {:>5} clients",
            t.client_type.as_str(),
            t.revenue,
            t.clients
        );
    }

    section(&mut out, "Top clients");
    for c in &report.top_clients {
        let _ = writeln!(out, "  {:<24} {:>10.2} {:>5}", c.name, c.spend, c.count);
    }

    section(&mut out, "Monthly");
    for m in &report.monthly {
        let _ = writeln!(
            out,
            "  {:<10} {:>10.2} {:>10.2} {:>5}",
            m.label, m.revenue, m.profit, m.count
        );
    }

    if !report.low_margin_services.is_empty() {
        section(&mut out, "Low margin alerts");
        for a in &report.low_margin_services {
            let _ = writeln!(
                out,
                "  {:<24} {:>6.1}% on {:.2} revenue",
                a.service, a.margin, a.revenue
            );
        }
    }

    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", title);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Aggregator, AggregatorOptions, ReportPeriod};
    use crate::types::{ServiceRef, Transaction};
    use chrono::NaiveDate;

    fn sample_report(cost: f64) -> Report {
        let tx = Transaction {
            id: "t1".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            selling_price: 100.0,
            cost_at_sale: cost,
            client_id: None,
            service_id: None,
            service: Some(ServiceRef {
                product_service: Some("Netflix".into()),
                category: Some("Video".into()),
                duration: Some("1 month".into()),
            }),
            client: None,
        };
        Aggregator::report(
            ReportPeriod::OneMonth,
            NaiveDate::from_ymd_opt(2024, 6, 20).unwrap(),
            &[tx],
            &[],
            &[],
            &AggregatorOptions::default(),
        )
    }

    #[test]
    fn test_render_contains_totals_and_sections() {
        let text = render_report(&sample_report(60.0));

        assert!(text.starts_with("Sales report (1m): 2024-05-20 to 2024-06-20"));
        assert!(text.contains("100.00"));
        assert!(text.contains("40.0%"));
        assert!(text.contains("Netflix"));
        assert!(text.contains("Jun 2024"));
        assert!(text.contains("reseller"));
        assert!(!text.contains("Low margin alerts"));
    }

    #[test]
    fn test_render_low_margin_section() {
        let text = render_report(&sample_report(95.0));
        assert!(text.contains("Low margin alerts"));
    }
}
