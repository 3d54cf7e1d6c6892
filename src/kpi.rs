use crate::filters::within_dates;
use crate::types::Transaction;
use crate::util::percent_of;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

/// Headline metrics for one table snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSnapshot {
    pub total_spend: f64,
    pub transaction_count: usize,
    pub unique_vendors: usize,
    pub ppi_spend_pct: f64,
    pub avg_transaction: f64,
}

impl KpiSnapshot {
    /// PPI spend above half of the total is highlighted on the card.
    pub fn ppi_warning(&self) -> bool {
        self.ppi_spend_pct > 50.0
    }
}

pub fn calculate_kpis(data: &[Transaction]) -> KpiSnapshot {
    let total_spend: f64 = data.iter().map(|t| t.total_amount).sum();
    let transaction_count = data.len();
    let unique_vendors = data
        .iter()
        .map(|t| t.vendor_name.as_str())
        .collect::<HashSet<_>>()
        .len();
    let ppi_spend: f64 = data
        .iter()
        .filter(|t| t.ppi_flag)
        .map(|t| t.total_amount)
        .sum();
    let avg_transaction = if transaction_count > 0 {
        total_spend / transaction_count as f64
    } else {
        0.0
    };

    KpiSnapshot {
        total_spend,
        transaction_count,
        unique_vendors,
        ppi_spend_pct: percent_of(ppi_spend, total_spend),
        avg_transaction,
    }
}

/// The comparison window ending the day before `start`.
///
/// Its start lies `n` days before its end, where `n` is the inclusive day
/// count of `[start, end]`. Returns `None` for an inverted range or when the
/// window would fall outside the calendar.
pub fn prior_window(start: NaiveDate, end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    if end < start {
        return None;
    }
    let span = (end - start).num_days() as u64 + 1;
    let prior_end = start.checked_sub_days(Days::new(1))?;
    let prior_start = prior_end.checked_sub_days(Days::new(span))?;
    Some((prior_start, prior_end))
}

/// KPIs for the window preceding `[current_start, current_end]`.
///
/// Only the dates restrict the prior window; facility, category, vendor,
/// contract and PPI selections are not reapplied to `full`.
pub fn calculate_prior_period(
    full: &[Transaction],
    current_start: NaiveDate,
    current_end: NaiveDate,
) -> KpiSnapshot {
    match prior_window(current_start, current_end) {
        Some((start, end)) => calculate_kpis(&within_dates(full, start, end)),
        None => calculate_kpis(&[]),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Positive,
    Negative,
    Neutral,
}

impl Trend {
    pub fn symbol(self) -> &'static str {
        match self {
            Trend::Positive => "▲",
            Trend::Negative => "▼",
            Trend::Neutral => "–",
        }
    }
}

/// Period-over-period change of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Delta {
    /// The prior value was zero, so no percentage exists.
    NoData,
    /// Percentage change relative to the prior value.
    Change(f64),
}

impl Delta {
    pub fn between(current: f64, prior: f64) -> Self {
        if prior == 0.0 {
            Delta::NoData
        } else {
            Delta::Change((current - prior) / prior * 100.0)
        }
    }

    pub fn trend(&self) -> Trend {
        match self {
            Delta::Change(pct) if *pct > 0.0 => Trend::Positive,
            Delta::Change(pct) if *pct < 0.0 => Trend::Negative,
            _ => Trend::Neutral,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Delta::NoData => "no data".to_string(),
            Delta::Change(pct) if *pct > 0.0 => format!("+{:.1}%", pct),
            Delta::Change(pct) if *pct < 0.0 => format!("{:.1}%", pct),
            Delta::Change(_) => "0.0%".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn txn(date: NaiveDate, vendor: &str, category: &str, amount: f64, ppi: bool) -> Transaction {
        Transaction {
            transaction_id: format!("TXN-{date}-{vendor}"),
            transaction_date: date,
            facility_name: "Memorial".to_string(),
            department: category.to_string(),
            spend_category: category.to_string(),
            vendor_name: vendor.to_string(),
            product_description: "Item".to_string(),
            unit_price: amount,
            quantity: 1,
            total_amount: amount,
            contract_type: "GPO".to_string(),
            ppi_flag: ppi,
        }
    }

    #[test]
    fn test_kpis_on_empty_table() {
        let k = calculate_kpis(&[]);
        assert_eq!(
            k,
            KpiSnapshot {
                total_spend: 0.0,
                transaction_count: 0,
                unique_vendors: 0,
                ppi_spend_pct: 0.0,
                avg_transaction: 0.0,
            }
        );
        assert!(!k.ppi_spend_pct.is_nan());
    }

    #[test]
    fn test_kpis_basic() {
        let data = vec![
            txn(d(2024, 1, 1), "Stryker", "Orthopedics", 300.0, true),
            txn(d(2024, 1, 2), "Stryker", "Orthopedics", 100.0, false),
            txn(d(2024, 1, 3), "Philips", "Radiology", 600.0, true),
        ];
        let k = calculate_kpis(&data);
        assert_eq!(k.total_spend, 1000.0);
        assert_eq!(k.transaction_count, 3);
        assert_eq!(k.unique_vendors, 2);
        assert_eq!(k.ppi_spend_pct, 90.0);
        assert!((k.avg_transaction - 333.333).abs() < 0.001);
        assert!(k.ppi_warning());
    }

    #[test]
    fn test_total_spend_equals_row_sum() {
        let amounts = [0.1, 0.2, 0.3, 1234.56, 7.89];
        let data: Vec<Transaction> = amounts
            .iter()
            .map(|a| txn(d(2024, 5, 1), "BD", "Surgical Supplies", *a, false))
            .collect();
        let expected: f64 = data.iter().map(|t| t.total_amount).sum();
        assert_eq!(calculate_kpis(&data).total_spend, expected);
    }

    #[test]
    fn test_prior_window_across_leap_day() {
        assert_eq!(
            prior_window(d(2024, 3, 1), d(2024, 3, 31)),
            Some((d(2024, 1, 29), d(2024, 2, 29)))
        );
        assert_eq!(
            prior_window(d(2023, 3, 1), d(2023, 3, 31)),
            Some((d(2023, 1, 28), d(2023, 2, 28)))
        );
        assert_eq!(
            prior_window(d(2024, 6, 10), d(2024, 6, 10)),
            Some((d(2024, 6, 8), d(2024, 6, 9)))
        );
        assert_eq!(prior_window(d(2024, 3, 31), d(2024, 3, 1)), None);
    }

    #[test]
    fn test_prior_period_ignores_other_facets() {
        let full = vec![
            txn(d(2024, 1, 28), "Stryker", "Orthopedics", 10.0, true),
            txn(d(2024, 1, 29), "Stryker", "Orthopedics", 100.0, true),
            txn(d(2024, 2, 15), "Philips", "Radiology", 50.0, false),
            txn(d(2024, 2, 29), "Abbott", "Vascular", 25.0, false),
            txn(d(2024, 3, 1), "Abbott", "Vascular", 999.0, false),
        ];
        let prior = calculate_prior_period(&full, d(2024, 3, 1), d(2024, 3, 31));
        assert_eq!(prior.transaction_count, 3);
        assert_eq!(prior.total_spend, 175.0);
        assert_eq!(prior.unique_vendors, 3);
    }

    #[test]
    fn test_delta_labels() {
        let up = Delta::between(120.0, 100.0);
        assert_eq!(up.label(), "+20.0%");
        assert_eq!(up.trend(), Trend::Positive);

        let down = Delta::between(80.0, 100.0);
        assert_eq!(down.label(), "-20.0%");
        assert_eq!(down.trend(), Trend::Negative);

        for current in [0.0, 5.0, 1e9] {
            let none = Delta::between(current, 0.0);
            assert_eq!(none, Delta::NoData);
            assert_eq!(none.label(), "no data");
            assert_eq!(none.trend(), Trend::Neutral);
        }

        let flat = Delta::between(100.0, 100.0);
        assert_eq!(flat.label(), "0.0%");
        assert_eq!(flat.trend(), Trend::Neutral);
        assert_eq!(up.trend().symbol(), "▲");
    }
}
