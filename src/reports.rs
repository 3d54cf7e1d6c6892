use crate::types::{
    CategoryContractMix, CategorySpend, FacilityBreakdown, FacilityCategorySpend, FacilityPpiMix,
    MonthlySpend, MonthlyTrend, Opportunity, OpportunityReport, Transaction, VendorContractSpend,
    VendorShare, CONTRACT_GPO, CONTRACT_LOCAL, CONTRACT_OFF,
};
use crate::util::percent_of;
use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_TOP_VENDORS: usize = 15;

/// Categories whose off-contract share is strictly above this are flagged.
pub const OFF_CONTRACT_THRESHOLD_PCT: f64 = 20.0;

#[derive(Default)]
struct ContractAcc {
    gpo: f64,
    local: f64,
    off_contract: f64,
    total: f64,
}

impl ContractAcc {
    fn add(&mut self, t: &Transaction) {
        match t.contract_type.as_str() {
            CONTRACT_GPO => self.gpo += t.total_amount,
            CONTRACT_LOCAL => self.local += t.total_amount,
            CONTRACT_OFF => self.off_contract += t.total_amount,
            _ => {}
        }
        self.total += t.total_amount;
    }
}

fn totals_by<'a, F>(data: &'a [Transaction], key: F) -> HashMap<&'a str, f64>
where
    F: Fn(&'a Transaction) -> &'a str,
{
    let mut map: HashMap<&str, f64> = HashMap::new();
    for t in data {
        *map.entry(key(t)).or_insert(0.0) += t.total_amount;
    }
    map
}

fn by_total(a: (&str, f64), b: (&str, f64), descending: bool) -> Ordering {
    let ord = a.1.total_cmp(&b.1);
    let ord = if descending { ord.reverse() } else { ord };
    ord.then_with(|| a.0.cmp(b.0))
}

/// Keys of `totals` sorted by value, ties broken by name.
fn ranked(totals: &HashMap<&str, f64>, descending: bool) -> Vec<String> {
    let mut keys: Vec<(&str, f64)> = totals.iter().map(|(k, v)| (*k, *v)).collect();
    keys.sort_by(|a, b| by_total(*a, *b, descending));
    keys.into_iter().map(|(k, _)| k.to_string()).collect()
}

fn position_map(order: &[String]) -> HashMap<&str, usize> {
    order
        .iter()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect()
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Spend per category, smallest first so the largest bar lands on top.
pub fn spend_by_category(data: &[Transaction]) -> Vec<CategorySpend> {
    let totals = totals_by(data, |t| t.spend_category.as_str());
    ranked(&totals, false)
        .into_iter()
        .map(|category| {
            let total = totals[category.as_str()];
            CategorySpend { category, total }
        })
        .collect()
}

/// Spend per calendar month and category.
pub fn monthly_spend_trend(data: &[Transaction]) -> MonthlyTrend {
    let category_order = ranked(&totals_by(data, |t| t.spend_category.as_str()), true);

    let mut cells: HashMap<(NaiveDate, &str), f64> = HashMap::new();
    for t in data {
        *cells
            .entry((month_start(t.transaction_date), t.spend_category.as_str()))
            .or_insert(0.0) += t.total_amount;
    }

    let pos = position_map(&category_order);
    let mut rows: Vec<MonthlySpend> = cells
        .into_iter()
        .map(|((month, category), total)| MonthlySpend {
            month,
            category: category.to_string(),
            total,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.month
            .cmp(&b.month)
            .then_with(|| pos[a.category.as_str()].cmp(&pos[b.category.as_str()]))
    });

    MonthlyTrend {
        category_order,
        rows,
    }
}

/// The `top_n` vendors by spend, split by contract type, smallest first.
pub fn top_vendors_by_spend(data: &[Transaction], top_n: usize) -> Vec<VendorContractSpend> {
    let mut map: HashMap<&str, ContractAcc> = HashMap::new();
    for t in data {
        map.entry(t.vendor_name.as_str()).or_default().add(t);
    }

    let mut vendors: Vec<(&str, ContractAcc)> = map.into_iter().collect();
    vendors.sort_by(|a, b| by_total((a.0, a.1.total), (b.0, b.1.total), true));
    vendors.truncate(top_n);
    vendors.reverse();

    vendors
        .into_iter()
        .map(|(vendor, acc)| VendorContractSpend {
            vendor: vendor.to_string(),
            gpo: acc.gpo,
            local: acc.local,
            off_contract: acc.off_contract,
            total: acc.total,
        })
        .collect()
}

/// Each vendor's share of total spend, largest first.
pub fn vendor_concentration(data: &[Transaction]) -> Vec<VendorShare> {
    let totals = totals_by(data, |t| t.vendor_name.as_str());
    let grand_total: f64 = data.iter().map(|t| t.total_amount).sum();
    ranked(&totals, true)
        .into_iter()
        .map(|vendor| {
            let total = totals[vendor.as_str()];
            VendorShare {
                vendor,
                total,
                share_pct: percent_of(total, grand_total),
            }
        })
        .collect()
}

/// Stacked facility bars: facilities and categories both by descending spend.
pub fn spend_by_facility(data: &[Transaction]) -> FacilityBreakdown {
    let facility_order = ranked(&totals_by(data, |t| t.facility_name.as_str()), true);
    let category_order = ranked(&totals_by(data, |t| t.spend_category.as_str()), true);

    let mut cells: HashMap<(&str, &str), f64> = HashMap::new();
    for t in data {
        *cells
            .entry((t.facility_name.as_str(), t.spend_category.as_str()))
            .or_insert(0.0) += t.total_amount;
    }

    let fac_pos = position_map(&facility_order);
    let cat_pos = position_map(&category_order);
    let mut rows: Vec<FacilityCategorySpend> = cells
        .into_iter()
        .map(|((facility, category), total)| FacilityCategorySpend {
            facility: facility.to_string(),
            category: category.to_string(),
            total,
        })
        .collect();
    rows.sort_by(|a, b| {
        fac_pos[a.facility.as_str()]
            .cmp(&fac_pos[b.facility.as_str()])
            .then_with(|| cat_pos[a.category.as_str()].cmp(&cat_pos[b.category.as_str()]))
    });

    FacilityBreakdown {
        facility_order,
        category_order,
        rows,
    }
}

/// PPI versus non-PPI spend per facility, largest facility first.
pub fn facility_ppi_mix(data: &[Transaction]) -> Vec<FacilityPpiMix> {
    #[derive(Default)]
    struct Acc {
        ppi: f64,
        non_ppi: f64,
    }
    let mut map: HashMap<&str, Acc> = HashMap::new();
    for t in data {
        let e = map.entry(t.facility_name.as_str()).or_default();
        if t.ppi_flag {
            e.ppi += t.total_amount;
        } else {
            e.non_ppi += t.total_amount;
        }
    }

    let mut rows: Vec<FacilityPpiMix> = map
        .into_iter()
        .map(|(facility, acc)| FacilityPpiMix {
            facility: facility.to_string(),
            ppi: acc.ppi,
            non_ppi: acc.non_ppi,
            total: acc.ppi + acc.non_ppi,
        })
        .collect();
    rows.sort_by(|a, b| by_total((a.facility.as_str(), a.total), (b.facility.as_str(), b.total), true));
    rows
}

/// Contract-type percentages per category, smallest category first.
///
/// Percentages use the category's full spend as denominator, so they sum to
/// 100 whenever every row carries one of the three known contract types.
pub fn contract_type_by_category(data: &[Transaction]) -> Vec<CategoryContractMix> {
    let mut map: HashMap<&str, ContractAcc> = HashMap::new();
    for t in data {
        map.entry(t.spend_category.as_str()).or_default().add(t);
    }

    let mut rows: Vec<CategoryContractMix> = map
        .into_iter()
        .map(|(category, acc)| CategoryContractMix {
            category: category.to_string(),
            total: acc.total,
            gpo_pct: percent_of(acc.gpo, acc.total),
            local_pct: percent_of(acc.local, acc.total),
            off_contract_pct: percent_of(acc.off_contract, acc.total),
        })
        .collect();
    rows.sort_by(|a, b| by_total((a.category.as_str(), a.total), (b.category.as_str(), b.total), false));
    rows
}

/// Categories spending more than [`OFF_CONTRACT_THRESHOLD_PCT`] off contract,
/// highest share first.
pub fn off_contract_opportunities(data: &[Transaction]) -> OpportunityReport {
    let mut map: HashMap<&str, ContractAcc> = HashMap::new();
    for t in data {
        map.entry(t.spend_category.as_str()).or_default().add(t);
    }
    let categories_evaluated = map.len();

    let mut rows: Vec<Opportunity> = map
        .into_iter()
        .map(|(category, acc)| Opportunity {
            category: category.to_string(),
            total_spend: acc.total,
            off_contract_spend: acc.off_contract,
            off_contract_pct: percent_of(acc.off_contract, acc.total),
        })
        .filter(|o| o.off_contract_pct > OFF_CONTRACT_THRESHOLD_PCT)
        .collect();
    rows.sort_by(|a, b| {
        b.off_contract_pct
            .total_cmp(&a.off_contract_pct)
            .then_with(|| a.category.cmp(&b.category))
    });

    OpportunityReport {
        categories_evaluated,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn txn(
        date: NaiveDate,
        facility: &str,
        category: &str,
        vendor: &str,
        contract: &str,
        amount: f64,
        ppi: bool,
    ) -> Transaction {
        Transaction {
            transaction_id: format!("TXN-{date}-{vendor}-{amount}"),
            transaction_date: date,
            facility_name: facility.to_string(),
            department: category.to_string(),
            spend_category: category.to_string(),
            vendor_name: vendor.to_string(),
            product_description: "Item".to_string(),
            unit_price: amount,
            quantity: 1,
            total_amount: amount,
            contract_type: contract.to_string(),
            ppi_flag: ppi,
        }
    }

    fn three_rows() -> Vec<Transaction> {
        vec![
            txn(d(2024, 1, 5), "North", "Cat A", "Stryker", "GPO", 100.0, true),
            txn(d(2024, 1, 20), "North", "Cat A", "Zimmer", "Off-Contract", 50.0, false),
            txn(d(2024, 2, 3), "South", "Cat B", "Philips", "Local", 200.0, false),
        ]
    }

    #[test]
    fn test_spend_by_category_scenario() {
        let rows = spend_by_category(&three_rows());
        assert_eq!(
            rows,
            vec![
                CategorySpend { category: "Cat A".to_string(), total: 150.0 },
                CategorySpend { category: "Cat B".to_string(), total: 200.0 },
            ]
        );
    }

    #[test]
    fn test_opportunities_scenario() {
        let report = off_contract_opportunities(&three_rows());
        assert!(report.has_data());
        assert_eq!(report.categories_evaluated, 2);
        assert_eq!(report.rows.len(), 1);
        let a = &report.rows[0];
        assert_eq!(a.category, "Cat A");
        assert_eq!(a.total_spend, 150.0);
        assert_eq!(a.off_contract_spend, 50.0);
        assert!((a.off_contract_pct - 33.333).abs() < 0.001);
    }

    #[test]
    fn test_opportunity_threshold_is_strict() {
        let data = vec![
            txn(d(2024, 1, 1), "North", "Over", "V", "Off-Contract", 25_000.0, false),
            txn(d(2024, 1, 1), "North", "Over", "V", "GPO", 75_000.0, false),
            txn(d(2024, 1, 1), "North", "Exact", "V", "Off-Contract", 20_000.0, false),
            txn(d(2024, 1, 1), "North", "Exact", "V", "Local", 80_000.0, false),
            txn(d(2024, 1, 1), "North", "Most", "V", "Off-Contract", 60.0, false),
            txn(d(2024, 1, 1), "North", "Most", "V", "GPO", 40.0, false),
        ];
        let report = off_contract_opportunities(&data);
        let names: Vec<&str> = report.rows.iter().map(|o| o.category.as_str()).collect();
        assert_eq!(names, vec!["Most", "Over"]);
        assert_eq!(report.rows[1].off_contract_pct, 25.0);
        assert_eq!(report.rows[1].total_spend, 100_000.0);
    }

    #[test]
    fn test_no_opportunities_differs_from_no_data() {
        let data = vec![txn(d(2024, 1, 1), "North", "Cat", "V", "GPO", 10.0, false)];
        let none_flagged = off_contract_opportunities(&data);
        assert!(none_flagged.rows.is_empty());
        assert!(none_flagged.has_data());

        let empty = off_contract_opportunities(&[]);
        assert!(empty.rows.is_empty());
        assert!(!empty.has_data());
    }

    #[test]
    fn test_monthly_trend_truncates_to_month() {
        let data = vec![
            txn(d(2024, 1, 5), "North", "Small", "V", "GPO", 10.0, false),
            txn(d(2024, 1, 31), "North", "Big", "V", "GPO", 100.0, false),
            txn(d(2024, 1, 2), "North", "Big", "V", "GPO", 50.0, false),
            txn(d(2024, 2, 1), "North", "Small", "V", "GPO", 30.0, false),
        ];
        let trend = monthly_spend_trend(&data);
        assert_eq!(trend.category_order, vec!["Big", "Small"]);
        let cells: Vec<(NaiveDate, &str, f64)> = trend
            .rows
            .iter()
            .map(|r| (r.month, r.category.as_str(), r.total))
            .collect();
        assert_eq!(
            cells,
            vec![
                (d(2024, 1, 1), "Big", 150.0),
                (d(2024, 1, 1), "Small", 10.0),
                (d(2024, 2, 1), "Small", 30.0),
            ]
        );
    }

    #[test]
    fn test_top_vendors_limit_and_contract_split() {
        let data = vec![
            txn(d(2024, 1, 1), "N", "C", "Alpha", "GPO", 100.0, false),
            txn(d(2024, 1, 1), "N", "C", "Alpha", "Off-Contract", 40.0, false),
            txn(d(2024, 1, 1), "N", "C", "Beta", "Local", 300.0, false),
            txn(d(2024, 1, 1), "N", "C", "Gamma", "GPO", 10.0, false),
            txn(d(2024, 1, 1), "N", "C", "Delta", "Local", 200.0, false),
        ];
        let top = top_vendors_by_spend(&data, 3);
        let names: Vec<&str> = top.iter().map(|v| v.vendor.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Delta", "Beta"]);
        assert_eq!(top[0].gpo, 100.0);
        assert_eq!(top[0].off_contract, 40.0);
        assert_eq!(top[0].local, 0.0);
        assert_eq!(top[0].total, 140.0);

        assert_eq!(top_vendors_by_spend(&data, DEFAULT_TOP_VENDORS).len(), 4);
    }

    #[test]
    fn test_vendor_concentration_shares() {
        let data = vec![
            txn(d(2024, 1, 1), "N", "C", "Alpha", "GPO", 250.0, false),
            txn(d(2024, 1, 1), "N", "C", "Beta", "GPO", 750.0, false),
        ];
        let shares = vendor_concentration(&data);
        assert_eq!(shares[0].vendor, "Beta");
        assert_eq!(shares[0].share_pct, 75.0);
        assert_eq!(shares[1].share_pct, 25.0);
    }

    #[test]
    fn test_spend_by_facility_orders() {
        let data = vec![
            txn(d(2024, 1, 1), "Small Clinic", "Radiology", "V", "GPO", 50.0, false),
            txn(d(2024, 1, 1), "Big Hospital", "Radiology", "V", "GPO", 100.0, false),
            txn(d(2024, 1, 1), "Big Hospital", "Orthopedics", "V", "GPO", 400.0, true),
        ];
        let breakdown = spend_by_facility(&data);
        assert_eq!(breakdown.facility_order, vec!["Big Hospital", "Small Clinic"]);
        assert_eq!(breakdown.category_order, vec!["Orthopedics", "Radiology"]);
        let cells: Vec<(&str, &str)> = breakdown
            .rows
            .iter()
            .map(|r| (r.facility.as_str(), r.category.as_str()))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("Big Hospital", "Orthopedics"),
                ("Big Hospital", "Radiology"),
                ("Small Clinic", "Radiology"),
            ]
        );
    }

    #[test]
    fn test_facility_ppi_mix() {
        let data = vec![
            txn(d(2024, 1, 1), "A", "C", "V", "GPO", 30.0, true),
            txn(d(2024, 1, 1), "A", "C", "V", "GPO", 20.0, false),
            txn(d(2024, 1, 1), "B", "C", "V", "GPO", 90.0, false),
        ];
        let mix = facility_ppi_mix(&data);
        assert_eq!(mix[0].facility, "B");
        assert_eq!(mix[0].ppi, 0.0);
        assert_eq!(mix[1].ppi, 30.0);
        assert_eq!(mix[1].non_ppi, 20.0);
    }

    #[test]
    fn test_contract_mix_sums_to_hundred() {
        let data = vec![
            txn(d(2024, 1, 1), "A", "Big", "V", "GPO", 500.0, false),
            txn(d(2024, 1, 1), "A", "Big", "V", "Local", 300.0, false),
            txn(d(2024, 1, 1), "A", "Big", "V", "Off-Contract", 200.0, false),
            txn(d(2024, 1, 1), "A", "Small", "V", "GPO", 10.0, false),
        ];
        let mix = contract_type_by_category(&data);
        assert_eq!(mix[0].category, "Small");
        assert_eq!(mix[0].gpo_pct, 100.0);
        assert_eq!(mix[0].off_contract_pct, 0.0);
        let big = &mix[1];
        assert_eq!((big.gpo_pct, big.local_pct, big.off_contract_pct), (50.0, 30.0, 20.0));
        assert!((big.gpo_pct + big.local_pct + big.off_contract_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_every_view_handles_empty_input() {
        assert!(spend_by_category(&[]).is_empty());
        let trend = monthly_spend_trend(&[]);
        assert!(trend.rows.is_empty() && trend.category_order.is_empty());
        assert!(top_vendors_by_spend(&[], DEFAULT_TOP_VENDORS).is_empty());
        assert!(vendor_concentration(&[]).is_empty());
        let facilities = spend_by_facility(&[]);
        assert!(facilities.rows.is_empty() && facilities.facility_order.is_empty());
        assert!(facility_ppi_mix(&[]).is_empty());
        assert!(contract_type_by_category(&[]).is_empty());
        assert!(off_contract_opportunities(&[]).rows.is_empty());
    }

    #[test]
    fn test_views_are_repeatable() {
        let data = three_rows();
        assert_eq!(spend_by_facility(&data), spend_by_facility(&data));
        assert_eq!(monthly_spend_trend(&data), monthly_spend_trend(&data));
        assert_eq!(off_contract_opportunities(&data), off_contract_opportunities(&data));
    }
}
