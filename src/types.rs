use crate::util::{display_money, display_pct};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

pub const CONTRACT_GPO: &str = "GPO";
pub const CONTRACT_LOCAL: &str = "Local";
pub const CONTRACT_OFF: &str = "Off-Contract";

/// Stacking order for every contract-type breakdown.
pub const CONTRACT_TYPES: [&str; 3] = [CONTRACT_GPO, CONTRACT_LOCAL, CONTRACT_OFF];

/// Columns every data file must carry, in export order.
pub const EXPECTED_COLUMNS: [&str; 12] = [
    "transaction_id",
    "transaction_date",
    "facility_name",
    "department",
    "spend_category",
    "vendor_name",
    "product_description",
    "unit_price",
    "quantity",
    "total_amount",
    "contract_type",
    "ppi_flag",
];

/// One CSV row exactly as read; coercion happens in the loader.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    pub transaction_id: String,
    pub transaction_date: String,
    pub facility_name: String,
    pub department: String,
    pub spend_category: String,
    pub vendor_name: String,
    pub product_description: String,
    pub unit_price: String,
    pub quantity: String,
    pub total_amount: String,
    pub contract_type: String,
    pub ppi_flag: String,
}

/// A single procurement line item.
///
/// Field order matches [`EXPECTED_COLUMNS`] so serializing a slice of these
/// reproduces the input schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub transaction_date: NaiveDate,
    pub facility_name: String,
    pub department: String,
    pub spend_category: String,
    pub vendor_name: String,
    pub product_description: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub total_amount: f64,
    pub contract_type: String,
    pub ppi_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CategorySpend {
    #[tabled(rename = "Spend Category")]
    pub category: String,
    #[tabled(rename = "Spend", display_with = "display_money")]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct MonthlySpend {
    #[tabled(rename = "Month")]
    pub month: NaiveDate,
    #[tabled(rename = "Spend Category")]
    pub category: String,
    #[tabled(rename = "Spend", display_with = "display_money")]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    /// Categories by descending spend across the whole input.
    pub category_order: Vec<String>,
    /// Sorted by month, then by `category_order`.
    pub rows: Vec<MonthlySpend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct VendorContractSpend {
    #[tabled(rename = "Vendor")]
    pub vendor: String,
    #[tabled(rename = "GPO", display_with = "display_money")]
    pub gpo: f64,
    #[tabled(rename = "Local", display_with = "display_money")]
    pub local: f64,
    #[tabled(rename = "Off-Contract", display_with = "display_money")]
    pub off_contract: f64,
    #[tabled(rename = "Total", display_with = "display_money")]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct VendorShare {
    #[tabled(rename = "Vendor")]
    pub vendor: String,
    #[tabled(rename = "Spend", display_with = "display_money")]
    pub total: f64,
    #[tabled(rename = "Share", display_with = "display_pct")]
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct FacilityCategorySpend {
    #[tabled(rename = "Facility")]
    pub facility: String,
    #[tabled(rename = "Spend Category")]
    pub category: String,
    #[tabled(rename = "Spend", display_with = "display_money")]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityBreakdown {
    pub facility_order: Vec<String>,
    pub category_order: Vec<String>,
    /// Sorted by `facility_order`, then by `category_order`.
    pub rows: Vec<FacilityCategorySpend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct FacilityPpiMix {
    #[tabled(rename = "Facility")]
    pub facility: String,
    #[tabled(rename = "PPI", display_with = "display_money")]
    pub ppi: f64,
    #[tabled(rename = "Non-PPI", display_with = "display_money")]
    pub non_ppi: f64,
    #[tabled(rename = "Total", display_with = "display_money")]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CategoryContractMix {
    #[tabled(rename = "Spend Category")]
    pub category: String,
    #[tabled(rename = "Total", display_with = "display_money")]
    pub total: f64,
    #[tabled(rename = "GPO %", display_with = "display_pct")]
    pub gpo_pct: f64,
    #[tabled(rename = "Local %", display_with = "display_pct")]
    pub local_pct: f64,
    #[tabled(rename = "Off-Contract %", display_with = "display_pct")]
    pub off_contract_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct Opportunity {
    #[tabled(rename = "Spend Category")]
    pub category: String,
    #[tabled(rename = "Total Category Spend", display_with = "display_money")]
    pub total_spend: f64,
    #[tabled(rename = "Off-Contract Spend", display_with = "display_money")]
    pub off_contract_spend: f64,
    #[tabled(rename = "Off-Contract %", display_with = "display_pct")]
    pub off_contract_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityReport {
    /// Distinct categories in the input; zero means there was no data at all.
    pub categories_evaluated: usize,
    pub rows: Vec<Opportunity>,
}

impl OpportunityReport {
    pub fn has_data(&self) -> bool {
        self.categories_evaluated > 0
    }
}
