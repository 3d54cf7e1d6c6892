use crate::types::Transaction;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// The user's facet selections.
///
/// An empty facet never restricts anything, so `FilterSelection::default()`
/// is also the reset state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    /// Inclusive on both ends.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub facilities: Vec<String>,
    pub categories: Vec<String>,
    pub vendors: Vec<String>,
    pub contract_types: Vec<String>,
    pub ppi_only: bool,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }

    pub fn with_facilities<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facilities = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_vendors<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vendors = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_contract_types<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contract_types = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn ppi_only(mut self, on: bool) -> Self {
        self.ppi_only = on;
        self
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when no facet restricts the table.
    pub fn is_empty(&self) -> bool {
        self.date_range.is_none()
            && self.facilities.is_empty()
            && self.categories.is_empty()
            && self.vendors.is_empty()
            && self.contract_types.is_empty()
            && !self.ppi_only
    }

    /// Count facets that actually narrow the view. A date range equal to the
    /// table's full extent does not count.
    pub fn active_count(&self, extent: Option<(NaiveDate, NaiveDate)>) -> usize {
        let date_active = match (self.date_range, extent) {
            (Some(range), Some(full)) => range != full,
            (Some(_), None) => true,
            (None, _) => false,
        };
        [
            date_active,
            !self.facilities.is_empty(),
            !self.categories.is_empty(),
            !self.vendors.is_empty(),
            !self.contract_types.is_empty(),
            self.ppi_only,
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        if let Some((start, end)) = self.date_range {
            if t.transaction_date < start || t.transaction_date > end {
                return false;
            }
        }
        member(&self.facilities, &t.facility_name)
            && member(&self.categories, &t.spend_category)
            && member(&self.vendors, &t.vendor_name)
            && member(&self.contract_types, &t.contract_type)
            && (!self.ppi_only || t.ppi_flag)
    }
}

fn member(selected: &[String], value: &str) -> bool {
    selected.is_empty() || selected.iter().any(|s| s == value)
}

/// Rows of `data` that satisfy every active facet, in input order.
pub fn apply_filters(data: &[Transaction], selection: &FilterSelection) -> Vec<Transaction> {
    data.iter()
        .filter(|t| selection.matches(t))
        .cloned()
        .collect()
}

/// Rows dated within `[start, end]`, ignoring every other facet.
pub fn within_dates(data: &[Transaction], start: NaiveDate, end: NaiveDate) -> Vec<Transaction> {
    apply_filters(data, &FilterSelection::new().with_date_range(start, end))
}

/// Earliest and latest transaction date, `None` for an empty table.
pub fn date_extent(data: &[Transaction]) -> Option<(NaiveDate, NaiveDate)> {
    let min = data.iter().map(|t| t.transaction_date).min()?;
    let max = data.iter().map(|t| t.transaction_date).max()?;
    Some((min, max))
}

pub fn facility_options(data: &[Transaction]) -> Vec<String> {
    distinct(data.iter().map(|t| t.facility_name.as_str()))
}

pub fn category_options(data: &[Transaction]) -> Vec<String> {
    distinct(data.iter().map(|t| t.spend_category.as_str()))
}

pub fn contract_type_options(data: &[Transaction]) -> Vec<String> {
    distinct(data.iter().map(|t| t.contract_type.as_str()))
}

/// Vendors ordered by descending total spend, ties by name.
pub fn vendor_options(data: &[Transaction]) -> Vec<String> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for t in data {
        *totals.entry(t.vendor_name.as_str()).or_insert(0.0) += t.total_amount;
    }
    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().map(|(v, _)| v.to_string()).collect()
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
