use crate::error::{Result, SpendError};
use crate::types::{RawRow, Transaction, EXPECTED_COLUMNS};
use crate::util::{parse_bool, parse_date, parse_f64, parse_i64};
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// Parsed tables by path. Entries are immutable once inserted; a process only
// re-reads a file after `clear_cache`.
static TABLE_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<Vec<Transaction>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Load the table at `path`, reusing the parsed copy if this process has
/// already read it.
pub fn load_data(path: &Path) -> Result<Arc<Vec<Transaction>>> {
    let mut cache = TABLE_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(table) = cache.get(path) {
        log::debug!("Using cached table for {}", path.display());
        return Ok(Arc::clone(table));
    }
    let table = Arc::new(load_transactions(path)?);
    log::info!(
        "Loaded {} transactions from {}",
        table.len(),
        path.display()
    );
    cache.insert(path.to_path_buf(), Arc::clone(&table));
    Ok(table)
}

pub fn clear_cache() {
    TABLE_CACHE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clear();
}

/// Read and validate a data file without touching the cache.
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    if !path.exists() {
        return Err(SpendError::NotFound(path.to_path_buf()));
    }
    let mut rdr = ReaderBuilder::new().from_path(path)?;
    let headers = rdr.headers()?.clone();

    let present: HashSet<&str> = headers.iter().collect();
    let missing: Vec<String> = EXPECTED_COLUMNS
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SpendError::Schema(missing));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRow = record.deserialize(Some(&headers))?;
        rows.push(coerce_row(raw, line)?);
    }
    Ok(rows)
}

fn coerce_row(row: RawRow, line: u64) -> Result<Transaction> {
    let bad = |column: &'static str, value: &str| SpendError::Parse {
        line,
        column,
        value: value.to_string(),
    };

    let transaction_date = parse_date(&row.transaction_date)
        .ok_or_else(|| bad("transaction_date", &row.transaction_date))?;
    let unit_price =
        parse_f64(&row.unit_price).ok_or_else(|| bad("unit_price", &row.unit_price))?;
    let quantity = parse_i64(&row.quantity).ok_or_else(|| bad("quantity", &row.quantity))?;
    let total_amount =
        parse_f64(&row.total_amount).ok_or_else(|| bad("total_amount", &row.total_amount))?;
    let ppi_flag = parse_bool(&row.ppi_flag).ok_or_else(|| bad("ppi_flag", &row.ppi_flag))?;

    Ok(Transaction {
        transaction_id: row.transaction_id.trim().to_string(),
        transaction_date,
        facility_name: row.facility_name.trim().to_string(),
        department: row.department.trim().to_string(),
        spend_category: row.spend_category.trim().to_string(),
        vendor_name: row.vendor_name.trim().to_string(),
        product_description: row.product_description.trim().to_string(),
        unit_price,
        quantity,
        total_amount,
        contract_type: row.contract_type.trim().to_string(),
        ppi_flag,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HEADER: &str = "transaction_id,transaction_date,facility_name,department,spend_category,vendor_name,product_description,unit_price,quantity,total_amount,contract_type,ppi_flag";

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{HEADER}\n\
             TXN-100001,2024-01-05,Northside Community Hospital,Vascular,Vascular,Abbott,PICC Line Kit,120.50,2,241.00,GPO,True\n\
             TXN-100002,2024-01-06,Riverside General Hospital,Radiology,Radiology,Philips,Lead Apron — Lightweight,300,1,300,Off-Contract,false\n"
        );
        let path = write_file(&dir, "spend.csv", &body);
        let rows = load_transactions(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].transaction_date, chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(rows[0].quantity, 2);
        assert_eq!(rows[0].total_amount, 241.0);
        assert!(rows[0].ppi_flag);
        assert!(!rows[1].ppi_flag);
        assert_eq!(rows[1].product_description, "Lead Apron — Lightweight");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_transactions(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, SpendError::NotFound(_)));
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "partial.csv",
            "transaction_id,transaction_date,facility_name,department,spend_category,vendor_name,product_description,unit_price,quantity,total_amount\n",
        );
        match load_transactions(&path).unwrap_err() {
            SpendError::Schema(missing) => {
                assert_eq!(missing, vec!["contract_type".to_string(), "ppi_flag".to_string()]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_amount_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{HEADER}\n\
             TXN-1,2024-01-05,A,Cat,Cat,V,P,10,1,10,GPO,false\n\
             TXN-2,2024-01-06,A,Cat,Cat,V,P,ten,1,10,GPO,false\n"
        );
        let path = write_file(&dir, "bad.csv", &body);
        match load_transactions(&path).unwrap_err() {
            SpendError::Parse { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, "unit_price");
                assert_eq!(value, "ten");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_extra_columns_and_reordered_header_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let body = "ppi_flag,notes,transaction_id,transaction_date,facility_name,department,spend_category,vendor_name,product_description,unit_price,quantity,total_amount,contract_type\n\
                    true,x,TXN-9,2025-12-31,F,C,C,V,P,5.5,2,11,Local\n";
        let path = write_file(&dir, "reordered.csv", body);
        let rows = load_transactions(&path).unwrap();
        assert_eq!(rows[0].transaction_id, "TXN-9");
        assert_eq!(rows[0].contract_type, "Local");
        assert!(rows[0].ppi_flag);
    }

    #[test]
    fn test_load_data_is_memoized_until_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{HEADER}\nTXN-1,2024-01-05,A,Cat,Cat,V,P,10,1,10,GPO,false\n");
        let path = write_file(&dir, "cached.csv", &body);

        let first = load_data(&path).unwrap();
        fs::write(&path, format!("{HEADER}\n")).unwrap();
        let second = load_data(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);

        clear_cache();
        let third = load_data(&path).unwrap();
        assert!(third.is_empty());
    }
}
