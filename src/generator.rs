use crate::error::{Result, SpendError};
use crate::types::{Transaction, CONTRACT_OFF, CONTRACT_TYPES};
use crate::filters::{category_options, date_extent, facility_options};
use crate::kpi::calculate_kpis;
use crate::reports::{spend_by_category, vendor_concentration};
use crate::util::{percent_of, round2};

use chrono::{Datelike, Days, NaiveDate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

pub const DEFAULT_SEED: u64 = 42;

pub struct GeneratorConfig {
    pub seed: u64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub first_id: u64,
    /// Multiplies both transaction counts and target spend per category.
    pub volume_scale: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MIN),
            first_id: 100_001,
            volume_scale: 1.0,
        }
    }
}

#[derive(Clone, Copy)]
enum QuantityProfile {
    /// Consumables ordered by the box or case.
    Bulk,
    /// Equipment and service lines, usually one at a time.
    Capital,
    Clinical,
}

impl QuantityProfile {
    fn choices(self) -> (&'static [i64], &'static [u32]) {
        match self {
            QuantityProfile::Bulk => (
                &[
                    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22,
                    23, 24,
                ],
                &[
                    20, 15, 12, 10, 8, 6, 5, 4, 3, 3, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
                ],
            ),
            QuantityProfile::Capital => (&[1, 2, 3, 4, 5], &[60, 20, 10, 5, 5]),
            QuantityProfile::Clinical => (
                &[1, 2, 3, 4, 5, 6, 7, 8, 9],
                &[40, 20, 15, 10, 5, 4, 3, 2, 1],
            ),
        }
    }
}

struct CategoryProfile {
    name: &'static str,
    target_spend: f64,
    target_txns: usize,
    ppi_rate: f64,
    /// GPO, Local, Off-Contract; same order as `CONTRACT_TYPES`.
    contract_weights: [f64; 3],
    quantity: QuantityProfile,
    vendors: &'static [(&'static str, f64)],
    /// Name, low and high unit price.
    products: &'static [(&'static str, f64, f64)],
}

const FACILITIES: &[(&str, f64)] = &[
    ("Memorial Regional Medical Center", 1.35),
    ("St. Joseph's University Hospital", 1.15),
    ("Valley Health System — Main Campus", 1.0),
    ("Northside Community Hospital", 0.65),
    ("Riverside General Hospital", 0.85),
];

/// Price multiplier by calendar month, January first.
const MONTHLY_SEASONALITY: [f64; 12] = [
    1.08, 1.05, 1.06, 1.02, 1.00, 0.98, 0.90, 0.92, 1.00, 1.03, 1.01, 0.95,
];

const OFF_CONTRACT_PREMIUM: (f64, f64) = (1.15, 1.30);

const CATEGORIES: &[CategoryProfile] = &[
    CategoryProfile {
        name: "Orthopedics",
        target_spend: 12_500_000.0,
        target_txns: 1100,
        ppi_rate: 0.95,
        contract_weights: [0.45, 0.35, 0.20],
        quantity: QuantityProfile::Clinical,
        vendors: &[
            ("Stryker", 0.22),
            ("DePuy Synthes", 0.20),
            ("Zimmer Biomet", 0.18),
            ("Smith+Nephew", 0.15),
            ("Medtronic", 0.10),
            ("Arthrex", 0.08),
            ("Globus Medical", 0.04),
            ("NuVasive", 0.03),
        ],
        products: &[
            ("Primary Total Hip System", 4500.0, 8500.0),
            ("Revision Hip Stem Component", 5500.0, 10000.0),
            ("Acetabular Cup w/ Liner", 2800.0, 5200.0),
            ("Primary Total Knee System", 4200.0, 7800.0),
            ("Revision Knee Tibial Baseplate", 3500.0, 6500.0),
            ("Partial Knee Unicompartmental System", 3200.0, 5800.0),
            ("Cervical Interbody Fusion Cage", 2200.0, 4500.0),
            ("Thoracolumbar Pedicle Screw Set", 1800.0, 3800.0),
            ("Spinal Rod System (Titanium)", 1200.0, 2800.0),
            ("Intramedullary Nail — Femoral", 1500.0, 3200.0),
            ("Intramedullary Nail — Tibial", 1200.0, 2800.0),
            ("Locking Plate System — Distal Radius", 800.0, 1800.0),
            ("Locking Plate System — Proximal Humerus", 900.0, 2200.0),
            ("Cannulated Screw Set (6.5mm)", 350.0, 850.0),
            ("Shoulder Arthroplasty System", 4800.0, 9200.0),
            ("Reverse Shoulder System", 5200.0, 9800.0),
            ("ACL Reconstruction Graft System", 1800.0, 3500.0),
            ("Meniscal Repair Device", 600.0, 1400.0),
            ("Bone Cement (40g)", 120.0, 350.0),
            ("Surgical Power Drill — Ortho", 2500.0, 5500.0),
        ],
    },
    CategoryProfile {
        name: "Biomedical Equipment",
        target_spend: 10_000_000.0,
        target_txns: 550,
        ppi_rate: 0.10,
        contract_weights: [0.50, 0.35, 0.15],
        quantity: QuantityProfile::Capital,
        vendors: &[
            ("GE Healthcare", 0.25),
            ("Philips", 0.22),
            ("Siemens Healthineers", 0.20),
            ("Agiliti", 0.15),
            ("Medtronic", 0.10),
            ("BD", 0.08),
        ],
        products: &[
            ("Patient Monitor — Bedside", 3500.0, 8500.0),
            ("Infusion Pump — Dual Channel", 2800.0, 6200.0),
            ("Ventilator — ICU", 18000.0, 35000.0),
            ("Defibrillator — Biphasic", 8000.0, 16000.0),
            ("Surgical Table — Powered", 25000.0, 55000.0),
            ("Electrosurgical Unit", 4500.0, 9500.0),
            ("Pulse Oximeter — Portable", 450.0, 1200.0),
            ("ECG Machine — 12-Lead", 3200.0, 7500.0),
            ("Suction Unit — Portable", 800.0, 2200.0),
            ("Sequential Compression Device", 1200.0, 3000.0),
            ("Fluid Warmer System", 2500.0, 5500.0),
            ("Surgical Headlight — LED", 1800.0, 4200.0),
            ("Transport Monitor", 5500.0, 12000.0),
            ("Bed — Med-Surg Electric", 6000.0, 14000.0),
            ("Stretcher — Emergency", 3500.0, 8000.0),
        ],
    },
    CategoryProfile {
        name: "Surgical Supplies",
        target_spend: 7_500_000.0,
        target_txns: 1400,
        ppi_rate: 0.05,
        contract_weights: [0.70, 0.20, 0.10],
        quantity: QuantityProfile::Bulk,
        vendors: &[
            ("Cardinal Health", 0.25),
            ("BD", 0.20),
            ("Teleflex", 0.15),
            ("B.Braun", 0.15),
            ("Baxter", 0.12),
            ("Medtronic", 0.08),
            ("Boston Scientific", 0.05),
        ],
        products: &[
            ("Surgical Stapler — Linear", 180.0, 450.0),
            ("Stapler Reload Cartridge (6-pack)", 250.0, 550.0),
            ("Hemostatic Agent — Topical", 120.0, 380.0),
            ("Surgical Suture — Absorbable (box)", 85.0, 220.0),
            ("Surgical Suture — Non-Absorbable (box)", 75.0, 195.0),
            ("Laparoscopic Trocar Set", 280.0, 650.0),
            ("Energy Device — Ultrasonic Shears", 350.0, 850.0),
            ("Surgical Drain — Closed Suction", 45.0, 120.0),
            ("Wound Closure Strip (box)", 35.0, 85.0),
            ("Irrigation Solution — 3L", 25.0, 65.0),
            ("Surgical Gloves — Sterile (case)", 85.0, 180.0),
            ("Surgical Gown — Sterile (case)", 120.0, 280.0),
            ("Drape — Surgical (case)", 95.0, 240.0),
            ("Scalpel — Disposable (box)", 40.0, 95.0),
            ("Specimen Container — Sterile (case)", 55.0, 130.0),
        ],
    },
    CategoryProfile {
        name: "Biologics & Wound Care",
        target_spend: 6_000_000.0,
        target_txns: 700,
        ppi_rate: 0.65,
        contract_weights: [0.45, 0.35, 0.20],
        quantity: QuantityProfile::Clinical,
        vendors: &[
            ("Integra LifeSciences", 0.22),
            ("Smith+Nephew", 0.18),
            ("ConvaTec", 0.16),
            ("Molnlycke", 0.15),
            ("KCI (3M+KCI)", 0.14),
            ("Medtronic", 0.08),
            ("Baxter", 0.07),
        ],
        products: &[
            ("Skin Substitute — Bioengineered (per cm²)", 350.0, 1200.0),
            ("Bone Graft Substitute — DBM Putty", 800.0, 2200.0),
            ("Negative Pressure Wound Therapy Kit", 450.0, 1100.0),
            ("NPWT Canister/Dressing Change Kit", 120.0, 350.0),
            ("Collagen Wound Dressing (box)", 180.0, 450.0),
            ("Antimicrobial Silver Dressing (box)", 150.0, 380.0),
            ("Foam Dressing — Adhesive (box)", 65.0, 180.0),
            ("Alginate Dressing (box)", 75.0, 200.0),
            ("Platelet-Rich Plasma Prep Kit", 350.0, 850.0),
            ("Tissue Sealant — Fibrin (5mL)", 280.0, 650.0),
            ("Hemostatic Matrix (5mL)", 320.0, 750.0),
            ("Bone Morphogenetic Protein Kit", 3500.0, 7500.0),
            ("Amniotic Membrane Allograft", 800.0, 2500.0),
        ],
    },
    CategoryProfile {
        name: "Radiology",
        target_spend: 5_000_000.0,
        target_txns: 450,
        ppi_rate: 0.05,
        contract_weights: [0.55, 0.30, 0.15],
        quantity: QuantityProfile::Clinical,
        vendors: &[
            ("GE Healthcare", 0.28),
            ("Philips", 0.25),
            ("Siemens Healthineers", 0.22),
            ("Hologic", 0.15),
            ("Canon Medical", 0.10),
        ],
        products: &[
            ("CT Contrast Agent — Iodinated (case)", 450.0, 1200.0),
            ("MRI Contrast Agent — Gadolinium (case)", 550.0, 1400.0),
            ("X-Ray Cassette — Digital DR Panel", 8000.0, 18000.0),
            ("Ultrasound Probe — Linear", 5500.0, 14000.0),
            ("Ultrasound Probe — Convex", 4800.0, 12000.0),
            ("Biopsy Needle — CT-Guided (box)", 280.0, 650.0),
            ("Mammography QC Phantom", 1200.0, 3500.0),
            ("Radiation Dosimeter Badge (quarterly)", 35.0, 85.0),
            ("Lead Apron — Lightweight", 250.0, 650.0),
            ("CR Imaging Plate", 1500.0, 4000.0),
            ("PACS Storage License — Annual", 8000.0, 22000.0),
            ("Fluoroscopy Drape (case)", 180.0, 450.0),
        ],
    },
    CategoryProfile {
        name: "Clinical Engineering Services",
        target_spend: 4_000_000.0,
        target_txns: 400,
        ppi_rate: 0.02,
        contract_weights: [0.40, 0.45, 0.15],
        quantity: QuantityProfile::Capital,
        vendors: &[
            ("Sodexo", 0.30),
            ("Agiliti", 0.25),
            ("GE Healthcare", 0.20),
            ("Philips", 0.15),
            ("Siemens Healthineers", 0.10),
        ],
        products: &[
            ("PM Service — Patient Monitors (quarterly)", 800.0, 2200.0),
            ("PM Service — Infusion Pumps (quarterly)", 600.0, 1600.0),
            ("PM Service — Ventilators (quarterly)", 1200.0, 3200.0),
            ("Calibration Service — Defibrillators", 350.0, 850.0),
            ("Repair Parts — Electrosurgical Unit", 400.0, 1200.0),
            ("Biomedical Equipment Inspection", 250.0, 700.0),
            ("Annual Safety Testing — OR Suite", 1500.0, 4000.0),
            ("Equipment Lifecycle Assessment", 2000.0, 5500.0),
            ("On-Call Service Contract — Monthly", 3500.0, 8500.0),
            ("Firmware Update Service — Monitors", 450.0, 1200.0),
        ],
    },
    CategoryProfile {
        name: "Vascular",
        target_spend: 3_000_000.0,
        target_txns: 500,
        ppi_rate: 0.55,
        contract_weights: [0.50, 0.30, 0.20],
        quantity: QuantityProfile::Clinical,
        vendors: &[
            ("Boston Scientific", 0.25),
            ("Medtronic", 0.22),
            ("Abbott", 0.20),
            ("Teleflex", 0.15),
            ("BD", 0.10),
            ("B.Braun", 0.08),
        ],
        products: &[
            ("Drug-Eluting Stent", 2200.0, 5500.0),
            ("Bare Metal Stent", 1200.0, 3000.0),
            ("PTA Balloon Catheter", 800.0, 2200.0),
            ("Peripheral Atherectomy Device", 2500.0, 5800.0),
            ("Vascular Graft — PTFE", 1500.0, 3800.0),
            ("Central Venous Catheter Kit", 85.0, 250.0),
            ("PICC Line Kit", 120.0, 350.0),
            ("Dialysis Catheter Kit", 150.0, 400.0),
            ("Embolization Coil (each)", 450.0, 1200.0),
            ("Vascular Closure Device", 280.0, 650.0),
            ("Guidewire — Hydrophilic", 120.0, 350.0),
            ("Introducer Sheath Set", 95.0, 280.0),
        ],
    },
    CategoryProfile {
        name: "Other/Miscellaneous",
        target_spend: 2_000_000.0,
        target_txns: 500,
        ppi_rate: 0.02,
        contract_weights: [0.65, 0.25, 0.10],
        quantity: QuantityProfile::Bulk,
        vendors: &[
            ("Cardinal Health", 0.30),
            ("BD", 0.20),
            ("Baxter", 0.15),
            ("B.Braun", 0.15),
            ("Teleflex", 0.10),
            ("Sodexo", 0.10),
        ],
        products: &[
            ("Hand Sanitizer — Wall Mount (case)", 45.0, 120.0),
            ("Sharps Container (case)", 65.0, 160.0),
            ("Exam Gloves — Nitrile (case)", 35.0, 95.0),
            ("Face Mask — Surgical (case)", 25.0, 75.0),
            ("Isolation Gown (case)", 55.0, 150.0),
            ("Linen — Disposable Underpads (case)", 40.0, 110.0),
            ("Thermometer — Digital (each)", 15.0, 45.0),
            ("Blood Pressure Cuff — Disposable (box)", 60.0, 160.0),
            ("Wheelchair — Standard", 350.0, 850.0),
            ("Walker — Folding", 80.0, 220.0),
            ("Crutches — Aluminum (pair)", 25.0, 65.0),
            ("IV Pole — Rolling", 120.0, 320.0),
        ],
    },
];

pub fn generate_transactions(config: &GeneratorConfig) -> Result<Vec<Transaction>> {
    validate_config(config)?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let span_days = (config.end - config.start).num_days() as u64;

    let facility_dist = weighted(FACILITIES.iter().map(|(_, w)| *w))?;
    let mut next_id = config.first_id;
    let mut records = Vec::new();

    for category in CATEGORIES {
        let vendor_dist = weighted(category.vendors.iter().map(|(_, w)| *w))?;
        let contract_dist = weighted(category.contract_weights.iter().copied())?;
        let (quantities, quantity_weights) = category.quantity.choices();
        let quantity_dist = weighted(quantity_weights.iter().map(|w| *w as f64))?;

        let n_txns = ((category.target_txns as f64) * config.volume_scale).round() as usize;
        let mut batch: Vec<Transaction> = Vec::with_capacity(n_txns);
        let mut batch_spend = 0.0;

        for _ in 0..n_txns {
            let offset = rng.gen_range(0..=span_days);
            let date = config
                .start
                .checked_add_days(Days::new(offset))
                .ok_or_else(|| SpendError::Generator("date out of range".to_string()))?;
            let seasonality = MONTHLY_SEASONALITY[date.month0() as usize];

            let facility = FACILITIES[facility_dist.sample(&mut rng)].0;
            let vendor = category.vendors[vendor_dist.sample(&mut rng)].0;
            let (product, low, high) = category
                .products
                .choose(&mut rng)
                .copied()
                .ok_or_else(|| SpendError::Generator(format!("{} has no products", category.name)))?;

            let mut unit_price = round2(rng.gen_range(low..high) * seasonality);
            let quantity = quantities[quantity_dist.sample(&mut rng)];
            let contract_type = CONTRACT_TYPES[contract_dist.sample(&mut rng)];
            if contract_type == CONTRACT_OFF {
                let premium = rng.gen_range(OFF_CONTRACT_PREMIUM.0..OFF_CONTRACT_PREMIUM.1);
                unit_price = round2(unit_price * premium);
            }
            let total_amount = round2(unit_price * quantity as f64);
            let ppi_flag = rng.gen::<f64>() < category.ppi_rate;

            batch_spend += total_amount;
            batch.push(Transaction {
                transaction_id: format!("TXN-{next_id}"),
                transaction_date: date,
                facility_name: facility.to_string(),
                department: category.name.to_string(),
                spend_category: category.name.to_string(),
                vendor_name: vendor.to_string(),
                product_description: product.to_string(),
                unit_price,
                quantity,
                total_amount,
                contract_type: contract_type.to_string(),
                ppi_flag,
            });
            next_id += 1;
        }

        // Rescale prices so the category lands near its target spend.
        if batch_spend > 0.0 {
            let factor = category.target_spend * config.volume_scale / batch_spend;
            for t in &mut batch {
                t.unit_price = round2(t.unit_price * factor);
                t.total_amount = round2(t.unit_price * t.quantity as f64);
            }
        }
        log::debug!(
            "Generated {} {} transactions",
            batch.len(),
            category.name
        );
        records.extend(batch);
    }

    records.sort_by_key(|t| t.transaction_date);
    Ok(records)
}

fn validate_config(config: &GeneratorConfig) -> Result<()> {
    if config.end < config.start {
        return Err(SpendError::InvalidRange {
            start: config.start,
            end: config.end,
        });
    }
    if !(config.volume_scale.is_finite() && config.volume_scale > 0.0) {
        return Err(SpendError::Generator(
            "volume_scale must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn weighted(weights: impl Iterator<Item = f64>) -> Result<WeightedIndex<f64>> {
    WeightedIndex::new(weights).map_err(|err| SpendError::Generator(err.to_string()))
}

/// Console summary printed after a generation run.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub rows: usize,
    pub total_spend: f64,
    pub date_span: Option<(NaiveDate, NaiveDate)>,
    pub facilities: usize,
    pub vendors: usize,
    pub categories: usize,
    /// Share of rows, not of spend.
    pub ppi_row_pct: f64,
    /// Category, spend and share of total, largest first.
    pub category_spend: Vec<(String, f64, f64)>,
    /// Contract type, row count and share of rows, most common first.
    pub contract_mix: Vec<(String, usize, f64)>,
    /// Vendor, spend and share of total for the ten largest vendors.
    pub top_vendors: Vec<(String, f64, f64)>,
}

pub fn summarize(rows: &[Transaction]) -> GenerationSummary {
    let kpis = calculate_kpis(rows);
    let ppi_rows = rows.iter().filter(|t| t.ppi_flag).count();

    let category_spend = spend_by_category(rows)
        .into_iter()
        .rev()
        .map(|c| {
            let pct = percent_of(c.total, kpis.total_spend);
            (c.category, c.total, pct)
        })
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in rows {
        *counts.entry(t.contract_type.as_str()).or_insert(0) += 1;
    }
    let mut contract_mix: Vec<(String, usize, f64)> = counts
        .into_iter()
        .map(|(ct, n)| (ct.to_string(), n, percent_of(n as f64, rows.len() as f64)))
        .collect();
    contract_mix.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let top_vendors = vendor_concentration(rows)
        .into_iter()
        .take(10)
        .map(|v| (v.vendor, v.total, v.share_pct))
        .collect();

    GenerationSummary {
        rows: rows.len(),
        total_spend: kpis.total_spend,
        date_span: date_extent(rows),
        facilities: facility_options(rows).len(),
        vendors: kpis.unique_vendors,
        categories: category_options(rows).len(),
        ppi_row_pct: percent_of(ppi_rows as f64, rows.len() as f64),
        category_spend,
        contract_mix,
        top_vendors,
    }
}
