// Entry point and CLI flow.
//
// - `generate` writes the synthetic procurement dataset and prints a summary.
// - `report` loads the dataset once, applies the facet filters and prints the
//   KPI cards with prior-period deltas followed by every chart/table view.
// - `export` writes the filtered rows back out in the load schema.
// - `options` lists the values each facet filter accepts.
mod error;
mod filters;
mod generator;
mod kpi;
mod loader;
mod logging;
mod output;
mod reports;
mod types;
mod util;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use error::{Result, SpendError};
use filters::{apply_filters, date_extent, FilterSelection};
use generator::{generate_transactions, summarize, GeneratorConfig, DEFAULT_SEED};
use kpi::{calculate_kpis, calculate_prior_period, Delta, KpiSnapshot};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tabled::Tabled;
use types::Transaction;
use util::{format_dollars, format_int, format_number, format_spend};

const DEFAULT_DATA_PATH: &str = "data/synthetic_spend_data.csv";

#[derive(Parser)]
#[command(name = "spend-report")]
#[command(about = "Healthcare procurement spend analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Generate(GenerateArgs),
    Report(ReportArgs),
    Export(ExportArgs),
    Options(OptionsArgs),
}

#[derive(Parser)]
struct GenerateArgs {
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    output: PathBuf,
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,
    /// First day to include (YYYY-MM-DD); defaults to the earliest transaction.
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD); defaults to the latest transaction.
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long = "facility")]
    facilities: Vec<String>,
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long = "vendor")]
    vendors: Vec<String>,
    #[arg(long = "contract-type")]
    contract_types: Vec<String>,
    #[arg(long, default_value_t = false)]
    ppi_only: bool,
    /// Drop every facet flag and report on the full table.
    #[arg(long, default_value_t = false)]
    reset: bool,
}

#[derive(Parser)]
struct ReportArgs {
    #[command(flatten)]
    filters: FilterArgs,
    #[arg(long, default_value_t = reports::DEFAULT_TOP_VENDORS)]
    top_n: usize,
    /// Rows shown per view.
    #[arg(long, default_value_t = 10)]
    rows: usize,
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Parser)]
struct ExportArgs {
    #[command(flatten)]
    filters: FilterArgs,
    #[arg(long, default_value = "healthcare_spend_filtered.csv")]
    output: PathBuf,
}

#[derive(Parser)]
struct OptionsArgs {
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,
}

#[derive(Tabled, Clone)]
struct KpiCard {
    #[tabled(rename = "Metric")]
    label: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "vs. prior period")]
    delta: String,
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    date_range: Option<(NaiveDate, NaiveDate)>,
    active_filters: usize,
    current: &'a KpiSnapshot,
    prior: &'a KpiSnapshot,
    total_spend_delta: Delta,
    transaction_count_delta: Delta,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init_logging("spend-report")?;
    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Report(args) => run_report(args),
        Command::Export(args) => run_export(args),
        Command::Options(args) => run_options(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = GeneratorConfig {
        seed: args.seed,
        ..GeneratorConfig::default()
    };
    log::info!(
        "Generating transactions {} to {} (seed {})",
        config.start,
        config.end,
        config.seed
    );
    let gen_start = Instant::now();
    let rows = generate_transactions(&config)?;
    output::write_csv(&args.output, &rows)?;
    loader::clear_cache();
    log::info!(
        "Wrote {} rows to {} in {} ms",
        rows.len(),
        args.output.display(),
        gen_start.elapsed().as_millis()
    );

    let summary = summarize(&rows);
    emit_info_line(&format!("Generated {} rows", format_int(summary.rows)));
    emit_info_line(&format!(
        "Total spend: ${}",
        format_number(summary.total_spend, 2)
    ));
    if let Some((first, last)) = summary.date_span {
        emit_info_line(&format!("Date range: {} to {}", first, last));
    }
    emit_info_line(&format!("Facilities: {}", summary.facilities));
    emit_info_line(&format!("Vendors: {}", summary.vendors));
    emit_info_line(&format!("Categories: {}", summary.categories));
    emit_info_line(&format!("PPI %: {:.1}%", summary.ppi_row_pct));
    emit_info_line("Spend by category:");
    for (category, spend, pct) in &summary.category_spend {
        emit_info_line(&format!(
            "  {}: ${} ({:.1}%)",
            category,
            format_number(*spend, 0),
            pct
        ));
    }
    emit_info_line("Contract type distribution:");
    for (contract_type, count, pct) in &summary.contract_mix {
        emit_info_line(&format!(
            "  {}: {} ({:.1}%)",
            contract_type,
            format_int(*count),
            pct
        ));
    }
    emit_info_line("Top 10 vendors by spend:");
    for (vendor, spend, pct) in &summary.top_vendors {
        emit_info_line(&format!(
            "  {}: ${} ({:.1}%)",
            vendor,
            format_number(*spend, 0),
            pct
        ));
    }
    Ok(())
}

/// Build the facet selection from CLI flags. An omitted date bound falls back
/// to the table's extent.
fn resolve_selection(
    args: &FilterArgs,
    full: &[Transaction],
) -> Result<(FilterSelection, Option<(NaiveDate, NaiveDate)>)> {
    let extent = date_extent(full);
    let mut selection = FilterSelection::new()
        .with_facilities(args.facilities.iter().cloned())
        .with_categories(args.categories.iter().cloned())
        .with_vendors(args.vendors.iter().cloned())
        .with_contract_types(args.contract_types.iter().cloned())
        .ppi_only(args.ppi_only);
    if args.reset {
        selection.reset();
        selection.date_range = extent;
        return Ok((selection, extent));
    }

    let range = match (args.from, args.to, extent) {
        (Some(start), Some(end), _) => Some((start, end)),
        (from, to, Some((min, max))) => Some((from.unwrap_or(min), to.unwrap_or(max))),
        (_, _, None) => None,
    };
    if let Some((start, end)) = range {
        if start > end {
            return Err(SpendError::InvalidRange { start, end });
        }
    }
    selection.date_range = range;
    if selection.is_empty() {
        log::debug!("No facet restricts the table");
    }
    Ok((selection, range))
}

fn run_report(args: ReportArgs) -> Result<()> {
    let full = loader::load_data(&args.filters.data)?;
    let (selection, range) = resolve_selection(&args.filters, &full)?;
    let active_filters = selection.active_count(date_extent(&full));
    let filtered = apply_filters(&full, &selection);
    log::info!(
        "{} of {} transactions match {} active filter(s)",
        filtered.len(),
        full.len(),
        active_filters
    );

    let kpis = calculate_kpis(&filtered);
    let prior = range
        .map(|(start, end)| calculate_prior_period(&full, start, end))
        .unwrap_or_default();
    let spend_delta = Delta::between(kpis.total_spend, prior.total_spend);
    let count_delta = Delta::between(
        kpis.transaction_count as f64,
        prior.transaction_count as f64,
    );

    println!("Healthcare Procurement Spend Analytics");
    match range {
        Some((start, end)) => println!(
            "Multi-facility spend analysis across {} – {} | {} transactions",
            start.format("%b %Y"),
            end.format("%b %Y"),
            format_int(kpis.transaction_count)
        ),
        None => println!("{} transactions", format_int(kpis.transaction_count)),
    }
    if active_filters > 0 {
        println!(
            "{} filter{} active",
            active_filters,
            if active_filters == 1 { "" } else { "s" }
        );
    }
    println!();

    let cards = vec![
        KpiCard {
            label: "Total Spend",
            value: format_spend(kpis.total_spend),
            delta: delta_text(spend_delta),
        },
        KpiCard {
            label: "Transactions",
            value: format_int(kpis.transaction_count),
            delta: delta_text(count_delta),
        },
        KpiCard {
            label: "Unique Vendors",
            value: kpis.unique_vendors.to_string(),
            delta: String::new(),
        },
        KpiCard {
            label: "PPI Spend %",
            value: if kpis.ppi_warning() {
                format!("{:.1}% (!)", kpis.ppi_spend_pct)
            } else {
                format!("{:.1}%", kpis.ppi_spend_pct)
            },
            delta: String::new(),
        },
        KpiCard {
            label: "Avg Transaction",
            value: format!("${}", format_number(kpis.avg_transaction, 0)),
            delta: String::new(),
        },
    ];
    output::preview_table_rows(&cards, cards.len());

    if let Some(path) = &args.json {
        let summary = ReportSummary {
            date_range: range,
            active_filters,
            current: &kpis,
            prior: &prior,
            total_spend_delta: spend_delta,
            transaction_count_delta: count_delta,
        };
        output::write_json(path, &summary)?;
        log::info!("KPI summary written to {}", path.display());
    }

    if filtered.is_empty() {
        println!("No data matches the current filters.");
        return Ok(());
    }

    print_views(&filtered, args.top_n, args.rows);
    Ok(())
}

fn delta_text(delta: Delta) -> String {
    format!("{} {}", delta.trend().symbol(), delta.label())
}

fn print_views(filtered: &[Transaction], top_n: usize, max_rows: usize) {
    let mut by_category = reports::spend_by_category(filtered);
    by_category.reverse();
    output::preview_table("Spend by Category", None, &by_category, max_rows);

    let trend = reports::monthly_spend_trend(filtered);
    output::preview_table(
        "Monthly Spend Trend",
        Some(&format!("stacked by {}", trend.category_order.join(", "))),
        &trend.rows,
        max_rows,
    );

    let mut top = reports::top_vendors_by_spend(filtered, top_n);
    top.reverse();
    let largest = top
        .first()
        .map(|v| format!("largest: {} {}", v.vendor, format_dollars(v.total)));
    output::preview_table(
        &format!("Top {} Vendors by Spend", top_n),
        largest.as_deref(),
        &top,
        max_rows,
    );

    let shares = reports::vendor_concentration(filtered);
    output::preview_table("Vendor Concentration", None, &shares, max_rows);

    let facilities = reports::spend_by_facility(filtered);
    output::preview_table(
        "Spend by Facility",
        Some(&format!("facilities: {}", facilities.facility_order.join(", "))),
        &facilities.rows,
        max_rows,
    );

    let ppi_mix = reports::facility_ppi_mix(filtered);
    output::preview_table("Facility PPI Mix", None, &ppi_mix, max_rows);

    let mut contract_mix = reports::contract_type_by_category(filtered);
    contract_mix.reverse();
    output::preview_table("Contract Type by Category", None, &contract_mix, max_rows);

    let opportunities = reports::off_contract_opportunities(filtered);
    println!("Off-Contract Spend Opportunities");
    println!(
        "(Categories with >{:.0}% off-contract spend represent potential savings from contract renegotiation.)\n",
        reports::OFF_CONTRACT_THRESHOLD_PCT
    );
    if !opportunities.has_data() {
        println!("No data matches the current filters.\n");
    } else if opportunities.rows.is_empty() {
        println!(
            "No categories exceed the {:.0}% off-contract threshold in the current filter selection.\n",
            reports::OFF_CONTRACT_THRESHOLD_PCT
        );
    } else {
        output::preview_table_rows(&opportunities.rows, opportunities.rows.len());
    }
}

fn run_export(args: ExportArgs) -> Result<()> {
    let full = loader::load_data(&args.filters.data)?;
    let (selection, _) = resolve_selection(&args.filters, &full)?;
    let filtered = apply_filters(&full, &selection);
    let written = output::export_transactions(&args.output, &filtered)?;
    emit_info_line(&format!(
        "Exported {} transactions to {}",
        format_int(written),
        args.output.display()
    ));
    Ok(())
}

/// Print every value each facet can take.
fn run_options(args: OptionsArgs) -> Result<()> {
    let full = loader::load_data(&args.data)?;
    match date_extent(&full) {
        Some((min, max)) => println!("Date range: {} to {}", min, max),
        None => println!("Date range: (no transactions)"),
    }
    let groups = [
        ("Facility", filters::facility_options(&full)),
        ("Spend Category", filters::category_options(&full)),
        ("Vendor (by spend)", filters::vendor_options(&full)),
        ("Contract Type", filters::contract_type_options(&full)),
    ];
    for (label, values) in groups {
        println!("\n{} ({}):", label, values.len());
        for value in values {
            println!("  {}", value);
        }
    }
    Ok(())
}

fn emit_info_line(message: &str) {
    if log::log_enabled!(log::Level::Info) {
        log::info!("{}", message);
    } else {
        println!("{message}");
    }
}
