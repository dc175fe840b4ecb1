//! CSV loading into transaction lines and result export using Polars

use crate::pipeline::RfmRecord;
use crate::segment::{Segment, SegmentedCustomer};
use crate::transaction::{CustomerId, TransactionLine};
use chrono::NaiveDateTime;
use polars::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fs::File;
use std::str::FromStr;

const INVOICE_COLUMNS: &[&str] = &["Invoice", "InvoiceNo"];
const STOCK_CODE_COLUMNS: &[&str] = &["StockCode"];
const DESCRIPTION_COLUMNS: &[&str] = &["Description"];
const QUANTITY_COLUMNS: &[&str] = &["Quantity"];
const DATE_COLUMNS: &[&str] = &["InvoiceDate"];
const PRICE_COLUMNS: &[&str] = &["Price", "UnitPrice"];
const CUSTOMER_COLUMNS: &[&str] = &["Customer ID", "CustomerID"];
const COUNTRY_COLUMNS: &[&str] = &["Country"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Load a transaction CSV file into invoice lines.
///
/// Every column is read as text; cells that are blank or fail to parse
/// become `None` and are left for the cleaner to exclude.
///
/// # Arguments
/// * `file_path` - Path to the CSV file
///
/// # Returns
/// * One `TransactionLine` per CSV row, in file order
pub fn load_transactions(file_path: &str) -> crate::Result<Vec<TransactionLine>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(file_path.into()))?
        .finish()?;

    tracing::info!(rows = df.height(), path = file_path, "transactions loaded");
    transactions_from_frame(&df)
}

/// Decode an all-text DataFrame into transaction lines.
pub fn transactions_from_frame(df: &DataFrame) -> crate::Result<Vec<TransactionLine>> {
    let invoices = required_column(df, INVOICE_COLUMNS)?;
    let quantities = required_column(df, QUANTITY_COLUMNS)?;
    let dates = required_column(df, DATE_COLUMNS)?;
    let prices = required_column(df, PRICE_COLUMNS)?;
    let customers = required_column(df, CUSTOMER_COLUMNS)?;
    let stock_codes = optional_column(df, STOCK_CODE_COLUMNS)?;
    let descriptions = optional_column(df, DESCRIPTION_COLUMNS)?;
    let countries = optional_column(df, COUNTRY_COLUMNS)?;

    let lines = (0..df.height())
        .map(|i| TransactionLine {
            invoice_id: invoices[i].clone(),
            stock_code: stock_codes[i].clone().unwrap_or_default(),
            description: descriptions[i].clone(),
            quantity: quantities[i].as_deref().and_then(parse_quantity),
            invoice_date: dates[i].as_deref().and_then(parse_timestamp),
            unit_price: prices[i].as_deref().and_then(|p| Decimal::from_str(p).ok()),
            customer_id: customers[i].as_deref().and_then(CustomerId::parse),
            country: countries[i].clone().unwrap_or_default(),
        })
        .collect();

    Ok(lines)
}

fn required_column(df: &DataFrame, names: &[&str]) -> crate::Result<Vec<Option<String>>> {
    match find_column(df, names) {
        Some(series) => text_cells(series),
        None => anyhow::bail!("Missing required column: expected one of {:?}", names),
    }
}

fn optional_column(df: &DataFrame, names: &[&str]) -> crate::Result<Vec<Option<String>>> {
    match find_column(df, names) {
        Some(series) => text_cells(series),
        None => Ok(vec![None; df.height()]),
    }
}

fn find_column<'a>(df: &'a DataFrame, names: &[&str]) -> Option<&'a Series> {
    names.iter().find_map(|name| df.column(name).ok())
}

fn text_cells(series: &Series) -> crate::Result<Vec<Option<String>>> {
    let cells = series.cast(&DataType::String)?;
    let cells = cells
        .str()?
        .into_iter()
        .map(|cell| cell.map(str::trim).filter(|c| !is_null_marker(c)).map(str::to_owned))
        .collect();
    Ok(cells)
}

fn is_null_marker(cell: &str) -> bool {
    cell.is_empty() || matches!(cell, "NaN" | "nan" | "NULL" | "null" | "NA")
}

/// Parse a quantity, accepting integral decimals such as `6.0`.
fn parse_quantity(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        Decimal::from_str(raw)
            .ok()
            .filter(|d| d.fract().is_zero())
            .and_then(|d| d.to_i64())
    })
}

/// Parse an invoice timestamp in any of the supported formats.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Build the result table: customer_id, segment, recency, frequency, monetary.
pub fn records_frame(records: &[RfmRecord]) -> crate::Result<DataFrame> {
    let df = df!(
        "customer_id" => records.iter().map(|r| r.customer_id.to_string()).collect::<Vec<_>>(),
        "segment" => records.iter().map(|r| r.segment.as_str()).collect::<Vec<_>>(),
        "recency" => records.iter().map(|r| r.recency).collect::<Vec<_>>(),
        "frequency" => records.iter().map(|r| i64::from(r.frequency)).collect::<Vec<_>>(),
        "monetary" => records.iter().map(|r| r.monetary.to_f64().unwrap_or(f64::NAN)).collect::<Vec<_>>(),
    )?;
    Ok(df)
}

/// Write the segmented result table to a CSV file.
pub fn write_rfm_csv(output_path: &str, records: &[RfmRecord]) -> crate::Result<()> {
    let mut df = records_frame(records)?;
    let mut file = File::create(output_path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

    tracing::info!(rows = records.len(), path = output_path, "rfm table written");
    Ok(())
}

/// Write the ids of every customer in `segment` to a single-column CSV file.
pub fn write_segment_ids(
    output_path: &str,
    customers: &[SegmentedCustomer],
    segment: Segment,
) -> crate::Result<usize> {
    let ids: Vec<String> = customers
        .iter()
        .filter(|c| c.segment == segment)
        .map(|c| c.scored.metrics.customer_id.to_string())
        .collect();
    let count = ids.len();

    let mut df = df!("customer_id" => ids)?;
    let mut file = File::create(output_path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;

    tracing::info!(rows = count, %segment, path = output_path, "segment ids written");
    Ok(count)
}
