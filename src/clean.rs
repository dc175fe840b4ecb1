//! Row filtering: drops incomplete lines and cancellations, computes line totals

use crate::config::AnalysisWindow;
use crate::transaction::{CleanedLine, TransactionLine};
use rust_decimal::Decimal;

/// Options controlling which lines survive cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOptions {
    /// Invoice ids containing this character are cancellations
    pub cancellation_marker: char,
    /// Optional inclusive date window; lines outside it are dropped
    pub window: Option<AnalysisWindow>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        CleanOptions {
            cancellation_marker: 'C',
            window: None,
        }
    }
}

/// Why a line was left out of the cleaned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    MissingInvoice,
    MissingCustomer,
    MissingQuantity,
    MissingUnitPrice,
    MissingInvoiceDate,
    Cancelled,
    OutsideWindow,
}

/// Counts of kept and excluded lines for one cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub total: usize,
    pub kept: usize,
    pub missing_invoice: usize,
    pub missing_customer: usize,
    pub missing_quantity: usize,
    pub missing_unit_price: usize,
    pub missing_invoice_date: usize,
    pub cancelled: usize,
    pub outside_window: usize,
}

impl CleanReport {
    fn record(&mut self, exclusion: Exclusion) {
        match exclusion {
            Exclusion::MissingInvoice => self.missing_invoice += 1,
            Exclusion::MissingCustomer => self.missing_customer += 1,
            Exclusion::MissingQuantity => self.missing_quantity += 1,
            Exclusion::MissingUnitPrice => self.missing_unit_price += 1,
            Exclusion::MissingInvoiceDate => self.missing_invoice_date += 1,
            Exclusion::Cancelled => self.cancelled += 1,
            Exclusion::OutsideWindow => self.outside_window += 1,
        }
    }

    pub fn excluded(&self) -> usize {
        self.total - self.kept
    }
}

/// Output of the cleaning stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub lines: Vec<CleanedLine>,
    pub report: CleanReport,
}

/// Check a single line, producing its cleaned form or the first reason it fails.
pub fn clean_line(line: &TransactionLine, options: &CleanOptions) -> Result<CleanedLine, Exclusion> {
    let invoice_id = line
        .invoice_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(Exclusion::MissingInvoice)?;
    let customer_id = line.customer_id.clone().ok_or(Exclusion::MissingCustomer)?;
    let quantity = line.quantity.ok_or(Exclusion::MissingQuantity)?;
    let unit_price = line.unit_price.ok_or(Exclusion::MissingUnitPrice)?;
    let invoice_date = line.invoice_date.ok_or(Exclusion::MissingInvoiceDate)?;

    if invoice_id.contains(options.cancellation_marker) {
        return Err(Exclusion::Cancelled);
    }

    if let Some(window) = &options.window {
        if !window.contains(invoice_date.date()) {
            return Err(Exclusion::OutsideWindow);
        }
    }

    Ok(CleanedLine {
        invoice_id: invoice_id.to_string(),
        stock_code: line.stock_code.clone(),
        description: line.description.clone(),
        quantity,
        invoice_date,
        unit_price,
        customer_id,
        country: line.country.clone(),
        line_total: Decimal::from(quantity) * unit_price,
    })
}

/// Filter `lines` down to complete, non-cancelled lines.
///
/// Excluded lines are counted in the report, never treated as errors.
pub fn clean_transactions(lines: &[TransactionLine], options: &CleanOptions) -> Cleaned {
    let mut report = CleanReport {
        total: lines.len(),
        ..CleanReport::default()
    };
    let mut cleaned = Vec::with_capacity(lines.len());

    for line in lines {
        match clean_line(line, options) {
            Ok(kept) => cleaned.push(kept),
            Err(exclusion) => {
                tracing::debug!(invoice = ?line.invoice_id, ?exclusion, "line excluded");
                report.record(exclusion);
            }
        }
    }

    report.kept = cleaned.len();
    tracing::info!(
        total = report.total,
        kept = report.kept,
        cancelled = report.cancelled,
        "cleaning complete"
    );

    Cleaned {
        lines: cleaned,
        report,
    }
}
