//! Invoice-line records as they enter and leave the cleaning stage

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

/// Customer identifier.
///
/// Numeric identifiers order by value and sort ahead of non-numeric ones,
/// which order lexicographically. A zero fractional suffix such as the one in
/// `13085.0` (how spreadsheet exports tend to write the column) is dropped;
/// the integer digits are kept as written, so `013085` stays distinct from
/// `13085`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomerId(String);

impl CustomerId {
    /// Parse a raw identifier cell. Returns `None` for blank cells.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let id = match trimmed.split_once('.') {
            Some((digits, zeros))
                if !digits.is_empty()
                    && digits.bytes().all(|b| b.is_ascii_digit())
                    && zeros.bytes().all(|b| b == b'0') =>
            {
                digits
            }
            _ => trimmed,
        };

        Some(CustomerId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric_key(&self) -> Option<u128> {
        self.0.parse().ok()
    }
}

impl From<&str> for CustomerId {
    fn from(value: &str) -> Self {
        CustomerId(value.to_string())
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for CustomerId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_key(), other.numeric_key()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for CustomerId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One invoice line as read from the source table.
///
/// Fields that may be blank or malformed in the source are optional; the
/// cleaner decides which of them a line needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionLine {
    pub invoice_id: Option<String>,
    pub stock_code: String,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub invoice_date: Option<NaiveDateTime>,
    pub unit_price: Option<Decimal>,
    pub customer_id: Option<CustomerId>,
    pub country: String,
}

/// An invoice line that survived cleaning, with its line total.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedLine {
    pub invoice_id: String,
    pub stock_code: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub invoice_date: NaiveDateTime,
    pub unit_price: Decimal,
    pub customer_id: CustomerId,
    pub country: String,
    /// `quantity * unit_price`
    pub line_total: Decimal,
}
