//! Exact monetary amounts.
//!
//! Amounts are [Decimal]s. They are stored in SQLite as TEXT so that no value
//! ever passes through binary floating point.

use std::str::FromStr;

use rusqlite::{Row, types::Type};
use rust_decimal::Decimal;

use crate::Error;

/// Parse a monetary amount such as "-120.50".
///
/// Surrounding whitespace is ignored.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `text` is not a decimal number. Invalid
/// amounts are rejected rather than being treated as zero.
pub fn parse_amount(text: &str) -> Result<Decimal, Error> {
    Decimal::from_str(text.trim()).map_err(|_| Error::InvalidAmount(text.to_owned()))
}

/// Read the decimal amount stored as TEXT in column `index` of `row`.
///
/// # Errors
/// Fails the row mapping with [rusqlite::Error::FromSqlConversionFailure] if the
/// stored text is not a decimal number.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    Decimal::from_str(&text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}
