//! Human-readable invoice numbers.

use super::schedule::BillingPeriod;
use rand::distributions::Alphanumeric;
use rand::Rng;

const SUFFIX_LEN: usize = 4;

/// Build an invoice number such as `INV-202502-TorreA101-7QX2`.
///
/// Whitespace is stripped from the unit number. Numbers are not unique on
/// their own; the store rejects duplicates and the caller draws a new suffix.
pub fn invoice_number(period: BillingPeriod, unit_number: &str, suffix: &str) -> String {
    let unit: String = unit_number
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    format!(
        "INV-{}{:02}-{}-{}",
        period.year, period.month, unit, suffix
    )
}

/// Random uppercase alphanumeric suffix.
pub fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}

/// Invoice number with a freshly drawn suffix.
pub fn generate(period: BillingPeriod, unit_number: &str) -> String {
    invoice_number(period, unit_number, &random_suffix())
}
