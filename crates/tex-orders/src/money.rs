//! Integer-cents money helpers.
//!
//! All amounts are `i64` cents. Conversion to a display string happens only
//! at the presentation boundary.

pub const CENTS_PER_UNIT: i64 = 100;

/// Render cents as Brazilian reais, e.g. `300000` → `"R$ 3.000,00"`.
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let units = abs / CENTS_PER_UNIT as u64;
    let frac = abs % CENTS_PER_UNIT as u64;

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{sign}R$ {grouped},{frac:02}")
}
