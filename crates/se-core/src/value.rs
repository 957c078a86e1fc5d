//! Numeric handling for text-valued samples.

/// Parses a sample value as a number, if it is one.
pub fn parse_numeric(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Number of digits after the decimal point as written.
pub fn decimal_digits(text: &str) -> usize {
    text.trim().split_once('.').map_or(0, |(_, fraction)| {
        fraction.chars().take_while(char::is_ascii_digit).count()
    })
}

/// Shortest rendering that parses back to the same number.
pub fn format_natural(value: f64) -> String {
    value.to_string()
}

/// Renders with exactly `precision` digits after the decimal point.
pub fn format_fixed(value: f64, precision: usize) -> String {
    format!("{value:.precision$}")
}
