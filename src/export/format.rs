//! Number formatting for text exports.

/// Fixed-point with `precision` decimals (`%.{precision}f`).
pub fn format_fixed(value: f64, precision: usize) -> String {
    format!("{:.*}", precision, value)
}

/// C-style scientific notation (`%.{precision}e`).
///
/// The exponent always carries a sign and at least two digits, so `4.43e-7`
/// renders as `4.430000000e-07` for precision 9. Non-finite values fall back
/// to Rust's spelling.
pub fn format_scientific(value: f64, precision: usize) -> String {
    let rust = format!("{:.*e}", precision, value);
    if !value.is_finite() {
        return rust;
    }
    match rust.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => rust,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed() {
        assert_eq!(format_fixed(1.5, 6), "1.500000");
    }

    #[test]
    fn test_scientific_matches_c() {
        assert_eq!(format_scientific(4.43e-7, 9), "4.430000000e-07");
        assert_eq!(format_scientific(0.0, 9), "0.000000000e+00");
        assert_eq!(format_scientific(-12346.0, 3), "-1.235e+04");
        assert_eq!(format_scientific(1e120, 2), "1.00e+120");
    }
}
