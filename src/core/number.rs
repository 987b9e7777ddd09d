// src/core/number.rs
//! Locale-formatted numbers as the dashboard prints them: comma decimal
//! separator, ordinary / no-break / thin spaces between thousands.

/// Parse a dashboard number (`"2 861"`, `"1,83"`, `"12\u{a0}000"`).
/// Anything else (`"—"`, `"12%"`, empty) is `None`.
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}' | '\u{2009}'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Signed delta in the site's display format: `+5`, `-3`, `+0,25`, `-1,50`.
/// Zero has no display form and yields `None`.
pub fn format_delta(delta: f64) -> Option<String> {
    if delta == 0.0 || !delta.is_finite() {
        return None;
    }
    if delta.fract() == 0.0 {
        Some(format!("{delta:+.0}"))
    } else {
        Some(format!("{delta:+.2}").replace('.', ","))
    }
}

/// `current - previous`, formatted; `None` when either side is not a
/// number or nothing changed.
pub fn delta_between(current: &str, previous: &str) -> Option<String> {
    let cur = parse_number(current)?;
    let prev = parse_number(previous)?;
    format_delta(cur - prev)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locale_formats() {
        assert_eq!(parse_number("2861"), Some(2861.0));
        assert_eq!(parse_number("1,83"), Some(1.83));
        assert_eq!(parse_number("12 345"), Some(12345.0));
        assert_eq!(parse_number("12\u{a0}345,5"), Some(12345.5));
        assert_eq!(parse_number("1\u{2009}000"), Some(1000.0));
        assert_eq!(parse_number(" -7 "), Some(-7.0));
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("—"), None);
        assert_eq!(parse_number("12%"), None);
        assert_eq!(parse_number("1,2,3"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn formats_whole_and_fractional_deltas() {
        assert_eq!(format_delta(5.0).as_deref(), Some("+5"));
        assert_eq!(format_delta(-3.0).as_deref(), Some("-3"));
        assert_eq!(format_delta(0.25).as_deref(), Some("+0,25"));
        assert_eq!(format_delta(-1.5).as_deref(), Some("-1,50"));
        assert_eq!(format_delta(0.0), None);
        assert_eq!(format_delta(-0.0), None);
    }

    #[test]
    fn delta_between_examples() {
        assert_eq!(delta_between("105", "100").as_deref(), Some("+5"));
        assert_eq!(delta_between("1,50", "1,83").as_deref(), Some("-0,33"));
        assert_eq!(delta_between("7", "7"), None);
        assert_eq!(delta_between("n/a", "7"), None);
    }

    #[test]
    fn formatted_deltas_parse_back() {
        for d in [1.0, -42.0, 0.33, -0.33, 1234.5, -0.07, 99999.0] {
            let text = format_delta(d).unwrap();
            let back = parse_number(&text).unwrap();
            assert!((back - d).abs() < 0.005, "{d} -> {text} -> {back}");
        }
    }
}
