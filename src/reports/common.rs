use chrono::{DateTime, SecondsFormat, Utc};

/// Pretty-print a chart value: whole numbers without decimals, anything else to two places.
pub fn format_value(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Machine-readable timestamp used by the file reports.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(-2.0), "-2");
        assert_eq!(format_value(0.127), "0.13");
        assert_eq!(format_value(1.5), "1.50");
    }

    #[test]
    fn test_format_timestamp() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_timestamp(t), "2024-01-15T10:30:00Z");
    }
}
