use super::{ReportableRepo, common};
use crate::Result;
use core::fmt::Write;
use std::borrow::Cow;

/// Long-format CSV: one row per chart, series, and bucket.
pub fn generate<W: Write>(report: &ReportableRepo, writer: &mut W) -> Result<()> {
    writeln!(writer, "chart,series,bucket_start,value")?;

    for chart in &report.dashboard.charts {
        for line in &chart.lines {
            for (bucket_start, value) in chart.bucket_starts.iter().zip(&line.values) {
                writeln!(
                    writer,
                    "{},{},{},{value}",
                    escape_csv(chart.name()),
                    escape_csv(&line.name),
                    common::format_timestamp(*bucket_start)
                )?;
            }
        }
    }

    Ok(())
}

/// Escape a value for RFC compliant CSV output.
///
/// Wraps the value in double quotes if it contains commas, newlines, or double quotes.
/// Internal double quotes are doubled per the RFC.
fn escape_csv(s: &str) -> Cow<'_, str> {
    if s.contains('"') {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else if s.contains(',') || s.contains('\n') || s.contains('\r') {
        Cow::Owned(format!("\"{s}\""))
    } else {
        Cow::Borrowed(s)
    }
}
