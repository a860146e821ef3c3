use super::{ReportableRepo, common};
use crate::Result;
use core::fmt::Write;
use owo_colors::OwoColorize;

pub fn generate<W: Write>(report: &ReportableRepo, use_colors: bool, writer: &mut W) -> Result<()> {
    let dashboard = &report.dashboard;

    if use_colors {
        writeln!(writer, "{}", report.repository.green().bold())?;
    } else {
        writeln!(writer, "{}", report.repository)?;
    }
    writeln!(
        writer,
        "Period: {} (generated {})",
        dashboard.period,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    )?;

    for chart in &dashboard.charts {
        writeln!(writer)?;

        let heading = format!(
            "{} [{}, {} {} bucket(s) from {}]",
            chart.title(),
            chart.y_label(),
            chart.bucket_starts.len(),
            chart.width,
            chart.first_bucket.format("%Y-%m-%d")
        );
        if use_colors {
            writeln!(writer, "{}", heading.bold())?;
        } else {
            writeln!(writer, "{heading}")?;
        }

        let max_name_len = chart.lines.iter().map(|line| line.name.len()).max().unwrap_or(0);
        for line in &chart.lines {
            let latest = line.values.last().map_or_else(|| "n/a".to_string(), |v| common::format_value(*v));
            writeln!(writer, "  {:<width$} : {latest}", line.name, width = max_name_len)?;
        }
    }

    writeln!(writer)?;
    if use_colors {
        writeln!(writer, "{}", "Top Releases by Downloads".bold())?;
    } else {
        writeln!(writer, "Top Releases by Downloads")?;
    }

    if dashboard.top_releases.is_empty() {
        writeln!(writer, "  no releases in this period")?;
    }

    let max_name_len = dashboard.top_releases.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for (rank, release) in dashboard.top_releases.iter().enumerate() {
        writeln!(
            writer,
            "  {:>3}. {:<width$}  {}",
            rank + 1,
            release.name,
            release.downloads,
            width = max_name_len
        )?;
    }

    Ok(())
}
