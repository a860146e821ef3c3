use super::{ReportableRepo, common};
use crate::Result;
use crate::metrics::Chart;
use core::fmt::Write;
use serde_json::json;

pub fn generate<W: Write>(report: &ReportableRepo, writer: &mut W) -> Result<()> {
    let dashboard = &report.dashboard;

    let output = json!({
        "repository": report.repository,
        "generated_at": common::format_timestamp(report.generated_at),
        "period": {
            "start": common::format_timestamp(dashboard.period.start()),
            "end": common::format_timestamp(dashboard.period.end()),
        },
        "charts": dashboard.charts.iter().map(chart_to_json).collect::<Vec<_>>(),
        "top_releases": dashboard.top_releases,
    });

    write!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

fn chart_to_json(chart: &Chart) -> serde_json::Value {
    json!({
        "name": chart.name(),
        "title": chart.title(),
        "y_label": chart.y_label(),
        "bucket_width": chart.width,
        "first_bucket": common::format_timestamp(chart.first_bucket),
        "bucket_starts": chart.bucket_starts.iter().copied().map(common::format_timestamp).collect::<Vec<_>>(),
        "series": chart.lines.iter().map(|line| json!({
            "name": line.name,
            "values": line.values,
        })).collect::<Vec<_>>(),
    })
}
