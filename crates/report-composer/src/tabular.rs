use std::collections::BTreeMap;

use analysis_core::CompanyReport;
use serde::Serialize;

/// One flat export row: a metric or ratio name plus its period-keyed values.
/// Periods are strings so growth spans ("2023_2024") sit beside plain years.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub values: BTreeMap<String, f64>,
}

/// Flatten a report into rows for row-oriented export collaborators.
/// Metrics first, then ratios, then projected values, each in name order.
pub fn to_rows(report: &CompanyReport) -> Vec<ReportRow> {
    let mut rows = Vec::new();

    for (metric, series) in report.metrics.iter() {
        rows.push(ReportRow {
            name: metric.to_string(),
            values: series.iter().map(|(y, v)| (y.to_string(), *v)).collect(),
        });
    }

    for (ratio, series) in report.ratios.iter() {
        rows.push(ReportRow {
            name: ratio.to_string(),
            values: series.iter().map(|(p, v)| (p.to_string(), *v)).collect(),
        });
    }

    for (name, series) in &report.predictions {
        rows.push(ReportRow {
            name: format!("{name}_projected"),
            values: series
                .iter()
                .map(|(y, p)| (y.to_string(), p.predicted_value))
                .collect(),
        });
    }

    rows
}
