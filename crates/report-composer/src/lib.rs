mod narrative;
mod tabular;

pub use tabular::{to_rows, ReportRow};

use std::io::Write;

use analysis_core::{
    AnalysisError, CompanyReport, EntityProfile, MetricTable, ProjectionSet, RatioTable,
    ReportSink,
};
use chrono::Utc;
use tracing::debug;

/// Assembles extraction, ratio, and projection output into the final
/// report object, optionally with a sign-comparison narrative.
pub struct ReportComposer {
    include_narrative: bool,
}

impl ReportComposer {
    pub fn new() -> Self {
        Self { include_narrative: false }
    }

    pub fn with_narrative(mut self) -> Self {
        self.include_narrative = true;
        self
    }

    pub fn compose(
        &self,
        profile: &EntityProfile,
        metrics: MetricTable,
        ratios: RatioTable,
        projections: ProjectionSet,
    ) -> CompanyReport {
        let narrative = if self.include_narrative {
            narrative::summarize(&profile.name, &ratios)
        } else {
            None
        };
        debug!(
            entity = %profile.ticker,
            metrics = metrics.len(),
            ratios = ratios.len(),
            projected_series = projections.series.len(),
            "report composed"
        );
        CompanyReport {
            name: profile.name.clone(),
            ticker: profile.ticker.clone(),
            timestamp: Utc::now(),
            metrics,
            ratios,
            predictions: projections.series,
            insufficient_history: projections.insufficient_history,
            narrative,
        }
    }

    /// Hand the report to the injected durable-storage writer.
    pub fn persist(
        &self,
        report: &CompanyReport,
        sink: &mut dyn ReportSink,
    ) -> Result<(), AnalysisError> {
        sink.write(report)
    }
}

impl Default for ReportComposer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sink that serializes each report as one JSON line.
pub struct JsonLinesSink<W: Write + Send + Sync> {
    writer: W,
}

impl<W: Write + Send + Sync> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + Sync> ReportSink for JsonLinesSink<W> {
    fn write(&mut self, report: &CompanyReport) -> Result<(), AnalysisError> {
        let json = serde_json::to_string(report)
            .map_err(|e| AnalysisError::SinkError(e.to_string()))?;
        writeln!(self.writer, "{json}").map_err(|e| AnalysisError::SinkError(e.to_string()))
    }
}
