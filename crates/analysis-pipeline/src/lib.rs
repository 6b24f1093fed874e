use analysis_core::{
    AnalysisError, CompanyReport, ComparativeRanking, EntityProfile, FiscalYear, RatioName,
};
use comparative_ranking::ComparativeRanker;
use filing_extraction::FilingExtractor;
use projection_engine::ProjectionEngine;
use ratio_analysis::RatioAnalysisEngine;
use rayon::prelude::*;
use report_composer::ReportComposer;
use tracing::info;

/// End-to-end filing analysis: extraction, ratios, projections, report.
///
/// The run fails as a whole only on empty input text; every other condition
/// (unmatched pattern, undefined ratio, short projection history) is
/// absorbed where it occurs and surfaces as structural absence in the
/// report.
pub struct FilingAnalysisEngine {
    extractor: FilingExtractor,
    ratios: RatioAnalysisEngine,
    projections: ProjectionEngine,
    ranker: ComparativeRanker,
    composer: ReportComposer,
}

impl FilingAnalysisEngine {
    pub fn new() -> Self {
        Self {
            extractor: FilingExtractor::new(),
            ratios: RatioAnalysisEngine::new(),
            projections: ProjectionEngine::new(),
            ranker: ComparativeRanker::new(),
            composer: ReportComposer::new(),
        }
    }

    /// Include the sign-comparison narrative in composed reports.
    pub fn with_narrative(mut self) -> Self {
        self.composer = self.composer.with_narrative();
        self
    }

    /// Analyze one entity's filing text, projecting `horizon` years forward.
    pub fn analyze(
        &self,
        profile: &EntityProfile,
        text: &str,
        horizon: u32,
    ) -> Result<CompanyReport, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput(format!(
                "no filing text for {}",
                profile.ticker
            )));
        }

        let metrics = self.extractor.extract(text);
        let ratios = self.ratios.compute(&metrics);
        let projections = self.projections.project_table(&metrics, horizon);
        let report = self.composer.compose(profile, metrics, ratios, projections);

        info!(
            entity = %profile.ticker,
            metrics = report.metrics.len(),
            ratios = report.ratios.len(),
            projected_series = report.predictions.len(),
            "analysis complete"
        );
        Ok(report)
    }

    /// Analyze several entities in parallel. Per-entity results are
    /// independent; aggregation happens only at the ranking stage.
    pub fn analyze_batch(
        &self,
        filings: &[(EntityProfile, String)],
        horizon: u32,
    ) -> Vec<Result<CompanyReport, AnalysisError>> {
        filings
            .par_iter()
            .map(|(profile, text)| self.analyze(profile, text, horizon))
            .collect()
    }

    /// Rank already-analyzed entities by one ratio for one year.
    pub fn rank(
        &self,
        reports: &[CompanyReport],
        ratio: RatioName,
        year: FiscalYear,
    ) -> ComparativeRanking {
        let entities: Vec<(String, &analysis_core::RatioTable)> = reports
            .iter()
            .map(|report| (report.name.clone(), &report.ratios))
            .collect();
        self.ranker.rank_ratio(&entities, ratio, year)
    }
}

impl Default for FilingAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
