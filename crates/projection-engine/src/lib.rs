mod regression;

pub use regression::LinearFit;

use std::collections::BTreeMap;

use analysis_core::{
    AnalysisError, FiscalYear, MetricName, MetricTable, Projection, ProjectionSet, RatioName,
};
use tracing::debug;

/// Fits a linear trend per metric, extrapolates it forward, and scores the
/// fit quality as a 0-100 confidence.
///
/// Deterministic: identical historical input always yields identical
/// projections.
pub struct ProjectionEngine;

impl ProjectionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Implied compound annual growth between the last historical value and
    /// the final projected value. Undefined for non-positive endpoints.
    fn implied_cagr(&self, last_historical: f64, final_projected: f64, years: f64) -> Option<f64> {
        if last_historical > 0.0 && final_projected > 0.0 && years > 0.0 {
            Some(((final_projected / last_historical).powf(1.0 / years) - 1.0) * 100.0)
        } else {
            None
        }
    }

    /// Project one historical series `horizon` years past its last year.
    ///
    /// Needs at least 2 historical points; confidence is the fit's R² scaled
    /// to 0-100 and clamped (a 2-point fit is perfect by construction). The
    /// growth rate attached to every projected year is the implied CAGR from
    /// the last historical value to the final projected value, not the raw
    /// regression slope.
    pub fn project(
        &self,
        series: &BTreeMap<FiscalYear, f64>,
        horizon: u32,
    ) -> Result<BTreeMap<FiscalYear, Projection>, AnalysisError> {
        let (Some((&first_year, _)), Some((&last_year, &last_value))) =
            (series.first_key_value(), series.last_key_value())
        else {
            return Err(AnalysisError::InsufficientData(
                "no historical points to project from".to_string(),
            ));
        };
        if series.len() < 2 {
            return Err(AnalysisError::InsufficientData(format!(
                "need at least 2 historical points, got {}",
                series.len()
            )));
        }
        debug_assert!(first_year < last_year);

        let points: Vec<(f64, f64)> =
            series.iter().map(|(&year, &value)| (year as f64, value)).collect();
        let fit = LinearFit::fit(&points).ok_or_else(|| {
            AnalysisError::InvalidData("degenerate year axis in historical series".to_string())
        })?;

        let confidence = (fit.r_squared * 100.0).clamp(0.0, 100.0);
        let final_projected = fit.predict((last_year + horizon as FiscalYear) as f64);
        let growth_rate = self.implied_cagr(last_value, final_projected, horizon as f64);

        let mut projected = BTreeMap::new();
        for offset in 1..=horizon {
            let year = last_year + offset as FiscalYear;
            projected.insert(
                year,
                Projection {
                    predicted_value: fit.predict(year as f64),
                    confidence,
                    growth_rate,
                },
            );
        }
        Ok(projected)
    }

    /// Project every metric series, then derive margin projections from the
    /// projected components.
    ///
    /// Projected ratios are never regressed from the historical ratio series;
    /// dividing projected numerator by projected denominator keeps projected
    /// margins consistent with projected revenue and income. Series with
    /// fewer than 2 historical points are skipped and reported as
    /// insufficient history.
    pub fn project_table(&self, metrics: &MetricTable, horizon: u32) -> ProjectionSet {
        let mut set = ProjectionSet::new();

        for metric in MetricName::ALL {
            let series = metrics.series(metric);
            match series.map(|s| self.project(s, horizon)) {
                Some(Ok(projected)) => {
                    debug!(metric = %metric, years = projected.len(), "projected series");
                    set.series.insert(metric.to_string(), projected);
                }
                Some(Err(_)) | None => {
                    debug!(metric = %metric, "insufficient history; skipping projection");
                    set.mark_insufficient(metric.to_string());
                }
            }
        }

        self.derive_margin_projections(&mut set);
        set
    }

    /// Projected net/gross margin from the projected revenue and
    /// income/profit series; confidence is the mean of the two inputs'
    /// confidences.
    fn derive_margin_projections(&self, set: &mut ProjectionSet) {
        let derivations = [
            (RatioName::NetMargin, MetricName::NetIncome),
            (RatioName::GrossMargin, MetricName::GrossProfit),
        ];

        for (ratio, numerator_metric) in derivations {
            let (Some(revenue), Some(numerator)) = (
                set.series.get(MetricName::Revenue.as_str()),
                set.series.get(numerator_metric.as_str()),
            ) else {
                continue;
            };

            let mut derived = BTreeMap::new();
            for (&year, numerator_projection) in numerator {
                let Some(revenue_projection) = revenue.get(&year) else {
                    continue;
                };
                if revenue_projection.predicted_value <= 0.0 {
                    continue;
                }
                derived.insert(
                    year,
                    Projection {
                        predicted_value: (numerator_projection.predicted_value
                            / revenue_projection.predicted_value)
                            * 100.0,
                        confidence: (numerator_projection.confidence
                            + revenue_projection.confidence)
                            / 2.0,
                        growth_rate: None,
                    },
                );
            }

            if !derived.is_empty() {
                set.series.insert(ratio.to_string(), derived);
            }
        }
    }
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new()
    }
}
