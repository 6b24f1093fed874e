use analysis_core::{MetricName, MetricTable, RatioName, RatioPeriod, RatioTable};
use tracing::debug;

/// Derives margin, leverage, return, and growth ratios from a metric table.
///
/// Every ratio is defined only where all of its inputs exist for the year and
/// the denominator is positive; an undefined ratio is omitted from the table,
/// never stored as zero.
pub struct RatioAnalysisEngine;

impl RatioAnalysisEngine {
    pub fn new() -> Self {
        Self
    }

    /// Numerator as a percentage of a strictly positive denominator.
    fn pct_of(&self, numerator: f64, denominator: f64) -> Option<f64> {
        if denominator > 0.0 {
            Some((numerator / denominator) * 100.0)
        } else {
            None
        }
    }

    /// Simple period-over-period percentage growth, from a positive base.
    fn growth_pct(&self, start: f64, end: f64) -> Option<f64> {
        if start > 0.0 {
            Some(((end - start) / start) * 100.0)
        } else {
            None
        }
    }

    /// Compound annual growth rate over `years` periods, both endpoints positive.
    fn cagr_pct(&self, start: f64, end: f64, years: f64) -> Option<f64> {
        if start > 0.0 && end > 0.0 && years > 0.0 {
            Some(((end / start).powf(1.0 / years) - 1.0) * 100.0)
        } else {
            None
        }
    }

    pub fn compute(&self, metrics: &MetricTable) -> RatioTable {
        let mut ratios = RatioTable::new();
        self.compute_margins(metrics, &mut ratios);
        self.compute_balance_sheet_ratios(metrics, &mut ratios);
        self.compute_growth(metrics, &mut ratios);
        debug!(ratio_count = ratios.len(), "ratio computation finished");
        ratios
    }

    /// Net and gross margin for each year present in the revenue series.
    fn compute_margins(&self, metrics: &MetricTable, ratios: &mut RatioTable) {
        let Some(revenues) = metrics.series(MetricName::Revenue) else {
            return;
        };

        for (&year, &revenue) in revenues {
            if let Some(net_income) = metrics.get(MetricName::NetIncome, year) {
                if let Some(margin) = self.pct_of(net_income, revenue) {
                    ratios.insert(RatioName::NetMargin, RatioPeriod::Year(year), margin);
                }
            }
            if let Some(gross_profit) = metrics.get(MetricName::GrossProfit, year) {
                if let Some(margin) = self.pct_of(gross_profit, revenue) {
                    ratios.insert(RatioName::GrossMargin, RatioPeriod::Year(year), margin);
                }
            }
        }
    }

    /// Leverage and return ratios for each year present in both balance-sheet
    /// series.
    fn compute_balance_sheet_ratios(&self, metrics: &MetricTable, ratios: &mut RatioTable) {
        let Some(assets_series) = metrics.series(MetricName::TotalAssets) else {
            return;
        };

        for (&year, &assets) in assets_series {
            let Some(liabilities) = metrics.get(MetricName::TotalLiabilities, year) else {
                continue;
            };
            let Some(debt_ratio) = self.pct_of(liabilities, assets) else {
                continue;
            };

            ratios.insert(RatioName::DebtRatio, RatioPeriod::Year(year), debt_ratio);
            ratios.insert(
                RatioName::FinancialAutonomy,
                RatioPeriod::Year(year),
                100.0 - debt_ratio,
            );

            if let Some(net_income) = metrics.get(MetricName::NetIncome, year) {
                if let Some(roa) = self.pct_of(net_income, assets) {
                    ratios.insert(RatioName::Roa, RatioPeriod::Year(year), roa);
                }
                let equity = assets - liabilities;
                if let Some(roe) = self.pct_of(net_income, equity) {
                    ratios.insert(RatioName::Roe, RatioPeriod::Year(year), roe);
                }
            }
        }
    }

    /// Year-over-year growth for adjacent years, and CAGR across the full
    /// span when the endpoints are at least two years apart.
    fn compute_growth(&self, metrics: &MetricTable, ratios: &mut RatioTable) {
        for metric in MetricName::ALL {
            let Some(series) = metrics.series(metric) else {
                continue;
            };

            for (&year, &value) in series {
                if let Some(&next) = series.get(&(year + 1)) {
                    if let Some(growth) = self.growth_pct(value, next) {
                        ratios.insert(
                            RatioName::Growth(metric),
                            RatioPeriod::Span(year, year + 1),
                            growth,
                        );
                    }
                }
            }

            let (Some((&first_year, &first_value)), Some((&last_year, &last_value))) =
                (series.first_key_value(), series.last_key_value())
            else {
                continue;
            };
            let span = last_year - first_year;
            if span >= 2 {
                if let Some(cagr) = self.cagr_pct(first_value, last_value, span as f64) {
                    ratios.insert(
                        RatioName::Cagr(metric),
                        RatioPeriod::Span(first_year, last_year),
                        cagr,
                    );
                }
            }
        }
    }
}

impl Default for RatioAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
