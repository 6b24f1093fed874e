use std::borrow::Cow;
use std::sync::LazyLock;

use analysis_core::{FiscalYear, MetricName, MetricTable};
use regex::Regex;
use tracing::{debug, warn};

use crate::normalizer::normalize;
use crate::patterns::PatternRegistry;

static PAGE_NUMBER_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d{1,4}\s*$").expect("built-in pattern must compile"));

static FISCAL_HEADER_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:fiscal\s+)?years?\s+end(?:ed|ing)[^\n]*?(20\d{2}|19\d{2})")
        .expect("built-in pattern must compile")
});

static YEAR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("built-in pattern must compile"));

/// Strip repeated page-number lines before pattern matching.
pub fn clean_filing_text(text: &str) -> Cow<'_, str> {
    PAGE_NUMBER_LINES.replace_all(text, "")
}

/// Detect the most recent fiscal year labeled in the filing.
///
/// Prefers a "fiscal year ended ... 2024" style header; falls back to the
/// largest plausible four-digit year mentioned anywhere in the text.
pub fn detect_base_year(text: &str) -> Option<FiscalYear> {
    if let Some(caps) = FISCAL_HEADER_YEAR.captures(text) {
        if let Ok(year) = caps[1].parse() {
            return Some(year);
        }
    }
    YEAR_TOKEN
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<FiscalYear>().ok())
        .max()
}

/// Applies the pattern registry to a filing text blob.
///
/// Pure function of the input text and the static registry: no I/O, no
/// shared mutable state. A metric no pattern matches is simply absent from
/// the result; extraction never substitutes placeholder numbers.
#[derive(Debug)]
pub struct FilingExtractor {
    registry: &'static PatternRegistry,
}

impl FilingExtractor {
    pub fn new() -> Self {
        Self { registry: PatternRegistry::shared() }
    }

    pub fn with_registry(registry: &'static PatternRegistry) -> Self {
        Self { registry }
    }

    /// Extract all metrics, detecting the base fiscal year from the text.
    ///
    /// Returns an empty table when no year labeling can be found at all,
    /// since values without a year axis cannot be keyed.
    pub fn extract(&self, text: &str) -> MetricTable {
        match detect_base_year(text) {
            Some(base_year) => self.extract_with_base_year(text, base_year),
            None => {
                warn!("no fiscal year labeling found in filing text; nothing extracted");
                MetricTable::new()
            }
        }
    }

    /// Extract all metrics with a caller-supplied most-recent fiscal year.
    ///
    /// For each metric, patterns are tried in registry order and the first
    /// one that matches with its declared column count wins. Captured columns
    /// map to years in descending order from `base_year` (the filing
    /// convention of current, prior, prior-prior columns). A malformed cell
    /// is dropped alone; sibling cells are unaffected.
    pub fn extract_with_base_year(&self, text: &str, base_year: FiscalYear) -> MetricTable {
        let text = clean_filing_text(text);
        let mut table = MetricTable::new();

        for metric in MetricName::ALL {
            let Some((pattern, values)) = self
                .registry
                .for_metric(metric)
                .find_map(|p| p.captures(&text).map(|v| (p, v)))
            else {
                debug!(metric = %metric, "no pattern matched; leaving metric absent");
                continue;
            };

            debug!(
                metric = %metric,
                format = ?pattern.format,
                years = pattern.year_count,
                "pattern matched"
            );

            for (offset, raw) in values.iter().enumerate() {
                let year = base_year - offset as FiscalYear;
                match normalize(raw) {
                    Ok(value) => table.insert(metric, year, value),
                    Err(err) => {
                        warn!(metric = %metric, year, raw, "dropping malformed cell: {err}");
                    }
                }
            }
        }

        table
    }
}

impl Default for FilingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TESLA_STYLE: &str = "\
Fiscal years ended December 31, 2024, 2023 and 2022
Total revenues $ 97,690 $ 96,773 $ 81,462
Gross profit 17,450 17,660 20,853
Net income 7,153 14,974 12,587
Total assets 122,070 106,618
Total liabilities 48,390 43,009
Cash flows from operating activities
Adjustments and working capital changes
Net cash provided by operating activities 14,923 13,256 14,724
";

    #[test]
    fn extracts_all_metrics_descending_from_base_year() {
        let table = FilingExtractor::new().extract(TESLA_STYLE);

        assert_relative_eq!(table.get(MetricName::Revenue, 2024).unwrap(), 97_690.0);
        assert_relative_eq!(table.get(MetricName::Revenue, 2023).unwrap(), 96_773.0);
        assert_relative_eq!(table.get(MetricName::Revenue, 2022).unwrap(), 81_462.0);

        assert_relative_eq!(table.get(MetricName::NetIncome, 2024).unwrap(), 7_153.0);
        assert_relative_eq!(table.get(MetricName::GrossProfit, 2023).unwrap(), 17_660.0);
        assert_relative_eq!(table.get(MetricName::OperatingCashFlow, 2022).unwrap(), 14_724.0);

        // Balance-sheet items only report two comparative years
        assert_relative_eq!(table.get(MetricName::TotalAssets, 2024).unwrap(), 122_070.0);
        assert_relative_eq!(table.get(MetricName::TotalAssets, 2023).unwrap(), 106_618.0);
        assert!(table.get(MetricName::TotalAssets, 2022).is_none());
        assert_relative_eq!(table.get(MetricName::TotalLiabilities, 2024).unwrap(), 48_390.0);
    }

    #[test]
    fn apple_style_phrasings_fall_through_to_variants() {
        let text = "\
Fiscal years ended September 2024, 2023 and 2022
Total net sales 391,035 383,285 394,328
Gross margin $180,683 $169,148 $170,782
Cash generated by operating activities 118,254 110,543 122,151
";
        let table = FilingExtractor::new().extract_with_base_year(text, 2024);

        assert_relative_eq!(table.get(MetricName::Revenue, 2024).unwrap(), 391_035.0);
        assert_relative_eq!(table.get(MetricName::GrossProfit, 2022).unwrap(), 170_782.0);
        assert_relative_eq!(table.get(MetricName::OperatingCashFlow, 2023).unwrap(), 110_543.0);
    }

    #[test]
    fn unmatched_metric_is_absent_not_defaulted() {
        let text = "Fiscal year ended December 31, 2024\nTotal revenues 100,000 90,000 80,000\n";
        let table = FilingExtractor::new().extract(text);

        assert!(table.series(MetricName::Revenue).is_some());
        assert!(table.series(MetricName::NetIncome).is_none());
        assert!(table.series(MetricName::TotalAssets).is_none());
    }

    #[test]
    fn negative_values_arrive_signed() {
        let text = "Fiscal year ended December 31, 2024\nNet income (1,093) 2,500 3,100\n";
        let table = FilingExtractor::new().extract(text);

        assert_relative_eq!(table.get(MetricName::NetIncome, 2024).unwrap(), -1093.0);
        assert_relative_eq!(table.get(MetricName::NetIncome, 2023).unwrap(), 2500.0);
    }

    #[test]
    fn base_year_detection_prefers_header_over_larger_tokens() {
        let text = "Fiscal year ended December 31, 2023\nOutlook through 2030 is discussed later.";
        assert_eq!(detect_base_year(text), Some(2023));
    }

    #[test]
    fn base_year_falls_back_to_max_year_token() {
        assert_eq!(detect_base_year("Results for 2022 and 2024 were mixed."), Some(2024));
        assert_eq!(detect_base_year("no years here"), None);
    }

    #[test]
    fn page_number_lines_are_stripped() {
        let text = "Total assets 10,000 9,000\n42\nTotal liabilities 4,000 3,500\n";
        let cleaned = clean_filing_text(text);
        assert!(!cleaned.contains("\n42\n"));
    }

    #[test]
    fn extraction_without_year_labels_yields_empty_table() {
        let table = FilingExtractor::new().extract("Total revenues 5 4 3");
        assert!(table.is_empty());
    }
}
