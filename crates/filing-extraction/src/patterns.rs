use std::sync::LazyLock;

use analysis_core::MetricName;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Captured value token: optional parentheses (losses) and currency marker.
const NUM: &str = r"(\(?\$?\s?[\d,]+(?:\.\d+)?\)?)";

/// Filing-format family a pattern targets.
///
/// Issuers phrase the same line item differently; patterns are tried
/// generic-family-first within each metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingFormat {
    /// Line item followed directly by value columns.
    Generic,
    /// Value columns carry a mandatory leading dollar sign.
    DollarColumns,
    /// Values separated from the caption by wrapped lines or prose.
    Narrative,
}

/// One extraction strategy: a compiled pattern plus its declared properties.
///
/// `year_count` declares how many fiscal-year columns the pattern captures
/// (3 for income/cash-flow statements, 2 for balance-sheet comparatives).
/// Column-to-year mapping is always most-recent-first; that is a property
/// declared here per pattern, not a global assumption.
#[derive(Debug)]
pub struct MetricPattern {
    pub metric: MetricName,
    pub format: FilingFormat,
    pub year_count: usize,
    regex: Regex,
}

impl MetricPattern {
    fn new(
        metric: MetricName,
        format: FilingFormat,
        year_count: usize,
        pattern: &str,
        dot_matches_newline: bool,
    ) -> Self {
        let regex = RegexBuilder::new(pattern)
            .dot_matches_new_line(dot_matches_newline)
            .build()
            .expect("built-in pattern must compile");
        Self { metric, format, year_count, regex }
    }

    /// Apply the pattern, returning the raw captured value columns.
    ///
    /// Returns `None` both when the pattern does not match and when the
    /// number of captured groups differs from the declared `year_count`;
    /// the latter is an extraction gap, never a reason to guess a mapping.
    pub fn captures<'t>(&self, text: &'t str) -> Option<Vec<&'t str>> {
        let caps = self.regex.captures(text)?;
        let values: Vec<&str> = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .collect();
        if values.len() == self.year_count {
            Some(values)
        } else {
            None
        }
    }
}

/// Ordered, per-metric lists of extraction patterns.
///
/// Read-only static configuration; safe for concurrent reads.
#[derive(Debug)]
pub struct PatternRegistry {
    patterns: Vec<MetricPattern>,
}

static BUILTIN: LazyLock<PatternRegistry> = LazyLock::new(PatternRegistry::builtin);

impl PatternRegistry {
    /// The built-in registry covering the filing phrasings the system
    /// recognizes for each line item.
    pub fn builtin() -> Self {
        use FilingFormat::{DollarColumns, Generic, Narrative};
        use MetricName::*;

        let p3 = |caption: &str| format!(r"{caption}\s+{NUM}\s+{NUM}\s+{NUM}");
        let p2 = |caption: &str| format!(r"{caption}\s+{NUM}\s+{NUM}");
        let dollar3 = |caption: &str| {
            format!(r"{caption}.*?(\$[\d,]+)\s+(\$[\d,]+)\s+(\$[\d,]+)")
        };
        let dollar2 = |caption: &str| format!(r"{caption}.*?(\$[\d,]+)\s+(\$[\d,]+)");

        let patterns = vec![
            // Revenue
            MetricPattern::new(Revenue, Generic, 3, &p3("Total revenues?"), false),
            MetricPattern::new(Revenue, Generic, 3, &p3("Total net sales"), false),
            MetricPattern::new(Revenue, DollarColumns, 3, &dollar3("Total revenues?"), false),
            MetricPattern::new(
                Revenue,
                Narrative,
                3,
                &format!(r"Total revenues?[^\n]*\n[^\n]*?{NUM}[^\n]*?{NUM}[^\n]*?{NUM}"),
                false,
            ),
            // Net income
            MetricPattern::new(NetIncome, Generic, 3, &p3("Net income"), false),
            MetricPattern::new(NetIncome, DollarColumns, 3, &dollar3("Net income"), false),
            // Gross profit
            MetricPattern::new(GrossProfit, Generic, 3, &p3("Gross profit"), false),
            MetricPattern::new(GrossProfit, Generic, 3, &p3("Total gross profit"), false),
            MetricPattern::new(GrossProfit, DollarColumns, 3, &dollar3("Gross margin"), false),
            // Balance sheet items report two comparative years
            MetricPattern::new(TotalAssets, Generic, 2, &p2("Total assets"), false),
            MetricPattern::new(TotalAssets, DollarColumns, 2, &dollar2("Total assets"), false),
            MetricPattern::new(TotalLiabilities, Generic, 2, &p2("Total liabilities"), false),
            MetricPattern::new(
                TotalLiabilities,
                DollarColumns,
                2,
                &dollar2("Total liabilities"),
                false,
            ),
            // Operating cash flow
            MetricPattern::new(
                OperatingCashFlow,
                Generic,
                3,
                &p3("Net cash provided by operating activities"),
                false,
            ),
            MetricPattern::new(
                OperatingCashFlow,
                Generic,
                3,
                &p3("Cash generated by operating activities"),
                false,
            ),
            MetricPattern::new(
                OperatingCashFlow,
                Narrative,
                3,
                &format!(
                    r"Cash flows from operating activities.*?Net cash provided by operating activities\s+{NUM}\s+{NUM}\s+{NUM}"
                ),
                true,
            ),
        ];

        Self { patterns }
    }

    /// Shared compiled registry; patterns compile once per process.
    pub fn shared() -> &'static Self {
        &BUILTIN
    }

    /// Patterns for one metric, in priority order.
    pub fn for_metric(&self, metric: MetricName) -> impl Iterator<Item = &MetricPattern> {
        self.patterns.iter().filter(move |p| p.metric == metric)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_covers_every_metric() {
        let registry = PatternRegistry::builtin();
        for metric in MetricName::ALL {
            assert!(
                registry.for_metric(metric).count() >= 2,
                "{metric} needs at least a generic pattern and one variant"
            );
        }
    }

    #[test]
    fn generic_family_comes_first_per_metric() {
        let registry = PatternRegistry::builtin();
        for metric in MetricName::ALL {
            let first = registry.for_metric(metric).next().unwrap();
            assert_eq!(first.format, FilingFormat::Generic);
        }
    }

    #[test]
    fn capture_count_mismatch_is_a_gap() {
        let registry = PatternRegistry::builtin();
        let pattern = registry.for_metric(MetricName::TotalAssets).next().unwrap();
        assert_eq!(pattern.year_count, 2);
        // Matches two columns even when a third trails; captured count stays 2
        let values = pattern.captures("Total assets 122,351 114,889").unwrap();
        assert_eq!(values, vec!["122,351", "114,889"]);
        assert!(pattern.captures("Total assets only prose here").is_none());
    }

    #[test]
    fn dollar_column_variant_matches_prefixed_values() {
        let registry = PatternRegistry::builtin();
        let text = "Net income for the periods presented $93,736 $96,995 $99,803";
        let pattern = registry
            .for_metric(MetricName::NetIncome)
            .find(|p| p.format == FilingFormat::DollarColumns)
            .unwrap();
        let values = pattern.captures(text).unwrap();
        assert_eq!(values, vec!["$93,736", "$96,995", "$99,803"]);
    }
}
