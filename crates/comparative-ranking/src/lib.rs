use analysis_core::{
    ComparativeRanking, FiscalYear, MetricName, MetricTable, RankingEntry, RatioName, RatioTable,
    SortDirection,
};
use tracing::debug;

/// Orders entities by a shared metric or ratio for one fiscal year.
///
/// Entities missing the value for that year are excluded from the ranking
/// entirely, never placed last with a placeholder. Ties break by entity
/// name so repeated runs produce the same order.
pub struct ComparativeRanker;

impl ComparativeRanker {
    pub fn new() -> Self {
        Self
    }

    fn build(
        &self,
        key: String,
        year: FiscalYear,
        direction: SortDirection,
        mut entries: Vec<RankingEntry>,
    ) -> ComparativeRanking {
        entries.sort_by(|a, b| {
            let ordering = a.value.total_cmp(&b.value);
            let ordering = match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            ordering.then_with(|| a.entity.cmp(&b.entity))
        });
        debug!(key = %key, year, entrants = entries.len(), "ranking built");
        ComparativeRanking { key, year, direction, entries }
    }

    /// Rank entities by a ratio. Debt ratio ranks ascending, everything else
    /// descending.
    pub fn rank_ratio(
        &self,
        entities: &[(String, &RatioTable)],
        ratio: RatioName,
        year: FiscalYear,
    ) -> ComparativeRanking {
        let direction = if ratio.lower_is_better() {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        let entries = entities
            .iter()
            .filter_map(|(entity, ratios)| {
                ratios.get_year(ratio, year).map(|value| RankingEntry {
                    entity: entity.clone(),
                    value,
                })
            })
            .collect();
        self.build(ratio.to_string(), year, direction, entries)
    }

    /// Rank entities by a raw metric value, always descending.
    pub fn rank_metric(
        &self,
        entities: &[(String, &MetricTable)],
        metric: MetricName,
        year: FiscalYear,
    ) -> ComparativeRanking {
        let entries = entities
            .iter()
            .filter_map(|(entity, metrics)| {
                metrics.get(metric, year).map(|value| RankingEntry {
                    entity: entity.clone(),
                    value,
                })
            })
            .collect();
        self.build(metric.to_string(), year, SortDirection::Descending, entries)
    }
}

impl Default for ComparativeRanker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::RatioPeriod;

    fn ratio_table(cells: &[(RatioName, FiscalYear, f64)]) -> RatioTable {
        let mut table = RatioTable::new();
        for &(ratio, year, value) in cells {
            table.insert(ratio, RatioPeriod::Year(year), value);
        }
        table
    }

    fn order(ranking: &ComparativeRanking) -> Vec<&str> {
        ranking.entries.iter().map(|e| e.entity.as_str()).collect()
    }

    #[test]
    fn net_margin_ranks_descending() {
        let a = ratio_table(&[(RatioName::NetMargin, 2024, 15.0)]);
        let b = ratio_table(&[(RatioName::NetMargin, 2024, 25.0)]);
        let c = ratio_table(&[(RatioName::NetMargin, 2024, 5.0)]);
        let entities = vec![
            ("Alpha".to_string(), &a),
            ("Bravo".to_string(), &b),
            ("Charlie".to_string(), &c),
        ];

        let ranking = ComparativeRanker::new().rank_ratio(&entities, RatioName::NetMargin, 2024);

        assert_eq!(ranking.direction, SortDirection::Descending);
        assert_eq!(order(&ranking), vec!["Bravo", "Alpha", "Charlie"]);
    }

    #[test]
    fn debt_ratio_ranks_ascending() {
        let a = ratio_table(&[(RatioName::DebtRatio, 2024, 60.0)]);
        let b = ratio_table(&[(RatioName::DebtRatio, 2024, 30.0)]);
        let entities = vec![("Alpha".to_string(), &a), ("Bravo".to_string(), &b)];

        let ranking = ComparativeRanker::new().rank_ratio(&entities, RatioName::DebtRatio, 2024);

        assert_eq!(ranking.direction, SortDirection::Ascending);
        assert_eq!(order(&ranking), vec!["Bravo", "Alpha"]);
    }

    #[test]
    fn entity_missing_the_value_is_excluded() {
        let a = ratio_table(&[(RatioName::NetMargin, 2024, 15.0)]);
        let b = ratio_table(&[(RatioName::DebtRatio, 2024, 40.0)]);
        let entities = vec![("Alpha".to_string(), &a), ("Bravo".to_string(), &b)];

        let ranking = ComparativeRanker::new().rank_ratio(&entities, RatioName::NetMargin, 2024);

        assert_eq!(order(&ranking), vec!["Alpha"]);
    }

    #[test]
    fn ties_break_by_entity_name() {
        let a = ratio_table(&[(RatioName::Roa, 2024, 8.0)]);
        let b = ratio_table(&[(RatioName::Roa, 2024, 8.0)]);
        let entities = vec![("Zeta".to_string(), &a), ("Alpha".to_string(), &b)];

        let ranking = ComparativeRanker::new().rank_ratio(&entities, RatioName::Roa, 2024);

        assert_eq!(order(&ranking), vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn metric_ranking_is_descending_by_value() {
        let mut a = MetricTable::new();
        a.insert(MetricName::Revenue, 2024, 96_000.0);
        let mut b = MetricTable::new();
        b.insert(MetricName::Revenue, 2024, 391_000.0);
        let mut c = MetricTable::new();
        c.insert(MetricName::Revenue, 2023, 81_000.0);
        let entities = vec![
            ("Alpha".to_string(), &a),
            ("Bravo".to_string(), &b),
            ("Charlie".to_string(), &c),
        ];

        let ranking = ComparativeRanker::new().rank_metric(&entities, MetricName::Revenue, 2024);

        // Charlie has no 2024 revenue and drops out
        assert_eq!(order(&ranking), vec!["Bravo", "Alpha"]);
        assert_eq!(ranking.key, "revenue");
    }
}
