use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Four-digit fiscal year. No lifecycle beyond being a map key.
pub type FiscalYear = i32;

/// Financial line items tracked across fiscal years.
///
/// Closed set: extending it means adding a variant plus extraction patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Revenue,
    NetIncome,
    GrossProfit,
    TotalAssets,
    TotalLiabilities,
    OperatingCashFlow,
}

impl MetricName {
    pub const ALL: [MetricName; 6] = [
        MetricName::Revenue,
        MetricName::NetIncome,
        MetricName::GrossProfit,
        MetricName::TotalAssets,
        MetricName::TotalLiabilities,
        MetricName::OperatingCashFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::Revenue => "revenue",
            MetricName::NetIncome => "net_income",
            MetricName::GrossProfit => "gross_profit",
            MetricName::TotalAssets => "total_assets",
            MetricName::TotalLiabilities => "total_liabilities",
            MetricName::OperatingCashFlow => "operating_cash_flow",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revenue" => Ok(MetricName::Revenue),
            "net_income" => Ok(MetricName::NetIncome),
            "gross_profit" => Ok(MetricName::GrossProfit),
            "total_assets" => Ok(MetricName::TotalAssets),
            "total_liabilities" => Ok(MetricName::TotalLiabilities),
            "operating_cash_flow" => Ok(MetricName::OperatingCashFlow),
            other => Err(format!("unknown metric name: {other}")),
        }
    }
}

/// Sparse year-indexed table of normalized metric values.
///
/// Values are already normalized: no currency symbols, no thousands
/// separators, losses stored as signed negatives. A missing (metric, year)
/// cell means "not extracted", never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTable(BTreeMap<MetricName, BTreeMap<FiscalYear, f64>>);

impl MetricTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: MetricName, year: FiscalYear, value: f64) {
        self.0.entry(metric).or_default().insert(year, value);
    }

    pub fn get(&self, metric: MetricName, year: FiscalYear) -> Option<f64> {
        self.0.get(&metric).and_then(|series| series.get(&year)).copied()
    }

    /// The full year series for one metric, if any cell was extracted.
    pub fn series(&self, metric: MetricName) -> Option<&BTreeMap<FiscalYear, f64>> {
        self.0.get(&metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricName, &BTreeMap<FiscalYear, f64>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for MetricTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (metric, series) in &self.0 {
            // Year keys are strings in the output shape
            let series: BTreeMap<String, f64> =
                series.iter().map(|(y, v)| (y.to_string(), *v)).collect();
            map.serialize_entry(metric.as_str(), &series)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MetricTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::deserialize(deserializer)?;
        let mut table = MetricTable::new();
        for (metric, series) in raw {
            let metric: MetricName = metric.parse().map_err(D::Error::custom)?;
            for (year, value) in series {
                let year: FiscalYear = year.parse().map_err(D::Error::custom)?;
                table.insert(metric, year, value);
            }
        }
        Ok(table)
    }
}

/// Derived ratio identifiers, including the per-metric growth variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RatioName {
    NetMargin,
    GrossMargin,
    DebtRatio,
    FinancialAutonomy,
    Roa,
    Roe,
    /// Simple year-over-year growth of a metric, keyed by year pair.
    Growth(MetricName),
    /// Compound annual growth of a metric, keyed by year range.
    Cagr(MetricName),
}

impl RatioName {
    /// Ranking direction: debt load is the one ratio where smaller wins.
    pub fn lower_is_better(&self) -> bool {
        matches!(self, RatioName::DebtRatio)
    }
}

impl fmt::Display for RatioName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatioName::NetMargin => f.write_str("net_margin"),
            RatioName::GrossMargin => f.write_str("gross_margin"),
            RatioName::DebtRatio => f.write_str("debt_ratio"),
            RatioName::FinancialAutonomy => f.write_str("financial_autonomy"),
            RatioName::Roa => f.write_str("roa"),
            RatioName::Roe => f.write_str("roe"),
            RatioName::Growth(metric) => write!(f, "{metric}_growth"),
            RatioName::Cagr(metric) => write!(f, "{metric}_cagr"),
        }
    }
}

impl FromStr for RatioName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "net_margin" => return Ok(RatioName::NetMargin),
            "gross_margin" => return Ok(RatioName::GrossMargin),
            "debt_ratio" => return Ok(RatioName::DebtRatio),
            "financial_autonomy" => return Ok(RatioName::FinancialAutonomy),
            "roa" => return Ok(RatioName::Roa),
            "roe" => return Ok(RatioName::Roe),
            _ => {}
        }
        if let Some(metric) = s.strip_suffix("_growth") {
            return metric.parse().map(RatioName::Growth);
        }
        if let Some(metric) = s.strip_suffix("_cagr") {
            return metric.parse().map(RatioName::Cagr);
        }
        Err(format!("unknown ratio name: {s}"))
    }
}

impl Serialize for RatioName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RatioName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Key for one ratio cell: a single fiscal year for point-in-time ratios,
/// a year pair/range for growth variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RatioPeriod {
    Year(FiscalYear),
    Span(FiscalYear, FiscalYear),
}

impl fmt::Display for RatioPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatioPeriod::Year(year) => write!(f, "{year}"),
            RatioPeriod::Span(start, end) => write!(f, "{start}_{end}"),
        }
    }
}

impl FromStr for RatioPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_year = |y: &str| -> Result<FiscalYear, String> {
            y.parse().map_err(|_| format!("invalid fiscal year: {y}"))
        };
        match s.split_once('_') {
            Some((start, end)) => Ok(RatioPeriod::Span(parse_year(start)?, parse_year(end)?)),
            None => Ok(RatioPeriod::Year(parse_year(s)?)),
        }
    }
}

impl Serialize for RatioPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RatioPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Derived ratios as percentages, keyed by ratio name then period.
///
/// An entry exists only when every input metric existed and the denominator
/// was non-zero; an undefined ratio is absent, never stored as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioTable(BTreeMap<RatioName, BTreeMap<RatioPeriod, f64>>);

impl RatioTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ratio: RatioName, period: RatioPeriod, value: f64) {
        self.0.entry(ratio).or_default().insert(period, value);
    }

    pub fn get(&self, ratio: RatioName, period: RatioPeriod) -> Option<f64> {
        self.0.get(&ratio).and_then(|series| series.get(&period)).copied()
    }

    pub fn get_year(&self, ratio: RatioName, year: FiscalYear) -> Option<f64> {
        self.get(ratio, RatioPeriod::Year(year))
    }

    pub fn series(&self, ratio: RatioName) -> Option<&BTreeMap<RatioPeriod, f64>> {
        self.0.get(&ratio)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RatioName, &BTreeMap<RatioPeriod, f64>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for RatioTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (ratio, series) in &self.0 {
            let series: BTreeMap<String, f64> =
                series.iter().map(|(p, v)| (p.to_string(), *v)).collect();
            map.serialize_entry(&ratio.to_string(), &series)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RatioTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::deserialize(deserializer)?;
        let mut table = RatioTable::new();
        for (ratio, series) in raw {
            let ratio: RatioName = ratio.parse().map_err(D::Error::custom)?;
            for (period, value) in series {
                let period: RatioPeriod = period.parse().map_err(D::Error::custom)?;
                table.insert(ratio, period, value);
            }
        }
        Ok(table)
    }
}

/// One forecasted future-year value. Never mutated after creation;
/// superseded only by re-running the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Value read off the fitted trend line.
    #[serde(rename = "value")]
    pub predicted_value: f64,
    /// Fit quality (R² of the trend regression) scaled to 0-100.
    pub confidence: f64,
    /// Implied CAGR between the last historical value and the final projected
    /// value. Absent when either endpoint is non-positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
}

/// Projections for every series that had enough history, plus the list of
/// series skipped for insufficient history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionSet {
    pub series: BTreeMap<String, BTreeMap<FiscalYear, Projection>>,
    pub insufficient_history: Vec<String>,
}

impl ProjectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: String, year: FiscalYear, projection: Projection) {
        self.series.entry(name).or_default().insert(year, projection);
    }

    pub fn get(&self, name: &str, year: FiscalYear) -> Option<&Projection> {
        self.series.get(name).and_then(|s| s.get(&year))
    }

    pub fn mark_insufficient(&mut self, name: String) {
        self.insufficient_history.push(name);
    }
}

/// Serde helpers for `name -> { "year" -> value }` maps with string year keys.
pub mod year_keyed {
    use super::FiscalYear;
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S, V>(
        map: &BTreeMap<String, BTreeMap<FiscalYear, V>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let view: BTreeMap<&String, BTreeMap<String, &V>> = map
            .iter()
            .map(|(name, series)| {
                (name, series.iter().map(|(y, v)| (y.to_string(), v)).collect())
            })
            .collect();
        view.serialize(serializer)
    }

    pub fn deserialize<'de, D, V>(
        deserializer: D,
    ) -> Result<BTreeMap<String, BTreeMap<FiscalYear, V>>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        let raw: BTreeMap<String, BTreeMap<String, V>> = BTreeMap::deserialize(deserializer)?;
        let mut out = BTreeMap::new();
        for (name, series) in raw {
            let mut parsed = BTreeMap::new();
            for (year, value) in series {
                let year: FiscalYear = year.parse().map_err(D::Error::custom)?;
                parsed.insert(year, value);
            }
            out.insert(name, parsed);
        }
        Ok(out)
    }
}

/// Entity identity fed into the pipeline alongside the filing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub name: String,
    pub ticker: String,
}

impl EntityProfile {
    pub fn new(name: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self { name: name.into(), ticker: ticker.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub entity: String,
    pub value: f64,
}

/// Ordered cross-entity ranking for one metric/ratio and year.
/// Entities missing the value are excluded, not ranked last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeRanking {
    pub key: String,
    pub year: FiscalYear,
    pub direction: SortDirection,
    pub entries: Vec<RankingEntry>,
}

/// Final structured result for one entity, in the persisted JSON shape
/// consumed by presentation/export collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyReport {
    pub name: String,
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: MetricTable,
    pub ratios: RatioTable,
    #[serde(with = "year_keyed")]
    pub predictions: BTreeMap<String, BTreeMap<FiscalYear, Projection>>,
    /// Series skipped by the projection engine for having <2 points.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insufficient_history: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_name_round_trips() {
        for metric in MetricName::ALL {
            let parsed: MetricName = metric.as_str().parse().unwrap();
            assert_eq!(parsed, metric);
        }
    }

    #[test]
    fn ratio_name_growth_variants_round_trip() {
        let names = [
            RatioName::NetMargin,
            RatioName::DebtRatio,
            RatioName::Growth(MetricName::Revenue),
            RatioName::Cagr(MetricName::NetIncome),
        ];
        for name in names {
            let parsed: RatioName = name.to_string().parse().unwrap();
            assert_eq!(parsed, name);
        }
        assert_eq!(RatioName::Growth(MetricName::Revenue).to_string(), "revenue_growth");
        assert_eq!(RatioName::Cagr(MetricName::Revenue).to_string(), "revenue_cagr");
    }

    #[test]
    fn ratio_period_round_trips() {
        assert_eq!("2024".parse::<RatioPeriod>().unwrap(), RatioPeriod::Year(2024));
        assert_eq!(
            "2022_2024".parse::<RatioPeriod>().unwrap(),
            RatioPeriod::Span(2022, 2024)
        );
        assert_eq!(RatioPeriod::Span(2022, 2024).to_string(), "2022_2024");
    }

    #[test]
    fn only_debt_ratio_sorts_ascending() {
        assert!(RatioName::DebtRatio.lower_is_better());
        assert!(!RatioName::NetMargin.lower_is_better());
        assert!(!RatioName::Growth(MetricName::Revenue).lower_is_better());
    }

    #[test]
    fn metric_table_json_round_trip() {
        let mut table = MetricTable::new();
        table.insert(MetricName::Revenue, 2024, 150_000.0);
        table.insert(MetricName::Revenue, 2023, 120_000.0);
        table.insert(MetricName::NetIncome, 2024, -500.0);

        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("\"revenue\""));
        assert!(json.contains("\"2024\""));

        let back: MetricTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn ratio_table_json_round_trip() {
        let mut table = RatioTable::new();
        table.insert(RatioName::NetMargin, RatioPeriod::Year(2024), 13.33);
        table.insert(
            RatioName::Cagr(MetricName::Revenue),
            RatioPeriod::Span(2022, 2024),
            20.0,
        );

        let json = serde_json::to_string(&table).unwrap();
        let back: RatioTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn projection_serializes_with_value_key() {
        let projection = Projection {
            predicted_value: 180_000.0,
            confidence: 99.5,
            growth_rate: Some(9.5),
        };
        let json = serde_json::to_value(&projection).unwrap();
        assert_eq!(json["value"], 180_000.0);
        assert_eq!(json["confidence"], 99.5);
        assert_eq!(json["growth_rate"], 9.5);
    }
}
