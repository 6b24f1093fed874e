use analysis_core::{MetricName, RatioName, RatioPeriod, RatioTable};

/// Most recent year-over-year growth entry for a metric, as (end year, pct).
fn latest_growth(ratios: &RatioTable, metric: MetricName) -> Option<(i32, f64)> {
    let series = ratios.series(RatioName::Growth(metric))?;
    series.iter().next_back().map(|(&period, &value)| {
        let year = match period {
            RatioPeriod::Span(_, end) => end,
            RatioPeriod::Year(year) => year,
        };
        (year, value)
    })
}

/// Direction of a yearly ratio between its two most recent years.
/// Positive means the latest year is higher.
fn latest_direction(ratios: &RatioTable, ratio: RatioName) -> Option<f64> {
    let series = ratios.series(ratio)?;
    let mut years = series.iter().rev().filter_map(|(&period, &value)| match period {
        RatioPeriod::Year(_) => Some(value),
        RatioPeriod::Span(..) => None,
    });
    let latest = years.next()?;
    let prior = years.next()?;
    Some(latest - prior)
}

/// Plain-language summary built purely from sign comparisons on the computed
/// ratios. Returns None when there is nothing to compare.
pub fn summarize(name: &str, ratios: &RatioTable) -> Option<String> {
    let mut sentences: Vec<String> = Vec::new();

    if let Some((year, growth)) = latest_growth(ratios, MetricName::Revenue) {
        let mut sentence = if growth > 0.0 {
            format!("{name} grew revenue in {year}")
        } else {
            format!("{name} saw revenue decline in {year}")
        };
        if let Some((_, income_growth)) = latest_growth(ratios, MetricName::NetIncome) {
            if income_growth > 0.0 {
                sentence.push_str(", accompanied by higher net income.");
            } else {
                sentence.push_str(", while net income fell.");
            }
        } else {
            sentence.push('.');
        }
        sentences.push(sentence);
    }

    if let Some(delta) = latest_direction(ratios, RatioName::GrossMargin) {
        if delta > 0.0 {
            sentences.push("Gross margin improved year over year.".to_string());
        } else {
            sentences.push("Gross margin deteriorated year over year.".to_string());
        }
    }

    if let Some(delta) = latest_direction(ratios, RatioName::DebtRatio) {
        if delta < 0.0 {
            sentences.push(
                "The debt ratio decreased, a positive sign for financial health.".to_string(),
            );
        } else {
            sentences.push(
                "The debt ratio increased, which may signal rising financial risk.".to_string(),
            );
        }
    }

    if sentences.is_empty() {
        None
    } else {
        Some(sentences.join(" "))
    }
}
