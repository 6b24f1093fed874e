use analysis_core::AnalysisError;

/// Normalize a captured financial value into a signed number.
///
/// Rules, in order: strip a leading currency marker and surrounding
/// whitespace; treat a parenthesis-wrapped value as negative; strip thousands
/// separators; parse what remains as a signed decimal. Idempotent on already
/// normalized input.
pub fn normalize(raw: &str) -> Result<f64, AnalysisError> {
    let mut value = raw.trim().trim_start_matches(['$', '€', '£']).trim_start();

    let mut negative = false;
    if value.starts_with('(') && value.ends_with(')') && value.len() >= 2 {
        negative = true;
        value = value[1..value.len() - 1].trim();
    }

    let cleaned: String = value.chars().filter(|c| *c != ',' && *c != ' ').collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(AnalysisError::MalformedValue(format!(
            "no digits left after cleaning {raw:?}"
        )));
    }

    let parsed: f64 = cleaned
        .parse()
        .map_err(|_| AnalysisError::MalformedValue(format!("cannot parse {raw:?} as a number")))?;

    Ok(if negative { -parsed } else { parsed })
}
