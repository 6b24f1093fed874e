mod extractor;
mod normalizer;
mod patterns;

pub use extractor::{clean_filing_text, detect_base_year, FilingExtractor};
pub use normalizer::normalize;
pub use patterns::{FilingFormat, MetricPattern, PatternRegistry};
