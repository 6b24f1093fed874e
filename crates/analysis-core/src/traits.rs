use crate::{AnalysisError, CompanyReport};

/// Durable-storage collaborator injected into the report composer.
///
/// The core never performs I/O itself; callers hand in a sink (file writer,
/// upload client, test buffer) and own its failure handling.
pub trait ReportSink: Send + Sync {
    fn write(&mut self, report: &CompanyReport) -> Result<(), AnalysisError>;
}
