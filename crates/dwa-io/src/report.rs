//! Statistics and diagnostics for one import operation.

use dwa_core::Diagnostics;
use serde::Serialize;

/// Element counts for an import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportStats {
    pub records: usize,
    pub skipped_rows: usize,
    pub defaulted_withdrawals: usize,
}

/// Combined statistics and issues, the secondary return of every importer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub stats: ImportStats,
    pub diagnostics: Diagnostics,
}

impl ImportReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} records, {} skipped, {} defaulted | {}",
            self.stats.records,
            self.stats.skipped_rows,
            self.stats.defaulted_withdrawals,
            self.diagnostics.summary()
        )
    }
}

impl std::fmt::Display for ImportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Import: {}", self.summary())?;
        for issue in &self.diagnostics.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut report = ImportReport::new();
        report.stats.records = 12;
        report.stats.skipped_rows = 1;
        report.diagnostics.warn("import", "defaulted withdrawal");
        let summary = report.summary();
        assert!(summary.contains("12 records"));
        assert!(summary.contains("1 warning"));
    }
}
