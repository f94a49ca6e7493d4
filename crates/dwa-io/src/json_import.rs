//! JSON snapshot importer.
//!
//! Expects an array of record objects:
//!
//! ```json
//! [
//!   {"id": 1, "name": "Gen A", "kind": "generator", "withdrawal_kwh": 1000.0, "sector": 1},
//!   {"id": 2, "name": "Box 1", "kind": "distribution_box", "withdrawal_kwh": 600.0,
//!    "sector": 1, "parent": 1}
//! ]
//! ```
//!
//! Kind labels are resolved through [`MeterKind::from_label`]; an unknown
//! label aborts the import. A missing `withdrawal_kwh` is legal and
//! recorded as a defaulted-value diagnostic.

use crate::report::ImportReport;
use dwa_core::{DwaError, DwaResult, MeterId, MeterKind, MeterRecord, SectorId};
use serde::Deserialize;
use std::path::Path;

/// Wire shape of one snapshot record before label resolution.
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: u64,
    name: String,
    kind: String,
    #[serde(default)]
    withdrawal_kwh: Option<f64>,
    sector: u64,
    #[serde(default)]
    parent: Option<u64>,
    #[serde(default)]
    current_balance: Option<f64>,
}

/// Import a JSON snapshot from a string.
pub fn import_json_str(input: &str) -> DwaResult<(Vec<MeterRecord>, ImportReport)> {
    let raw: Vec<RawRecord> =
        serde_json::from_str(input).map_err(|e| DwaError::Parse(e.to_string()))?;

    let mut report = ImportReport::new();
    let mut records = Vec::with_capacity(raw.len());
    for r in raw {
        let kind = MeterKind::from_label(&r.kind)?;
        if r.withdrawal_kwh.is_none() {
            report.diagnostics.warn_entity(
                "import",
                "withdrawal missing, defaulted to 0.0",
                &format!("Meter {}", r.id),
            );
            report.stats.defaulted_withdrawals += 1;
        }
        records.push(MeterRecord {
            id: MeterId::new(r.id),
            name: r.name,
            kind,
            withdrawal_kwh: r.withdrawal_kwh,
            sector: SectorId::new(r.sector),
            parent: r.parent.map(MeterId::new),
            current_balance: r.current_balance,
        });
    }
    report.stats.records = records.len();
    Ok((records, report))
}

/// Import a JSON snapshot file.
pub fn import_json_path(path: &Path) -> DwaResult<(Vec<MeterRecord>, ImportReport)> {
    let input = std::fs::read_to_string(path)?;
    import_json_str(&input)
}
