//! CSV snapshot importer.
//!
//! Header-mapped columns: `id,name,kind,withdrawal_kwh,sector,parent,
//! current_balance`. Empty `withdrawal_kwh`, `parent`, and
//! `current_balance` cells are legal. Rows with unparsable numerics are
//! skipped with a line-numbered diagnostic; an unknown kind label aborts
//! the whole import.

use crate::report::ImportReport;
use dwa_core::{DwaError, DwaResult, MeterId, MeterKind, MeterRecord, SectorId};
use std::io::Read;
use std::path::Path;

fn parse_optional_f64(field: &str, line: usize, context: &str) -> Result<Option<f64>, String> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("bad {} {:?} at line {}", context, trimmed, line))
}

fn parse_optional_u64(field: &str, line: usize, context: &str) -> Result<Option<u64>, String> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| format!("bad {} {:?} at line {}", context, trimmed, line))
}

/// Import a CSV snapshot from any reader.
pub fn import_csv_reader<R: Read>(reader: R) -> DwaResult<(Vec<MeterRecord>, ImportReport)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| DwaError::Parse(e.to_string()))?
        .clone();
    let column = |name: &str| -> DwaResult<usize> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| DwaError::Parse(format!("missing column {:?}", name)))
    };
    let col_id = column("id")?;
    let col_name = column("name")?;
    let col_kind = column("kind")?;
    let col_withdrawal = column("withdrawal_kwh")?;
    let col_sector = column("sector")?;
    let col_parent = column("parent")?;
    let col_balance = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("current_balance"));

    let mut report = ImportReport::new();
    let mut records = Vec::new();

    for (i, row) in csv_reader.records().enumerate() {
        let line = i + 2; // 1-based, after the header
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                report
                    .diagnostics
                    .error_at_line("import", &format!("unreadable row: {}", e), line);
                report.stats.skipped_rows += 1;
                continue;
            }
        };

        let field = |idx: usize| row.get(idx).unwrap_or("");

        // Kind resolution is strict: an unknown label means the snapshot
        // comes from something we do not understand, so the import aborts.
        let kind = MeterKind::from_label(field(col_kind))?;

        let parsed = (|| -> Result<MeterRecord, String> {
            let id = parse_optional_u64(field(col_id), line, "id")?
                .ok_or_else(|| format!("missing id at line {}", line))?;
            let sector = parse_optional_u64(field(col_sector), line, "sector")?
                .ok_or_else(|| format!("missing sector at line {}", line))?;
            let withdrawal = parse_optional_f64(field(col_withdrawal), line, "withdrawal")?;
            let parent = parse_optional_u64(field(col_parent), line, "parent")?;
            let balance = match col_balance {
                Some(idx) => parse_optional_f64(field(idx), line, "balance")?,
                None => None,
            };
            Ok(MeterRecord {
                id: MeterId::new(id),
                name: field(col_name).to_string(),
                kind,
                withdrawal_kwh: withdrawal,
                sector: SectorId::new(sector),
                parent: parent.map(MeterId::new),
                current_balance: balance,
            })
        })();

        match parsed {
            Ok(record) => {
                if record.withdrawal_kwh.is_none() {
                    report.diagnostics.warn_at_line(
                        "import",
                        "withdrawal missing, defaulted to 0.0",
                        line,
                    );
                    report.stats.defaulted_withdrawals += 1;
                }
                records.push(record);
            }
            Err(message) => {
                report.diagnostics.error_at_line("import", &message, line);
                report.stats.skipped_rows += 1;
            }
        }
    }

    report.stats.records = records.len();
    Ok((records, report))
}

/// Import a CSV snapshot file.
pub fn import_csv_path(path: &Path) -> DwaResult<(Vec<MeterRecord>, ImportReport)> {
    let file = std::fs::File::open(path)?;
    import_csv_reader(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = "\
id,name,kind,withdrawal_kwh,sector,parent,current_balance
1,Gen A,generator,1000.0,1,,
2,Box 1,box,600.0,1,1,
3,Cust 1,customer,,1,2,-10.5
";

    #[test]
    fn test_import_csv() {
        let (records, report) = import_csv_reader(SNAPSHOT.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].kind, MeterKind::Generator);
        assert_eq!(records[1].kind, MeterKind::DistributionBox);
        assert_eq!(records[1].parent, Some(MeterId::new(1)));
        assert_eq!(records[2].withdrawal_kwh, None);
        assert_eq!(records[2].current_balance, Some(-10.5));
        assert_eq!(report.stats.defaulted_withdrawals, 1);
        assert_eq!(report.stats.skipped_rows, 0);
    }

    #[test]
    fn test_bad_numeric_row_skipped() {
        let input = "\
id,name,kind,withdrawal_kwh,sector,parent
1,Gen A,generator,1000.0,1,
oops,Box 1,box,600.0,1,1
";
        let (records, report) = import_csv_reader(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.stats.skipped_rows, 1);
        assert!(report.diagnostics.has_errors());
        assert!(report
            .diagnostics
            .issues
            .iter()
            .any(|i| i.line == Some(3)));
    }

    #[test]
    fn test_unknown_kind_aborts() {
        let input = "\
id,name,kind,withdrawal_kwh,sector,parent
1,X,transformer,10.0,1,
";
        let err = import_csv_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(err, DwaError::UnknownMeterKind(_)));
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let input = "id,name,withdrawal_kwh,sector,parent\n1,X,10.0,1,\n";
        let err = import_csv_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(err, DwaError::Parse(_)));
    }
}
