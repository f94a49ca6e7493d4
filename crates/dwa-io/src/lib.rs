//! # dwa-io: Snapshot Import and the In-Memory Store
//!
//! Imports meter-record snapshots (JSON and CSV) and serves them through
//! the [`dwa_core::MeterStore`] boundary via [`MemoryStore`].
//!
//! Importers resolve node-kind labels to the closed [`dwa_core::MeterKind`]
//! variant exactly once, failing fast on anything unrecognized. Missing
//! withdrawals default to 0.0 with a diagnostic; malformed rows are skipped
//! with a line-numbered diagnostic and counted in the import stats.

pub mod csv_import;
pub mod json_import;
pub mod memory;
pub mod report;

pub use csv_import::import_csv_path;
pub use json_import::{import_json_path, import_json_str};
pub use memory::MemoryStore;
pub use report::{ImportReport, ImportStats};
