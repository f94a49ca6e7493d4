//! Boundary to the persistence collaborator that serves raw meter records.
//!
//! The engine only ever reads: a root lookup per sector, a children lookup
//! per node, and a by-id lookup for configured root overrides. Failures are
//! propagated unchanged as [`DwaError::Store`]; retry/backoff policy
//! belongs to the implementation behind this trait, not to the engine.

use crate::{DwaResult, MeterId, MeterRecord, SectorId};

/// Read-only access to one point-in-time snapshot of meter records.
pub trait MeterStore {
    /// The sector's designated root: a generator with no parent belonging
    /// to the sector, if one exists.
    fn root_for_sector(&self, sector: SectorId) -> DwaResult<Option<MeterRecord>>;

    /// All records whose parent is the given meter, regardless of their own
    /// sector.
    fn children_of(&self, meter: MeterId) -> DwaResult<Vec<MeterRecord>>;

    /// Fetch a record by id (used to resolve explicit root overrides).
    fn record(&self, meter: MeterId) -> DwaResult<Option<MeterRecord>>;

    /// Sectors with at least one record, for comparative analysis.
    fn active_sectors(&self) -> DwaResult<Vec<SectorId>>;
}
