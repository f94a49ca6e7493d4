//! Vec-backed [`MeterStore`] over one imported snapshot.

use dwa_core::{DwaError, DwaResult, MeterId, MeterKind, MeterRecord, MeterStore, SectorId};
use std::collections::HashMap;

/// In-memory store serving a fixed record set. Children are returned in
/// snapshot order, which keeps repeated analyses over the same snapshot
/// bit-identical.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: Vec<MeterRecord>,
    by_id: HashMap<MeterId, usize>,
    by_parent: HashMap<MeterId, Vec<usize>>,
}

impl MemoryStore {
    /// Index a snapshot. Duplicate meter ids are rejected: the analysis
    /// downstream assumes ids are unique and would otherwise silently pick
    /// one of the duplicates.
    pub fn new(records: Vec<MeterRecord>) -> DwaResult<Self> {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_parent: HashMap<MeterId, Vec<usize>> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            if by_id.insert(record.id, i).is_some() {
                return Err(DwaError::Parse(format!(
                    "duplicate meter id {} in snapshot",
                    record.id
                )));
            }
            if let Some(parent) = record.parent {
                by_parent.entry(parent).or_default().push(i);
            }
        }
        Ok(Self {
            records,
            by_id,
            by_parent,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MeterRecord] {
        &self.records
    }

    /// Record count per sector, for listings.
    pub fn sector_counts(&self) -> Vec<(SectorId, usize)> {
        let mut counts: HashMap<SectorId, usize> = HashMap::new();
        for record in &self.records {
            *counts.entry(record.sector).or_insert(0) += 1;
        }
        let mut out: Vec<_> = counts.into_iter().collect();
        out.sort();
        out
    }
}

impl MeterStore for MemoryStore {
    fn root_for_sector(&self, sector: SectorId) -> DwaResult<Option<MeterRecord>> {
        Ok(self
            .records
            .iter()
            .find(|r| r.sector == sector && r.parent.is_none() && r.kind == MeterKind::Generator)
            .cloned())
    }

    fn children_of(&self, meter: MeterId) -> DwaResult<Vec<MeterRecord>> {
        Ok(self
            .by_parent
            .get(&meter)
            .map(|indices| indices.iter().map(|&i| self.records[i].clone()).collect())
            .unwrap_or_default())
    }

    fn record(&self, meter: MeterId) -> DwaResult<Option<MeterRecord>> {
        Ok(self.by_id.get(&meter).map(|&i| self.records[i].clone()))
    }

    fn active_sectors(&self) -> DwaResult<Vec<SectorId>> {
        let mut sectors: Vec<SectorId> = self.records.iter().map(|r| r.sector).collect();
        sectors.sort();
        sectors.dedup();
        Ok(sectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: u64, kind: MeterKind, sector: u64, parent: Option<u64>) -> MeterRecord {
        MeterRecord {
            id: MeterId::new(id),
            name: format!("M{}", id),
            kind,
            withdrawal_kwh: Some(1.0),
            sector: SectorId::new(sector),
            parent: parent.map(MeterId::new),
            current_balance: None,
        }
    }

    #[test]
    fn test_store_queries() {
        let store = MemoryStore::new(vec![
            rec(1, MeterKind::Generator, 1, None),
            rec(2, MeterKind::Customer, 1, Some(1)),
            rec(3, MeterKind::Customer, 1, Some(1)),
            rec(4, MeterKind::Generator, 2, None),
        ])
        .unwrap();

        let root = store.root_for_sector(SectorId::new(1)).unwrap().unwrap();
        assert_eq!(root.id, MeterId::new(1));

        let children = store.children_of(MeterId::new(1)).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].id, MeterId::new(2)); // snapshot order

        assert_eq!(
            store.active_sectors().unwrap(),
            vec![SectorId::new(1), SectorId::new(2)]
        );
        assert!(store.record(MeterId::new(9)).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = MemoryStore::new(vec![
            rec(1, MeterKind::Generator, 1, None),
            rec(1, MeterKind::Customer, 1, None),
        ])
        .unwrap_err();
        assert!(matches!(err, DwaError::Parse(_)));
    }

    #[test]
    fn test_sector_counts() {
        let store = MemoryStore::new(vec![
            rec(1, MeterKind::Generator, 1, None),
            rec(2, MeterKind::Customer, 1, Some(1)),
            rec(3, MeterKind::Generator, 2, None),
        ])
        .unwrap();
        assert_eq!(
            store.sector_counts(),
            vec![(SectorId::new(1), 2), (SectorId::new(2), 1)]
        );
    }
}
