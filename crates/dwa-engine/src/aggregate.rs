//! Buckets the already-computed waste records by hierarchy depth and by
//! node kind. Purely additive: one extra pass over the tree, no waste
//! recomputation.

use crate::waste::WasteAnalysis;
use dwa_core::{MeterHierarchy, MeterKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary for one bucket (a depth or a kind).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelBucket {
    /// Own withdrawal summed over every node in the bucket.
    pub total_withdrawal_kwh: f64,
    /// Waste summed over the bucket's metering nodes (those carrying a
    /// waste record); customers contribute nothing here.
    pub total_waste_kwh: f64,
    pub count: usize,
    /// `|total waste| / Σ own-over-record-holders × 100`; 0 for buckets
    /// with no metering nodes.
    pub waste_pct: f64,
    /// `Σ children / Σ own` over record holders, capped to [0, 100]; 100
    /// for buckets with no metering nodes (nothing to lose).
    pub efficiency_pct: f64,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct BucketAccumulator {
    total_withdrawal: f64,
    total_waste: f64,
    record_own: f64,
    record_children: f64,
    count: usize,
    members: Vec<String>,
}

impl BucketAccumulator {
    fn finish(self) -> LevelBucket {
        let (waste_pct, efficiency_pct) = if self.record_own > 0.0 {
            (
                self.total_waste.abs() / self.record_own * 100.0,
                (self.record_children / self.record_own * 100.0).clamp(0.0, 100.0),
            )
        } else {
            (0.0, 100.0)
        };
        LevelBucket {
            total_withdrawal_kwh: self.total_withdrawal,
            total_waste_kwh: self.total_waste,
            count: self.count,
            waste_pct,
            efficiency_pct,
            members: self.members,
        }
    }
}

/// Depth-wise and kind-wise aggregates over one sector's tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelReport {
    pub by_level: BTreeMap<u32, LevelBucket>,
    pub by_kind: BTreeMap<MeterKind, LevelBucket>,
}

/// Aggregate the computed waste records into depth and kind buckets.
pub fn aggregate(hierarchy: &MeterHierarchy, waste: &WasteAnalysis) -> LevelReport {
    let mut by_level: BTreeMap<u32, BucketAccumulator> = BTreeMap::new();
    let mut by_kind: BTreeMap<MeterKind, BucketAccumulator> = BTreeMap::new();

    for idx in hierarchy.pre_order() {
        let node = hierarchy.node(idx);
        let record = waste.records.get(&node.record.id);

        for acc in [
            by_level.entry(node.level).or_default(),
            by_kind.entry(node.record.kind).or_default(),
        ] {
            acc.total_withdrawal += node.record.withdrawal();
            acc.count += 1;
            acc.members.push(node.record.name.clone());
            if let Some(rec) = record {
                acc.total_waste += rec.waste_amount;
                acc.record_own += rec.own_withdrawal;
                acc.record_children += rec.children_sum;
            }
        }
    }

    LevelReport {
        by_level: by_level.into_iter().map(|(k, v)| (k, v.finish())).collect(),
        by_kind: by_kind.into_iter().map(|(k, v)| (k, v.finish())).collect(),
    }
}
