//! Per-node waste computation and the four aggregate views derived from it.
//!
//! One explicit-stack post-order pass over the hierarchy fills a single
//! accumulator with everything downstream stages need: the per-node
//! [`WasteRecord`]s, the root's pre-distribution record, the
//! distribution-box and main-meter tables, and the end-to-end network loss.
//! No view triggers its own re-walk of the tree.

use dwa_core::{
    AnalysisConfig, MeterHierarchy, MeterId, MeterKind, WasteRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tolerance used when the validator re-derives waste amounts.
pub const RECOMPUTE_TOLERANCE: f64 = 1e-2;

/// One row of the distribution-box waste table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxWasteRow {
    pub id: MeterId,
    pub name: String,
    pub level: u32,
    pub record: WasteRecord,
}

/// One row of the main-meter waste table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterWasteRow {
    pub id: MeterId,
    pub name: String,
    pub level: u32,
    /// Name of the distribution box this meter hangs under, by upward
    /// tree lookup. `None` when the meter sits directly under the root.
    pub parent_box: Option<String>,
    /// Direct customer children.
    pub customer_count: usize,
    pub record: WasteRecord,
}

/// Totals over one waste table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WasteTableTotals {
    pub total_withdrawal_kwh: f64,
    pub total_children_kwh: f64,
    pub total_absolute_waste_kwh: f64,
    /// `Σ children / Σ own × 100`, capped to [0, 100].
    pub overall_efficiency_pct: f64,
}

impl WasteTableTotals {
    fn from_records<'a>(records: impl Iterator<Item = &'a WasteRecord>) -> Self {
        let mut totals = WasteTableTotals::default();
        for record in records {
            totals.total_withdrawal_kwh += record.own_withdrawal;
            totals.total_children_kwh += record.children_sum;
            totals.total_absolute_waste_kwh += record.absolute_waste;
        }
        totals.overall_efficiency_pct = if totals.total_withdrawal_kwh > 0.0 {
            (totals.total_children_kwh / totals.total_withdrawal_kwh * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        totals
    }
}

/// Distribution-box view: per-box table sorted worst-first, plus totals and
/// the boxes whose children out-metered them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxWasteView {
    pub rows: Vec<BoxWasteRow>,
    pub totals: WasteTableTotals,
    /// Boxes with negative waste (measurement inconsistency).
    pub problem_boxes: Vec<MeterId>,
}

/// Main-meter view, same structure as the box view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterWasteView {
    pub rows: Vec<MeterWasteRow>,
    pub totals: WasteTableTotals,
    pub problem_meters: Vec<MeterId>,
}

/// End-to-end loss: root withdrawal against the sum over every customer
/// leaf in the tree. Independent of intermediate anomalies, which makes it
/// the headline metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkLoss {
    pub root_withdrawal_kwh: f64,
    pub customer_total_kwh: f64,
    pub customer_count: usize,
    pub loss_kwh: f64,
    /// `loss / root × 100`, or 0 for a zero root reading. Negative when
    /// customers collectively metered more than the root.
    pub loss_pct: f64,
}

impl NetworkLoss {
    /// Network efficiency as reported in the executive summary.
    pub fn efficiency_pct(&self) -> f64 {
        100.0 - self.loss_pct
    }
}

/// Result of the single waste pass: every per-node record plus the four
/// named views. Immutable once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteAnalysis {
    /// WasteRecord per non-customer node, keyed by meter id.
    pub records: BTreeMap<MeterId, WasteRecord>,
    /// The root node's own record.
    pub pre_distribution: WasteRecord,
    pub boxes: BoxWasteView,
    pub meters: MeterWasteView,
    pub network_loss: NetworkLoss,
}

/// Compute waste for every non-customer node and assemble all four views in
/// one post-order traversal.
pub fn compute(hierarchy: &MeterHierarchy, config: &AnalysisConfig) -> WasteAnalysis {
    let mut records = BTreeMap::new();
    let mut box_rows = Vec::new();
    let mut meter_rows = Vec::new();
    let mut customer_total = 0.0;
    let mut customer_count = 0usize;

    for idx in hierarchy.post_order() {
        let node = hierarchy.node(idx);

        if node.record.kind == MeterKind::Customer {
            customer_total += node.record.withdrawal();
            customer_count += 1;
            continue;
        }

        let children = hierarchy.children(idx);
        let children_sum: f64 = children
            .iter()
            .map(|&c| hierarchy.node(c).record.withdrawal())
            .sum();
        let record = WasteRecord::derive(node.record.withdrawal(), children_sum, config);

        match node.record.kind {
            MeterKind::DistributionBox => box_rows.push(BoxWasteRow {
                id: node.record.id,
                name: node.record.name.clone(),
                level: node.level,
                record: record.clone(),
            }),
            MeterKind::MainMeter => {
                let direct_customers = children
                    .iter()
                    .filter(|&&c| hierarchy.node(c).record.kind == MeterKind::Customer)
                    .count();
                meter_rows.push(MeterWasteRow {
                    id: node.record.id,
                    name: node.record.name.clone(),
                    level: node.level,
                    parent_box: hierarchy
                        .ancestor_name_of_kind(idx, MeterKind::DistributionBox),
                    customer_count: direct_customers,
                    record: record.clone(),
                });
            }
            _ => {}
        }

        records.insert(node.record.id, record);
    }

    // Worst offenders first; tie-break on id so repeated runs over the same
    // snapshot stay bit-identical.
    let by_waste_desc = |pct_a: f64, id_a: MeterId, pct_b: f64, id_b: MeterId| {
        pct_b
            .total_cmp(&pct_a)
            .then_with(|| id_a.cmp(&id_b))
    };
    box_rows.sort_by(|a, b| by_waste_desc(a.record.waste_pct, a.id, b.record.waste_pct, b.id));
    meter_rows.sort_by(|a, b| by_waste_desc(a.record.waste_pct, a.id, b.record.waste_pct, b.id));

    let box_totals = WasteTableTotals::from_records(box_rows.iter().map(|r| &r.record));
    let meter_totals = WasteTableTotals::from_records(meter_rows.iter().map(|r| &r.record));
    let problem_boxes = box_rows
        .iter()
        .filter(|r| r.record.anomaly)
        .map(|r| r.id)
        .collect();
    let problem_meters = meter_rows
        .iter()
        .filter(|r| r.record.anomaly)
        .map(|r| r.id)
        .collect();

    let root = hierarchy.root_node();
    let root_withdrawal = root.record.withdrawal();
    let pre_distribution = records
        .get(&root.record.id)
        .cloned()
        .unwrap_or_else(|| WasteRecord::derive(root_withdrawal, 0.0, config));

    let loss_kwh = root_withdrawal - customer_total;
    let loss_pct = if root_withdrawal > 0.0 {
        loss_kwh / root_withdrawal * 100.0
    } else {
        0.0
    };

    WasteAnalysis {
        records,
        pre_distribution,
        boxes: BoxWasteView {
            rows: box_rows,
            totals: box_totals,
            problem_boxes,
        },
        meters: MeterWasteView {
            rows: meter_rows,
            totals: meter_totals,
            problem_meters,
        },
        network_loss: NetworkLoss {
            root_withdrawal_kwh: root_withdrawal,
            customer_total_kwh: customer_total,
            customer_count,
            loss_kwh,
            loss_pct,
        },
    }
}
