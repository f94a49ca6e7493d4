//! # dwa-core: Distribution Waste Analysis Core
//!
//! Fundamental data structures for analyzing unaccounted energy loss in
//! multi-level electrical distribution networks.
//!
//! ## Design Philosophy
//!
//! A sector's metering points form a **rooted tree** anchored at a generator:
//! - **Generator**: the sector's root metering point
//! - **Distribution box**: intermediate node aggregating main meters/customers
//! - **Main meter**: intermediate node between a box and end customers
//! - **Customer**: leaf billing account, structurally childless
//!
//! Every node records a cumulative withdrawal (kWh) for the billing cycle.
//! The difference between a node's own withdrawal and the sum recorded by its
//! direct children is its **waste**: a proxy for technical loss, metering
//! error, or unbilled consumption. Waste can be negative when children
//! collectively meter more than their parent; that is preserved as a
//! measurement anomaly rather than discarded.
//!
//! ## Core Data Structures
//!
//! - [`MeterRecord`] - one metering point as served by the persistence layer
//! - [`MeterKind`] - closed tagged variant for the node type, resolved once
//!   at ingestion from raw labels
//! - [`MeterHierarchy`] - the assembled tree (petgraph `DiGraph`) with depth
//!   and ancestor-path annotations
//! - [`WasteRecord`] - derived per-node discrepancy metrics, immutable once
//!   computed
//! - Type-safe IDs: [`MeterId`], [`SectorId`]
//!
//! ## Modules
//!
//! - [`config`] - named, overridable business constants (thresholds, tariffs)
//! - [`diagnostics`] - non-fatal issue collection during build and import
//! - [`error`] - unified error type [`DwaError`]
//! - [`hierarchy`] - tree assembly and traversal helpers
//! - [`store`] - read-only boundary to the persistence collaborator

use serde::{Deserialize, Serialize};

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod hierarchy;
pub mod store;

pub use config::AnalysisConfig;
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{DwaError, DwaResult};
pub use hierarchy::{HierarchyNode, MeterHierarchy};
pub use store::MeterStore;

// Newtype wrappers for IDs for type safety
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MeterId(u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SectorId(u64);

impl MeterId {
    #[inline]
    pub fn new(value: u64) -> Self {
        MeterId(value)
    }
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl SectorId {
    #[inline]
    pub fn new(value: u64) -> Self {
        SectorId(value)
    }
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MeterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for SectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a metering point in the distribution tree.
///
/// Upstream systems store this as a free-text label with several spellings
/// in circulation; [`MeterKind::from_label`] resolves a label to a variant
/// exactly once at ingestion and fails fast on anything unrecognized.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum MeterKind {
    Generator,
    DistributionBox,
    MainMeter,
    Customer,
}

impl MeterKind {
    /// Resolve a raw label to a kind. Matching is case-insensitive and
    /// covers the spellings observed in upstream exports.
    pub fn from_label(label: &str) -> DwaResult<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "generator" | "gen" => Ok(MeterKind::Generator),
            "distribution_box" | "distribution box" | "distbox" | "box" => {
                Ok(MeterKind::DistributionBox)
            }
            "main_meter" | "main meter" | "meter" | "mainmeter" => Ok(MeterKind::MainMeter),
            "customer" | "subscriber" => Ok(MeterKind::Customer),
            _ => Err(DwaError::UnknownMeterKind(label.to_string())),
        }
    }

    /// Whether `child` is an allowed direct child of `self` in a
    /// well-formed hierarchy.
    ///
    /// Generator → {DistributionBox, MainMeter, Customer},
    /// DistributionBox → {MainMeter, Customer},
    /// MainMeter → {Customer}, Customer → {}.
    pub fn allows_child(&self, child: MeterKind) -> bool {
        match self {
            MeterKind::Generator => !matches!(child, MeterKind::Generator),
            MeterKind::DistributionBox => {
                matches!(child, MeterKind::MainMeter | MeterKind::Customer)
            }
            MeterKind::MainMeter => matches!(child, MeterKind::Customer),
            MeterKind::Customer => false,
        }
    }

    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            MeterKind::Generator => "generator",
            MeterKind::DistributionBox => "distribution box",
            MeterKind::MainMeter => "main meter",
            MeterKind::Customer => "customer",
        }
    }
}

impl std::fmt::Display for MeterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One metering point as served by the persistence layer.
///
/// Read-only for the duration of an analysis call; the engine never mutates
/// records. A missing withdrawal means the reading was not captured and is
/// treated as 0.0 kWh, never as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterRecord {
    pub id: MeterId,
    pub name: String,
    pub kind: MeterKind,
    /// Cumulative metered consumption for the billing cycle (kWh).
    pub withdrawal_kwh: Option<f64>,
    pub sector: SectorId,
    /// `None` only for the root of a sector's tree.
    pub parent: Option<MeterId>,
    /// Informational account balance; not used by the analysis.
    pub current_balance: Option<f64>,
}

impl MeterRecord {
    /// Withdrawal with the missing-reading rule applied: absent or
    /// non-finite values count as 0.0 kWh.
    pub fn withdrawal(&self) -> f64 {
        match self.withdrawal_kwh {
            Some(v) if v.is_finite() => v,
            _ => 0.0,
        }
    }
}

/// Severity tier of a node's waste, from the configured waste-percentage
/// thresholds. `Anomaly` is the distinct reporting bucket for negative
/// waste (children metered more than their parent): a measurement
/// inconsistency, not a physical loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WasteStatus {
    Critical,
    High,
    Normal,
    Excellent,
    Anomaly,
}

impl std::fmt::Display for WasteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WasteStatus::Critical => "critical",
            WasteStatus::High => "high",
            WasteStatus::Normal => "normal",
            WasteStatus::Excellent => "excellent",
            WasteStatus::Anomaly => "anomaly",
        };
        f.write_str(s)
    }
}

/// Derived per-node discrepancy metrics. Created once per analysis run and
/// never persisted; `waste_amount` is always recomputable from the two
/// inputs, which is what the validator exploits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRecord {
    /// The node's own metered withdrawal (kWh).
    pub own_withdrawal: f64,
    /// Sum of direct children's own withdrawal (kWh).
    pub children_sum: f64,
    /// `own_withdrawal - children_sum`; negative when children collectively
    /// metered more than the parent.
    pub waste_amount: f64,
    pub absolute_waste: f64,
    /// `absolute_waste / own_withdrawal * 100`, or 0 for a zero withdrawal.
    pub waste_pct: f64,
    /// `children_sum / own_withdrawal * 100`, capped to [0, 100] and forced
    /// to 100 for negative waste.
    pub efficiency_pct: f64,
    /// True iff `waste_amount < 0`.
    pub anomaly: bool,
    pub status: WasteStatus,
}

impl WasteRecord {
    /// Build a record from the two measured inputs, applying the
    /// zero-withdrawal and negative-waste rules. Thresholds come from the
    /// caller so business constants stay in one place.
    pub fn derive(own_withdrawal: f64, children_sum: f64, config: &AnalysisConfig) -> Self {
        let waste_amount = own_withdrawal - children_sum;
        let absolute_waste = waste_amount.abs();
        let anomaly = waste_amount < 0.0;

        let waste_pct = if own_withdrawal == 0.0 {
            0.0
        } else {
            absolute_waste / own_withdrawal * 100.0
        };

        let efficiency_pct = if anomaly {
            // Children cannot be less efficient than a parent that
            // under-measured them.
            100.0
        } else if own_withdrawal == 0.0 {
            0.0
        } else {
            (children_sum / own_withdrawal * 100.0).clamp(0.0, 100.0)
        };

        let status = if anomaly {
            WasteStatus::Anomaly
        } else {
            config.waste_thresholds.classify(waste_pct)
        };

        WasteRecord {
            own_withdrawal,
            children_sum,
            waste_amount,
            absolute_waste,
            waste_pct,
            efficiency_pct,
            anomaly,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_label_resolution() {
        assert_eq!(MeterKind::from_label("Generator").unwrap(), MeterKind::Generator);
        assert_eq!(
            MeterKind::from_label("distribution box").unwrap(),
            MeterKind::DistributionBox
        );
        assert_eq!(MeterKind::from_label("MAIN_METER").unwrap(), MeterKind::MainMeter);
        assert_eq!(MeterKind::from_label(" subscriber ").unwrap(), MeterKind::Customer);
    }

    #[test]
    fn test_kind_unknown_label_fails_fast() {
        let err = MeterKind::from_label("transformer").unwrap_err();
        assert!(matches!(err, DwaError::UnknownMeterKind(_)));
        assert!(err.to_string().contains("transformer"));
    }

    #[test]
    fn test_allowed_children_rule() {
        assert!(MeterKind::Generator.allows_child(MeterKind::DistributionBox));
        assert!(MeterKind::Generator.allows_child(MeterKind::MainMeter));
        assert!(MeterKind::Generator.allows_child(MeterKind::Customer));
        assert!(!MeterKind::Generator.allows_child(MeterKind::Generator));
        assert!(MeterKind::DistributionBox.allows_child(MeterKind::MainMeter));
        assert!(!MeterKind::DistributionBox.allows_child(MeterKind::DistributionBox));
        assert!(MeterKind::MainMeter.allows_child(MeterKind::Customer));
        assert!(!MeterKind::MainMeter.allows_child(MeterKind::MainMeter));
        assert!(!MeterKind::Customer.allows_child(MeterKind::Customer));
    }

    #[test]
    fn test_missing_withdrawal_is_zero() {
        let record = MeterRecord {
            id: MeterId::new(1),
            name: "Box 1".to_string(),
            kind: MeterKind::DistributionBox,
            withdrawal_kwh: None,
            sector: SectorId::new(1),
            parent: Some(MeterId::new(0)),
            current_balance: None,
        };
        assert_eq!(record.withdrawal(), 0.0);

        let nan = MeterRecord {
            withdrawal_kwh: Some(f64::NAN),
            ..record
        };
        assert_eq!(nan.withdrawal(), 0.0);
    }

    #[test]
    fn test_waste_record_normal_case() {
        let config = AnalysisConfig::default();
        let record = WasteRecord::derive(1000.0, 950.0, &config);
        assert!((record.waste_amount - 50.0).abs() < 1e-9);
        assert!((record.waste_pct - 5.0).abs() < 1e-9);
        assert!((record.efficiency_pct - 95.0).abs() < 1e-9);
        assert!(!record.anomaly);
        assert_eq!(record.status, WasteStatus::Normal);
    }

    #[test]
    fn test_waste_record_negative_is_anomaly() {
        let config = AnalysisConfig::default();
        let record = WasteRecord::derive(200.0, 250.0, &config);
        assert!((record.waste_amount + 50.0).abs() < 1e-9);
        assert!((record.absolute_waste - 50.0).abs() < 1e-9);
        assert!(record.anomaly);
        assert_eq!(record.efficiency_pct, 100.0);
        assert_eq!(record.status, WasteStatus::Anomaly);
    }

    #[test]
    fn test_waste_record_zero_withdrawal() {
        let config = AnalysisConfig::default();
        let record = WasteRecord::derive(0.0, 0.0, &config);
        assert_eq!(record.waste_pct, 0.0);
        assert_eq!(record.efficiency_pct, 0.0);
        assert_eq!(record.status, WasteStatus::Excellent);
    }

    #[test]
    fn test_waste_record_structural_leaf() {
        let config = AnalysisConfig::default();
        let record = WasteRecord::derive(300.0, 0.0, &config);
        assert!((record.waste_amount - 300.0).abs() < 1e-9);
        assert_eq!(record.waste_pct, 100.0);
        assert_eq!(record.status, WasteStatus::Critical);
    }

    #[test]
    fn test_meter_id_roundtrip() {
        let id = MeterId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: MeterId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
