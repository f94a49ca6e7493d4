//! End-to-end pipeline tests over an in-memory snapshot store.

use dwa_core::{
    AnalysisConfig, DwaError, MeterId, MeterKind, MeterRecord, SectorId, WasteStatus,
};
use dwa_engine::{SectorAnalyzer, ValidationStatus};
use dwa_io::MemoryStore;

fn rec(
    id: u64,
    name: &str,
    kind: MeterKind,
    withdrawal: Option<f64>,
    sector: u64,
    parent: Option<u64>,
) -> MeterRecord {
    MeterRecord {
        id: MeterId::new(id),
        name: name.to_string(),
        kind,
        withdrawal_kwh: withdrawal,
        sector: SectorId::new(sector),
        parent: parent.map(MeterId::new),
        current_balance: None,
    }
}

/// One healthy sector: generator 1000 feeding two boxes (400, 550), each
/// box feeding one meter, each meter one customer.
fn healthy_sector(sector: u64, base_id: u64) -> Vec<MeterRecord> {
    use MeterKind::*;
    vec![
        rec(base_id, "Gen", Generator, Some(1000.0), sector, None),
        rec(base_id + 1, "Box A", DistributionBox, Some(400.0), sector, Some(base_id)),
        rec(base_id + 2, "Box B", DistributionBox, Some(550.0), sector, Some(base_id)),
        rec(base_id + 3, "Meter A1", MainMeter, Some(380.0), sector, Some(base_id + 1)),
        rec(base_id + 4, "Meter B1", MainMeter, Some(520.0), sector, Some(base_id + 2)),
        rec(base_id + 5, "Cust A1a", Customer, Some(360.0), sector, Some(base_id + 3)),
        rec(base_id + 6, "Cust B1a", Customer, Some(500.0), sector, Some(base_id + 4)),
    ]
}

#[test]
fn test_root_waste_figures() {
    let store = MemoryStore::new(healthy_sector(1, 1)).unwrap();
    let analyzer = SectorAnalyzer::new(AnalysisConfig::default());
    let result = analyzer.analyze(&store, SectorId::new(1)).unwrap();

    let root = &result.waste.pre_distribution;
    assert!((root.waste_amount - 50.0).abs() < 1e-9);
    assert!((root.waste_pct - 5.0).abs() < 1e-9);
    assert!((root.efficiency_pct - 95.0).abs() < 1e-9);
    assert_eq!(root.status, WasteStatus::Normal);
}

#[test]
fn test_anomaly_flows_to_validator() {
    use MeterKind::*;
    let store = MemoryStore::new(vec![
        rec(1, "Gen", Generator, Some(1000.0), 1, None),
        rec(2, "Box", DistributionBox, Some(200.0), 1, Some(1)),
        rec(3, "Cust", Customer, Some(250.0), 1, Some(2)),
    ])
    .unwrap();
    let analyzer = SectorAnalyzer::new(AnalysisConfig::default());
    let result = analyzer.analyze(&store, SectorId::new(1)).unwrap();

    let record = &result.waste.records[&MeterId::new(2)];
    assert!(record.anomaly);
    assert!((record.waste_amount - (-50.0)).abs() < 1e-9);
    assert!((record.absolute_waste - 50.0).abs() < 1e-9);
    assert!((record.efficiency_pct - 100.0).abs() < 1e-9);
    assert_eq!(record.status, WasteStatus::Anomaly);

    // The independent re-check flags the same node from its own recompute.
    assert_eq!(result.validation.status, ValidationStatus::NeedsReview);
    assert!(result
        .validation
        .issues
        .iter()
        .any(|i| i.meter == MeterId::new(2) && i.excess_kwh.is_some()));
    assert_eq!(result.waste.boxes.problem_boxes, vec![MeterId::new(2)]);
}

#[test]
fn test_rootless_sector_fails() {
    let store = MemoryStore::new(vec![rec(
        1,
        "Box",
        MeterKind::DistributionBox,
        Some(100.0),
        3,
        None,
    )])
    .unwrap();
    let analyzer = SectorAnalyzer::new(AnalysisConfig::default());
    let err = analyzer.analyze(&store, SectorId::new(3)).unwrap_err();
    assert!(matches!(err, DwaError::RootNotFound(s) if s == SectorId::new(3)));
}

#[test]
fn test_comparison_excludes_rootless_sector() {
    let mut records = Vec::new();
    for sector in 1..=4u64 {
        records.extend(healthy_sector(sector, sector * 100));
    }
    // Sector 5 has meters but no generator.
    records.push(rec(
        500,
        "Orphan box",
        MeterKind::DistributionBox,
        Some(80.0),
        5,
        None,
    ));
    let store = MemoryStore::new(records).unwrap();

    let analyzer = SectorAnalyzer::new(AnalysisConfig::default());
    let result = analyzer
        .analyze_with_comparison(&store, SectorId::new(1))
        .unwrap();
    let comparison = result.comparison.expect("comparison requested");

    assert_eq!(comparison.rankings.len(), 4);
    assert_eq!(comparison.excluded.len(), 1);
    assert_eq!(comparison.excluded[0].sector, SectorId::new(5));
    assert_eq!(comparison.excluded[0].reason, "excluded: no root");
    let ranks: Vec<usize> = comparison.rankings.iter().map(|s| s.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
    assert!(comparison.current_rank.is_some());
}

#[test]
fn test_financial_impact_multiples() {
    use MeterKind::*;
    // Root 1000, single customer chain metering 900: loss is 100 kWh.
    let store = MemoryStore::new(vec![
        rec(1, "Gen", Generator, Some(1000.0), 1, None),
        rec(2, "Box", DistributionBox, Some(950.0), 1, Some(1)),
        rec(3, "Cust", Customer, Some(900.0), 1, Some(2)),
    ])
    .unwrap();
    let analyzer = SectorAnalyzer::new(AnalysisConfig::default().with_price(7200.0));
    let result = analyzer.analyze(&store, SectorId::new(1)).unwrap();

    assert!((result.waste.network_loss.loss_kwh - 100.0).abs() < 1e-9);
    assert!((result.financial.monthly_cost - 21_600_000.0).abs() < 1e-6);
    assert!((result.financial.annual_cost - 262_800_000.0).abs() < 1e-6);
}

#[test]
fn test_consistent_snapshot_validates_clean() {
    let store = MemoryStore::new(healthy_sector(1, 1)).unwrap();
    let analyzer = SectorAnalyzer::new(AnalysisConfig::default());
    let result = analyzer.analyze(&store, SectorId::new(1)).unwrap();

    assert!(result.validation.issues.is_empty());
    assert_eq!(result.validation.status, ValidationStatus::Good);
}

#[test]
fn test_repeat_analysis_is_bit_identical() {
    let mut records = healthy_sector(1, 1);
    records.extend(healthy_sector(2, 100));
    let store = MemoryStore::new(records).unwrap();
    let analyzer = SectorAnalyzer::new(AnalysisConfig::default());

    let first = analyzer
        .analyze_with_comparison(&store, SectorId::new(1))
        .unwrap();
    let second = analyzer
        .analyze_with_comparison(&store, SectorId::new(1))
        .unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_efficiency_stays_in_bounds() {
    use MeterKind::*;
    // Mix of over- and under-metering children.
    let store = MemoryStore::new(vec![
        rec(1, "Gen", Generator, Some(500.0), 1, None),
        rec(2, "Box hot", DistributionBox, Some(100.0), 1, Some(1)),
        rec(3, "Cust hot", Customer, Some(400.0), 1, Some(2)),
        rec(4, "Box cold", DistributionBox, Some(300.0), 1, Some(1)),
        rec(5, "Cust cold", Customer, Some(10.0), 1, Some(4)),
    ])
    .unwrap();
    let analyzer = SectorAnalyzer::new(AnalysisConfig::default());
    let result = analyzer.analyze(&store, SectorId::new(1)).unwrap();

    for record in result.waste.records.values() {
        assert!(
            (0.0..=100.0).contains(&record.efficiency_pct),
            "efficiency out of bounds: {}",
            record.efficiency_pct
        );
    }
}
