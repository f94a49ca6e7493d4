//! Cross-sector comparative ranking.
//!
//! Each active sector gets its own full build-and-compute pass against the
//! same store; the sub-analyses are pure and independent, so with the
//! `parallel` feature they run on the rayon pool (no snapshot-consistency
//! guarantee exists between sectors either way). Results are sorted
//! afterwards, so the output ranking is deterministic regardless of
//! execution order. Sectors without a resolvable root are excluded from the
//! ranking and reported separately; one sector's store failure never aborts
//! the others.

use crate::{builder, waste};
use dwa_core::config::BenchmarkTier;
use dwa_core::{AnalysisConfig, DwaError, DwaResult, MeterStore, SectorId};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One ranked sector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorStanding {
    pub sector: SectorId,
    pub network_efficiency_pct: f64,
    pub loss_pct: f64,
    /// 1-based, best efficiency first.
    pub rank: usize,
}

/// A sector left out of the ranking, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedSector {
    pub sector: SectorId,
    pub reason: String,
}

/// Distance from the current sector's efficiency to one benchmark target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkGap {
    pub tier: BenchmarkTier,
    /// `target - current`; negative means the target is already met.
    pub gap_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparativeReport {
    pub rankings: Vec<SectorStanding>,
    pub excluded: Vec<ExcludedSector>,
    /// Rank of the sector under analysis, if it made the ranking.
    pub current_rank: Option<usize>,
    pub top_performer: Option<SectorId>,
    pub benchmark_gaps: Vec<BenchmarkGap>,
}

/// Measured efficiency for one sector, or the reason it could not be.
type SectorMeasurement = (SectorId, Result<(f64, f64), String>);

fn measure_sector<S: MeterStore + ?Sized>(
    store: &S,
    sector: SectorId,
    config: &AnalysisConfig,
) -> SectorMeasurement {
    let outcome = match builder::build(store, sector, config) {
        Ok(outcome) => outcome,
        Err(DwaError::RootNotFound(_)) => return (sector, Err("no root".to_string())),
        Err(err) => return (sector, Err(err.to_string())),
    };
    let analysis = waste::compute(&outcome.hierarchy, config);
    let loss = &analysis.network_loss;
    (sector, Ok((loss.efficiency_pct(), loss.loss_pct)))
}

/// Rank every active sector by network efficiency.
pub fn compare<S: MeterStore + Sync + ?Sized>(
    store: &S,
    current: SectorId,
    config: &AnalysisConfig,
) -> DwaResult<ComparativeReport> {
    let mut sectors = store.active_sectors()?;
    if !sectors.contains(&current) {
        sectors.push(current);
    }
    sectors.sort();
    sectors.dedup();

    #[cfg(feature = "parallel")]
    let measurements: Vec<SectorMeasurement> = sectors
        .par_iter()
        .map(|&s| measure_sector(store, s, config))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let measurements: Vec<SectorMeasurement> = sectors
        .iter()
        .map(|&s| measure_sector(store, s, config))
        .collect();

    let mut measured = Vec::new();
    let mut excluded = Vec::new();
    for (sector, result) in measurements {
        match result {
            Ok((efficiency, loss)) => measured.push((sector, efficiency, loss)),
            Err(reason) => excluded.push(ExcludedSector {
                sector,
                reason: format!("excluded: {}", reason),
            }),
        }
    }

    measured.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let rankings: Vec<SectorStanding> = measured
        .iter()
        .enumerate()
        .map(|(i, &(sector, efficiency, loss))| SectorStanding {
            sector,
            network_efficiency_pct: efficiency,
            loss_pct: loss,
            rank: i + 1,
        })
        .collect();

    let current_standing = rankings.iter().find(|s| s.sector == current);
    let benchmark_gaps = current_standing
        .map(|standing| {
            config
                .benchmark_tiers
                .iter()
                .map(|&tier| BenchmarkGap {
                    tier,
                    gap_pct: tier.target_efficiency_pct - standing.network_efficiency_pct,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ComparativeReport {
        current_rank: current_standing.map(|s| s.rank),
        top_performer: rankings.first().map(|s| s.sector),
        rankings,
        excluded,
        benchmark_gaps,
    })
}
