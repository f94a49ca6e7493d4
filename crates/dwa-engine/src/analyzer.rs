//! Orchestrates the full pipeline for one sector into a single immutable,
//! serializable result.
//!
//! One call, one snapshot: build the tree, compute waste, aggregate,
//! validate, synthesize the reports, plan the actions. Nothing is cached
//! between calls and nothing in the result is mutated after assembly.

use crate::aggregate::{self, LevelReport};
use crate::builder;
use crate::compare::{self, ComparativeReport};
use crate::plan::{self, ActionItem};
use crate::report::{self, ExecutiveSummary, FinancialImpact, Forecast};
use crate::validate::{self, ValidationReport};
use crate::waste::{self, WasteAnalysis};
use dwa_core::{
    AnalysisConfig, Diagnostics, DwaResult, MeterHierarchy, MeterId, MeterKind, MeterStore,
    SectorId, WasteRecord,
};
use serde::{Deserialize, Serialize};

/// Flat, serializable rendering of one tree node with its annotations and
/// (for metering nodes) its waste record. Parent references reconstruct the
/// tree shape for downstream presenters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedNode {
    pub id: MeterId,
    pub name: String,
    pub kind: MeterKind,
    pub sector: SectorId,
    pub parent: Option<MeterId>,
    pub level: u32,
    pub path: Vec<String>,
    pub withdrawal_kwh: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste: Option<WasteRecord>,
}

/// Everything one analysis call produces. Consumed once by presentation or
/// export collaborators, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorAnalysisResult {
    pub sector: SectorId,
    /// Pre-order flattening of the annotated tree.
    pub nodes: Vec<AnnotatedNode>,
    pub waste: WasteAnalysis,
    pub levels: LevelReport,
    pub validation: ValidationReport,
    pub summary: ExecutiveSummary,
    pub financial: FinancialImpact,
    pub forecast: Forecast,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparativeReport>,
    pub actions: Vec<ActionItem>,
    pub diagnostics: Diagnostics,
}

/// Entry point for sector analysis.
#[derive(Debug, Clone, Default)]
pub struct SectorAnalyzer {
    config: AnalysisConfig,
}

impl SectorAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one sector without cross-sector comparison.
    pub fn analyze<S: MeterStore + ?Sized>(
        &self,
        store: &S,
        sector: SectorId,
    ) -> DwaResult<SectorAnalysisResult> {
        self.run(store, sector, None)
    }

    /// Analyze one sector and rank it against every other active sector.
    pub fn analyze_with_comparison<S: MeterStore + Sync + ?Sized>(
        &self,
        store: &S,
        sector: SectorId,
    ) -> DwaResult<SectorAnalysisResult> {
        let comparison = compare::compare(store, sector, &self.config)?;
        self.run(store, sector, Some(comparison))
    }

    fn run<S: MeterStore + ?Sized>(
        &self,
        store: &S,
        sector: SectorId,
        comparison: Option<ComparativeReport>,
    ) -> DwaResult<SectorAnalysisResult> {
        let outcome = builder::build(store, sector, &self.config)?;
        let waste = waste::compute(&outcome.hierarchy, &self.config);
        let levels = aggregate::aggregate(&outcome.hierarchy, &waste);
        let validation = validate::validate(&outcome.hierarchy, &waste);
        let summary = report::executive_summary(sector, &outcome.hierarchy, &waste, &self.config);
        let financial = report::financial_impact(&waste, &self.config);
        let forecast = report::forecast(&summary, &self.config);
        let actions = plan::plan(&waste, &validation, &self.config);
        let nodes = flatten(&outcome.hierarchy, &waste);

        Ok(SectorAnalysisResult {
            sector,
            nodes,
            waste,
            levels,
            validation,
            summary,
            financial,
            forecast,
            comparison,
            actions,
            diagnostics: outcome.diagnostics,
        })
    }
}

fn flatten(hierarchy: &MeterHierarchy, waste: &WasteAnalysis) -> Vec<AnnotatedNode> {
    hierarchy
        .pre_order()
        .into_iter()
        .map(|idx| {
            let node = hierarchy.node(idx);
            AnnotatedNode {
                id: node.record.id,
                name: node.record.name.clone(),
                kind: node.record.kind,
                sector: node.record.sector,
                parent: node.record.parent,
                level: node.level,
                path: node.path.clone(),
                withdrawal_kwh: node.record.withdrawal(),
                waste: waste.records.get(&node.record.id).cloned(),
            }
        })
        .collect()
}
