//! # dwa-engine: Waste Analysis Pipeline
//!
//! Batch analysis of one sector's metering tree: quantify unaccounted
//! energy loss between successive metering points and turn it into
//! prioritized, financially-costed remediation guidance.
//!
//! ## Pipeline
//!
//! | Stage | Entry point | Output |
//! |-------|-------------|--------|
//! | Tree assembly | [`builder::build`] | [`dwa_core::MeterHierarchy`] |
//! | Waste computation | [`waste::compute`] | [`WasteAnalysis`] (four views, one pass) |
//! | Depth/kind aggregation | [`aggregate::aggregate`] | [`LevelReport`] |
//! | Independent re-check | [`validate::validate`] | [`ValidationReport`] |
//! | Report synthesis | [`report`] | summary, financial impact, forecast |
//! | Cross-sector ranking | [`compare::compare`] | [`ComparativeReport`] |
//! | Action planning | [`plan::plan`] | prioritized [`ActionItem`] list |
//!
//! Each stage consumes only the immutable output of the previous one;
//! [`SectorAnalyzer`] wires them together and returns a single
//! serializable [`SectorAnalysisResult`] per call. Every invocation is a
//! fresh, self-contained batch computation over one point-in-time store
//! snapshot: no cross-run state, no caching, no incremental recomputation.
//!
//! ## Example
//!
//! ```ignore
//! use dwa_core::{AnalysisConfig, SectorId};
//! use dwa_engine::SectorAnalyzer;
//!
//! let analyzer = SectorAnalyzer::new(AnalysisConfig::default().with_price(7200.0));
//! let result = analyzer.analyze_with_comparison(&store, SectorId::new(1))?;
//! println!("network loss: {:.1} kWh", result.waste.network_loss.loss_kwh);
//! ```

pub mod aggregate;
pub mod analyzer;
pub mod builder;
pub mod compare;
pub mod plan;
pub mod report;
pub mod validate;
pub mod waste;

pub use aggregate::{LevelBucket, LevelReport};
pub use analyzer::{AnnotatedNode, SectorAnalysisResult, SectorAnalyzer};
pub use builder::BuildOutcome;
pub use compare::{BenchmarkGap, ComparativeReport, ExcludedSector, SectorStanding};
pub use plan::{load_balance_score, ActionItem, Priority, Role, Timeline};
pub use report::{
    CategoryBreakdown, ExecutiveSummary, FinancialImpact, Forecast, ForecastHorizon, ForecastPoint,
};
pub use validate::{
    IssueKind, IssueSeverity, ValidationIssue, ValidationReport, ValidationStatus,
};
pub use waste::{
    BoxWasteRow, BoxWasteView, MeterWasteRow, MeterWasteView, NetworkLoss, WasteAnalysis,
    WasteTableTotals, RECOMPUTE_TOLERANCE,
};
