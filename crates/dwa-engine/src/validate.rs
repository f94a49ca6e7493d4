//! Independent cross-check of the waste computation.
//!
//! The validator trusts nothing: it re-derives every node's waste amount
//! from the two stored inputs and compares against the stored value, and it
//! flags every node whose children collectively metered more than the node
//! itself. Both checks can fire for the same node.

use crate::waste::{WasteAnalysis, RECOMPUTE_TOLERANCE};
use dwa_core::{MeterHierarchy, MeterId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueSeverity {
    High,
    Medium,
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueSeverity::High => f.write_str("high"),
            IssueSeverity::Medium => f.write_str("medium"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    /// Stored waste amount disagrees with `own - children` beyond tolerance.
    CalculationMismatch,
    /// Direct children's metered total exceeds the parent's own reading.
    ChildrenExceedParent,
}

/// One finding, tied to a meter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub meter: MeterId,
    pub name: String,
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub detail: String,
    /// For [`IssueKind::ChildrenExceedParent`]: the kWh excess.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excess_kwh: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Good,
    NeedsReview,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStatus::Good => f.write_str("good"),
            ValidationStatus::NeedsReview => f.write_str("needs review"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub high_count: usize,
    pub medium_count: usize,
    pub status: ValidationStatus,
}

/// Re-derive every waste record and collect inconsistencies.
pub fn validate(hierarchy: &MeterHierarchy, waste: &WasteAnalysis) -> ValidationReport {
    let mut issues = Vec::new();

    for (&id, record) in &waste.records {
        let name = hierarchy
            .get(id)
            .map(|idx| hierarchy.node(idx).record.name.clone())
            .unwrap_or_else(|| format!("Meter {}", id));

        let recomputed = record.own_withdrawal - record.children_sum;
        if (recomputed - record.waste_amount).abs() > RECOMPUTE_TOLERANCE {
            issues.push(ValidationIssue {
                meter: id,
                name: name.clone(),
                kind: IssueKind::CalculationMismatch,
                severity: IssueSeverity::High,
                detail: format!(
                    "stored waste {:.3} kWh, recomputed {:.3} kWh",
                    record.waste_amount, recomputed
                ),
                excess_kwh: None,
            });
        }

        if record.children_sum > record.own_withdrawal {
            let excess = record.children_sum - record.own_withdrawal;
            issues.push(ValidationIssue {
                meter: id,
                name,
                kind: IssueKind::ChildrenExceedParent,
                severity: IssueSeverity::Medium,
                detail: format!(
                    "children metered {:.3} kWh against own reading {:.3} kWh",
                    record.children_sum, record.own_withdrawal
                ),
                excess_kwh: Some(excess),
            });
        }
    }

    let high_count = issues
        .iter()
        .filter(|i| i.severity == IssueSeverity::High)
        .count();
    let medium_count = issues.len() - high_count;
    let status = if issues.is_empty() {
        ValidationStatus::Good
    } else {
        ValidationStatus::NeedsReview
    };

    ValidationReport {
        issues,
        high_count,
        medium_count,
        status,
    }
}
