//! Turns the findings into a prioritized, cost-estimated action list.
//!
//! Saving estimates are heuristic recoverable fractions of observed waste,
//! read from configuration; validator findings always become immediate
//! items with no numeric estimate (the number would be the disputed one).

use crate::validate::ValidationReport;
use crate::waste::WasteAnalysis;
use dwa_core::AnalysisConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeline {
    Immediate,
    ShortTerm,
    MediumTerm,
    Ongoing,
}

impl std::fmt::Display for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Timeline::Immediate => "immediate",
            Timeline::ShortTerm => "short term",
            Timeline::MediumTerm => "medium term",
            Timeline::Ongoing => "ongoing",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    NetworkOperations,
    FieldMaintenance,
    MeteringTeam,
    Planning,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::NetworkOperations => "network operations",
            Role::FieldMaintenance => "field maintenance",
            Role::MeteringTeam => "metering team",
            Role::Planning => "planning",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub priority: Priority,
    pub description: String,
    /// Estimated recoverable energy; absent where a number would be
    /// speculative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_saving_kwh: Option<f64>,
    pub timeline: Timeline,
    pub role: Role,
}

/// How evenly load is spread across distribution boxes, 0-100.
///
/// 100 minus the coefficient of variation (in percent) of box withdrawals,
/// clamped to [0, 100]. With at most one box there is nothing to balance
/// and the score is 100.
pub fn load_balance_score(waste: &WasteAnalysis) -> f64 {
    let withdrawals: Vec<f64> = waste
        .boxes
        .rows
        .iter()
        .map(|r| r.record.own_withdrawal)
        .collect();
    if withdrawals.len() <= 1 {
        return 100.0;
    }
    let n = withdrawals.len() as f64;
    let mean = withdrawals.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 100.0;
    }
    let variance = withdrawals.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / n;
    let cv_pct = variance.sqrt() / mean * 100.0;
    (100.0 - cv_pct).clamp(0.0, 100.0)
}

/// Build the prioritized action list from the computed findings.
pub fn plan(
    waste: &WasteAnalysis,
    validation: &ValidationReport,
    config: &AnalysisConfig,
) -> Vec<ActionItem> {
    let mut items = Vec::new();
    let fractions = &config.saving_fractions;

    // Pre-distribution loss at the root.
    if waste.pre_distribution.waste_pct > config.pre_distribution_action_pct {
        items.push(ActionItem {
            priority: Priority::High,
            description: format!(
                "Investigate pre-distribution loss at the root: {:.1}% ({:.1} kWh) unaccounted \
                 before the first distribution level",
                waste.pre_distribution.waste_pct, waste.pre_distribution.absolute_waste
            ),
            estimated_saving_kwh: Some(
                waste.pre_distribution.absolute_waste * fractions.pre_distribution,
            ),
            timeline: Timeline::ShortTerm,
            role: Role::NetworkOperations,
        });
    }

    // Worst distribution boxes, capped.
    let mut bad_boxes: Vec<_> = waste
        .boxes
        .rows
        .iter()
        .filter(|r| r.record.waste_pct > config.waste_thresholds.critical || r.record.anomaly)
        .collect();
    bad_boxes.sort_by(|a, b| {
        b.record
            .absolute_waste
            .total_cmp(&a.record.absolute_waste)
            .then_with(|| a.id.cmp(&b.id))
    });
    for row in bad_boxes.into_iter().take(config.action_cap_per_category) {
        let (priority, description) = if row.record.anomaly {
            (
                Priority::Medium,
                format!(
                    "Audit distribution box {}: children metered {:.1} kWh above the box reading",
                    row.name, row.record.absolute_waste
                ),
            )
        } else {
            (
                Priority::High,
                format!(
                    "Inspect distribution box {}: {:.1}% waste ({:.1} kWh)",
                    row.name, row.record.waste_pct, row.record.absolute_waste
                ),
            )
        };
        items.push(ActionItem {
            priority,
            description,
            estimated_saving_kwh: Some(row.record.absolute_waste * fractions.distribution_box),
            timeline: Timeline::ShortTerm,
            role: Role::FieldMaintenance,
        });
    }

    // Worst main meters, capped.
    let mut bad_meters: Vec<_> = waste
        .meters
        .rows
        .iter()
        .filter(|r| r.record.waste_pct > config.waste_thresholds.critical || r.record.anomaly)
        .collect();
    bad_meters.sort_by(|a, b| {
        b.record
            .absolute_waste
            .total_cmp(&a.record.absolute_waste)
            .then_with(|| a.id.cmp(&b.id))
    });
    for row in bad_meters.into_iter().take(config.action_cap_per_category) {
        let note = match &row.parent_box {
            Some(parent) => format!(" (under {})", parent),
            None => String::new(),
        };
        items.push(ActionItem {
            priority: Priority::Medium,
            description: format!(
                "Recalibrate main meter {}{}: {:.1} kWh unaccounted across {} customers",
                row.name, note, row.record.absolute_waste, row.customer_count
            ),
            estimated_saving_kwh: Some(row.record.absolute_waste * fractions.main_meter),
            timeline: Timeline::MediumTerm,
            role: Role::MeteringTeam,
        });
    }

    // Every validator finding demands immediate review.
    for issue in &validation.issues {
        items.push(ActionItem {
            priority: Priority::High,
            description: format!("Review reading of {}: {}", issue.name, issue.detail),
            estimated_saving_kwh: None,
            timeline: Timeline::Immediate,
            role: Role::MeteringTeam,
        });
    }

    // Structural rebalancing when box loading is badly skewed.
    let balance = load_balance_score(waste);
    if balance < config.load_balance_action_score {
        items.push(ActionItem {
            priority: Priority::Medium,
            description: format!(
                "Rebalance load across distribution boxes (balance score {:.0}/100)",
                balance
            ),
            estimated_saving_kwh: Some(
                waste.boxes.totals.total_absolute_waste_kwh * fractions.load_balance,
            ),
            timeline: Timeline::MediumTerm,
            role: Role::Planning,
        });
    }

    // Standing maintenance item.
    items.push(ActionItem {
        priority: Priority::Low,
        description: "Routine preventive maintenance across the metering chain".to_string(),
        estimated_saving_kwh: None,
        timeline: Timeline::Ongoing,
        role: Role::FieldMaintenance,
    });

    items.sort_by(|a, b| {
        a.priority.cmp(&b.priority).then_with(|| {
            b.estimated_saving_kwh
                .unwrap_or(0.0)
                .total_cmp(&a.estimated_saving_kwh.unwrap_or(0.0))
        })
    });
    items
}
