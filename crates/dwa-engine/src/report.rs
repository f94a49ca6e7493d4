//! Executive summary, financial-impact projection, and the heuristic
//! forward projection.
//!
//! The forecast is a simple multiplicative decay/growth heuristic, not a
//! statistical model: efficiency is assumed to erode without intervention
//! while the customer base grows.

use crate::waste::WasteAnalysis;
use dwa_core::config::HealthTier;
use dwa_core::{AnalysisConfig, MeterHierarchy, MeterKind, SectorId};
use serde::{Deserialize, Serialize};

/// Per-category waste breakdown for the executive summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub pre_distribution_waste_kwh: f64,
    pub pre_distribution_waste_pct: f64,
    pub box_absolute_waste_kwh: f64,
    pub problem_box_count: usize,
    pub meter_absolute_waste_kwh: f64,
    pub problem_meter_count: usize,
}

/// Top-of-report summary for one sector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub sector: SectorId,
    pub generator_count: usize,
    pub box_count: usize,
    pub meter_count: usize,
    pub customer_count: usize,
    /// `100 - network loss %`. Negative loss (customers out-metering the
    /// root) pushes this above 100; it is reported as-is.
    pub network_efficiency_pct: f64,
    pub health: HealthTier,
    pub breakdown: CategoryBreakdown,
}

/// Build the executive summary from the computed views.
pub fn executive_summary(
    sector: SectorId,
    hierarchy: &MeterHierarchy,
    waste: &WasteAnalysis,
    config: &AnalysisConfig,
) -> ExecutiveSummary {
    let counts = hierarchy.counts_by_kind();
    let count = |kind: MeterKind| counts.get(&kind).copied().unwrap_or(0);

    let efficiency = waste.network_loss.efficiency_pct();

    ExecutiveSummary {
        sector,
        generator_count: count(MeterKind::Generator),
        box_count: count(MeterKind::DistributionBox),
        meter_count: count(MeterKind::MainMeter),
        customer_count: count(MeterKind::Customer),
        network_efficiency_pct: efficiency,
        health: config.health_tiers.classify(efficiency),
        breakdown: CategoryBreakdown {
            pre_distribution_waste_kwh: waste.pre_distribution.absolute_waste,
            pre_distribution_waste_pct: waste.pre_distribution.waste_pct,
            box_absolute_waste_kwh: waste.boxes.totals.total_absolute_waste_kwh,
            problem_box_count: waste.boxes.problem_boxes.len(),
            meter_absolute_waste_kwh: waste.meters.totals.total_absolute_waste_kwh,
            problem_meter_count: waste.meters.problem_meters.len(),
        },
    }
}

/// Cost of the network loss at the configured tariff. The loss figure is a
/// daily quantity; month and year are simple 30/365 multiples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialImpact {
    pub price_per_kwh: f64,
    pub daily_loss_kwh: f64,
    pub daily_cost: f64,
    pub monthly_cost: f64,
    pub annual_cost: f64,
}

pub fn financial_impact(waste: &WasteAnalysis, config: &AnalysisConfig) -> FinancialImpact {
    let daily_loss = waste.network_loss.loss_kwh;
    let daily_cost = daily_loss * config.price_per_kwh;
    FinancialImpact {
        price_per_kwh: config.price_per_kwh,
        daily_loss_kwh: daily_loss,
        daily_cost,
        monthly_cost: daily_cost * 30.0,
        annual_cost: daily_cost * 365.0,
    }
}

/// Horizon of one forecast point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastHorizon {
    NextMonth,
    NextQuarter,
    NextYear,
}

impl std::fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ForecastHorizon::NextMonth => "next month",
            ForecastHorizon::NextQuarter => "next quarter",
            ForecastHorizon::NextYear => "next year",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub horizon: ForecastHorizon,
    pub efficiency_pct: f64,
    pub projected_customers: u64,
}

/// Heuristic projection plus qualitative warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub points: Vec<ForecastPoint>,
    pub warnings: Vec<String>,
}

// Multiplicative heuristics: efficiency erodes, customers grow.
const EFFICIENCY_FACTORS: [(ForecastHorizon, f64); 3] = [
    (ForecastHorizon::NextMonth, 0.98),
    (ForecastHorizon::NextQuarter, 0.95),
    (ForecastHorizon::NextYear, 0.90),
];
const CUSTOMER_FACTORS: [f64; 3] = [1.02, 1.05, 1.15];

pub fn forecast(summary: &ExecutiveSummary, config: &AnalysisConfig) -> Forecast {
    let customers = summary.customer_count as f64;
    let points = EFFICIENCY_FACTORS
        .iter()
        .zip(CUSTOMER_FACTORS.iter())
        .map(|(&(horizon, eff_factor), &cust_factor)| ForecastPoint {
            horizon,
            efficiency_pct: summary.network_efficiency_pct * eff_factor,
            projected_customers: (customers * cust_factor).round() as u64,
        })
        .collect();

    let mut warnings = Vec::new();
    if summary.network_efficiency_pct < config.forecast_low_efficiency_pct {
        warnings.push(format!(
            "network efficiency {:.1}% is below {:.0}%; losses will compound without intervention",
            summary.network_efficiency_pct, config.forecast_low_efficiency_pct
        ));
    }
    let ratio = customers / (summary.meter_count.max(1) as f64);
    if ratio > config.forecast_customer_saturation_ratio {
        warnings.push(format!(
            "{:.0} customers per main meter exceeds {:.0}; metering capacity is saturating",
            ratio, config.forecast_customer_saturation_ratio
        ));
    }

    Forecast { points, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waste;
    use dwa_core::{MeterId, MeterRecord};

    fn record(
        id: u64,
        name: &str,
        kind: MeterKind,
        withdrawal: f64,
        parent: Option<u64>,
    ) -> MeterRecord {
        MeterRecord {
            id: MeterId::new(id),
            name: name.to_string(),
            kind,
            withdrawal_kwh: Some(withdrawal),
            sector: SectorId::new(1),
            parent: parent.map(MeterId::new),
            current_balance: None,
        }
    }

    fn sample() -> (MeterHierarchy, WasteAnalysis) {
        let mut h = MeterHierarchy::new(record(1, "Gen", MeterKind::Generator, 1000.0, None));
        let root = h.root();
        let b = h
            .attach(root, record(2, "Box", MeterKind::DistributionBox, 950.0, Some(1)))
            .unwrap();
        let m = h
            .attach(b, record(3, "Meter", MeterKind::MainMeter, 930.0, Some(2)))
            .unwrap();
        h.attach(m, record(4, "Cust", MeterKind::Customer, 900.0, Some(3)))
            .unwrap();
        let analysis = waste::compute(&h, &AnalysisConfig::default());
        (h, analysis)
    }

    #[test]
    fn test_executive_summary_counts_and_health() {
        let (h, analysis) = sample();
        let config = AnalysisConfig::default();
        let summary = executive_summary(SectorId::new(1), &h, &analysis, &config);
        assert_eq!(summary.generator_count, 1);
        assert_eq!(summary.box_count, 1);
        assert_eq!(summary.meter_count, 1);
        assert_eq!(summary.customer_count, 1);
        // loss = (1000 - 900) / 1000 = 10% -> efficiency 90
        assert!((summary.network_efficiency_pct - 90.0).abs() < 1e-9);
        assert_eq!(summary.health, HealthTier::VeryGood);
    }

    #[test]
    fn test_financial_projection() {
        let (_, analysis) = sample();
        let config = AnalysisConfig::default().with_price(7200.0);
        let impact = financial_impact(&analysis, &config);
        assert!((impact.daily_loss_kwh - 100.0).abs() < 1e-9);
        assert!((impact.daily_cost - 720_000.0).abs() < 1e-6);
        assert!((impact.monthly_cost - 21_600_000.0).abs() < 1e-6);
        assert!((impact.annual_cost - 262_800_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_forecast_decay_and_growth() {
        let (h, analysis) = sample();
        let config = AnalysisConfig::default();
        let summary = executive_summary(SectorId::new(1), &h, &analysis, &config);
        let forecast = forecast(&summary, &config);

        assert_eq!(forecast.points.len(), 3);
        assert!((forecast.points[0].efficiency_pct - 90.0 * 0.98).abs() < 1e-9);
        assert!((forecast.points[1].efficiency_pct - 90.0 * 0.95).abs() < 1e-9);
        assert!((forecast.points[2].efficiency_pct - 90.0 * 0.90).abs() < 1e-9);
        assert!(forecast.warnings.is_empty());
    }

    #[test]
    fn test_forecast_warns_on_low_efficiency() {
        let (h, analysis) = sample();
        let config = AnalysisConfig::default();
        let mut summary = executive_summary(SectorId::new(1), &h, &analysis, &config);
        summary.network_efficiency_pct = 70.0;
        let forecast = forecast(&summary, &config);
        assert!(forecast.warnings.iter().any(|w| w.contains("below 80%")));
    }

    #[test]
    fn test_forecast_cutoffs_come_from_config() {
        let (h, analysis) = sample();
        let mut config = AnalysisConfig::default();
        let summary = executive_summary(SectorId::new(1), &h, &analysis, &config);
        // 90% efficiency is clean against the default cutoff.
        assert!(forecast(&summary, &config).warnings.is_empty());

        // Raising the cutoff above the network's efficiency flips the warning.
        config.forecast_low_efficiency_pct = 95.0;
        assert!(forecast(&summary, &config)
            .warnings
            .iter()
            .any(|w| w.contains("below 95%")));
    }

    #[test]
    fn test_forecast_warns_on_meter_saturation() {
        let (h, analysis) = sample();
        let config = AnalysisConfig::default();
        let mut summary = executive_summary(SectorId::new(1), &h, &analysis, &config);
        summary.customer_count = 40;
        summary.meter_count = 1;
        let forecast = forecast(&summary, &config);
        assert!(forecast
            .warnings
            .iter()
            .any(|w| w.contains("customers per main meter")));
    }
}
