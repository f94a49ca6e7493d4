//! Named, overridable business constants consumed at call time.
//!
//! The thresholds here (waste severity, health tiers, benchmark tiers,
//! saving fractions) are fixed business constants with no published
//! derivation; they are deliberately kept as configuration rather than
//! literals so a deployment can override any of them per call.

use crate::{MeterId, SectorId, WasteStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Waste-percentage severity thresholds: `> critical` ⇒ Critical,
/// `> high` ⇒ High, `> normal` ⇒ Normal, otherwise Excellent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WasteThresholds {
    pub critical: f64,
    pub high: f64,
    pub normal: f64,
}

impl Default for WasteThresholds {
    fn default() -> Self {
        Self {
            critical: 15.0,
            high: 8.0,
            normal: 0.0,
        }
    }
}

impl WasteThresholds {
    /// Classify a non-negative waste percentage into a severity tier.
    pub fn classify(&self, waste_pct: f64) -> WasteStatus {
        if waste_pct > self.critical {
            WasteStatus::Critical
        } else if waste_pct > self.high {
            WasteStatus::High
        } else if waste_pct > self.normal {
            WasteStatus::Normal
        } else {
            WasteStatus::Excellent
        }
    }
}

/// Network-efficiency cutoffs for the executive summary's health tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthTiers {
    pub excellent: f64,
    pub very_good: f64,
    pub good: f64,
    pub average: f64,
}

impl Default for HealthTiers {
    fn default() -> Self {
        Self {
            excellent: 95.0,
            very_good: 90.0,
            good: 85.0,
            average: 80.0,
        }
    }
}

impl HealthTiers {
    pub fn classify(&self, efficiency_pct: f64) -> HealthTier {
        if efficiency_pct >= self.excellent {
            HealthTier::Excellent
        } else if efficiency_pct >= self.very_good {
            HealthTier::VeryGood
        } else if efficiency_pct >= self.good {
            HealthTier::Good
        } else if efficiency_pct >= self.average {
            HealthTier::Average
        } else {
            HealthTier::Poor
        }
    }
}

/// Qualitative health tier of a sector's network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthTier {
    Excellent,
    VeryGood,
    Good,
    Average,
    Poor,
}

impl std::fmt::Display for HealthTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthTier::Excellent => "excellent",
            HealthTier::VeryGood => "very good",
            HealthTier::Good => "good",
            HealthTier::Average => "average",
            HealthTier::Poor => "poor",
        };
        f.write_str(s)
    }
}

/// One industry benchmark tier: networks with loss percentage at or below
/// `max_loss_pct` are expected to reach `target_efficiency_pct`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkTier {
    pub max_loss_pct: f64,
    pub target_efficiency_pct: f64,
}

/// Default industry benchmark ladder.
pub fn default_benchmark_tiers() -> Vec<BenchmarkTier> {
    vec![
        BenchmarkTier {
            max_loss_pct: 5.0,
            target_efficiency_pct: 95.0,
        },
        BenchmarkTier {
            max_loss_pct: 8.0,
            target_efficiency_pct: 92.0,
        },
        BenchmarkTier {
            max_loss_pct: 12.0,
            target_efficiency_pct: 88.0,
        },
        BenchmarkTier {
            max_loss_pct: 15.0,
            target_efficiency_pct: 85.0,
        },
    ]
}

/// Fractions of observed waste used as recoverable-saving estimates in the
/// action plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingFractions {
    pub pre_distribution: f64,
    pub distribution_box: f64,
    pub main_meter: f64,
    pub load_balance: f64,
}

impl Default for SavingFractions {
    fn default() -> Self {
        Self {
            pre_distribution: 0.30,
            distribution_box: 0.40,
            main_meter: 0.50,
            load_balance: 0.20,
        }
    }
}

/// Configuration surface consumed at call time. All analysis passes read
/// their constants from here; nothing in the engine hard-codes a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub waste_thresholds: WasteThresholds,
    pub health_tiers: HealthTiers,
    pub benchmark_tiers: Vec<BenchmarkTier>,
    /// Tariff used for the financial-impact projection (currency per kWh).
    pub price_per_kwh: f64,
    /// Explicit root meter per sector, taking precedence over the
    /// generator search.
    pub root_overrides: BTreeMap<SectorId, MeterId>,
    pub saving_fractions: SavingFractions,
    /// Waste percentage above which pre-distribution loss becomes an
    /// action item.
    pub pre_distribution_action_pct: f64,
    /// Load-balance score below which a structural rebalancing item is
    /// raised.
    pub load_balance_action_score: f64,
    /// Most-severe entries retained per category in the action plan.
    pub action_cap_per_category: usize,
    /// Network efficiency below which the forecast warns outright.
    pub forecast_low_efficiency_pct: f64,
    /// Customers-per-main-meter ratio above which the forecast flags
    /// metering saturation.
    pub forecast_customer_saturation_ratio: f64,
    /// Reject disallowed child kinds during tree assembly instead of
    /// recording a warning.
    pub strict_child_kinds: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            waste_thresholds: WasteThresholds::default(),
            health_tiers: HealthTiers::default(),
            benchmark_tiers: default_benchmark_tiers(),
            price_per_kwh: 0.0,
            root_overrides: BTreeMap::new(),
            saving_fractions: SavingFractions::default(),
            pre_distribution_action_pct: 10.0,
            load_balance_action_score: 80.0,
            action_cap_per_category: 5,
            forecast_low_efficiency_pct: 80.0,
            forecast_customer_saturation_ratio: 30.0,
            strict_child_kinds: false,
        }
    }
}

impl AnalysisConfig {
    /// Config with a tariff attached.
    pub fn with_price(mut self, price_per_kwh: f64) -> Self {
        self.price_per_kwh = price_per_kwh;
        self
    }

    /// Pin a sector's root meter explicitly.
    pub fn with_root_override(mut self, sector: SectorId, root: MeterId) -> Self {
        self.root_overrides.insert(sector, root);
        self
    }

    /// Fail tree assembly on disallowed child kinds instead of warning.
    pub fn strict(mut self) -> Self {
        self.strict_child_kinds = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waste_threshold_classification() {
        let t = WasteThresholds::default();
        assert_eq!(t.classify(20.0), WasteStatus::Critical);
        assert_eq!(t.classify(15.0), WasteStatus::High);
        assert_eq!(t.classify(10.0), WasteStatus::High);
        assert_eq!(t.classify(5.0), WasteStatus::Normal);
        assert_eq!(t.classify(0.0), WasteStatus::Excellent);
    }

    #[test]
    fn test_health_tier_classification() {
        let t = HealthTiers::default();
        assert_eq!(t.classify(97.0), HealthTier::Excellent);
        assert_eq!(t.classify(95.0), HealthTier::Excellent);
        assert_eq!(t.classify(92.0), HealthTier::VeryGood);
        assert_eq!(t.classify(86.0), HealthTier::Good);
        assert_eq!(t.classify(81.0), HealthTier::Average);
        assert_eq!(t.classify(60.0), HealthTier::Poor);
    }

    #[test]
    fn test_default_benchmark_ladder_is_sorted() {
        let tiers = default_benchmark_tiers();
        assert_eq!(tiers.len(), 4);
        for pair in tiers.windows(2) {
            assert!(pair[0].max_loss_pct < pair[1].max_loss_pct);
            assert!(pair[0].target_efficiency_pct > pair[1].target_efficiency_pct);
        }
    }

    #[test]
    fn test_root_override_builder() {
        let config = AnalysisConfig::default()
            .with_price(7200.0)
            .with_root_override(SectorId::new(3), MeterId::new(77));
        assert_eq!(config.price_per_kwh, 7200.0);
        assert_eq!(
            config.root_overrides.get(&SectorId::new(3)),
            Some(&MeterId::new(77))
        );
    }
}
