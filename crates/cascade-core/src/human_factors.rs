//! Four coupled human-factor stocks with explicit monthly update rules.
//!
//! The stocks feed the composite Human Factor Multiplier, which throttles
//! both adoption speed and realized freed capacity. Loop diagnostics live in
//! `feedback`; the numeric coupling is entirely here and in `adoption`.

use contracts::{HumanFactorStocks, OrganizationProfile};

/// Rate constants for the monthly stock updates. Injected so tests can
/// substitute alternates.
#[derive(Debug, Clone)]
pub struct HumanFactorConfig {
    /// Natural monthly decay of resistance.
    pub resistance_decay: f64,
    /// Resistance gained per unit of adoption growth (pace of change).
    pub resistance_pace_weight: f64,
    /// Resistance gained per unit of monthly separation rate.
    pub resistance_separation_weight: f64,
    /// Resistance removed per unit of change-management investment.
    pub resistance_change_mgmt_relief: f64,
    /// Morale gained per unit of reskilling investment (career signal).
    pub morale_reskilling_signal: f64,
    /// Morale gained per unit of adoption growth (momentum).
    pub morale_momentum_weight: f64,
    /// Morale lost per unit of separation rate.
    pub morale_separation_weight: f64,
    /// Monthly morale drag while the transition is underway but far from
    /// done (sustained uncertainty).
    pub morale_uncertainty_drag: f64,
    /// Baseline monthly learning rate before reskilling investment.
    pub proficiency_base_learning_rate: f64,
    /// Additional learning rate per unit of reskilling investment.
    pub proficiency_reskilling_gain: f64,
}

impl Default for HumanFactorConfig {
    fn default() -> Self {
        Self {
            resistance_decay: 0.05,
            resistance_pace_weight: 0.80,
            resistance_separation_weight: 2.0,
            resistance_change_mgmt_relief: 0.04,
            morale_reskilling_signal: 0.02,
            morale_momentum_weight: 0.30,
            morale_separation_weight: 0.30,
            morale_uncertainty_drag: 0.01,
            proficiency_base_learning_rate: 0.03,
            proficiency_reskilling_gain: 0.10,
        }
    }
}

/// Monthly context the stocks react to.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthContext {
    /// Adoption growth this month, in [0,1].
    pub adoption_delta: f64,
    /// Current adoption level after this month's growth.
    pub adoption_level: f64,
    /// Separations this month as a share of total headcount.
    pub separation_rate: f64,
    /// Standing reskilling spend level in [0,1].
    pub reskilling_investment: f64,
    /// Standing change-management spend level in [0,1].
    pub change_mgmt_investment: f64,
    /// Headcount-weighted learning aptitude of affected career bands.
    pub career_band_aptitude: f64,
}

#[derive(Debug, Clone)]
pub struct HumanFactorEngine {
    config: HumanFactorConfig,
    culture_target: f64,
    culture_time_constant_months: f64,
}

impl HumanFactorEngine {
    pub fn new(config: HumanFactorConfig, organization: &OrganizationProfile) -> Self {
        Self {
            config,
            culture_target: organization.culture_target.clamp(0.0, 1.0),
            // tau below one month would overshoot the exponential update.
            culture_time_constant_months: organization.culture_time_constant_months.max(1.0),
        }
    }

    pub fn from_organization(organization: &OrganizationProfile) -> Self {
        Self::new(HumanFactorConfig::default(), organization)
    }

    /// Applies one month of stock evolution. Every stock stays in [0,1].
    pub fn step(&self, stocks: &HumanFactorStocks, context: &MonthContext) -> HumanFactorStocks {
        let cfg = &self.config;

        let resistance = stocks.resistance * (1.0 - cfg.resistance_decay)
            + cfg.resistance_pace_weight * context.adoption_delta
            + cfg.resistance_separation_weight * context.separation_rate
            - cfg.resistance_change_mgmt_relief * context.change_mgmt_investment;

        let uncertainty_drag =
            if context.adoption_level > 0.05 && context.adoption_level < 0.80 {
                cfg.morale_uncertainty_drag
            } else {
                0.0
            };
        let morale = stocks.morale
            + cfg.morale_reskilling_signal * context.reskilling_investment
            + cfg.morale_momentum_weight * context.adoption_delta
            - cfg.morale_separation_weight * context.separation_rate
            - uncertainty_drag;

        let learning_rate = (cfg.proficiency_base_learning_rate
            + cfg.proficiency_reskilling_gain * context.reskilling_investment)
            * context.career_band_aptitude.clamp(0.1, 2.0);
        let proficiency = stocks.proficiency + learning_rate * (1.0 - stocks.proficiency);

        let culture_readiness = stocks.culture_readiness
            - (stocks.culture_readiness - self.culture_target)
                / self.culture_time_constant_months;

        HumanFactorStocks {
            resistance: resistance.clamp(0.0, 1.0),
            morale: morale.clamp(0.0, 1.0),
            proficiency: proficiency.clamp(0.0, 1.0),
            culture_readiness: culture_readiness.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> (HumanFactorEngine, HumanFactorStocks) {
        let organization = OrganizationProfile::default();
        (
            HumanFactorEngine::from_organization(&organization),
            organization.initial_stocks(),
        )
    }

    fn quiet_month() -> MonthContext {
        MonthContext {
            adoption_delta: 0.0,
            adoption_level: 0.0,
            separation_rate: 0.0,
            reskilling_investment: 0.0,
            change_mgmt_investment: 0.0,
            career_band_aptitude: 1.0,
        }
    }

    #[test]
    fn resistance_decays_in_a_quiet_month() {
        let (engine, stocks) = defaults();
        let next = engine.step(&stocks, &quiet_month());
        assert!(next.resistance < stocks.resistance);
    }

    #[test]
    fn separations_raise_resistance_and_cut_morale() {
        let (engine, stocks) = defaults();
        let mut context = quiet_month();
        context.separation_rate = 0.05;
        let next = engine.step(&stocks, &context);
        let quiet = engine.step(&stocks, &quiet_month());
        assert!(next.resistance > quiet.resistance);
        assert!(next.morale < quiet.morale);
        // morale penalty is 0.3 x separation rate
        assert!((quiet.morale - next.morale - 0.30 * 0.05).abs() < 1e-9);
    }

    #[test]
    fn proficiency_growth_saturates() {
        let (engine, _) = defaults();
        let mut stocks = HumanFactorStocks {
            resistance: 0.0,
            morale: 0.5,
            proficiency: 0.0,
            culture_readiness: 0.5,
        };
        let mut context = quiet_month();
        context.reskilling_investment = 1.0;
        let mut previous_gain = f64::MAX;
        for _ in 0..24 {
            let next = engine.step(&stocks, &context);
            let gain = next.proficiency - stocks.proficiency;
            assert!(gain >= 0.0);
            assert!(gain <= previous_gain + 1e-12, "dP shrinks as P approaches 1");
            previous_gain = gain;
            stocks = next;
        }
        assert!(stocks.proficiency > 0.9);
    }

    #[test]
    fn culture_approaches_target_exponentially() {
        let (engine, mut stocks) = defaults();
        let context = quiet_month();
        let target = OrganizationProfile::default().culture_target;
        let mut previous_distance = (stocks.culture_readiness - target).abs();
        for _ in 0..48 {
            stocks = engine.step(&stocks, &context);
            let distance = (stocks.culture_readiness - target).abs();
            assert!(distance <= previous_distance);
            previous_distance = distance;
        }
        assert!(previous_distance < 0.06);
    }

    #[test]
    fn stocks_never_leave_unit_interval() {
        let (engine, mut stocks) = defaults();
        let mut context = quiet_month();
        context.adoption_delta = 1.0;
        context.separation_rate = 1.0;
        for _ in 0..12 {
            stocks = engine.step(&stocks, &context);
            for value in [
                stocks.resistance,
                stocks.morale,
                stocks.proficiency,
                stocks.culture_readiness,
            ] {
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }
}
