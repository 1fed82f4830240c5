//! Monte Carlo sweep over behavioral assumptions. Point estimates for
//! adoption and human-factor parameters are the least trustworthy inputs, so
//! strategy comparisons should look at the spread, not a single run.

use rayon::prelude::*;

use contracts::{ConfigError, ScenarioConfig, ScopeSnapshot};

use crate::demo::{mix_seed, sample_unit};
use crate::simulation::SimulationRun;
use crate::technology::TechnologyCatalog;

#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub draws: u32,
    /// Relative jitter applied to each behavioral parameter, e.g. 0.2 means
    /// each draw scales the parameter by a factor in [0.8, 1.2].
    pub jitter: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            draws: 200,
            jitter: 0.2,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SweepDraw {
    pub draw: u32,
    pub npv: f64,
    pub payback_months: Option<u32>,
    pub final_adoption: f64,
    pub cumulative_net: f64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SweepPercentiles {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SweepSummary {
    pub draws: u32,
    pub npv: SweepPercentiles,
    pub final_adoption: SweepPercentiles,
    pub cumulative_net: SweepPercentiles,
    /// Fraction of draws that ever reached cumulative break-even.
    pub payback_rate: f64,
    pub median_payback_months: Option<u32>,
}

/// Runs `draws` independent simulations with jittered behavioral parameters.
/// Draw number seeds the jitter, so the same config always sweeps the same
/// parameter cloud.
pub fn run_sweep(
    scope: &ScopeSnapshot,
    config: &ScenarioConfig,
    catalog: &TechnologyCatalog,
    sweep: SweepConfig,
) -> Result<SweepSummary, ConfigError> {
    if sweep.draws == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "draws".to_string(),
            detail: "sweep needs at least one draw".to_string(),
        });
    }
    if !(0.0..=0.5).contains(&sweep.jitter) {
        return Err(ConfigError::InvalidParameter {
            name: "jitter".to_string(),
            detail: format!("{} outside supported range 0..=0.5", sweep.jitter),
        });
    }

    let outcomes: Result<Vec<SweepDraw>, ConfigError> = (0..sweep.draws)
        .into_par_iter()
        .map(|draw| {
            let jittered = jitter_config(config, sweep.jitter, draw);
            let trajectory =
                SimulationRun::new(scope.clone(), jittered, catalog)?.run_to_completion();
            Ok(SweepDraw {
                draw,
                npv: trajectory.npv,
                payback_months: trajectory.payback_months,
                final_adoption: trajectory.final_adoption,
                cumulative_net: trajectory.cumulative.net,
            })
        })
        .collect();
    let outcomes = outcomes?;

    let npv: Vec<f64> = outcomes.iter().map(|outcome| outcome.npv).collect();
    let adoption: Vec<f64> = outcomes
        .iter()
        .map(|outcome| outcome.final_adoption)
        .collect();
    let net: Vec<f64> = outcomes
        .iter()
        .map(|outcome| outcome.cumulative_net)
        .collect();
    let mut paybacks: Vec<u32> = outcomes
        .iter()
        .filter_map(|outcome| outcome.payback_months)
        .collect();
    paybacks.sort_unstable();

    Ok(SweepSummary {
        draws: sweep.draws,
        npv: percentiles(npv),
        final_adoption: percentiles(adoption),
        cumulative_net: percentiles(net),
        payback_rate: paybacks.len() as f64 / outcomes.len() as f64,
        median_payback_months: paybacks.get(paybacks.len() / 2).copied(),
    })
}

/// Scales the behavioral knobs by an independent factor per parameter per
/// draw. Structural inputs (scope, stimulus, timeline, money) stay fixed.
fn jitter_config(config: &ScenarioConfig, jitter: f64, draw: u32) -> ScenarioConfig {
    let mut jittered = config.clone();
    let draw_seed = mix_seed(config.seed, 0x31EE_u64 + draw as u64);
    let org = &mut jittered.organization;
    org.initial_resistance = scaled(org.initial_resistance, draw_seed, 1, jitter).clamp(0.0, 1.0);
    org.initial_morale = scaled(org.initial_morale, draw_seed, 2, jitter).clamp(0.0, 1.0);
    org.initial_proficiency = scaled(org.initial_proficiency, draw_seed, 3, jitter).clamp(0.0, 1.0);
    org.org_readiness = scaled(org.org_readiness, draw_seed, 4, jitter).clamp(0.0, 1.0);
    org.regulatory_brake = scaled(org.regulatory_brake, draw_seed, 5, jitter).clamp(0.0, 1.0);
    org.reskilling_investment =
        scaled(org.reskilling_investment, draw_seed, 6, jitter).clamp(0.0, 1.0);
    org.change_mgmt_investment =
        scaled(org.change_mgmt_investment, draw_seed, 7, jitter).clamp(0.0, 1.0);
    jittered
}

fn scaled(value: f64, seed: u64, stream: u64, jitter: f64) -> f64 {
    let unit = sample_unit(seed, stream);
    value * (1.0 + jitter * (2.0 * unit - 1.0))
}

fn percentiles(mut values: Vec<f64>) -> SweepPercentiles {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let at = |pct: f64| {
        let index = ((values.len() - 1) as f64 * pct).round() as usize;
        values[index]
    };
    SweepPercentiles {
        p10: at(0.10),
        p50: at(0.50),
        p90: at(0.90),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_scope;
    use contracts::{
        InterventionSchedule, ScenarioConfig, ScenarioConstraints, SimulationType, StimulusParams,
        SCHEMA_VERSION_V1,
    };

    fn base_config() -> ScenarioConfig {
        ScenarioConfig {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            scenario_name: "sweep".to_string(),
            scope_type: "department".to_string(),
            scope_name: "claims".to_string(),
            simulation_type: SimulationType::TimeStepped,
            stimulus: StimulusParams::RoleRedesign {
                automation_factor: 0.6,
                target_classifications: None,
            },
            timeline_months: 24,
            constraints: ScenarioConstraints::default(),
            organization: Default::default(),
            schedule: InterventionSchedule::default(),
            discount_rate_annual: 0.10,
            severance_months: 3.0,
            seed: 7,
        }
    }

    #[test]
    fn sweep_is_deterministic() {
        let scope = demo_scope("department", "claims", 7);
        let catalog = TechnologyCatalog::builtin();
        let sweep = SweepConfig {
            draws: 16,
            jitter: 0.2,
        };
        let first = run_sweep(&scope, &base_config(), &catalog, sweep).unwrap();
        let second = run_sweep(&scope, &base_config(), &catalog, sweep).unwrap();
        assert_eq!(first.npv.p50, second.npv.p50);
        assert_eq!(first.final_adoption.p90, second.final_adoption.p90);
    }

    #[test]
    fn percentiles_are_ordered() {
        let scope = demo_scope("department", "claims", 7);
        let catalog = TechnologyCatalog::builtin();
        let sweep = SweepConfig {
            draws: 32,
            jitter: 0.25,
        };
        let summary = run_sweep(&scope, &base_config(), &catalog, sweep).unwrap();
        assert!(summary.npv.p10 <= summary.npv.p50);
        assert!(summary.npv.p50 <= summary.npv.p90);
        assert!(summary.final_adoption.p10 <= summary.final_adoption.p90);
        assert!((0.0..=1.0).contains(&summary.payback_rate));
    }

    #[test]
    fn zero_jitter_collapses_the_spread() {
        let scope = demo_scope("department", "claims", 7);
        let catalog = TechnologyCatalog::builtin();
        let sweep = SweepConfig {
            draws: 8,
            jitter: 0.0,
        };
        let summary = run_sweep(&scope, &base_config(), &catalog, sweep).unwrap();
        assert_eq!(summary.npv.p10, summary.npv.p90);
        assert_eq!(summary.final_adoption.p10, summary.final_adoption.p90);
    }

    #[test]
    fn zero_draws_is_rejected() {
        let scope = demo_scope("department", "claims", 7);
        let catalog = TechnologyCatalog::builtin();
        let sweep = SweepConfig {
            draws: 0,
            jitter: 0.2,
        };
        assert!(run_sweep(&scope, &base_config(), &catalog, sweep).is_err());
    }
}
