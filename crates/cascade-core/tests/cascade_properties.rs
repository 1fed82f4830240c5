use std::collections::BTreeMap;

use cascade_core::cascade::{shift_delta, CascadeEngine, CascadeTables};
use cascade_core::demo::demo_scope;
use cascade_core::simulation::SimulationRun;
use cascade_core::stimulus;
use cascade_core::technology::TechnologyCatalog;
use contracts::{
    AutomationLevel, ConfigError, InterventionSchedule, ScenarioConfig, ScenarioConstraints,
    SimulationType, StimulusParams, TargetMix, SCHEMA_VERSION_V1,
};
use proptest::prelude::*;

fn base_config(stimulus: StimulusParams) -> ScenarioConfig {
    ScenarioConfig {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        scenario_name: "property".to_string(),
        scope_type: "department".to_string(),
        scope_name: "claims".to_string(),
        simulation_type: SimulationType::TimeStepped,
        stimulus,
        timeline_months: 36,
        constraints: ScenarioConstraints::default(),
        organization: Default::default(),
        schedule: InterventionSchedule::default(),
        discount_rate_annual: 0.10,
        severance_months: 3.0,
        seed: 7,
    }
}

fn redesign(factor: f64) -> StimulusParams {
    StimulusParams::RoleRedesign {
        automation_factor: factor,
        target_classifications: None,
    }
}

fn run_cascade(scope_seed: u64, params: &StimulusParams) -> contracts::CascadeResult {
    let scope = demo_scope("department", "claims", scope_seed);
    let catalog = TechnologyCatalog::builtin();
    let generated = stimulus::generate(&scope, params, &catalog).expect("stimulus generates");
    let engine = CascadeEngine::new(CascadeTables::default());
    engine.run(
        &scope,
        &generated.reclassifications,
        &generated.technology_costs,
        36,
    )
}

#[test]
fn freed_capacity_stays_within_role_bounds() {
    let result = run_cascade(7, &redesign(1.0));
    for role in &result.role_impacts {
        assert!(
            (0.0..=100.0).contains(&role.freed_capacity_pct),
            "{} freed {}",
            role.role_id,
            role.freed_capacity_pct
        );
    }
    assert!(result.workforce.freed_headcount <= result.workforce.total_headcount as f64);
}

#[test]
fn zero_factor_redesign_changes_nothing() {
    let result = run_cascade(7, &redesign(0.0));
    assert!(result.task_changes.is_empty());
    assert_eq!(result.workforce.freed_headcount, 0.0);
    assert_eq!(result.financial.gross_savings, 0.0);
}

#[test]
fn workforce_accounting_closes() {
    let result = run_cascade(7, &redesign(1.0));
    let recombined =
        result.workforce.redeployable_headcount + result.workforce.separated_headcount;
    assert!((recombined - result.workforce.freed_headcount).abs() < 1e-9);
}

#[test]
fn cascade_output_is_bit_identical_across_runs() {
    let first = run_cascade(7, &redesign(0.7));
    let second = run_cascade(7, &redesign(0.7));
    let a = serde_json::to_string(&first).expect("serialize");
    let b = serde_json::to_string(&second).expect("serialize");
    assert_eq!(a, b);
}

#[test]
fn malformed_target_mix_is_rejected() {
    let scope = demo_scope("department", "claims", 7);
    let catalog = TechnologyCatalog::builtin();
    let params = StimulusParams::TaskDistribution {
        target_mix: TargetMix {
            human_only: 20.0,
            human_led: 20.0,
            shared: 20.0,
            ai_led: 20.0,
            ai_only: 10.0,
        },
        max_steps_per_task: None,
        min_time_allocation_pct: None,
        target_classifications: None,
    };
    assert!(matches!(
        stimulus::generate(&scope, &params, &catalog),
        Err(ConfigError::DistributionSumInvalid { .. })
    ));
}

/// Time-weighted distance between the scope's automation mix and a target.
fn mix_error(
    scope: &contracts::ScopeSnapshot,
    overrides: &BTreeMap<String, AutomationLevel>,
    target: &TargetMix,
) -> f64 {
    let mut weight_by_level: BTreeMap<AutomationLevel, f64> = BTreeMap::new();
    let mut total = 0.0;
    for task in &scope.tasks {
        let level = overrides
            .get(&task.id)
            .copied()
            .unwrap_or(task.automation_level);
        *weight_by_level.entry(level).or_insert(0.0) += task.time_allocation_pct;
        total += task.time_allocation_pct;
    }
    AutomationLevel::ALL
        .iter()
        .map(|level| {
            let share = weight_by_level.get(level).copied().unwrap_or(0.0) / total * 100.0;
            (share - target.share(*level)).abs()
        })
        .sum()
}

#[test]
fn task_distribution_moves_the_mix_toward_uniform_target() {
    let scope = demo_scope("department", "claims", 7);
    let catalog = TechnologyCatalog::builtin();
    let target = TargetMix {
        human_only: 20.0,
        human_led: 20.0,
        shared: 20.0,
        ai_led: 20.0,
        ai_only: 20.0,
    };
    let params = StimulusParams::TaskDistribution {
        target_mix: target,
        max_steps_per_task: Some(4),
        min_time_allocation_pct: None,
        target_classifications: None,
    };
    let generated = stimulus::generate(&scope, &params, &catalog).expect("stimulus generates");

    let before = mix_error(&scope, &BTreeMap::new(), &target);
    let overrides: BTreeMap<String, AutomationLevel> = generated
        .reclassifications
        .iter()
        .map(|change| (change.task_id.clone(), change.new_automation_level))
        .collect();
    let after = mix_error(&scope, &overrides, &target);
    assert!(
        after <= before + 1e-9,
        "distribution search worsened the mix: {before} -> {after}"
    );
}

#[test]
fn shift_delta_is_antisymmetric() {
    for from in AutomationLevel::ALL {
        for to in AutomationLevel::ALL {
            let forward = shift_delta(from, to);
            let backward = shift_delta(to, from);
            assert!((forward + backward).abs() < 1e-12);
        }
    }
}

proptest! {
    #[test]
    fn property_freed_capacity_is_monotone_in_factor(factor in 0.0_f64..=1.0) {
        let partial = run_cascade(7, &redesign(factor));
        let full = run_cascade(7, &redesign(1.0));
        let full_by_role: BTreeMap<&str, f64> = full
            .role_impacts
            .iter()
            .map(|role| (role.role_id.as_str(), role.freed_capacity_pct))
            .collect();
        for role in &partial.role_impacts {
            let ceiling = full_by_role.get(role.role_id.as_str()).copied().unwrap_or(0.0);
            prop_assert!(role.freed_capacity_pct <= ceiling + 1e-9);
        }
        prop_assert!(partial.workforce.freed_headcount <= full.workforce.freed_headcount + 1e-9);
    }

    #[test]
    fn property_generated_scopes_always_validate(seed in 0_u64..2_000) {
        let scope = demo_scope("department", "claims", seed);
        prop_assert!(scope.validate().is_empty());
    }

    #[test]
    fn property_trajectory_has_one_snapshot_per_month(timeline in 1_u32..=60) {
        let mut config = base_config(redesign(0.6));
        config.timeline_months = timeline;
        let scope = demo_scope("department", "claims", 7);
        let trajectory = SimulationRun::new(scope, config, &TechnologyCatalog::builtin())
            .expect("run builds")
            .run_to_completion();
        prop_assert_eq!(trajectory.months.len(), timeline as usize);
        for month in &trajectory.months {
            prop_assert!((0.0..=1.0).contains(&month.adoption_level));
        }
        prop_assert!((0.0..=1.0).contains(&trajectory.final_adoption));
    }
}
