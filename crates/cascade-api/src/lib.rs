//! Scenario lifecycle facade: creation, execution, comparison, and SQLite
//! persistence over the simulation engine.

mod persistence;
mod server;

use std::fmt;

use cascade_core::scope_provider::ScopeProvider;
use cascade_core::simulation::SimulationRun;
use cascade_core::technology::TechnologyCatalog;
use contracts::{
    CascadeResult, ComparisonEntry, ConfigError, ROI_SENTINEL_PCT, Scenario, ScenarioComparison,
    ScenarioConfig, ScenarioConstraints, ScenarioResult, ScenarioStatus, ScopeSnapshot,
    SimulationType, SCHEMA_VERSION_V1,
};

pub use persistence::{
    InMemoryScenarioRepository, PersistenceError, ScenarioRepository, SqliteScenarioStore,
};
pub use server::{serve, ServerError};

#[derive(Debug)]
pub enum ManagerError {
    Config(ConfigError),
    Persistence(PersistenceError),
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid scenario config: {err}"),
            Self::Persistence(err) => write!(f, "persistence failure: {err}"),
        }
    }
}

impl std::error::Error for ManagerError {}

impl From<ConfigError> for ManagerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<PersistenceError> for ManagerError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// Owns the scenario lifecycle. Runs are synchronous; a scenario is either
/// a draft or completed with an immutable result.
pub struct ScenarioManager {
    repository: Box<dyn ScenarioRepository>,
    scopes: Box<dyn ScopeProvider>,
    catalog: TechnologyCatalog,
}

impl ScenarioManager {
    pub fn new(
        repository: Box<dyn ScenarioRepository>,
        scopes: Box<dyn ScopeProvider>,
        catalog: TechnologyCatalog,
    ) -> Self {
        Self {
            repository,
            scopes,
            catalog,
        }
    }

    pub fn catalog(&self) -> &TechnologyCatalog {
        &self.catalog
    }

    pub fn available_scopes(&self) -> Vec<(String, String)> {
        self.scopes.available_scopes()
    }

    /// One-shot simulation without creating a stored scenario.
    pub fn simulate(
        &self,
        config: &ScenarioConfig,
    ) -> Result<(ScenarioResult, Vec<String>), ManagerError> {
        let scope = self
            .scopes
            .get_scope(&config.scope_type, &config.scope_name)?;
        let (scope, mut warnings) = apply_protected_roles(scope, &config.constraints);

        let run = SimulationRun::new(scope, config.clone(), &self.catalog)?;
        let mut result = match config.simulation_type {
            SimulationType::Cascade => ScenarioResult::Cascade(run.theoretical_max().clone()),
            SimulationType::TimeStepped => ScenarioResult::Trajectory(run.run_to_completion()),
        };

        warnings.extend(apply_caps(&mut result, &config.constraints));
        Ok((result, warnings))
    }

    pub fn create_scenario(&mut self, config: ScenarioConfig) -> Result<Scenario, ManagerError> {
        // Reject unresolvable boundaries at creation time, not run time.
        self.scopes
            .get_scope(&config.scope_type, &config.scope_name)?;

        let scenario = Scenario {
            id: self.next_scenario_id()?,
            config,
            status: ScenarioStatus::Draft,
            result: None,
            warnings: Vec::new(),
        };
        self.repository.save(&scenario)?;
        Ok(scenario)
    }

    pub fn run_scenario(&mut self, scenario_id: &str) -> Result<Scenario, ManagerError> {
        let mut scenario = self.repository.load(scenario_id)?;
        let (result, warnings) = self.simulate(&scenario.config)?;
        scenario.status = ScenarioStatus::Completed;
        scenario.result = Some(result);
        scenario.warnings = warnings;
        self.repository.save(&scenario)?;
        Ok(scenario)
    }

    pub fn get_scenario(&self, scenario_id: &str) -> Result<Scenario, ManagerError> {
        Ok(self.repository.load(scenario_id)?)
    }

    pub fn list_scenarios(&self) -> Result<Vec<Scenario>, ManagerError> {
        Ok(self.repository.list()?)
    }

    pub fn delete_scenario(&mut self, scenario_id: &str) -> Result<(), ManagerError> {
        Ok(self.repository.delete(scenario_id)?)
    }

    /// Side-by-side comparison. Draft scenarios are run first, so comparing
    /// a batch of fresh scenarios executes the whole batch.
    pub fn compare(&mut self, scenario_ids: &[String]) -> Result<ScenarioComparison, ManagerError> {
        let mut entries = Vec::new();
        for scenario_id in scenario_ids {
            let scenario = self.repository.load(scenario_id)?;
            let scenario = if scenario.result.is_some() {
                scenario
            } else {
                self.run_scenario(scenario_id)?
            };
            entries.push(comparison_entry(&scenario));
        }

        let best_by_roi = entries
            .iter()
            .filter(|entry| entry.valid && entry.roi_pct < ROI_SENTINEL_PCT)
            .max_by(|a, b| {
                a.roi_pct
                    .partial_cmp(&b.roi_pct)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|entry| entry.scenario_id.clone());
        let lowest_risk = entries
            .iter()
            .filter(|entry| entry.valid)
            .min_by_key(|entry| entry.risk_score)
            .map(|entry| entry.scenario_id.clone());

        Ok(ScenarioComparison {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            entries,
            best_by_roi,
            lowest_risk,
        })
    }

    fn next_scenario_id(&self) -> Result<String, ManagerError> {
        let max_existing = self
            .repository
            .list()?
            .iter()
            .filter_map(|scenario| scenario.id.strip_prefix("scn-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok(format!("scn-{:04}", max_existing + 1))
    }
}

fn comparison_entry(scenario: &Scenario) -> ComparisonEntry {
    let Some(result) = scenario.result.as_ref() else {
        // Only reachable for scenarios persisted by older writers; surface
        // them as invalid rather than failing the whole comparison.
        return ComparisonEntry {
            scenario_id: scenario.id.clone(),
            scenario_name: scenario.config.scenario_name.clone(),
            net_impact: 0.0,
            roi_pct: 0.0,
            payback_months: None,
            freed_headcount: 0.0,
            separated_headcount: 0.0,
            sunrise_skills: 0,
            sunset_skills: 0,
            risk_score: 0,
            valid: false,
        };
    };

    let cascade = result.cascade();
    let payback_months = match result {
        ScenarioResult::Trajectory(trajectory) => trajectory.payback_months,
        ScenarioResult::Cascade(cascade) => cascade.financial.payback_months,
    };
    let sunrise = cascade.sunrise_skill_count();
    ComparisonEntry {
        scenario_id: scenario.id.clone(),
        scenario_name: scenario.config.scenario_name.clone(),
        net_impact: result.financial().net_impact,
        roi_pct: result.roi_pct(),
        payback_months,
        freed_headcount: cascade.workforce.freed_headcount,
        separated_headcount: cascade.workforce.separated_headcount,
        sunrise_skills: sunrise,
        sunset_skills: cascade.skill_shifts.len() - sunrise,
        risk_score: result.risk_count_weighted(),
        valid: cascade.validation.valid,
    }
}

/// Protected roles are carved out of the simulation boundary entirely: no
/// reclassification touches their tasks and no impact is attributed to them.
fn apply_protected_roles(
    mut scope: ScopeSnapshot,
    constraints: &ScenarioConstraints,
) -> (ScopeSnapshot, Vec<String>) {
    if constraints.protected_roles.is_empty() {
        return (scope, Vec::new());
    }

    let protected: Vec<String> = scope
        .roles
        .iter()
        .filter(|role| constraints.protected_roles.contains(&role.id))
        .map(|role| role.id.clone())
        .collect();
    if protected.is_empty() {
        return (scope, Vec::new());
    }

    let removed_workloads: Vec<String> = scope
        .workloads
        .iter()
        .filter(|workload| protected.contains(&workload.role_id))
        .map(|workload| workload.id.clone())
        .collect();

    scope.roles.retain(|role| !protected.contains(&role.id));
    scope
        .job_titles
        .retain(|title| !protected.contains(&title.role_id));
    scope
        .workloads
        .retain(|workload| !protected.contains(&workload.role_id));
    scope
        .tasks
        .retain(|task| !removed_workloads.contains(&task.workload_id));
    let kept_tasks: Vec<&String> = scope.tasks.iter().map(|task| &task.id).collect();
    scope
        .task_skills
        .retain(|edge| kept_tasks.contains(&&edge.task_id));

    let warning = format!(
        "protected roles excluded from simulation boundary: {}",
        protected.join(", ")
    );
    (scope, vec![warning])
}

/// Post-run constraint checks. The reduction cap reshapes the outcome; the
/// budget cap only annotates it.
fn apply_caps(result: &mut ScenarioResult, constraints: &ScenarioConstraints) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(cap_pct) = constraints.max_headcount_reduction_pct {
        let cascade = match result {
            ScenarioResult::Cascade(cascade) => cascade,
            ScenarioResult::Trajectory(trajectory) => &mut trajectory.theoretical_max,
        };
        if let Some(warning) = cap_separations(cascade, cap_pct) {
            warnings.push(warning);
        }
    }

    if let Some(budget) = constraints.budget_cap {
        let total_cost = result.financial().costs.total();
        if total_cost > budget {
            warnings.push(format!(
                "total cost {total_cost:.0} exceeds budget cap {budget:.0}"
            ));
        }
    }

    warnings
}

/// Caps separations at the configured share of total headcount; the excess
/// moves to redeployment and severance shrinks proportionally.
fn cap_separations(cascade: &mut CascadeResult, cap_pct: f64) -> Option<String> {
    let allowed = cascade.workforce.total_headcount as f64 * cap_pct / 100.0;
    let separated = cascade.workforce.separated_headcount;
    if separated <= allowed {
        return None;
    }

    let factor = if separated > 0.0 { allowed / separated } else { 0.0 };
    let excess = separated - allowed;
    cascade.workforce.separated_headcount = allowed;
    cascade.workforce.redeployable_headcount += excess;

    for role in &mut cascade.role_impacts {
        for title in &mut role.title_impacts {
            let scaled = title.separated_headcount * factor;
            title.redeployable_headcount += title.separated_headcount - scaled;
            title.separated_headcount = scaled;
        }
    }

    let financial = &mut cascade.financial;
    financial.costs.severance *= factor;
    let total_cost = financial.costs.total();
    financial.net_impact = financial.gross_savings - total_cost;
    financial.roi_pct = if total_cost == 0.0 {
        if financial.gross_savings > 0.0 {
            ROI_SENTINEL_PCT
        } else {
            0.0
        }
    } else {
        100.0 * financial.net_impact / total_cost
    };
    if cascade.timeline_months > 0 && financial.gross_savings > 0.0 {
        let monthly_gross = financial.gross_savings / cascade.timeline_months as f64;
        financial.payback_months = Some((total_cost / monthly_gross).ceil() as u32);
    }

    Some(format!(
        "headcount reduction capped at {cap_pct:.1}%: {excess:.1} separations redirected to redeployment"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cascade_core::scope_provider::InMemoryScopeProvider;
    use contracts::{InterventionSchedule, StimulusParams};

    fn manager() -> ScenarioManager {
        ScenarioManager::new(
            Box::new(InMemoryScenarioRepository::new()),
            Box::new(InMemoryScopeProvider::with_demo_fallback(7)),
            TechnologyCatalog::builtin(),
        )
    }

    fn sample_config(name: &str) -> ScenarioConfig {
        ScenarioConfig {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            scenario_name: name.to_string(),
            scope_type: "department".to_string(),
            scope_name: "claims".to_string(),
            simulation_type: SimulationType::Cascade,
            stimulus: StimulusParams::RoleRedesign {
                automation_factor: 0.8,
                target_classifications: None,
            },
            timeline_months: 36,
            constraints: ScenarioConstraints::default(),
            organization: Default::default(),
            schedule: InterventionSchedule::default(),
            discount_rate_annual: 0.10,
            severance_months: 3.0,
            seed: 7,
        }
    }

    #[test]
    fn create_run_get_delete_lifecycle() {
        let mut manager = manager();
        let scenario = manager
            .create_scenario(sample_config("baseline"))
            .expect("create");
        assert_eq!(scenario.status, ScenarioStatus::Draft);
        assert!(scenario.result.is_none());

        let completed = manager.run_scenario(&scenario.id).expect("run");
        assert_eq!(completed.status, ScenarioStatus::Completed);
        assert!(completed.result.is_some());

        let fetched = manager.get_scenario(&scenario.id).expect("get");
        assert_eq!(fetched, completed);

        manager.delete_scenario(&scenario.id).expect("delete");
        assert!(manager.get_scenario(&scenario.id).is_err());
    }

    #[test]
    fn scenario_ids_are_sequential_and_gap_tolerant() {
        let mut manager = manager();
        let first = manager.create_scenario(sample_config("a")).expect("create");
        let second = manager.create_scenario(sample_config("b")).expect("create");
        assert_eq!(first.id, "scn-0001");
        assert_eq!(second.id, "scn-0002");

        manager.delete_scenario(&first.id).expect("delete");
        let third = manager.create_scenario(sample_config("c")).expect("create");
        assert_eq!(third.id, "scn-0003");
    }

    #[test]
    fn compare_runs_drafts_and_ranks_by_roi() {
        let mut manager = manager();
        let mut aggressive = sample_config("aggressive");
        aggressive.stimulus = StimulusParams::RoleRedesign {
            automation_factor: 1.0,
            target_classifications: None,
        };
        let mut timid = sample_config("timid");
        timid.stimulus = StimulusParams::RoleRedesign {
            automation_factor: 0.3,
            target_classifications: None,
        };

        let a = manager.create_scenario(aggressive).expect("create");
        let b = manager.create_scenario(timid).expect("create");
        let comparison = manager
            .compare(&[a.id.clone(), b.id.clone()])
            .expect("compare");

        assert_eq!(comparison.entries.len(), 2);
        for entry in &comparison.entries {
            assert!(entry.valid);
        }
        // Comparing ran both drafts.
        assert!(manager.get_scenario(&a.id).expect("get").result.is_some());
        assert!(manager.get_scenario(&b.id).expect("get").result.is_some());
    }

    #[test]
    fn protected_role_receives_no_impact() {
        let manager = manager();
        let scope = cascade_core::demo::demo_scope("department", "claims", 7);
        let protected_id = scope.roles[0].id.clone();

        let mut config = sample_config("protected");
        config.constraints.protected_roles = vec![protected_id.clone()];

        let (result, warnings) = manager.simulate(&config).expect("simulate");
        assert!(warnings.iter().any(|warning| warning.contains("protected")));
        assert!(result
            .cascade()
            .role_impacts
            .iter()
            .all(|role| role.role_id != protected_id));
    }

    #[test]
    fn reduction_cap_moves_excess_to_redeployment() {
        let manager = manager();
        let mut config = sample_config("capped");
        config.stimulus = StimulusParams::RoleRedesign {
            automation_factor: 1.0,
            target_classifications: None,
        };
        config.constraints.max_headcount_reduction_pct = Some(1.0);

        let (capped, warnings) = manager.simulate(&config).expect("capped run");
        let (free, _) = {
            let mut uncapped = config.clone();
            uncapped.constraints.max_headcount_reduction_pct = None;
            manager.simulate(&uncapped).expect("uncapped run")
        };

        let capped_wf = &capped.cascade().workforce;
        let free_wf = &free.cascade().workforce;
        assert!(capped_wf.separated_headcount <= free_wf.separated_headcount);
        assert!(
            capped_wf.separated_headcount
                <= capped_wf.total_headcount as f64 * 0.01 + 1e-9
        );
        // Freed total is conserved; only the split changes.
        assert!(
            (capped_wf.separated_headcount + capped_wf.redeployable_headcount
                - free_wf.freed_headcount)
                .abs()
                < 1e-9
        );
        assert!(warnings.iter().any(|warning| warning.contains("capped")));
    }

    #[test]
    fn budget_cap_warns_without_changing_the_result() {
        let manager = manager();
        let mut config = sample_config("over budget");
        config.constraints.budget_cap = Some(1.0);

        let (constrained, warnings) = manager.simulate(&config).expect("run");
        let (unconstrained, _) = {
            let mut free = config.clone();
            free.constraints.budget_cap = None;
            manager.simulate(&free).expect("run")
        };

        assert_eq!(constrained, unconstrained);
        assert!(warnings.iter().any(|warning| warning.contains("budget cap")));
    }

    #[test]
    fn unknown_scope_fails_at_creation() {
        let mut manager = ScenarioManager::new(
            Box::new(InMemoryScenarioRepository::new()),
            Box::new(InMemoryScopeProvider::new()),
            TechnologyCatalog::builtin(),
        );
        assert!(matches!(
            manager.create_scenario(sample_config("orphan")),
            Err(ManagerError::Config(ConfigError::UnknownScope { .. }))
        ));
    }

    #[test]
    fn time_stepped_scenario_stores_a_trajectory() {
        let mut manager = manager();
        let mut config = sample_config("trajectory");
        config.simulation_type = SimulationType::TimeStepped;
        config.timeline_months = 12;

        let scenario = manager.create_scenario(config).expect("create");
        let completed = manager.run_scenario(&scenario.id).expect("run");
        match completed.result {
            Some(ScenarioResult::Trajectory(trajectory)) => {
                assert_eq!(trajectory.months.len(), 12);
            }
            other => panic!("expected trajectory result, got {other:?}"),
        }
    }
}
