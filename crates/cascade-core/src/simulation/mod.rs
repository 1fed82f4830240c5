//! Time-step orchestrator: turns a theoretical-maximum cascade into a
//! realistic monthly trajectory.

mod step;

use std::collections::BTreeMap;

use contracts::{
    CascadeResult, ConfigError, CumulativeFinancial, ExogenousAdjustment, HumanFactorStocks,
    MonthlySnapshot, ScenarioConfig, ScopeSnapshot, SimulationTrajectory, TaskReclassification,
    SCHEMA_VERSION_V1,
};

use crate::adoption::BassDiffusion;
use crate::cascade::{CascadeEngine, CascadeTables};
use crate::financial::FinancialModel;
use crate::human_factors::HumanFactorEngine;
use crate::stimulus::{self, Stimulus};
use crate::technology::TechnologyCatalog;

pub const MAX_TIMELINE_MONTHS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Running,
    Done,
}

/// Mutable per-run state, owned exclusively by the orchestrator. Converted
/// into an immutable `MonthlySnapshot` at the end of every step.
#[derive(Debug, Clone)]
struct SimulationState {
    month: u32,
    adoption_level: f64,
    stocks: HumanFactorStocks,
    cumulative: CumulativeFinancial,
    separated_to_date: f64,
    reskilling_investment: f64,
    change_mgmt_investment: f64,
}

/// One scenario's monthly simulation. Strictly sequential; phases within a
/// month run in a fixed order and no snapshot is ever revised.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    scope: ScopeSnapshot,
    config: ScenarioConfig,
    engine: CascadeEngine,
    bass: BassDiffusion,
    human_factors: HumanFactorEngine,
    financial: FinancialModel,
    theoretical: CascadeResult,
    applied_reclassifications: Vec<TaskReclassification>,
    technology_costs: Vec<crate::stimulus::TechnologyCost>,
    scheduled_waves: BTreeMap<u32, Vec<TaskReclassification>>,
    scheduled_adjustments: BTreeMap<u32, Vec<ExogenousAdjustment>>,
    state: SimulationState,
    months: Vec<MonthlySnapshot>,
    mode: RunMode,
}

impl SimulationRun {
    /// Validates configuration and scope, generates the stimulus, and runs
    /// the initial theoretical-maximum cascade. Only malformed input fails
    /// here; everything later is non-fatal.
    pub fn new(
        scope: ScopeSnapshot,
        config: ScenarioConfig,
        catalog: &TechnologyCatalog,
    ) -> Result<Self, ConfigError> {
        if config.timeline_months == 0 || config.timeline_months > MAX_TIMELINE_MONTHS {
            return Err(ConfigError::InvalidTimeline(config.timeline_months));
        }
        let violations = scope.validate();
        if !violations.is_empty() {
            return Err(ConfigError::InvalidScope(violations));
        }

        let Stimulus {
            reclassifications,
            technology_costs,
        } = stimulus::generate(&scope, &config.stimulus, catalog)?;

        let mut tables = CascadeTables::default();
        tables.redeployable_fraction = config.organization.redeployable_fraction;
        tables.market_avg_salary = config.organization.market_avg_salary;
        tables.severance_months = config.severance_months;
        let engine = CascadeEngine::new(tables);

        let theoretical = engine.run(
            &scope,
            &reclassifications,
            &technology_costs,
            config.timeline_months,
        );

        let bass = Self::diffusion_for(&config, catalog);
        let human_factors = HumanFactorEngine::from_organization(&config.organization);
        let financial = Self::financial_for(&engine, &theoretical, &config);

        let mut scheduled_waves: BTreeMap<u32, Vec<TaskReclassification>> = BTreeMap::new();
        for wave in &config.schedule.waves {
            scheduled_waves
                .entry(wave.month)
                .or_default()
                .extend(wave.reclassifications.iter().cloned());
        }
        let mut scheduled_adjustments: BTreeMap<u32, Vec<ExogenousAdjustment>> = BTreeMap::new();
        for adjustment in &config.schedule.adjustments {
            scheduled_adjustments
                .entry(adjustment.month)
                .or_default()
                .push(adjustment.clone());
        }

        let state = SimulationState {
            month: 0,
            adoption_level: 0.0,
            stocks: config.organization.initial_stocks(),
            cumulative: CumulativeFinancial::default(),
            separated_to_date: 0.0,
            reskilling_investment: config.organization.reskilling_investment,
            change_mgmt_investment: config.organization.change_mgmt_investment,
        };

        Ok(Self {
            scope,
            config,
            engine,
            bass,
            human_factors,
            financial,
            theoretical,
            applied_reclassifications: reclassifications,
            technology_costs,
            scheduled_waves,
            scheduled_adjustments,
            state,
            months: Vec::new(),
            mode: RunMode::Running,
        })
    }

    /// Adoption speed comes from the first named technology; parameter-only
    /// stimuli roll out at moderate speed.
    fn diffusion_for(config: &ScenarioConfig, catalog: &TechnologyCatalog) -> BassDiffusion {
        let speed = match &config.stimulus {
            contracts::StimulusParams::TechnologyAdoption {
                technologies,
                custom_profiles,
                ..
            } => {
                let catalog = catalog.clone().with_custom(custom_profiles);
                technologies
                    .first()
                    .and_then(|name| catalog.get(name))
                    .map(|profile| profile.adoption_speed)
                    .unwrap_or(contracts::AdoptionSpeed::Moderate)
            }
            _ => contracts::AdoptionSpeed::Moderate,
        };
        BassDiffusion::from_speed(
            speed,
            config.organization.regulatory_brake,
            config.organization.org_readiness,
        )
    }

    fn financial_for(
        engine: &CascadeEngine,
        theoretical: &CascadeResult,
        config: &ScenarioConfig,
    ) -> FinancialModel {
        FinancialModel::from_cascade(
            theoretical,
            engine.tables().reskilling_cost_per_person,
            engine.tables().reskilling_headcount_fraction,
            config.severance_months,
            config.discount_rate_annual,
        )
    }

    pub fn current_month(&self) -> u32 {
        self.state.month
    }

    pub fn is_complete(&self) -> bool {
        self.mode == RunMode::Done
    }

    pub fn months(&self) -> &[MonthlySnapshot] {
        &self.months
    }

    pub fn theoretical_max(&self) -> &CascadeResult {
        &self.theoretical
    }

    /// Runs all remaining months and yields the trajectory.
    pub fn run_to_completion(mut self) -> SimulationTrajectory {
        while self.step() {}
        self.into_trajectory()
    }

    pub fn into_trajectory(self) -> SimulationTrajectory {
        let series: Vec<contracts::MonthlyFinancial> =
            self.months.iter().map(|month| month.monthly.clone()).collect();
        let npv = self.financial.npv(&series);
        let payback_months = FinancialModel::payback_month(&series);
        SimulationTrajectory {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            scope_name: self.scope.scope_name.clone(),
            timeline_months: self.config.timeline_months,
            theoretical_max: self.theoretical,
            final_adoption: self.state.adoption_level,
            cumulative: self.state.cumulative.clone(),
            npv,
            payback_months,
            months: self.months,
        }
    }
}
