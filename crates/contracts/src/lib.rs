//! Cross-boundary contracts for the workforce transformation engine, the
//! scenario API, persistence, and the dashboard collaborator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod results;
pub mod scope;
pub mod serde_u64_string;

pub use results::*;
pub use scope::*;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Fallback annual salary when a role or title carries no salary data.
pub const MARKET_AVG_SALARY: f64 = 65_000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LicenseTier {
    Low,
    Medium,
    High,
    Enterprise,
}

impl LicenseTier {
    /// Dollars per user per month.
    pub fn rate_per_user_month(self) -> f64 {
        match self {
            Self::Low => 10.0,
            Self::Medium => 30.0,
            Self::High => 75.0,
            Self::Enterprise => 150.0,
        }
    }
}

/// Named Bass-diffusion speed presets for technology rollouts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionSpeed {
    Fast,
    Moderate,
    Slow,
}

impl AdoptionSpeed {
    /// Innovation coefficient p.
    pub fn innovation_coefficient(self) -> f64 {
        match self {
            Self::Fast => 0.05,
            Self::Moderate => 0.03,
            Self::Slow => 0.015,
        }
    }

    /// Imitation coefficient q.
    pub fn imitation_coefficient(self) -> f64 {
        match self {
            Self::Fast => 0.50,
            Self::Moderate => 0.38,
            Self::Slow => 0.25,
        }
    }
}

/// A deployable automation technology: matched against task text by the
/// technology-adoption stimulus and priced by the financial layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnologyProfile {
    pub name: String,
    pub vendor: String,
    pub capabilities: Vec<String>,
    pub keywords: Vec<String>,
    /// Target automation level per task classification for matched tasks.
    pub classification_shift: BTreeMap<TaskClassification, AutomationLevel>,
    pub license_tier: LicenseTier,
    pub adoption_speed: AdoptionSpeed,
}

/// Target percentage mix across the five automation levels. Must sum to
/// 100 within [`TARGET_MIX_TOLERANCE`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TargetMix {
    pub human_only: f64,
    pub human_led: f64,
    pub shared: f64,
    pub ai_led: f64,
    pub ai_only: f64,
}

pub const TARGET_MIX_TOLERANCE: f64 = 0.01;

impl TargetMix {
    pub fn sum(&self) -> f64 {
        self.human_only + self.human_led + self.shared + self.ai_led + self.ai_only
    }

    pub fn share(&self, level: AutomationLevel) -> f64 {
        match level {
            AutomationLevel::HumanOnly => self.human_only,
            AutomationLevel::HumanLed => self.human_led,
            AutomationLevel::Shared => self.shared,
            AutomationLevel::AiLed => self.ai_led,
            AutomationLevel::AiOnly => self.ai_only,
        }
    }
}

/// A single task-level change: the atom the cascade engine consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskReclassification {
    pub task_id: String,
    pub new_automation_level: AutomationLevel,
}

/// A later reclassification wave applied mid-run at the named month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterventionWave {
    pub month: u32,
    pub reclassifications: Vec<TaskReclassification>,
}

/// Exogenous mid-run changes to standing investments or the regulatory
/// environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExogenousAdjustment {
    pub month: u32,
    #[serde(default)]
    pub reskilling_investment: Option<f64>,
    #[serde(default)]
    pub change_mgmt_investment: Option<f64>,
    #[serde(default)]
    pub regulatory_brake: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InterventionSchedule {
    #[serde(default)]
    pub waves: Vec<InterventionWave>,
    #[serde(default)]
    pub adjustments: Vec<ExogenousAdjustment>,
}

impl InterventionSchedule {
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty() && self.adjustments.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StimulusParams {
    RoleRedesign {
        automation_factor: f64,
        #[serde(default)]
        target_classifications: Option<Vec<TaskClassification>>,
    },
    TechnologyAdoption {
        technologies: Vec<String>,
        #[serde(default)]
        custom_profiles: Vec<TechnologyProfile>,
        #[serde(default)]
        confidence_threshold: Option<f64>,
    },
    TaskDistribution {
        target_mix: TargetMix,
        #[serde(default)]
        max_steps_per_task: Option<u8>,
        #[serde(default)]
        min_time_allocation_pct: Option<f64>,
        #[serde(default)]
        target_classifications: Option<Vec<TaskClassification>>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SimulationType {
    /// Single-pass theoretical-maximum cascade.
    Cascade,
    /// Monthly time-stepped trajectory with adoption and human factors.
    TimeStepped,
}

/// Post-hoc constraints applied to cascade output by the scenario manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConstraints {
    #[serde(default)]
    pub max_headcount_reduction_pct: Option<f64>,
    #[serde(default)]
    pub budget_cap: Option<f64>,
    #[serde(default)]
    pub protected_roles: Vec<String>,
}

/// Human-factor stocks, each held in [0,1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HumanFactorStocks {
    pub resistance: f64,
    pub morale: f64,
    pub proficiency: f64,
    pub culture_readiness: f64,
}

impl HumanFactorStocks {
    /// Composite Human Factor Multiplier throttling adoption speed and
    /// realized freed capacity.
    pub fn composite_multiplier(&self) -> f64 {
        let hfm = 0.30 * (1.0 - self.resistance)
            + 0.25 * self.proficiency
            + 0.20 * self.morale
            + 0.25 * self.culture_readiness;
        hfm.clamp(0.0, 1.0)
    }
}

/// Tunable starting state and standing investments of the organization
/// under study. Defaults describe a typical mid-transformation enterprise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationProfile {
    pub initial_resistance: f64,
    pub initial_morale: f64,
    pub initial_proficiency: f64,
    pub initial_culture_readiness: f64,
    /// Leadership-set culture target approached with time constant tau.
    pub culture_target: f64,
    pub culture_time_constant_months: f64,
    /// Standing reskilling spend level in [0,1].
    pub reskilling_investment: f64,
    /// Standing change-management spend level in [0,1].
    pub change_mgmt_investment: f64,
    pub regulatory_brake: f64,
    pub org_readiness: f64,
    pub redeployable_fraction: f64,
    pub market_avg_salary: f64,
}

impl Default for OrganizationProfile {
    fn default() -> Self {
        Self {
            initial_resistance: 0.30,
            initial_morale: 0.60,
            initial_proficiency: 0.10,
            initial_culture_readiness: 0.40,
            culture_target: 0.80,
            culture_time_constant_months: 24.0,
            reskilling_investment: 0.50,
            change_mgmt_investment: 0.50,
            regulatory_brake: 0.0,
            org_readiness: 1.0,
            redeployable_fraction: 0.60,
            market_avg_salary: MARKET_AVG_SALARY,
        }
    }
}

impl OrganizationProfile {
    pub fn initial_stocks(&self) -> HumanFactorStocks {
        HumanFactorStocks {
            resistance: self.initial_resistance,
            morale: self.initial_morale,
            proficiency: self.initial_proficiency,
            culture_readiness: self.initial_culture_readiness,
        }
    }
}

fn default_discount_rate() -> f64 {
    0.10
}

fn default_severance_months() -> f64 {
    3.0
}

fn default_timeline_months() -> u32 {
    36
}

fn default_seed() -> u64 {
    1337
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    pub schema_version: String,
    pub scenario_name: String,
    pub scope_type: String,
    pub scope_name: String,
    pub simulation_type: SimulationType,
    pub stimulus: StimulusParams,
    #[serde(default = "default_timeline_months")]
    pub timeline_months: u32,
    #[serde(default)]
    pub constraints: ScenarioConstraints,
    #[serde(default)]
    pub organization: OrganizationProfile,
    /// Mid-run reclassification waves and exogenous adjustments
    /// (time-stepped runs only).
    #[serde(default)]
    pub schedule: InterventionSchedule,
    #[serde(default = "default_discount_rate")]
    pub discount_rate_annual: f64,
    #[serde(default = "default_severance_months")]
    pub severance_months: f64,
    /// Drives deterministic Monte Carlo parameter jitter only; single runs
    /// are seed-independent.
    #[serde(default = "default_seed", with = "serde_u64_string")]
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Draft,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub id: String,
    pub config: ScenarioConfig,
    pub status: ScenarioStatus,
    pub result: Option<ScenarioResult>,
    /// Non-fatal run annotations, e.g. budget cap exceeded.
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonEntry {
    pub scenario_id: String,
    pub scenario_name: String,
    pub net_impact: f64,
    pub roi_pct: f64,
    pub payback_months: Option<u32>,
    pub freed_headcount: f64,
    pub separated_headcount: f64,
    pub sunrise_skills: usize,
    pub sunset_skills: usize,
    pub risk_score: u32,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioComparison {
    pub schema_version: String,
    pub entries: Vec<ComparisonEntry>,
    pub best_by_roi: Option<String>,
    pub lowest_risk: Option<String>,
}

/// Malformed or inconsistent input, rejected before any simulation step.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    DistributionSumInvalid { sum: f64 },
    UnknownTechnology(String),
    UnknownScope { scope_type: String, scope_name: String },
    InvalidScope(Vec<ScopeViolation>),
    InvalidTimeline(u32),
    InvalidParameter { name: String, detail: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DistributionSumInvalid { sum } => write!(
                f,
                "target distribution sums to {sum:.2}, expected 100 +/- {TARGET_MIX_TOLERANCE}"
            ),
            Self::UnknownTechnology(name) => write!(f, "unknown technology: {name}"),
            Self::UnknownScope {
                scope_type,
                scope_name,
            } => write!(f, "unknown scope: {scope_type}/{scope_name}"),
            Self::InvalidScope(violations) => {
                write!(f, "scope failed validation with {} issue(s)", violations.len())
            }
            Self::InvalidTimeline(months) => {
                write!(f, "timeline_months={months} outside supported range 1..=120")
            }
            Self::InvalidParameter { name, detail } => {
                write!(f, "invalid parameter {name}: {detail}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ScenarioNotFound,
    ScopeNotFound,
    InvalidConfig,
    UnknownTechnology,
    ScenarioConflict,
    PersistenceError,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}
