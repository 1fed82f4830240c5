//! Immutable result types produced by the cascade engine and the
//! time-stepped orchestrator. Nothing here is ever revised after creation;
//! re-running with identical inputs must reproduce these values exactly.

use serde::{Deserialize, Serialize};

use crate::scope::{AutomationLevel, CareerBand};
use crate::HumanFactorStocks;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskChange {
    pub task_id: String,
    pub old_level: AutomationLevel,
    pub new_level: AutomationLevel,
    /// Delta from the 5x5 shift table, as a fraction of task time.
    pub automation_delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadChange {
    pub workload_id: String,
    pub role_id: String,
    pub old_score: f64,
    pub new_score: f64,
    pub old_level: AutomationLevel,
    pub new_level: AutomationLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleImpact {
    pub title_id: String,
    pub career_band: CareerBand,
    pub headcount: u32,
    pub avg_salary: f64,
    /// Role freed capacity adjusted by the band's level impact factor.
    pub freed_capacity_pct: f64,
    pub freed_headcount: f64,
    pub redeployable_headcount: f64,
    pub separated_headcount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleImpact {
    pub role_id: String,
    pub role_name: String,
    pub freed_capacity_pct: f64,
    pub transformation_index: f64,
    pub needs_redesign: bool,
    pub title_impacts: Vec<TitleImpact>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkillShiftSource {
    Lifecycle,
    TaskMapping,
    Universal,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum SkillShiftDirection {
    Sunrise,
    Sunset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillShift {
    pub skill_id: String,
    pub skill_name: String,
    pub direction: SkillShiftDirection,
    pub source: SkillShiftSource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkforceImpact {
    pub freed_headcount: f64,
    pub redeployable_headcount: f64,
    pub separated_headcount: f64,
    pub total_headcount: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub licensing: f64,
    pub implementation: f64,
    pub reskilling: f64,
    pub severance: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.licensing + self.implementation + self.reskilling + self.severance
    }
}

/// Sentinel ROI when costs are zero but savings are positive.
pub const ROI_SENTINEL_PCT: f64 = 9999.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FinancialImpact {
    pub gross_savings: f64,
    pub costs: CostBreakdown,
    pub net_impact: f64,
    pub roi_pct: f64,
    pub payback_months: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    HighAutomation,
    WorkforceReduction,
    SkillGap,
    BroadChange,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskFlag {
    pub kind: RiskKind,
    pub severity: RiskSeverity,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub failed_checks: Vec<String>,
}

impl ValidationReport {
    pub fn passing() -> Self {
        Self {
            valid: true,
            failed_checks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataGapWarning {
    pub entity_id: String,
    pub field: String,
    pub fallback: String,
}

/// Output of one cascade pass: the theoretical-maximum impact of a set of
/// task reclassifications, before adoption and human factors throttle it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CascadeResult {
    pub schema_version: String,
    pub scope_name: String,
    pub timeline_months: u32,
    pub task_changes: Vec<TaskChange>,
    pub workload_changes: Vec<WorkloadChange>,
    pub role_impacts: Vec<RoleImpact>,
    pub skill_shifts: Vec<SkillShift>,
    pub workforce: WorkforceImpact,
    pub financial: FinancialImpact,
    pub risks: Vec<RiskFlag>,
    pub validation: ValidationReport,
    pub data_gaps: Vec<DataGapWarning>,
    /// Degrades from 1.0 as documented fallbacks substitute for missing
    /// scope data.
    pub confidence: f64,
}

impl CascadeResult {
    pub fn tasks_affected(&self) -> usize {
        self.task_changes.len()
    }

    pub fn sunrise_skill_count(&self) -> usize {
        self.skill_shifts
            .iter()
            .filter(|shift| shift.direction == SkillShiftDirection::Sunrise)
            .count()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackLoop {
    R1ProductivityFlywheel,
    R2CapabilityCompounding,
    B1ChangeResistance,
    B2SkillGapBrake,
    B3KnowledgeDrain,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MonthlyFinancial {
    pub gross_savings: f64,
    pub committed_cost: f64,
    pub adoption_cost: f64,
    pub separation_cost: f64,
    pub j_curve_cost: f64,
    pub net: f64,
}

impl MonthlyFinancial {
    pub fn total_cost(&self) -> f64 {
        self.committed_cost + self.adoption_cost + self.separation_cost + self.j_curve_cost
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CumulativeFinancial {
    pub savings: f64,
    pub costs: f64,
    pub net: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkforceCounts {
    pub freed_headcount: f64,
    pub redeployable_headcount: f64,
    pub separated_headcount: f64,
    /// Separations that occurred during this month, as headcount.
    pub monthly_separations: f64,
}

/// One month of a time-stepped run; appended to the trajectory exactly once
/// and never revised.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlySnapshot {
    pub month: u32,
    pub adoption_level: f64,
    pub stocks: HumanFactorStocks,
    pub human_factor_multiplier: f64,
    pub monthly: MonthlyFinancial,
    pub cumulative: CumulativeFinancial,
    pub workforce: WorkforceCounts,
    pub active_loops: Vec<FeedbackLoop>,
    pub risks: Vec<RiskFlag>,
    pub valid: bool,
    pub failed_checks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationTrajectory {
    pub schema_version: String,
    pub scope_name: String,
    pub timeline_months: u32,
    pub months: Vec<MonthlySnapshot>,
    /// The unscaled single-pass cascade this trajectory converges toward.
    pub theoretical_max: CascadeResult,
    pub npv: f64,
    pub payback_months: Option<u32>,
    pub final_adoption: f64,
    pub cumulative: CumulativeFinancial,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioResult {
    Cascade(CascadeResult),
    Trajectory(SimulationTrajectory),
}

impl ScenarioResult {
    pub fn financial(&self) -> &FinancialImpact {
        match self {
            Self::Cascade(result) => &result.financial,
            Self::Trajectory(trajectory) => &trajectory.theoretical_max.financial,
        }
    }

    pub fn cascade(&self) -> &CascadeResult {
        match self {
            Self::Cascade(result) => result,
            Self::Trajectory(trajectory) => &trajectory.theoretical_max,
        }
    }

    pub fn roi_pct(&self) -> f64 {
        match self {
            Self::Cascade(result) => result.financial.roi_pct,
            Self::Trajectory(trajectory) => {
                let cumulative = &trajectory.cumulative;
                if cumulative.costs == 0.0 {
                    if cumulative.savings > 0.0 {
                        ROI_SENTINEL_PCT
                    } else {
                        0.0
                    }
                } else {
                    100.0 * cumulative.net / cumulative.costs
                }
            }
        }
    }

    pub fn risk_count_weighted(&self) -> u32 {
        let risks = match self {
            Self::Cascade(result) => &result.risks,
            Self::Trajectory(trajectory) => &trajectory.theoretical_max.risks,
        };
        risks
            .iter()
            .map(|flag| match flag.severity {
                RiskSeverity::High => 2,
                RiskSeverity::Medium => 1,
            })
            .sum()
    }
}
