//! Read-only organizational scope model consumed by the simulation engine.
//!
//! A `ScopeSnapshot` is produced by the graph-persistence collaborator and is
//! never mutated by the engine; all derived numbers live in result types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered five-level classification of how much of a task is AI-performed.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum AutomationLevel {
    HumanOnly,
    HumanLed,
    Shared,
    AiLed,
    AiOnly,
}

impl AutomationLevel {
    pub const ALL: [AutomationLevel; 5] = [
        Self::HumanOnly,
        Self::HumanLed,
        Self::Shared,
        Self::AiLed,
        Self::AiOnly,
    ];

    /// Fraction of task time performed by AI at this level.
    pub fn automation_fraction(self) -> f64 {
        match self {
            Self::HumanOnly => 0.00,
            Self::HumanLed => 0.15,
            Self::Shared => 0.40,
            Self::AiLed => 0.70,
            Self::AiOnly => 0.95,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::HumanOnly => 0,
            Self::HumanLed => 1,
            Self::Shared => 2,
            Self::AiLed => 3,
            Self::AiOnly => 4,
        }
    }

    /// Level at `index`, clamped to the ai_only end of the scale.
    pub fn from_index(index: usize) -> Self {
        *Self::ALL.get(index).unwrap_or(&Self::AiOnly)
    }

    /// Advances `steps` levels along the scale, clamped at ai_only.
    pub fn advance(self, steps: usize) -> Self {
        Self::from_index(self.index().saturating_add(steps))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HumanOnly => "human_only",
            Self::HumanLed => "human_led",
            Self::Shared => "shared",
            Self::AiLed => "ai_led",
            Self::AiOnly => "ai_only",
        }
    }
}

impl fmt::Display for AutomationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskClassification {
    Directive,
    FeedbackLoop,
    Learning,
    Validation,
    TaskIteration,
    Negligibility,
}

impl TaskClassification {
    pub const ALL: [TaskClassification; 6] = [
        Self::Directive,
        Self::FeedbackLoop,
        Self::Learning,
        Self::Validation,
        Self::TaskIteration,
        Self::Negligibility,
    ];
}

/// Eight career bands, entry through c-suite.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum CareerBand {
    Entry,
    Associate,
    Senior,
    Lead,
    Manager,
    Director,
    Vp,
    CSuite,
}

impl CareerBand {
    pub const ALL: [CareerBand; 8] = [
        Self::Entry,
        Self::Associate,
        Self::Senior,
        Self::Lead,
        Self::Manager,
        Self::Director,
        Self::Vp,
        Self::CSuite,
    ];

    /// Multiplier applied to role-level freed capacity per title band.
    /// Descends monotonically: routine entry work absorbs automation
    /// fastest, executive work the slowest.
    pub fn level_impact_factor(self) -> f64 {
        match self {
            Self::Entry => 1.4,
            Self::Associate => 1.25,
            Self::Senior => 1.1,
            Self::Lead => 0.9,
            Self::Manager => 0.7,
            Self::Director => 0.5,
            Self::Vp => 0.35,
            Self::CSuite => 0.2,
        }
    }

    /// Per-band reskilling cost multiplier used by the time-stepped
    /// financial path.
    pub fn reskilling_multiplier(self) -> f64 {
        match self {
            Self::Entry => 0.7,
            Self::Associate => 0.9,
            Self::Senior => 1.1,
            Self::Lead => 1.3,
            Self::Manager => 1.6,
            Self::Director => 2.0,
            Self::Vp => 2.5,
            Self::CSuite => 2.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkillLifecycle {
    Emerging,
    Stable,
    Declining,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MarketDemandTrend {
    Rising,
    Steady,
    Falling,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillRelevance {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub headcount: u32,
    /// Missing salary is a data gap, not an error; the engine falls back to
    /// the market average and annotates the result.
    pub avg_salary: Option<f64>,
    pub automation_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobTitle {
    pub id: String,
    pub role_id: String,
    pub name: String,
    pub career_band: CareerBand,
    pub level: u8,
    pub headcount: u32,
    pub avg_salary: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workload {
    pub id: String,
    pub role_id: String,
    pub name: String,
    pub effort_allocation_pct: f64,
    pub automation_level: AutomationLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub workload_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub classification: TaskClassification,
    pub time_allocation_pct: f64,
    pub automation_level: AutomationLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub lifecycle_status: SkillLifecycle,
    pub market_demand_trend: MarketDemandTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSkillEdge {
    pub task_id: String,
    pub skill_id: String,
    pub relevance: SkillRelevance,
}

/// Tolerance on the ≈100 allocation closure invariants.
pub const ALLOCATION_TOLERANCE_PCT: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScopeSnapshot {
    pub scope_type: String,
    pub scope_name: String,
    pub roles: Vec<Role>,
    pub job_titles: Vec<JobTitle>,
    pub workloads: Vec<Workload>,
    pub tasks: Vec<Task>,
    pub skills: Vec<Skill>,
    pub task_skills: Vec<TaskSkillEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeViolation {
    TaskTimeNotClosed { workload_id: String, sum_pct_x100: i64 },
    WorkloadEffortNotClosed { role_id: String, sum_pct_x100: i64 },
    OrphanWorkload { workload_id: String },
    OrphanTask { task_id: String },
    OrphanTitle { title_id: String },
    NegativeAllocation { id: String },
}

impl fmt::Display for ScopeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskTimeNotClosed {
                workload_id,
                sum_pct_x100,
            } => write!(
                f,
                "task time allocation for workload {workload_id} sums to {:.2}, expected ~100",
                *sum_pct_x100 as f64 / 100.0
            ),
            Self::WorkloadEffortNotClosed {
                role_id,
                sum_pct_x100,
            } => write!(
                f,
                "workload effort allocation for role {role_id} sums to {:.2}, expected ~100",
                *sum_pct_x100 as f64 / 100.0
            ),
            Self::OrphanWorkload { workload_id } => {
                write!(f, "workload {workload_id} references an unknown role")
            }
            Self::OrphanTask { task_id } => {
                write!(f, "task {task_id} references an unknown workload")
            }
            Self::OrphanTitle { title_id } => {
                write!(f, "job title {title_id} references an unknown role")
            }
            Self::NegativeAllocation { id } => {
                write!(f, "negative allocation percentage on {id}")
            }
        }
    }
}

impl ScopeSnapshot {
    pub fn total_headcount(&self) -> u32 {
        self.roles.iter().map(|role| role.headcount).sum()
    }

    pub fn tasks_for_workload(&self, workload_id: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.workload_id == workload_id)
            .collect()
    }

    pub fn workloads_for_role(&self, role_id: &str) -> Vec<&Workload> {
        self.workloads
            .iter()
            .filter(|workload| workload.role_id == role_id)
            .collect()
    }

    pub fn titles_for_role(&self, role_id: &str) -> Vec<&JobTitle> {
        self.job_titles
            .iter()
            .filter(|title| title.role_id == role_id)
            .collect()
    }

    /// Structural validation run before any simulation: closure invariants
    /// and referential integrity. An empty result means the scope is usable.
    pub fn validate(&self) -> Vec<ScopeViolation> {
        let mut violations = Vec::new();

        let role_ids = self
            .roles
            .iter()
            .map(|role| role.id.as_str())
            .collect::<std::collections::BTreeSet<_>>();
        let workload_ids = self
            .workloads
            .iter()
            .map(|workload| workload.id.as_str())
            .collect::<std::collections::BTreeSet<_>>();

        for workload in &self.workloads {
            if !role_ids.contains(workload.role_id.as_str()) {
                violations.push(ScopeViolation::OrphanWorkload {
                    workload_id: workload.id.clone(),
                });
            }
            if workload.effort_allocation_pct < 0.0 {
                violations.push(ScopeViolation::NegativeAllocation {
                    id: workload.id.clone(),
                });
            }
        }
        for task in &self.tasks {
            if !workload_ids.contains(task.workload_id.as_str()) {
                violations.push(ScopeViolation::OrphanTask {
                    task_id: task.id.clone(),
                });
            }
            if task.time_allocation_pct < 0.0 {
                violations.push(ScopeViolation::NegativeAllocation {
                    id: task.id.clone(),
                });
            }
        }
        for title in &self.job_titles {
            if !role_ids.contains(title.role_id.as_str()) {
                violations.push(ScopeViolation::OrphanTitle {
                    title_id: title.id.clone(),
                });
            }
        }

        let mut time_by_workload: BTreeMap<&str, f64> = BTreeMap::new();
        for task in &self.tasks {
            *time_by_workload.entry(task.workload_id.as_str()).or_default() +=
                task.time_allocation_pct;
        }
        for (workload_id, sum) in time_by_workload {
            if (sum - 100.0).abs() > ALLOCATION_TOLERANCE_PCT {
                violations.push(ScopeViolation::TaskTimeNotClosed {
                    workload_id: workload_id.to_string(),
                    sum_pct_x100: (sum * 100.0).round() as i64,
                });
            }
        }

        let mut effort_by_role: BTreeMap<&str, f64> = BTreeMap::new();
        for workload in &self.workloads {
            *effort_by_role.entry(workload.role_id.as_str()).or_default() +=
                workload.effort_allocation_pct;
        }
        for (role_id, sum) in effort_by_role {
            if (sum - 100.0).abs() > ALLOCATION_TOLERANCE_PCT {
                violations.push(ScopeViolation::WorkloadEffortNotClosed {
                    role_id: role_id.to_string(),
                    sum_pct_x100: (sum * 100.0).round() as i64,
                });
            }
        }

        violations
    }
}
