//! Deterministic demo organization generator so the CLI, server, and tests
//! can run without the graph collaborator. Same seed, same scope.

use contracts::{
    AutomationLevel, CareerBand, JobTitle, MarketDemandTrend, Role, ScopeSnapshot, Skill,
    SkillLifecycle, SkillRelevance, Task, TaskClassification, TaskSkillEdge, Workload,
};

pub(crate) fn mix_seed(seed: u64, salt: u64) -> u64 {
    let mut value = seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    value ^= value.rotate_left(29);
    value = value.wrapping_mul(0x517C_C1B7_2722_0A95);
    value ^ (value >> 31)
}

pub(crate) fn sample_range_i64(seed: u64, stream: u64, min: i64, max: i64) -> i64 {
    if max <= min {
        return min;
    }
    let span = (max - min + 1) as u64;
    let mixed = mix_seed(seed, stream);
    min + (mixed % span) as i64
}

/// Unit sample in [0,1) on a named stream.
pub(crate) fn sample_unit(seed: u64, stream: u64) -> f64 {
    (mix_seed(seed, stream) % 10_000) as f64 / 10_000.0
}

const ROLE_NAMES: [&str; 6] = [
    "Claims Analyst",
    "Underwriting Specialist",
    "Customer Service Agent",
    "Financial Controller",
    "Operations Coordinator",
    "Compliance Reviewer",
];

const WORKLOAD_NAMES: [&str; 6] = [
    "Case intake",
    "Document processing",
    "Customer correspondence",
    "Reporting and reconciliation",
    "Quality assurance",
    "Stakeholder coordination",
];

const TASK_TEMPLATES: [(&str, TaskClassification); 8] = [
    ("Review incoming document batch", TaskClassification::Directive),
    ("Respond to customer inquiry email", TaskClassification::Directive),
    ("Reconcile account discrepancies", TaskClassification::FeedbackLoop),
    ("Analyze weekly trend report", TaskClassification::FeedbackLoop),
    ("Research policy knowledge base", TaskClassification::Learning),
    ("Validate processed claim output", TaskClassification::Validation),
    ("Enter form data into system", TaskClassification::TaskIteration),
    ("Archive closed case files", TaskClassification::Negligibility),
];

const SKILL_NAMES: [(&str, SkillLifecycle, MarketDemandTrend); 8] = [
    ("Manual data entry", SkillLifecycle::Declining, MarketDemandTrend::Falling),
    ("Document review", SkillLifecycle::Declining, MarketDemandTrend::Falling),
    ("Customer empathy", SkillLifecycle::Stable, MarketDemandTrend::Steady),
    ("Regulatory knowledge", SkillLifecycle::Stable, MarketDemandTrend::Steady),
    ("Financial analysis", SkillLifecycle::Stable, MarketDemandTrend::Rising),
    ("Prompt engineering", SkillLifecycle::Emerging, MarketDemandTrend::Rising),
    ("Process redesign", SkillLifecycle::Emerging, MarketDemandTrend::Rising),
    ("Exception handling", SkillLifecycle::Stable, MarketDemandTrend::Steady),
];

const BAND_PAIRS: [(CareerBand, CareerBand); 3] = [
    (CareerBand::Entry, CareerBand::Senior),
    (CareerBand::Associate, CareerBand::Lead),
    (CareerBand::Senior, CareerBand::Manager),
];

/// Builds a closed, validation-clean scope for the named boundary.
pub fn demo_scope(scope_type: &str, scope_name: &str, seed: u64) -> ScopeSnapshot {
    let role_count = sample_range_i64(seed, 1, 3, 4) as usize;

    let mut roles = Vec::new();
    let mut job_titles = Vec::new();
    let mut workloads = Vec::new();
    let mut tasks = Vec::new();

    for role_index in 0..role_count {
        let role_seed = mix_seed(seed, role_index as u64 + 10);
        let role_name = ROLE_NAMES[role_index % ROLE_NAMES.len()];
        let role_id = format!("role:{}", slug(role_name));
        let headcount = sample_range_i64(role_seed, 2, 20, 120) as u32;
        let salary = 45_000.0 + sample_range_i64(role_seed, 3, 0, 40) as f64 * 1_000.0;
        roles.push(Role {
            id: role_id.clone(),
            name: role_name.to_string(),
            headcount,
            avg_salary: Some(salary),
            automation_score: sample_unit(role_seed, 4) * 30.0,
        });

        let (junior_band, senior_band) = BAND_PAIRS[role_index % BAND_PAIRS.len()];
        let junior_headcount = headcount * 2 / 3;
        job_titles.push(JobTitle {
            id: format!("{role_id}:title:1"),
            role_id: role_id.clone(),
            name: format!("{role_name} I"),
            career_band: junior_band,
            level: 1,
            headcount: junior_headcount,
            avg_salary: Some(salary * 0.9),
        });
        job_titles.push(JobTitle {
            id: format!("{role_id}:title:2"),
            role_id: role_id.clone(),
            name: format!("Senior {role_name}"),
            career_band: senior_band,
            level: 2,
            headcount: headcount - junior_headcount,
            avg_salary: Some(salary * 1.25),
        });

        let workload_count = sample_range_i64(role_seed, 5, 2, 3) as usize;
        let efforts = split_hundred(workload_count);
        for workload_index in 0..workload_count {
            let workload_seed = mix_seed(role_seed, workload_index as u64 + 20);
            let workload_name =
                WORKLOAD_NAMES[(role_index + workload_index) % WORKLOAD_NAMES.len()];
            let workload_id = format!("{role_id}:wl:{workload_index}");
            workloads.push(Workload {
                id: workload_id.clone(),
                role_id: role_id.clone(),
                name: workload_name.to_string(),
                effort_allocation_pct: efforts[workload_index],
                automation_level: low_level(workload_seed, 6),
            });

            let task_count = sample_range_i64(workload_seed, 7, 2, 4) as usize;
            let times = split_hundred(task_count);
            for task_index in 0..task_count {
                let task_seed = mix_seed(workload_seed, task_index as u64 + 30);
                let (name, classification) = TASK_TEMPLATES
                    [(role_index + workload_index * 2 + task_index) % TASK_TEMPLATES.len()];
                tasks.push(Task {
                    id: format!("{workload_id}:task:{task_index}"),
                    workload_id: workload_id.clone(),
                    name: name.to_string(),
                    description: format!("{name} for {workload_name}"),
                    classification,
                    time_allocation_pct: times[task_index],
                    automation_level: low_level(task_seed, 8),
                });
            }
        }
    }

    let skills: Vec<Skill> = SKILL_NAMES
        .iter()
        .map(|(name, lifecycle, demand)| Skill {
            id: format!("skill:{}", slug(name)),
            name: name.to_string(),
            lifecycle_status: *lifecycle,
            market_demand_trend: *demand,
        })
        .collect();

    // Each task gets one primary and one secondary skill, deterministically.
    let mut task_skills = Vec::new();
    for (task_index, task) in tasks.iter().enumerate() {
        let primary = &skills[task_index % skills.len()];
        let secondary = &skills[(task_index + 3) % skills.len()];
        task_skills.push(TaskSkillEdge {
            task_id: task.id.clone(),
            skill_id: primary.id.clone(),
            relevance: SkillRelevance::Primary,
        });
        task_skills.push(TaskSkillEdge {
            task_id: task.id.clone(),
            skill_id: secondary.id.clone(),
            relevance: SkillRelevance::Secondary,
        });
    }

    ScopeSnapshot {
        scope_type: scope_type.to_string(),
        scope_name: scope_name.to_string(),
        roles,
        job_titles,
        workloads,
        tasks,
        skills,
        task_skills,
    }
}

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Starting levels skew manual; the point of a demo scope is headroom.
fn low_level(seed: u64, stream: u64) -> AutomationLevel {
    match sample_range_i64(seed, stream, 0, 2) {
        0 => AutomationLevel::HumanOnly,
        1 => AutomationLevel::HumanLed,
        _ => AutomationLevel::Shared,
    }
}

/// Splits 100% into `count` parts that sum exactly to 100.
fn split_hundred(count: usize) -> Vec<f64> {
    let base = (100.0 / count as f64 * 10.0).floor() / 10.0;
    let mut parts = vec![base; count];
    let assigned: f64 = base * (count as f64 - 1.0);
    parts[count - 1] = ((100.0 - assigned) * 10.0).round() / 10.0;
    parts
}
