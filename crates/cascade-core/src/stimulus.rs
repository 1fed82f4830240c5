//! Stimulus generators: turn user parameters plus a scope snapshot into a
//! set of task reclassifications. All three strategies are pure functions of
//! their inputs.

use std::collections::BTreeMap;

use contracts::{
    AutomationLevel, ConfigError, ScopeSnapshot, StimulusParams, TargetMix, TaskClassification,
    TaskReclassification, TechnologyProfile, TARGET_MIX_TOLERANCE,
};
use serde::{Deserialize, Serialize};

use crate::technology::{keyword_confidence, TechnologyCatalog};

/// Per-technology cost input carried alongside reclassifications into the
/// financial step. Costs stay additive across technologies even when their
/// reclassifications overlap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TechnologyCost {
    pub technology: String,
    pub license_tier: contracts::LicenseTier,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stimulus {
    pub reclassifications: Vec<TaskReclassification>,
    pub technology_costs: Vec<TechnologyCost>,
}

const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.3;
const DEFAULT_MAX_STEPS_PER_TASK: u8 = 2;

/// Builds the stimulus for a scenario configuration against a scope.
pub fn generate(
    scope: &ScopeSnapshot,
    params: &StimulusParams,
    catalog: &TechnologyCatalog,
) -> Result<Stimulus, ConfigError> {
    match params {
        StimulusParams::RoleRedesign {
            automation_factor,
            target_classifications,
        } => role_redesign(scope, *automation_factor, target_classifications.as_deref()),
        StimulusParams::TechnologyAdoption {
            technologies,
            custom_profiles,
            confidence_threshold,
        } => technology_adoption(
            scope,
            technologies,
            custom_profiles,
            confidence_threshold.unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            catalog,
        ),
        StimulusParams::TaskDistribution {
            target_mix,
            max_steps_per_task,
            min_time_allocation_pct,
            target_classifications,
        } => task_distribution(
            scope,
            *target_mix,
            max_steps_per_task.unwrap_or(DEFAULT_MAX_STEPS_PER_TASK),
            min_time_allocation_pct.unwrap_or(0.0),
            target_classifications.as_deref(),
        ),
    }
}

fn default_redesign_classifications() -> Vec<TaskClassification> {
    vec![TaskClassification::Directive, TaskClassification::FeedbackLoop]
}

fn role_redesign(
    scope: &ScopeSnapshot,
    automation_factor: f64,
    target_classifications: Option<&[TaskClassification]>,
) -> Result<Stimulus, ConfigError> {
    if !(0.0..=1.0).contains(&automation_factor) {
        return Err(ConfigError::InvalidParameter {
            name: "automation_factor".to_string(),
            detail: format!("{automation_factor} outside [0,1]"),
        });
    }
    let defaults = default_redesign_classifications();
    let targets = target_classifications.unwrap_or(&defaults);
    let steps = (automation_factor * 3.0).round() as usize;

    let mut reclassifications = Vec::new();
    for task in &scope.tasks {
        if !targets.contains(&task.classification) {
            continue;
        }
        let new_level = task.automation_level.advance(steps);
        if new_level != task.automation_level {
            reclassifications.push(TaskReclassification {
                task_id: task.id.clone(),
                new_automation_level: new_level,
            });
        }
    }
    Ok(Stimulus {
        reclassifications,
        technology_costs: Vec::new(),
    })
}

fn technology_adoption(
    scope: &ScopeSnapshot,
    technologies: &[String],
    custom_profiles: &[TechnologyProfile],
    confidence_threshold: f64,
    catalog: &TechnologyCatalog,
) -> Result<Stimulus, ConfigError> {
    if technologies.is_empty() {
        return Err(ConfigError::InvalidParameter {
            name: "technologies".to_string(),
            detail: "at least one technology is required".to_string(),
        });
    }
    let catalog = catalog.clone().with_custom(custom_profiles);
    let mut profiles = Vec::with_capacity(technologies.len());
    for name in technologies {
        let profile = catalog
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTechnology(name.clone()))?;
        profiles.push(profile.clone());
    }

    // task_id -> winning reclassification. When two technologies both match
    // a task, the higher resulting level wins; a tie keeps the profile
    // encountered first.
    let mut winners: BTreeMap<String, AutomationLevel> = BTreeMap::new();
    let mut order: Vec<String> = Vec::new();
    for profile in &profiles {
        for task in &scope.tasks {
            let text = format!("{} {}", task.name, task.description);
            let confidence = keyword_confidence(profile, &text);
            if confidence < confidence_threshold {
                continue;
            }
            let Some(&target_level) = profile.classification_shift.get(&task.classification)
            else {
                continue;
            };
            if target_level == task.automation_level {
                continue;
            }
            match winners.get(&task.id) {
                Some(&existing) if existing >= target_level => {}
                Some(_) => {
                    winners.insert(task.id.clone(), target_level);
                }
                None => {
                    winners.insert(task.id.clone(), target_level);
                    order.push(task.id.clone());
                }
            }
        }
    }

    let reclassifications = order
        .into_iter()
        .map(|task_id| {
            let new_automation_level = winners[&task_id];
            TaskReclassification {
                task_id,
                new_automation_level,
            }
        })
        .collect();

    let technology_costs = profiles
        .iter()
        .map(|profile| TechnologyCost {
            technology: profile.name.clone(),
            license_tier: profile.license_tier,
        })
        .collect();

    Ok(Stimulus {
        reclassifications,
        technology_costs,
    })
}

/// Time-weighted share of scope task time at each automation level, as
/// percentages summing to ~100.
fn time_weighted_distribution(
    levels: &BTreeMap<&str, AutomationLevel>,
    weights: &BTreeMap<&str, f64>,
    total_weight: f64,
) -> [f64; 5] {
    let mut shares = [0.0_f64; 5];
    for (task_id, level) in levels {
        shares[level.index()] += weights.get(task_id).copied().unwrap_or(0.0);
    }
    if total_weight > 0.0 {
        for share in &mut shares {
            *share *= 100.0 / total_weight;
        }
    }
    shares
}

fn mean_absolute_error(shares: &[f64; 5], target: &TargetMix) -> f64 {
    AutomationLevel::ALL
        .iter()
        .map(|&level| (shares[level.index()] - target.share(level)).abs())
        .sum::<f64>()
        / 5.0
}

fn task_distribution(
    scope: &ScopeSnapshot,
    target_mix: TargetMix,
    max_steps_per_task: u8,
    min_time_allocation_pct: f64,
    target_classifications: Option<&[TaskClassification]>,
) -> Result<Stimulus, ConfigError> {
    if (target_mix.sum() - 100.0).abs() > TARGET_MIX_TOLERANCE {
        return Err(ConfigError::DistributionSumInvalid {
            sum: target_mix.sum(),
        });
    }

    let eligible: Vec<&contracts::Task> = scope
        .tasks
        .iter()
        .filter(|task| task.time_allocation_pct >= min_time_allocation_pct)
        .filter(|task| {
            target_classifications
                .map(|targets| targets.contains(&task.classification))
                .unwrap_or(true)
        })
        .collect();

    // Distribution is computed over the whole scope's task time; only
    // eligible tasks may move.
    let mut levels: BTreeMap<&str, AutomationLevel> = scope
        .tasks
        .iter()
        .map(|task| (task.id.as_str(), task.automation_level))
        .collect();
    let weights: BTreeMap<&str, f64> = scope
        .tasks
        .iter()
        .map(|task| (task.id.as_str(), task.time_allocation_pct))
        .collect();
    let total_weight: f64 = scope.tasks.iter().map(|task| task.time_allocation_pct).sum();

    let mut steps_used: BTreeMap<&str, u8> = BTreeMap::new();
    let mut current_error = mean_absolute_error(
        &time_weighted_distribution(&levels, &weights, total_weight),
        &target_mix,
    );

    // Greedy hill-climb: apply the single one-level move that most reduces
    // the time-weighted MAE until no move improves or step budgets are
    // spent. Deterministic because candidates iterate in task order.
    loop {
        let mut best: Option<(&str, AutomationLevel, f64)> = None;
        for task in &eligible {
            let used = steps_used.get(task.id.as_str()).copied().unwrap_or(0);
            if used >= max_steps_per_task {
                continue;
            }
            let level = levels[task.id.as_str()];
            for candidate in neighbor_levels(level) {
                let mut trial = levels.clone();
                trial.insert(task.id.as_str(), candidate);
                let error = mean_absolute_error(
                    &time_weighted_distribution(&trial, &weights, total_weight),
                    &target_mix,
                );
                if error + 1e-12 < current_error
                    && best.map(|(_, _, best_error)| error < best_error).unwrap_or(true)
                {
                    best = Some((task.id.as_str(), candidate, error));
                }
            }
        }
        let Some((task_id, new_level, error)) = best else {
            break;
        };
        levels.insert(task_id, new_level);
        *steps_used.entry(task_id).or_insert(0) += 1;
        current_error = error;
    }

    let reclassifications = scope
        .tasks
        .iter()
        .filter_map(|task| {
            let final_level = levels[task.id.as_str()];
            (final_level != task.automation_level).then(|| TaskReclassification {
                task_id: task.id.clone(),
                new_automation_level: final_level,
            })
        })
        .collect();

    Ok(Stimulus {
        reclassifications,
        technology_costs: Vec::new(),
    })
}

fn neighbor_levels(level: AutomationLevel) -> Vec<AutomationLevel> {
    let index = level.index();
    let mut neighbors = Vec::with_capacity(2);
    if index > 0 {
        neighbors.push(AutomationLevel::from_index(index - 1));
    }
    if index < 4 {
        neighbors.push(AutomationLevel::from_index(index + 1));
    }
    neighbors
}
