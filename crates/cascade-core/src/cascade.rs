//! The 8-step cascade: propagates task reclassifications through workload,
//! role, skill, workforce, financial and risk layers in one pure pass.
//!
//! The pipeline is strictly ordered; each step consumes only the previous
//! step's output plus the immutable scope, so re-running with identical
//! inputs reproduces the result exactly.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{
    AutomationLevel, CascadeResult, CostBreakdown, DataGapWarning, FinancialImpact, JobTitle,
    RiskFlag, RiskKind, RiskSeverity, RoleImpact, ScopeSnapshot, SkillLifecycle, SkillRelevance,
    SkillShift, SkillShiftDirection, SkillShiftSource, TaskChange, TaskReclassification,
    TitleImpact, ValidationReport, WorkforceImpact, WorkloadChange, ROI_SENTINEL_PCT,
    SCHEMA_VERSION_V1,
};

use crate::stimulus::TechnologyCost;

/// Immutable constant tables injected at engine construction so tests can
/// substitute alternates without touching globals.
#[derive(Debug, Clone)]
pub struct CascadeTables {
    /// Workload-score thresholds mapping a recomposed score to a level:
    /// (ai_led_floor, shared_floor, human_led_floor).
    pub workload_thresholds: (f64, f64, f64),
    pub redeployable_fraction: f64,
    pub transformation_multiplier: f64,
    pub redesign_threshold: f64,
    /// Share of PRIMARY-skill coverage over reclassified tasks past which a
    /// skill becomes a sunset candidate.
    pub primary_skill_sunset_share: f64,
    pub implementation_rate: f64,
    /// Flat v1 rule: this share of affected headcount is reskilled.
    pub reskilling_headcount_fraction: f64,
    pub reskilling_cost_per_person: f64,
    pub severance_months: f64,
    pub market_avg_salary: f64,
    /// Risk thresholds: freed% per role, workforce reduction share, net new
    /// skills, tasks affected.
    pub risk_high_automation_pct: f64,
    pub risk_workforce_reduction_share: f64,
    pub risk_skill_gap_count: usize,
    pub risk_broad_change_tasks: usize,
}

impl Default for CascadeTables {
    fn default() -> Self {
        Self {
            workload_thresholds: (80.0, 50.0, 20.0),
            redeployable_fraction: 0.60,
            transformation_multiplier: 1.5,
            redesign_threshold: 40.0,
            primary_skill_sunset_share: 0.30,
            implementation_rate: 0.15,
            reskilling_headcount_fraction: 0.30,
            reskilling_cost_per_person: 2_500.0,
            severance_months: 3.0,
            market_avg_salary: contracts::MARKET_AVG_SALARY,
            risk_high_automation_pct: 60.0,
            risk_workforce_reduction_share: 0.20,
            risk_skill_gap_count: 5,
            risk_broad_change_tasks: 50,
        }
    }
}

/// Delta from the fixed 5x5 shift table keyed by (old, new).
pub fn shift_delta(old: AutomationLevel, new: AutomationLevel) -> f64 {
    new.automation_fraction() - old.automation_fraction()
}

#[derive(Debug, Clone)]
pub struct CascadeEngine {
    tables: CascadeTables,
}

impl Default for CascadeEngine {
    fn default() -> Self {
        Self::new(CascadeTables::default())
    }
}

impl CascadeEngine {
    pub fn new(tables: CascadeTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &CascadeTables {
        &self.tables
    }

    /// Runs the full 8-step cascade. Boundary violations flag the result
    /// rather than failing it; callers inspect `validation`.
    pub fn run(
        &self,
        scope: &ScopeSnapshot,
        reclassifications: &[TaskReclassification],
        technology_costs: &[TechnologyCost],
        timeline_months: u32,
    ) -> CascadeResult {
        let mut data_gaps = Vec::new();

        // Step 1: task reclassification via the shift table.
        let task_changes = self.step_task_changes(scope, reclassifications);

        // Step 2: workload recomposition.
        let workload_changes = self.step_workload_changes(scope, &task_changes);

        // Step 3: role and title impacts.
        let role_impacts =
            self.step_role_impacts(scope, &workload_changes, &mut data_gaps);

        // Step 4: skill shifts from three tagged signal sources.
        let skill_shifts = self.step_skill_shifts(scope, &task_changes);

        // Step 5: workforce recalculation.
        let workforce = self.step_workforce(scope, &role_impacts);

        // Step 6: financial projection (v1 flat rules).
        let financial = self.step_financial(
            &role_impacts,
            &skill_shifts,
            technology_costs,
            timeline_months,
        );

        // Step 7: risk assessment.
        let risks = self.step_risks(&role_impacts, &skill_shifts, &workforce, &task_changes);

        // Step 8: boundary validation; failures are reported, not thrown.
        let validation = self.step_validation(&role_impacts, &workforce);

        let confidence = (1.0 - 0.05 * data_gaps.len() as f64).max(0.5);

        CascadeResult {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            scope_name: scope.scope_name.clone(),
            timeline_months,
            task_changes,
            workload_changes,
            role_impacts,
            skill_shifts,
            workforce,
            financial,
            risks,
            validation,
            data_gaps,
            confidence,
        }
    }

    fn step_task_changes(
        &self,
        scope: &ScopeSnapshot,
        reclassifications: &[TaskReclassification],
    ) -> Vec<TaskChange> {
        let tasks_by_id: BTreeMap<&str, &contracts::Task> = scope
            .tasks
            .iter()
            .map(|task| (task.id.as_str(), task))
            .collect();
        let mut seen = BTreeSet::new();
        let mut changes = Vec::new();
        for reclass in reclassifications {
            if !seen.insert(reclass.task_id.as_str()) {
                continue;
            }
            let Some(task) = tasks_by_id.get(reclass.task_id.as_str()) else {
                continue;
            };
            if task.automation_level == reclass.new_automation_level {
                continue;
            }
            changes.push(TaskChange {
                task_id: task.id.clone(),
                old_level: task.automation_level,
                new_level: reclass.new_automation_level,
                automation_delta: shift_delta(task.automation_level, reclass.new_automation_level),
            });
        }
        changes
    }

    fn step_workload_changes(
        &self,
        scope: &ScopeSnapshot,
        task_changes: &[TaskChange],
    ) -> Vec<WorkloadChange> {
        let new_levels: BTreeMap<&str, AutomationLevel> = task_changes
            .iter()
            .map(|change| (change.task_id.as_str(), change.new_level))
            .collect();
        let changed_workloads: BTreeSet<&str> = scope
            .tasks
            .iter()
            .filter(|task| new_levels.contains_key(task.id.as_str()))
            .map(|task| task.workload_id.as_str())
            .collect();

        let (ai_led_floor, shared_floor, human_led_floor) = self.tables.workload_thresholds;
        let mut changes = Vec::new();
        for workload in &scope.workloads {
            if !changed_workloads.contains(workload.id.as_str()) {
                continue;
            }
            let tasks = scope.tasks_for_workload(&workload.id);
            let old_score: f64 = tasks
                .iter()
                .map(|task| {
                    task.time_allocation_pct * task.automation_level.automation_fraction()
                })
                .sum();
            let new_score: f64 = tasks
                .iter()
                .map(|task| {
                    let level = new_levels
                        .get(task.id.as_str())
                        .copied()
                        .unwrap_or(task.automation_level);
                    task.time_allocation_pct * level.automation_fraction()
                })
                .sum();
            let new_level = if new_score >= ai_led_floor {
                AutomationLevel::AiLed
            } else if new_score >= shared_floor {
                AutomationLevel::Shared
            } else if new_score >= human_led_floor {
                AutomationLevel::HumanLed
            } else {
                AutomationLevel::HumanOnly
            };
            changes.push(WorkloadChange {
                workload_id: workload.id.clone(),
                role_id: workload.role_id.clone(),
                old_score,
                new_score,
                old_level: workload.automation_level,
                new_level,
            });
        }
        changes
    }

    fn step_role_impacts(
        &self,
        scope: &ScopeSnapshot,
        workload_changes: &[WorkloadChange],
        data_gaps: &mut Vec<DataGapWarning>,
    ) -> Vec<RoleImpact> {
        let mut changes_by_role: BTreeMap<&str, Vec<&WorkloadChange>> = BTreeMap::new();
        for change in workload_changes {
            changes_by_role
                .entry(change.role_id.as_str())
                .or_default()
                .push(change);
        }

        let mut impacts = Vec::new();
        for role in &scope.roles {
            let Some(changes) = changes_by_role.get(role.id.as_str()) else {
                continue;
            };
            // Only changed workloads contribute: marginal impact of this
            // intervention, isolated from pre-existing automation.
            let freed_pct: f64 = changes
                .iter()
                .map(|change| {
                    let effort = scope
                        .workloads
                        .iter()
                        .find(|workload| workload.id == change.workload_id)
                        .map(|workload| workload.effort_allocation_pct)
                        .unwrap_or(0.0);
                    effort * (change.new_score - change.old_score) / 100.0
                })
                .sum();
            let freed_pct = freed_pct.clamp(0.0, 100.0);
            let transformation_index =
                (freed_pct * self.tables.transformation_multiplier).min(100.0);

            let title_impacts = scope
                .titles_for_role(&role.id)
                .into_iter()
                .map(|title| self.title_impact(role, title, freed_pct, data_gaps))
                .collect();

            impacts.push(RoleImpact {
                role_id: role.id.clone(),
                role_name: role.name.clone(),
                freed_capacity_pct: freed_pct,
                transformation_index,
                needs_redesign: transformation_index >= self.tables.redesign_threshold,
                title_impacts,
            });
        }
        impacts
    }

    fn title_impact(
        &self,
        role: &contracts::Role,
        title: &JobTitle,
        role_freed_pct: f64,
        data_gaps: &mut Vec<DataGapWarning>,
    ) -> TitleImpact {
        let freed_capacity_pct =
            (role_freed_pct * title.career_band.level_impact_factor()).clamp(0.0, 100.0);
        let freed_headcount = f64::from(title.headcount) * freed_capacity_pct / 100.0;
        let redeployable_headcount = freed_headcount * self.tables.redeployable_fraction;
        let avg_salary = match title.avg_salary.or(role.avg_salary) {
            Some(salary) => salary,
            None => {
                data_gaps.push(DataGapWarning {
                    entity_id: title.id.clone(),
                    field: "avg_salary".to_string(),
                    fallback: format!("market average {}", self.tables.market_avg_salary),
                });
                self.tables.market_avg_salary
            }
        };
        TitleImpact {
            title_id: title.id.clone(),
            career_band: title.career_band,
            headcount: title.headcount,
            avg_salary,
            freed_capacity_pct,
            freed_headcount,
            redeployable_headcount,
            separated_headcount: freed_headcount - redeployable_headcount,
        }
    }

    fn step_skill_shifts(
        &self,
        scope: &ScopeSnapshot,
        task_changes: &[TaskChange],
    ) -> Vec<SkillShift> {
        let mut shifts: Vec<SkillShift> = Vec::new();
        let mut seen: BTreeSet<(String, SkillShiftDirection)> = BTreeSet::new();
        let mut push = |shifts: &mut Vec<SkillShift>, shift: SkillShift| {
            if seen.insert((shift.skill_id.clone(), shift.direction)) {
                shifts.push(shift);
            }
        };

        // (a) lifecycle signal.
        for skill in &scope.skills {
            match skill.lifecycle_status {
                SkillLifecycle::Declining => push(
                    &mut shifts,
                    SkillShift {
                        skill_id: skill.id.clone(),
                        skill_name: skill.name.clone(),
                        direction: SkillShiftDirection::Sunset,
                        source: SkillShiftSource::Lifecycle,
                    },
                ),
                SkillLifecycle::Emerging => push(
                    &mut shifts,
                    SkillShift {
                        skill_id: skill.id.clone(),
                        skill_name: skill.name.clone(),
                        direction: SkillShiftDirection::Sunrise,
                        source: SkillShiftSource::Lifecycle,
                    },
                ),
                SkillLifecycle::Stable => {}
            }
        }

        // (b) task-mapping signal: PRIMARY for more than the threshold share
        // of reclassified tasks.
        if !task_changes.is_empty() {
            let changed: BTreeSet<&str> = task_changes
                .iter()
                .map(|change| change.task_id.as_str())
                .collect();
            let mut primary_hits: BTreeMap<&str, usize> = BTreeMap::new();
            for edge in &scope.task_skills {
                if edge.relevance == SkillRelevance::Primary
                    && changed.contains(edge.task_id.as_str())
                {
                    *primary_hits.entry(edge.skill_id.as_str()).or_default() += 1;
                }
            }
            for skill in &scope.skills {
                let hits = primary_hits.get(skill.id.as_str()).copied().unwrap_or(0);
                let share = hits as f64 / task_changes.len() as f64;
                if share > self.tables.primary_skill_sunset_share {
                    push(
                        &mut shifts,
                        SkillShift {
                            skill_id: skill.id.clone(),
                            skill_name: skill.name.clone(),
                            direction: SkillShiftDirection::Sunset,
                            source: SkillShiftSource::TaskMapping,
                        },
                    );
                }
            }
        }

        // (c) universal signal: any automation at all demands these two.
        if !task_changes.is_empty() {
            for (skill_id, skill_name) in [
                ("skill:ai_literacy", "AI literacy"),
                ("skill:ai_output_validation", "AI output validation"),
            ] {
                push(
                    &mut shifts,
                    SkillShift {
                        skill_id: skill_id.to_string(),
                        skill_name: skill_name.to_string(),
                        direction: SkillShiftDirection::Sunrise,
                        source: SkillShiftSource::Universal,
                    },
                );
            }
        }

        shifts
    }

    fn step_workforce(
        &self,
        scope: &ScopeSnapshot,
        role_impacts: &[RoleImpact],
    ) -> WorkforceImpact {
        let mut workforce = WorkforceImpact {
            total_headcount: scope.total_headcount(),
            ..WorkforceImpact::default()
        };
        for role in role_impacts {
            for title in &role.title_impacts {
                workforce.freed_headcount += title.freed_headcount;
                workforce.redeployable_headcount += title.redeployable_headcount;
                workforce.separated_headcount += title.separated_headcount;
            }
        }
        workforce
    }

    fn step_financial(
        &self,
        role_impacts: &[RoleImpact],
        skill_shifts: &[SkillShift],
        technology_costs: &[TechnologyCost],
        timeline_months: u32,
    ) -> FinancialImpact {
        let years = f64::from(timeline_months) / 12.0;

        let mut gross_savings = 0.0;
        let mut affected_headcount = 0.0;
        let mut severance = 0.0;
        for role in role_impacts {
            for title in &role.title_impacts {
                gross_savings += title.avg_salary
                    * f64::from(title.headcount)
                    * (title.freed_capacity_pct / 100.0)
                    * years;
                affected_headcount += f64::from(title.headcount);
                severance += title.separated_headcount
                    * title.avg_salary
                    * (self.tables.severance_months / 12.0);
            }
        }

        let licensing: f64 = technology_costs
            .iter()
            .map(|cost| {
                cost.license_tier.rate_per_user_month()
                    * affected_headcount
                    * f64::from(timeline_months)
            })
            .sum();
        let implementation = licensing * self.tables.implementation_rate;

        let sunrise_count = skill_shifts
            .iter()
            .filter(|shift| shift.direction == SkillShiftDirection::Sunrise)
            .count();
        let reskilling = sunrise_count as f64
            * (affected_headcount * self.tables.reskilling_headcount_fraction)
            * self.tables.reskilling_cost_per_person;

        let costs = CostBreakdown {
            licensing,
            implementation,
            reskilling,
            severance,
        };
        let total_cost = costs.total();
        let net_impact = gross_savings - total_cost;
        let roi_pct = if total_cost == 0.0 {
            if gross_savings > 0.0 {
                ROI_SENTINEL_PCT
            } else {
                0.0
            }
        } else {
            100.0 * net_impact / total_cost
        };

        // v1 payback assumes uniform monthly gross against upfront cost.
        let payback_months = if gross_savings > 0.0 && timeline_months > 0 {
            let monthly_gross = gross_savings / f64::from(timeline_months);
            let month = (total_cost / monthly_gross).ceil() as u32;
            (month <= timeline_months).then_some(month.max(1))
        } else {
            None
        };

        FinancialImpact {
            gross_savings,
            costs,
            net_impact,
            roi_pct,
            payback_months,
        }
    }

    fn step_risks(
        &self,
        role_impacts: &[RoleImpact],
        skill_shifts: &[SkillShift],
        workforce: &WorkforceImpact,
        task_changes: &[TaskChange],
    ) -> Vec<RiskFlag> {
        let mut risks = Vec::new();

        for role in role_impacts {
            if role.freed_capacity_pct > self.tables.risk_high_automation_pct {
                risks.push(RiskFlag {
                    kind: RiskKind::HighAutomation,
                    severity: RiskSeverity::High,
                    detail: format!(
                        "role {} is {:.1}% freed, above the {:.0}% threshold",
                        role.role_id,
                        role.freed_capacity_pct,
                        self.tables.risk_high_automation_pct
                    ),
                });
            }
        }

        if workforce.total_headcount > 0 {
            let reduction_share =
                workforce.separated_headcount / f64::from(workforce.total_headcount);
            if reduction_share > self.tables.risk_workforce_reduction_share {
                risks.push(RiskFlag {
                    kind: RiskKind::WorkforceReduction,
                    severity: RiskSeverity::High,
                    detail: format!(
                        "projected separations are {:.1}% of scope headcount",
                        reduction_share * 100.0
                    ),
                });
            }
        }

        let net_new_skills = skill_shifts
            .iter()
            .filter(|shift| shift.direction == SkillShiftDirection::Sunrise)
            .count();
        if net_new_skills > self.tables.risk_skill_gap_count {
            risks.push(RiskFlag {
                kind: RiskKind::SkillGap,
                severity: RiskSeverity::Medium,
                detail: format!("{net_new_skills} new skills required across the scope"),
            });
        }

        if task_changes.len() > self.tables.risk_broad_change_tasks {
            risks.push(RiskFlag {
                kind: RiskKind::BroadChange,
                severity: RiskSeverity::Medium,
                detail: format!("{} tasks reclassified in one intervention", task_changes.len()),
            });
        }

        risks
    }

    fn step_validation(
        &self,
        role_impacts: &[RoleImpact],
        workforce: &WorkforceImpact,
    ) -> ValidationReport {
        let mut failed_checks = Vec::new();

        if workforce.freed_headcount < 0.0 || workforce.separated_headcount < 0.0 {
            failed_checks.push("freed_headcount_non_negative".to_string());
        }
        let pct_in_range = role_impacts.iter().all(|role| {
            (0.0..=100.0).contains(&role.freed_capacity_pct)
                && role
                    .title_impacts
                    .iter()
                    .all(|title| (0.0..=100.0).contains(&title.freed_capacity_pct))
        });
        if !pct_in_range {
            failed_checks.push("freed_capacity_in_range".to_string());
        }
        if role_impacts.is_empty() {
            failed_checks.push("at_least_one_role_affected".to_string());
        }

        ValidationReport {
            valid: failed_checks.is_empty(),
            failed_checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CareerBand, Role, Task, TaskClassification, Workload};

    /// The worked single-role scenario: 100 heads at $60k, entry band, one
    /// workload, one human_led task reclassified to shared.
    fn single_role_scope() -> ScopeSnapshot {
        ScopeSnapshot {
            scope_type: "department".to_string(),
            scope_name: "claims".to_string(),
            roles: vec![Role {
                id: "role:analyst".to_string(),
                name: "Analyst".to_string(),
                headcount: 100,
                avg_salary: Some(60_000.0),
                automation_score: 15.0,
            }],
            job_titles: vec![JobTitle {
                id: "title:analyst".to_string(),
                role_id: "role:analyst".to_string(),
                name: "Analyst".to_string(),
                career_band: CareerBand::Entry,
                level: 1,
                headcount: 100,
                avg_salary: Some(60_000.0),
            }],
            workloads: vec![Workload {
                id: "wl:claims".to_string(),
                role_id: "role:analyst".to_string(),
                name: "Claims handling".to_string(),
                effort_allocation_pct: 100.0,
                automation_level: AutomationLevel::HumanLed,
            }],
            tasks: vec![Task {
                id: "task:claims".to_string(),
                workload_id: "wl:claims".to_string(),
                name: "Handle claims".to_string(),
                description: String::new(),
                classification: TaskClassification::Directive,
                time_allocation_pct: 100.0,
                automation_level: AutomationLevel::HumanLed,
            }],
            skills: Vec::new(),
            task_skills: Vec::new(),
        }
    }

    fn reclass_to_shared() -> Vec<TaskReclassification> {
        vec![TaskReclassification {
            task_id: "task:claims".to_string(),
            new_automation_level: AutomationLevel::Shared,
        }]
    }

    #[test]
    fn worked_example_matches_published_numbers() {
        let engine = CascadeEngine::default();
        let result = engine.run(&single_role_scope(), &reclass_to_shared(), &[], 36);

        assert_eq!(result.task_changes.len(), 1);
        assert!((result.task_changes[0].automation_delta - 0.25).abs() < 1e-9);

        let workload = &result.workload_changes[0];
        assert!((workload.old_score - 15.0).abs() < 1e-9);
        assert!((workload.new_score - 40.0).abs() < 1e-9);
        // 40 sits in the 20-50 band: the workload stays human-led even
        // though its dominant task moved to shared.
        assert_eq!(workload.new_level, AutomationLevel::HumanLed);

        let role = &result.role_impacts[0];
        assert!((role.freed_capacity_pct - 25.0).abs() < 1e-9);
        let title = &role.title_impacts[0];
        assert!((title.freed_capacity_pct - 35.0).abs() < 1e-9);
        assert!((title.freed_headcount - 35.0).abs() < 1e-9);
        assert!((title.redeployable_headcount - 21.0).abs() < 1e-9);

        assert!((result.financial.gross_savings - 6_300_000.0).abs() < 1.0);
        assert!(result.validation.valid);
    }

    #[test]
    fn rerun_is_bit_identical() {
        let engine = CascadeEngine::default();
        let scope = single_role_scope();
        let reclass = reclass_to_shared();
        let first = engine.run(&scope, &reclass, &[], 36);
        let second = engine.run(&scope, &reclass, &[], 36);
        assert_eq!(
            serde_json::to_string(&first).expect("serialize"),
            serde_json::to_string(&second).expect("serialize"),
        );
    }

    #[test]
    fn unchanged_role_contributes_nothing() {
        let mut scope = single_role_scope();
        // A second role, heavily pre-automated, untouched by the stimulus.
        scope.roles.push(Role {
            id: "role:legacy".to_string(),
            name: "Legacy".to_string(),
            headcount: 50,
            avg_salary: Some(80_000.0),
            automation_score: 90.0,
        });
        scope.workloads.push(Workload {
            id: "wl:legacy".to_string(),
            role_id: "role:legacy".to_string(),
            name: "Legacy ops".to_string(),
            effort_allocation_pct: 100.0,
            automation_level: AutomationLevel::AiLed,
        });
        scope.tasks.push(Task {
            id: "task:legacy".to_string(),
            workload_id: "wl:legacy".to_string(),
            name: "Operate legacy pipeline".to_string(),
            description: String::new(),
            classification: TaskClassification::TaskIteration,
            time_allocation_pct: 100.0,
            automation_level: AutomationLevel::AiLed,
        });

        let engine = CascadeEngine::default();
        let result = engine.run(&scope, &reclass_to_shared(), &[], 36);
        assert!(
            !result
                .role_impacts
                .iter()
                .any(|role| role.role_id == "role:legacy"),
            "roles with zero changed workloads carry no impact"
        );
    }

    #[test]
    fn no_op_reclassification_is_dropped() {
        let engine = CascadeEngine::default();
        let result = engine.run(
            &single_role_scope(),
            &[TaskReclassification {
                task_id: "task:claims".to_string(),
                new_automation_level: AutomationLevel::HumanLed,
            }],
            &[],
            36,
        );
        assert!(result.task_changes.is_empty());
        assert!(!result.validation.valid);
        assert!(result
            .validation
            .failed_checks
            .contains(&"at_least_one_role_affected".to_string()));
    }

    #[test]
    fn universal_skills_appear_whenever_anything_changes() {
        let engine = CascadeEngine::default();
        let result = engine.run(&single_role_scope(), &reclass_to_shared(), &[], 36);
        let universal: Vec<&SkillShift> = result
            .skill_shifts
            .iter()
            .filter(|shift| shift.source == SkillShiftSource::Universal)
            .collect();
        assert_eq!(universal.len(), 2);
        assert!(universal
            .iter()
            .all(|shift| shift.direction == SkillShiftDirection::Sunrise));
    }

    #[test]
    fn roi_sentinel_when_no_costs() {
        let mut tables = CascadeTables::default();
        // Suppress reskilling so the run is genuinely cost-free.
        tables.reskilling_cost_per_person = 0.0;
        tables.redeployable_fraction = 1.0;
        let engine = CascadeEngine::new(tables);
        let result = engine.run(&single_role_scope(), &reclass_to_shared(), &[], 36);
        assert_eq!(result.financial.costs.total(), 0.0);
        assert!(result.financial.gross_savings > 0.0);
        assert_eq!(result.financial.roi_pct, ROI_SENTINEL_PCT);
    }

    #[test]
    fn roi_zero_when_no_savings_and_no_costs() {
        let engine = CascadeEngine::default();
        let result = engine.run(&single_role_scope(), &[], &[], 36);
        assert_eq!(result.financial.roi_pct, 0.0);
        assert_eq!(result.financial.payback_months, None);
    }

    #[test]
    fn downshift_clamps_freed_capacity_at_zero() {
        let mut scope = single_role_scope();
        scope.tasks[0].automation_level = AutomationLevel::AiLed;
        scope.workloads[0].automation_level = AutomationLevel::AiLed;
        let engine = CascadeEngine::default();
        let result = engine.run(
            &scope,
            &[TaskReclassification {
                task_id: "task:claims".to_string(),
                new_automation_level: AutomationLevel::HumanOnly,
            }],
            &[],
            36,
        );
        let role = &result.role_impacts[0];
        assert_eq!(role.freed_capacity_pct, 0.0);
        assert!(result.validation.valid);
    }

    #[test]
    fn licensing_costs_are_additive_per_technology() {
        let engine = CascadeEngine::default();
        let costs = vec![
            TechnologyCost {
                technology: "a".to_string(),
                license_tier: contracts::LicenseTier::Low,
            },
            TechnologyCost {
                technology: "b".to_string(),
                license_tier: contracts::LicenseTier::Medium,
            },
        ];
        let result = engine.run(&single_role_scope(), &reclass_to_shared(), &costs, 12);
        // (10 + 30) $/user-month * 100 users * 12 months
        assert!((result.financial.costs.licensing - 48_000.0).abs() < 1e-6);
        assert!(
            (result.financial.costs.implementation - 48_000.0 * 0.15).abs() < 1e-6
        );
    }

    #[test]
    fn high_automation_risk_flag_fires_past_threshold() {
        let mut scope = single_role_scope();
        scope.tasks[0].automation_level = AutomationLevel::HumanOnly;
        scope.workloads[0].automation_level = AutomationLevel::HumanOnly;
        let engine = CascadeEngine::default();
        let result = engine.run(
            &scope,
            &[TaskReclassification {
                task_id: "task:claims".to_string(),
                new_automation_level: AutomationLevel::AiOnly,
            }],
            &[],
            36,
        );
        // freed 95% > 60% threshold
        assert!(result
            .risks
            .iter()
            .any(|flag| flag.kind == RiskKind::HighAutomation
                && flag.severity == RiskSeverity::High));
    }

    #[test]
    fn missing_salary_falls_back_with_data_gap() {
        let mut scope = single_role_scope();
        scope.roles[0].avg_salary = None;
        scope.job_titles[0].avg_salary = None;
        let engine = CascadeEngine::default();
        let result = engine.run(&scope, &reclass_to_shared(), &[], 36);
        assert_eq!(result.data_gaps.len(), 1);
        assert!(result.confidence < 1.0);
        let title = &result.role_impacts[0].title_impacts[0];
        assert!((title.avg_salary - contracts::MARKET_AVG_SALARY).abs() < 1e-9);
        assert!(result.validation.valid);
    }
}
