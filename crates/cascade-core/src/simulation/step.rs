use contracts::{
    CumulativeFinancial, MonthlySnapshot, RiskFlag, RiskKind, RiskSeverity, WorkforceCounts,
};

use super::{RunMode, SimulationRun};
use crate::feedback::{detect_active_loops, LoopContext};
use crate::human_factors::MonthContext;

impl SimulationRun {
    /// Advances one month through the fixed phase order. Returns false once
    /// the timeline is exhausted. A month whose scaled cascade fails
    /// boundary validation is recorded flagged; the loop continues.
    pub fn step(&mut self) -> bool {
        if self.mode == RunMode::Done {
            return false;
        }
        let month = self.state.month + 1;
        if month > self.config.timeline_months {
            self.mode = RunMode::Done;
            return false;
        }
        self.state.month = month;

        // APPLY_EXOGENOUS
        self.apply_exogenous(month);

        // STEP_ADOPTION
        let hfm = self.state.stocks.composite_multiplier();
        let adoption_delta = self.bass.monthly_delta(self.state.adoption_level, hfm);
        self.state.adoption_level =
            (self.state.adoption_level + adoption_delta).clamp(0.0, 1.0);

        // APPLY_SCHEDULED_INTERVENTIONS
        self.apply_scheduled_waves(month);

        // RUN_SCALED_CASCADE
        let realization = (self.state.adoption_level * hfm).clamp(0.0, 1.0);
        let workforce = self.scaled_workforce(realization);
        let (valid, failed_checks) = self.validate_month(&workforce);

        // STEP_FINANCIAL
        let monthly = self.financial.step_month(
            month,
            self.state.adoption_level,
            adoption_delta,
            self.state.stocks.proficiency,
            workforce.monthly_separations,
        );
        self.state.cumulative = CumulativeFinancial {
            savings: self.state.cumulative.savings + monthly.gross_savings,
            costs: self.state.cumulative.costs + monthly.total_cost(),
            net: self.state.cumulative.net + monthly.net,
        };

        // STEP_WORKFORCE
        self.state.separated_to_date = workforce.separated_headcount;
        let total_headcount = self.theoretical.workforce.total_headcount;
        let separation_rate = if total_headcount > 0 {
            workforce.monthly_separations / f64::from(total_headcount)
        } else {
            0.0
        };

        // STEP_HUMAN_FACTORS
        let context = MonthContext {
            adoption_delta,
            adoption_level: self.state.adoption_level,
            separation_rate,
            reskilling_investment: self.state.reskilling_investment,
            change_mgmt_investment: self.state.change_mgmt_investment,
            career_band_aptitude: self.career_band_aptitude(),
        };
        self.state.stocks = self.human_factors.step(&self.state.stocks, &context);

        // DETECT_FEEDBACK
        let active_loops = detect_active_loops(&LoopContext {
            adoption_level: self.state.adoption_level,
            cumulative_savings: self.state.cumulative.savings,
            cumulative_costs: self.state.cumulative.costs,
            monthly_separation_rate: separation_rate,
            stocks: self.state.stocks,
        });

        // STEP_RISK
        let risks = self.month_risks(realization, &workforce);

        // RECORD_SNAPSHOT
        self.months.push(MonthlySnapshot {
            month,
            adoption_level: self.state.adoption_level,
            stocks: self.state.stocks,
            human_factor_multiplier: self.state.stocks.composite_multiplier(),
            monthly,
            cumulative: self.state.cumulative.clone(),
            workforce,
            active_loops,
            risks,
            valid,
            failed_checks,
        });

        if month >= self.config.timeline_months {
            self.mode = RunMode::Done;
        }
        true
    }

    pub fn step_n(&mut self, n: u32) -> u32 {
        let mut committed = 0;
        for _ in 0..n {
            if !self.step() {
                break;
            }
            committed += 1;
        }
        committed
    }

    fn apply_exogenous(&mut self, month: u32) {
        let Some(adjustments) = self.scheduled_adjustments.get(&month).cloned() else {
            return;
        };
        for adjustment in adjustments {
            if let Some(value) = adjustment.reskilling_investment {
                self.state.reskilling_investment = value.clamp(0.0, 1.0);
            }
            if let Some(value) = adjustment.change_mgmt_investment {
                self.state.change_mgmt_investment = value.clamp(0.0, 1.0);
            }
            if let Some(value) = adjustment.regulatory_brake {
                self.bass.regulatory_brake = value.clamp(0.0, 1.0);
            }
        }
    }

    /// A wave re-runs the full cascade over the accumulated
    /// reclassifications and refreshes the financial model; adoption and
    /// human-factor state carry across unchanged.
    fn apply_scheduled_waves(&mut self, month: u32) {
        let Some(wave) = self.scheduled_waves.get(&month).cloned() else {
            return;
        };
        self.applied_reclassifications.extend(wave);
        self.theoretical = self.engine.run(
            &self.scope,
            &self.applied_reclassifications,
            &self.technology_costs,
            self.config.timeline_months,
        );
        self.financial = Self::financial_for(&self.engine, &self.theoretical, &self.config);
    }

    fn scaled_workforce(&self, realization: f64) -> WorkforceCounts {
        let theoretical = &self.theoretical.workforce;
        let separated = theoretical.separated_headcount * realization;
        WorkforceCounts {
            freed_headcount: theoretical.freed_headcount * realization,
            redeployable_headcount: theoretical.redeployable_headcount * realization,
            separated_headcount: separated,
            monthly_separations: (separated - self.state.separated_to_date).max(0.0),
        }
    }

    fn validate_month(&self, workforce: &WorkforceCounts) -> (bool, Vec<String>) {
        let mut failed_checks = self.theoretical.validation.failed_checks.clone();
        if workforce.freed_headcount < 0.0 || workforce.separated_headcount < 0.0 {
            failed_checks.push("scaled_headcount_non_negative".to_string());
        }
        if workforce.freed_headcount > self.theoretical.workforce.freed_headcount + 1e-9 {
            failed_checks.push("realized_within_theoretical_max".to_string());
        }
        (failed_checks.is_empty(), failed_checks)
    }

    /// Headcount-weighted learning aptitude over affected titles; higher
    /// bands reskill slower.
    fn career_band_aptitude(&self) -> f64 {
        let mut weight = 0.0;
        let mut sum = 0.0;
        for role in &self.theoretical.role_impacts {
            for title in &role.title_impacts {
                let headcount = f64::from(title.headcount);
                sum += headcount * 2.0 / (1.0 + title.career_band.reskilling_multiplier());
                weight += headcount;
            }
        }
        if weight > 0.0 {
            sum / weight
        } else {
            1.0
        }
    }

    fn month_risks(&self, realization: f64, workforce: &WorkforceCounts) -> Vec<RiskFlag> {
        let tables = self.engine.tables();
        let mut risks = Vec::new();
        for role in &self.theoretical.role_impacts {
            let realized_pct = role.freed_capacity_pct * realization;
            if realized_pct > tables.risk_high_automation_pct {
                risks.push(RiskFlag {
                    kind: RiskKind::HighAutomation,
                    severity: RiskSeverity::High,
                    detail: format!(
                        "role {} realized {:.1}% freed capacity this month",
                        role.role_id, realized_pct
                    ),
                });
            }
        }
        let total = self.theoretical.workforce.total_headcount;
        if total > 0 {
            let reduction_share = workforce.separated_headcount / f64::from(total);
            if reduction_share > tables.risk_workforce_reduction_share {
                risks.push(RiskFlag {
                    kind: RiskKind::WorkforceReduction,
                    severity: RiskSeverity::High,
                    detail: format!(
                        "realized separations reached {:.1}% of scope headcount",
                        reduction_share * 100.0
                    ),
                });
            }
        }
        risks
    }
}
