//! Time-stepped financial projection: monthly categorized costs, realized
//! gross savings scaled by adoption and proficiency, NPV and payback.
//!
//! The single-pass cascade carries its own flat v1 financial rules in
//! `cascade`; this module is the v2 path with band-weighted reskilling and
//! the four phased cost categories.

use contracts::{CascadeResult, MonthlyFinancial, SkillShiftDirection};

/// Months over which the committed implementation cost is spread.
const COMMITTED_SPREAD_MONTHS: u32 = 6;
/// Depth of the early-transition J-curve productivity dip, as a share of
/// the theoretical monthly gross run-rate.
const J_CURVE_DEPTH: f64 = 0.15;
/// Months until the J-curve dip fades out.
const J_CURVE_DURATION_MONTHS: u32 = 6;

/// Floor preventing zero early-month value from untrained users.
pub fn proficiency_effectiveness(proficiency: f64) -> f64 {
    0.5 + 0.5 * proficiency.clamp(0.0, 1.0)
}

/// Per-run financial parameters derived once from the theoretical-maximum
/// cascade, then consulted monthly.
#[derive(Debug, Clone)]
pub struct FinancialModel {
    /// Theoretical gross savings per month at full adoption and full
    /// proficiency.
    pub monthly_gross_runrate: f64,
    /// Licensing cost per month at full adoption.
    pub monthly_licensing_at_full_adoption: f64,
    /// One-time implementation cost, spread over the committed window.
    pub implementation_total: f64,
    /// Band-weighted total reskilling cost, charged proportionally to
    /// adoption growth.
    pub reskilling_total: f64,
    /// Headcount-weighted average salary of affected titles.
    pub weighted_avg_salary: f64,
    pub severance_months: f64,
    pub discount_rate_annual: f64,
}

impl FinancialModel {
    /// Derives the model from a cascade result. The cascade's v1 financial
    /// block already priced licensing/implementation for the horizon; the
    /// v2 model re-expresses them as monthly quantities and swaps the flat
    /// reskilling rule for the band-weighted one.
    pub fn from_cascade(
        cascade: &CascadeResult,
        reskilling_cost_per_person: f64,
        reskilling_headcount_fraction: f64,
        severance_months: f64,
        discount_rate_annual: f64,
    ) -> Self {
        let mut monthly_gross_runrate = 0.0;
        let mut salary_weight = 0.0;
        let mut weighted_salary_sum = 0.0;
        let mut reskilling_total = 0.0;
        let sunrise_count = cascade
            .skill_shifts
            .iter()
            .filter(|shift| shift.direction == SkillShiftDirection::Sunrise)
            .count() as f64;

        for role in &cascade.role_impacts {
            for title in &role.title_impacts {
                let headcount = f64::from(title.headcount);
                monthly_gross_runrate +=
                    title.avg_salary * headcount * (title.freed_capacity_pct / 100.0) / 12.0;
                weighted_salary_sum += title.avg_salary * headcount;
                salary_weight += headcount;
                reskilling_total += sunrise_count
                    * (headcount * reskilling_headcount_fraction)
                    * reskilling_cost_per_person
                    * title.career_band.reskilling_multiplier();
            }
        }

        let horizon = f64::from(cascade.timeline_months.max(1));
        Self {
            monthly_gross_runrate,
            monthly_licensing_at_full_adoption: cascade.financial.costs.licensing / horizon,
            implementation_total: cascade.financial.costs.implementation,
            reskilling_total,
            weighted_avg_salary: if salary_weight > 0.0 {
                weighted_salary_sum / salary_weight
            } else {
                0.0
            },
            severance_months,
            discount_rate_annual,
        }
    }

    /// Computes month `month` (1-based) of the cash flow.
    pub fn step_month(
        &self,
        month: u32,
        adoption_level: f64,
        adoption_delta: f64,
        proficiency: f64,
        separations_this_month: f64,
    ) -> MonthlyFinancial {
        let gross_savings = self.monthly_gross_runrate
            * adoption_level.clamp(0.0, 1.0)
            * proficiency_effectiveness(proficiency);

        let committed_cost = if month <= COMMITTED_SPREAD_MONTHS {
            self.implementation_total / f64::from(COMMITTED_SPREAD_MONTHS)
        } else {
            0.0
        };
        let adoption_cost = self.monthly_licensing_at_full_adoption * adoption_level
            + self.reskilling_total * adoption_delta.max(0.0);
        let separation_cost = separations_this_month
            * self.weighted_avg_salary
            * (self.severance_months / 12.0);
        let j_curve_cost = if month <= J_CURVE_DURATION_MONTHS {
            self.monthly_gross_runrate
                * J_CURVE_DEPTH
                * (1.0 - f64::from(month - 1) / f64::from(J_CURVE_DURATION_MONTHS))
        } else {
            0.0
        };

        let mut monthly = MonthlyFinancial {
            gross_savings,
            committed_cost,
            adoption_cost,
            separation_cost,
            j_curve_cost,
            net: 0.0,
        };
        monthly.net = monthly.gross_savings - monthly.total_cost();
        monthly
    }

    /// NPV of a monthly cash-flow series at the configured annual rate,
    /// compounded monthly. Month 1 is discounted one period.
    pub fn npv(&self, months: &[MonthlyFinancial]) -> f64 {
        let monthly_rate = self.discount_rate_annual / 12.0;
        months
            .iter()
            .enumerate()
            .map(|(index, month)| {
                month.net / (1.0 + monthly_rate).powi(index as i32 + 1)
            })
            .sum()
    }

    /// Smallest month with non-negative cumulative net, if reached.
    pub fn payback_month(months: &[MonthlyFinancial]) -> Option<u32> {
        let mut cumulative = 0.0;
        for (index, month) in months.iter().enumerate() {
            cumulative += month.net;
            if cumulative >= 0.0 {
                return Some(index as u32 + 1);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_months(net: f64, count: usize) -> Vec<MonthlyFinancial> {
        (0..count)
            .map(|_| MonthlyFinancial {
                gross_savings: net.max(0.0),
                committed_cost: (-net).max(0.0),
                adoption_cost: 0.0,
                separation_cost: 0.0,
                j_curve_cost: 0.0,
                net,
            })
            .collect()
    }

    fn model() -> FinancialModel {
        FinancialModel {
            monthly_gross_runrate: 100_000.0,
            monthly_licensing_at_full_adoption: 10_000.0,
            implementation_total: 60_000.0,
            reskilling_total: 120_000.0,
            weighted_avg_salary: 60_000.0,
            severance_months: 3.0,
            discount_rate_annual: 0.10,
        }
    }

    #[test]
    fn proficiency_effectiveness_has_half_floor() {
        assert!((proficiency_effectiveness(0.0) - 0.5).abs() < 1e-9);
        assert!((proficiency_effectiveness(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn gross_scales_with_adoption_and_proficiency() {
        let model = model();
        let low = model.step_month(10, 0.2, 0.0, 0.0, 0.0);
        let high = model.step_month(10, 0.8, 0.0, 1.0, 0.0);
        assert!((low.gross_savings - 100_000.0 * 0.2 * 0.5).abs() < 1e-6);
        assert!((high.gross_savings - 100_000.0 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn committed_cost_stops_after_spread_window() {
        let model = model();
        let early = model.step_month(3, 0.1, 0.0, 0.1, 0.0);
        let late = model.step_month(9, 0.5, 0.0, 0.5, 0.0);
        assert!((early.committed_cost - 10_000.0).abs() < 1e-6);
        assert_eq!(late.committed_cost, 0.0);
    }

    #[test]
    fn j_curve_fades_linearly_over_six_months() {
        let model = model();
        let month1 = model.step_month(1, 0.0, 0.0, 0.0, 0.0);
        let month4 = model.step_month(4, 0.0, 0.0, 0.0, 0.0);
        let month7 = model.step_month(7, 0.0, 0.0, 0.0, 0.0);
        assert!((month1.j_curve_cost - 15_000.0).abs() < 1e-6);
        assert!(month4.j_curve_cost < month1.j_curve_cost);
        assert_eq!(month7.j_curve_cost, 0.0);
    }

    #[test]
    fn reskilling_charges_track_adoption_growth() {
        let model = model();
        let growth = model.step_month(8, 0.5, 0.1, 0.5, 0.0);
        let flat = model.step_month(8, 0.5, 0.0, 0.5, 0.0);
        assert!((growth.adoption_cost - flat.adoption_cost - 12_000.0).abs() < 1e-6);
    }

    #[test]
    fn separation_cost_uses_severance_window() {
        let model = model();
        let month = model.step_month(12, 0.5, 0.0, 0.5, 2.0);
        assert!((month.separation_cost - 2.0 * 60_000.0 * 0.25).abs() < 1e-6);
    }

    #[test]
    fn npv_discounts_future_flows() {
        let model = model();
        let undiscounted: f64 = flat_months(1_000.0, 12).iter().map(|m| m.net).sum();
        let npv = model.npv(&flat_months(1_000.0, 12));
        assert!(npv < undiscounted);
        assert!(npv > undiscounted * 0.9);
    }

    #[test]
    fn payback_is_first_cumulative_break_even() {
        let mut months = flat_months(-100.0, 3);
        months.extend(flat_months(200.0, 3));
        assert_eq!(FinancialModel::payback_month(&months), Some(5));
        assert_eq!(FinancialModel::payback_month(&flat_months(-1.0, 6)), None);
    }
}
