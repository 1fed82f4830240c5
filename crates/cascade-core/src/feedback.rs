//! Feedback-loop detector: diagnostic labels over the stock dynamics.
//!
//! Each loop is a pure predicate on the month's state. The detector does not
//! feed back into the numeric update; the coupling already exists through
//! the HFM and adoption formulas. These labels document why the numbers
//! moved.

use contracts::{FeedbackLoop, HumanFactorStocks};

/// State visible to the detector for one month.
#[derive(Debug, Clone, Copy)]
pub struct LoopContext {
    pub adoption_level: f64,
    pub cumulative_savings: f64,
    pub cumulative_costs: f64,
    /// Separations this month as a share of total headcount.
    pub monthly_separation_rate: f64,
    pub stocks: HumanFactorStocks,
}

pub fn detect_active_loops(context: &LoopContext) -> Vec<FeedbackLoop> {
    let mut active = Vec::new();

    // R1 productivity flywheel: savings fund further rollout.
    if context.cumulative_savings > context.cumulative_costs && context.adoption_level > 0.30 {
        active.push(FeedbackLoop::R1ProductivityFlywheel);
    }
    // R2 capability compounding: proficient users adopt faster.
    if context.stocks.proficiency > 0.40 && context.adoption_level > 0.20 {
        active.push(FeedbackLoop::R2CapabilityCompounding);
    }
    // B1 change resistance.
    if context.stocks.resistance > 0.50 {
        active.push(FeedbackLoop::B1ChangeResistance);
    }
    // B2 skill gap brake: rollout outruns capability.
    if context.stocks.proficiency < 0.30 && context.adoption_level > 0.10 {
        active.push(FeedbackLoop::B2SkillGapBrake);
    }
    // B3 knowledge drain.
    if context.monthly_separation_rate > 0.01 {
        active.push(FeedbackLoop::B3KnowledgeDrain);
    }

    active
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_context() -> LoopContext {
        LoopContext {
            adoption_level: 0.0,
            cumulative_savings: 0.0,
            cumulative_costs: 0.0,
            monthly_separation_rate: 0.0,
            stocks: HumanFactorStocks {
                resistance: 0.2,
                morale: 0.6,
                proficiency: 0.5,
                culture_readiness: 0.5,
            },
        }
    }

    #[test]
    fn no_loops_active_at_rest() {
        assert!(detect_active_loops(&base_context()).is_empty());
    }

    #[test]
    fn flywheel_needs_both_profit_and_adoption() {
        let mut context = base_context();
        context.cumulative_savings = 100.0;
        context.cumulative_costs = 50.0;
        context.adoption_level = 0.25;
        assert!(!detect_active_loops(&context).contains(&FeedbackLoop::R1ProductivityFlywheel));
        context.adoption_level = 0.35;
        assert!(detect_active_loops(&context).contains(&FeedbackLoop::R1ProductivityFlywheel));
    }

    #[test]
    fn skill_gap_brake_fires_when_rollout_outruns_proficiency() {
        let mut context = base_context();
        context.stocks.proficiency = 0.15;
        context.adoption_level = 0.2;
        let active = detect_active_loops(&context);
        assert!(active.contains(&FeedbackLoop::B2SkillGapBrake));
        // proficiency 0.5 at same adoption also qualifies for R2
        context.stocks.proficiency = 0.45;
        context.adoption_level = 0.25;
        let active = detect_active_loops(&context);
        assert!(active.contains(&FeedbackLoop::R2CapabilityCompounding));
        assert!(!active.contains(&FeedbackLoop::B2SkillGapBrake));
    }

    #[test]
    fn knowledge_drain_threshold_is_one_percent() {
        let mut context = base_context();
        context.monthly_separation_rate = 0.009;
        assert!(!detect_active_loops(&context).contains(&FeedbackLoop::B3KnowledgeDrain));
        context.monthly_separation_rate = 0.02;
        assert!(detect_active_loops(&context).contains(&FeedbackLoop::B3KnowledgeDrain));
    }

    #[test]
    fn high_resistance_activates_balancing_loop() {
        let mut context = base_context();
        context.stocks.resistance = 0.6;
        assert!(detect_active_loops(&context).contains(&FeedbackLoop::B1ChangeResistance));
    }
}
