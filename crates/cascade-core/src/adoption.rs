//! Bass-diffusion adoption curve, consumed once per month by the
//! time-step loop.

use contracts::AdoptionSpeed;

#[derive(Debug, Clone)]
pub struct BassDiffusion {
    /// Innovation coefficient p.
    pub p: f64,
    /// Imitation coefficient q.
    pub q: f64,
    /// Max addressable adopters, normalized.
    pub max_adoption: f64,
    pub regulatory_brake: f64,
    pub org_readiness: f64,
}

impl BassDiffusion {
    pub fn from_speed(speed: AdoptionSpeed, regulatory_brake: f64, org_readiness: f64) -> Self {
        Self {
            p: speed.innovation_coefficient(),
            q: speed.imitation_coefficient(),
            max_adoption: 1.0,
            regulatory_brake: regulatory_brake.clamp(0.0, 1.0),
            org_readiness: org_readiness.clamp(0.0, 1.0),
        }
    }

    /// Monthly adoption delta:
    /// `dA = [p + q*(A/M)] * (M - A) * HFM * (1 - brake) * readiness`.
    /// Never negative; adoption is monotonically non-decreasing.
    pub fn monthly_delta(&self, current: f64, human_factor_multiplier: f64) -> f64 {
        let current = current.clamp(0.0, self.max_adoption);
        let pressure = self.p + self.q * (current / self.max_adoption);
        let delta = pressure
            * (self.max_adoption - current)
            * human_factor_multiplier.clamp(0.0, 1.0)
            * (1.0 - self.regulatory_brake)
            * self.org_readiness;
        delta.max(0.0).min(self.max_adoption - current)
    }

    /// Advances adoption one month, clamped to [0, max].
    pub fn step(&self, current: f64, human_factor_multiplier: f64) -> f64 {
        (current + self.monthly_delta(current, human_factor_multiplier))
            .clamp(0.0, self.max_adoption)
    }
}

impl Default for BassDiffusion {
    fn default() -> Self {
        Self::from_speed(AdoptionSpeed::Moderate, 0.0, 1.0)
    }
}
