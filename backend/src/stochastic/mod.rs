//! Stochastic outcome models
//!
//! The kernel treats randomness as a black box behind
//! [`StochasticOutcomeModel`]: survival draws, lengths of stay, arrival gaps
//! and arrival acuity. Each model instance owns its generator, so seeding
//! and reproducibility are the model's responsibility.
//!
//! Two reference models are provided:
//!
//! - [`SeededOutcomeModel`]: per-severity survival probabilities,
//!   exponential lengths of stay, exponential inter-arrival gaps driven by a
//!   constant mean or a per-day demand curve
//! - [`FixedOutcomeModel`]: constant draws, for what-if runs and tests

use crate::core::time::{SimTime, MINUTES_PER_DAY};
use crate::models::patient::{Outcome, PatientStatus, Severity};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

/// Source of every random draw the simulation needs
pub trait StochasticOutcomeModel {
    /// Outcome at discharge for an admitted patient
    fn admitted_outcome(&mut self, status: &PatientStatus) -> Outcome;

    /// Outcome for a patient who was declined
    fn declined_outcome(&mut self, status: &PatientStatus) -> Outcome;

    /// Length of stay for an admitted patient
    fn length_of_stay(&mut self, status: &PatientStatus) -> SimTime;

    /// Gap until the next arrival, given the time of the previous one
    fn next_interarrival(&mut self, now: SimTime) -> SimTime;

    /// Status of the next arriving patient
    fn draw_status(&mut self) -> PatientStatus;
}

/// Behaviour of one severity class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityProfile {
    pub severity: Severity,

    /// Relative frequency among arrivals
    pub weight: f64,

    /// Probability that an arrival of this class needs a ventilator
    pub vent_probability: f64,

    /// Survival probability when admitted
    pub admitted_survival: f64,

    /// Survival probability when declined
    pub declined_survival: f64,

    /// Mean length of stay in minutes
    pub mean_stay: SimTime,
}

impl SeverityProfile {
    fn validate(&self) -> Result<(), String> {
        let probabilities = [
            ("vent_probability", self.vent_probability),
            ("admitted_survival", self.admitted_survival),
            ("declined_survival", self.declined_survival),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!(
                    "{} for {} must be within [0, 1], got {}",
                    name,
                    self.severity.name(),
                    p
                ));
            }
        }
        if !(self.weight >= 0.0 && self.weight.is_finite()) {
            return Err(format!("weight for {} must be non-negative", self.severity.name()));
        }
        if !(self.mean_stay > 0.0 && self.mean_stay.is_finite()) {
            return Err(format!("mean_stay for {} must be positive", self.severity.name()));
        }
        Ok(())
    }
}

/// Parameters of [`SeededOutcomeModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Mean minutes between arrivals when no demand curve is given
    pub interarrival_mean: SimTime,

    /// Expected arrivals per day, indexed by day; the last entry holds for
    /// every later day. Overrides `interarrival_mean` when non-empty.
    #[serde(default)]
    pub daily_arrivals: Vec<f64>,

    /// Severity mix; must contain at least one positive weight
    pub severities: Vec<SeverityProfile>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            interarrival_mean: 480.0,
            daily_arrivals: Vec::new(),
            severities: vec![SeverityProfile {
                severity: Severity::Critical,
                weight: 1.0,
                vent_probability: 1.0,
                admitted_survival: 0.5,
                declined_survival: 0.05,
                mean_stay: 10.0 * MINUTES_PER_DAY,
            }],
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.daily_arrivals.is_empty()
            && !(self.interarrival_mean > 0.0 && self.interarrival_mean.is_finite())
        {
            return Err("interarrival_mean must be positive".to_string());
        }
        if let Some(rate) = self
            .daily_arrivals
            .iter()
            .find(|rate| !(**rate > 0.0 && rate.is_finite()))
        {
            return Err(format!("daily arrival rates must be positive, got {}", rate));
        }
        if !self.severities.iter().any(|profile| profile.weight > 0.0) {
            return Err("severity mix needs at least one positive weight".to_string());
        }
        self.severities.iter().try_for_each(SeverityProfile::validate)
    }

    /// Mean gap between arrivals at time `now`
    pub fn mean_gap_at(&self, now: SimTime) -> SimTime {
        match self.daily_arrivals.len() {
            0 => self.interarrival_mean,
            len => {
                let day = ((now.max(0.0) / MINUTES_PER_DAY) as usize).min(len - 1);
                MINUTES_PER_DAY / self.daily_arrivals[day]
            }
        }
    }
}

/// Seeded reference model
///
/// # Example
///
/// ```
/// use hospital_sim_core::stochastic::{ModelConfig, SeededOutcomeModel, StochasticOutcomeModel};
///
/// let mut a = SeededOutcomeModel::new(ModelConfig::default(), 7).unwrap();
/// let mut b = SeededOutcomeModel::new(ModelConfig::default(), 7).unwrap();
///
/// assert_eq!(a.next_interarrival(0.0), b.next_interarrival(0.0));
/// ```
#[derive(Debug, Clone)]
pub struct SeededOutcomeModel {
    config: ModelConfig,
    rng: RngManager,
}

impl SeededOutcomeModel {
    pub fn new(config: ModelConfig, seed: u64) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            config,
            rng: RngManager::new(seed),
        })
    }

    pub fn from_rng(config: ModelConfig, rng: RngManager) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Profile for `severity`; unknown classes use the first profile
    fn profile(&self, severity: Severity) -> &SeverityProfile {
        self.config
            .severities
            .iter()
            .find(|profile| profile.severity == severity)
            .unwrap_or(&self.config.severities[0])
    }

    fn survival_draw(&mut self, survival: f64) -> Outcome {
        if self.rng.bernoulli(survival) {
            Outcome::Lives
        } else {
            Outcome::Dies
        }
    }
}

impl StochasticOutcomeModel for SeededOutcomeModel {
    fn admitted_outcome(&mut self, status: &PatientStatus) -> Outcome {
        let survival = self.profile(status.severity).admitted_survival;
        self.survival_draw(survival)
    }

    fn declined_outcome(&mut self, status: &PatientStatus) -> Outcome {
        let survival = self.profile(status.severity).declined_survival;
        self.survival_draw(survival)
    }

    fn length_of_stay(&mut self, status: &PatientStatus) -> SimTime {
        let mean = self.profile(status.severity).mean_stay;
        self.rng.exponential(mean)
    }

    fn next_interarrival(&mut self, now: SimTime) -> SimTime {
        let mean = self.config.mean_gap_at(now);
        self.rng.exponential(mean)
    }

    fn draw_status(&mut self) -> PatientStatus {
        let weights: Vec<f64> = self.config.severities.iter().map(|p| p.weight).collect();
        let index = self.rng.weighted_index(&weights).unwrap_or(0);
        let profile = &self.config.severities[index];
        let (severity, vent_probability) = (profile.severity, profile.vent_probability);
        PatientStatus::new(severity, self.rng.bernoulli(vent_probability))
    }
}

/// Model returning the same draws every time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedOutcomeModel {
    pub admitted_outcome: Outcome,
    pub declined_outcome: Outcome,
    pub length_of_stay: SimTime,
    pub interarrival: SimTime,
    pub status: PatientStatus,
}

impl FixedOutcomeModel {
    /// Everybody lives; stays last `length_of_stay`
    pub fn new(length_of_stay: SimTime) -> Self {
        Self {
            admitted_outcome: Outcome::Lives,
            declined_outcome: Outcome::Lives,
            length_of_stay,
            interarrival: 1.0,
            status: PatientStatus::ventilated(),
        }
    }

    pub fn with_outcomes(mut self, admitted: Outcome, declined: Outcome) -> Self {
        self.admitted_outcome = admitted;
        self.declined_outcome = declined;
        self
    }

    pub fn with_interarrival(mut self, interarrival: SimTime) -> Self {
        self.interarrival = interarrival;
        self
    }

    pub fn with_status(mut self, status: PatientStatus) -> Self {
        self.status = status;
        self
    }
}

impl StochasticOutcomeModel for FixedOutcomeModel {
    fn admitted_outcome(&mut self, _status: &PatientStatus) -> Outcome {
        self.admitted_outcome
    }

    fn declined_outcome(&mut self, _status: &PatientStatus) -> Outcome {
        self.declined_outcome
    }

    fn length_of_stay(&mut self, _status: &PatientStatus) -> SimTime {
        self.length_of_stay
    }

    fn next_interarrival(&mut self, _now: SimTime) -> SimTime {
        self.interarrival
    }

    fn draw_status(&mut self) -> PatientStatus {
        self.status
    }
}
