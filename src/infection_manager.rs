//! Per-person SEIR progression with an independent hospitalization track.
//!
//! Every person owns an [`InfectionProgress`]: elapsed hours and drawn thresholds for the
//! incubation, infection and hospitalization clocks plus the hospital stay. Each hour
//! [`advance`] moves the person at most one state forward:
//!
//! - Susceptible becomes Exposed when a uniform draw is at most the hourly hazard.
//! - Exposed becomes Infectious once incubation time exceeds its threshold.
//! - Infectious becomes Recovered once infection time exceeds its threshold; until then the
//!   hospitalization clock runs and eligible persons are admitted when it passes its threshold.
//! - Recovered is terminal, but the hospitalization clock keeps running so a late admission can
//!   still happen, and admitted persons are discharged after their length of stay.
use rand::Rng;
use rand_distr::{Distribution, LogNormal, Weibull};

use crate::demography::{EpidemicState, HOURS_PER_DAY};
use crate::error::ModelError;
use crate::parameters::Parameters;
use crate::person::Person;

/// The distributions thresholds are drawn from. Built once per run.
#[derive(Debug, Clone, Copy)]
pub struct ProgressionDistributions {
    incubation: Weibull<f64>,
    infection: Weibull<f64>,
    hospitalization: Weibull<f64>,
    hospital_stay: LogNormal<f64>,
}

impl ProgressionDistributions {
    pub fn new(parameters: &Parameters) -> Result<Self, ModelError> {
        let weibull = |name: &str, shape: f64, scale: f64| {
            Weibull::new(scale, shape).map_err(|e| {
                ModelError::InvalidParameter(format!("{name} Weibull({shape}, {scale}): {e}"))
            })
        };
        Ok(ProgressionDistributions {
            incubation: weibull(
                "incubation",
                parameters.incubation.shape,
                parameters.incubation.scale,
            )?,
            infection: weibull(
                "infection",
                parameters.infection.shape,
                parameters.infection.scale,
            )?,
            hospitalization: weibull(
                "hospitalization",
                parameters.hospitalization.shape,
                parameters.hospitalization.scale,
            )?,
            hospital_stay: LogNormal::new(
                parameters.hospital_stay.mu,
                parameters.hospital_stay.sigma,
            )
            .map_err(|e| ModelError::InvalidParameter(format!("hospital stay: {e}")))?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InfectionProgress {
    pub incubation_time: u32,
    pub incubation_threshold: u32,
    pub infection_time: u32,
    pub infection_threshold: u32,
    pub hospitalization_time: u32,
    pub hospitalization_threshold: u32,
    pub hospital_length_of_stay: u32,
    pub time_in_hospital: u32,
    /// Whether this person will be admitted once the hospitalization clock runs out.
    pub hospitalize_person: bool,
    /// Eligibility has been decided.
    pub initialized: bool,
    /// Thresholds have been drawn.
    pub drawn: bool,
}

fn uniform_below<R: Rng + ?Sized>(rng: &mut R, threshold: u32) -> u32 {
    if threshold == 0 {
        0
    } else {
        rng.random_range(0..threshold)
    }
}

impl InfectionProgress {
    /// Draws fresh thresholds. A person placed directly into `Exposed` or `Infectious` also
    /// gets a uniform amount of time already spent on that clock.
    pub fn draw_from_distributions<R: Rng + ?Sized>(
        &mut self,
        distributions: &ProgressionDistributions,
        state: EpidemicState,
        rng: &mut R,
    ) {
        // Float to int casts saturate, so huge draws cannot wrap.
        self.incubation_threshold = distributions.incubation.sample(rng) as u32;
        self.infection_threshold = distributions.infection.sample(rng) as u32;
        self.hospitalization_threshold = distributions.hospitalization.sample(rng) as u32;
        self.hospital_length_of_stay =
            (HOURS_PER_DAY as f64 * distributions.hospital_stay.sample(rng)) as u32;
        self.drawn = true;

        match state {
            EpidemicState::Exposed => {
                self.incubation_time = uniform_below(rng, self.incubation_threshold);
            }
            EpidemicState::Infectious => {
                self.infection_time = uniform_below(rng, self.infection_threshold);
            }
            _ => {}
        }
    }

    fn tick_hospitalization(&mut self, hospitalized: &mut bool) {
        self.hospitalization_time += 1;
        if self.hospitalization_time > self.hospitalization_threshold
            && self.hospitalize_person
            && self.time_in_hospital <= self.hospital_length_of_stay
        {
            *hospitalized = true;
        }
    }
}

/// Places a person directly into `state`, redrawing its thresholds.
pub fn seed_person<R: Rng + ?Sized>(
    person: &mut Person,
    state: EpidemicState,
    distributions: &ProgressionDistributions,
    rng: &mut R,
) {
    person
        .progression
        .draw_from_distributions(distributions, state, rng);
    person.state = state;
}

/// Advances one person by one hour. `hazard` is only evaluated for susceptible persons.
pub fn advance<R, H>(
    person: &mut Person,
    distributions: &ProgressionDistributions,
    hazard: H,
    rng: &mut R,
) where
    R: Rng + ?Sized,
    H: FnOnce(&Person) -> f64,
{
    if !person.progression.drawn {
        person
            .progression
            .draw_from_distributions(distributions, EpidemicState::Susceptible, rng);
    }
    if !person.progression.initialized {
        let probability = person.demography.hospitalization_probability();
        person.progression.hospitalize_person = rng.random::<f64>() <= probability;
        person.progression.initialized = true;
    }

    let progress = &mut person.progression;
    match person.state {
        EpidemicState::Susceptible => {
            let lambda = hazard(person);
            if rng.random::<f64>() <= lambda && lambda > 0.0 {
                person.state = EpidemicState::Exposed;
            }
        }
        EpidemicState::Exposed => {
            if progress.incubation_time > progress.incubation_threshold {
                person.state = EpidemicState::Infectious;
            } else {
                progress.incubation_time += 1;
            }
        }
        EpidemicState::Infectious => {
            if progress.infection_time > progress.infection_threshold {
                person.state = EpidemicState::Recovered;
            } else {
                progress.infection_time += 1;
                progress.tick_hospitalization(&mut person.hospitalized);
            }
        }
        EpidemicState::Recovered => {
            progress.tick_hospitalization(&mut person.hospitalized);
            if person.hospitalized {
                if progress.time_in_hospital > progress.hospital_length_of_stay {
                    person.hospitalized = false;
                } else {
                    progress.time_in_hospital += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_rng;
    use crate::demography::{Demography, Gender};
    use crate::random::named_rng;

    define_rng!(InfectionTestRng);

    fn distributions() -> ProgressionDistributions {
        ProgressionDistributions::new(&Parameters::default()).unwrap()
    }

    fn person(demography: Demography) -> Person {
        Person::new(demography, 40, Gender::Female, 0)
    }

    #[test]
    fn zero_hazard_never_infects() {
        let dists = distributions();
        let mut rng = named_rng::<InfectionTestRng>(0);
        let mut p = person(Demography::Elderly);
        for _ in 0..1000 {
            advance(&mut p, &dists, |_| 0.0, &mut rng);
        }
        assert_eq!(p.state, EpidemicState::Susceptible);
        assert!(p.progression.initialized);
    }

    #[test]
    fn certain_hazard_infects() {
        let dists = distributions();
        let mut rng = named_rng::<InfectionTestRng>(0);
        let mut p = person(Demography::Elderly);
        advance(&mut p, &dists, |_| 1.0, &mut rng);
        assert_eq!(p.state, EpidemicState::Exposed);
    }

    #[test]
    fn exposed_becomes_infectious_after_threshold() {
        let dists = distributions();
        let mut rng = named_rng::<InfectionTestRng>(1);
        let mut p = person(Demography::Students);
        p.state = EpidemicState::Exposed;
        p.progression = InfectionProgress {
            incubation_threshold: 3,
            drawn: true,
            ..InfectionProgress::default()
        };
        for _ in 0..4 {
            advance(&mut p, &dists, |_| 1.0, &mut rng);
            assert_eq!(p.state, EpidemicState::Exposed);
        }
        assert_eq!(p.progression.incubation_time, 4);
        advance(&mut p, &dists, |_| 1.0, &mut rng);
        assert_eq!(p.state, EpidemicState::Infectious);
    }

    #[test]
    fn hospitalization_and_discharge() {
        let dists = distributions();
        let mut rng = named_rng::<InfectionTestRng>(2);
        let mut p = person(Demography::Eldest);
        p.state = EpidemicState::Infectious;
        p.progression = InfectionProgress {
            infection_threshold: 5,
            hospitalization_threshold: 2,
            hospital_length_of_stay: 3,
            hospitalize_person: true,
            initialized: true,
            drawn: true,
            ..InfectionProgress::default()
        };

        advance(&mut p, &dists, |_| 0.0, &mut rng);
        advance(&mut p, &dists, |_| 0.0, &mut rng);
        assert!(!p.hospitalized);
        advance(&mut p, &dists, |_| 0.0, &mut rng);
        assert!(p.hospitalized);

        while p.state == EpidemicState::Infectious {
            advance(&mut p, &dists, |_| 0.0, &mut rng);
        }
        assert!(p.hospitalized);
        for _ in 0..4 {
            advance(&mut p, &dists, |_| 0.0, &mut rng);
            assert!(p.hospitalized);
        }
        advance(&mut p, &dists, |_| 0.0, &mut rng);
        assert!(!p.hospitalized);
        for _ in 0..10 {
            advance(&mut p, &dists, |_| 0.0, &mut rng);
            assert!(!p.hospitalized);
            assert_eq!(p.state, EpidemicState::Recovered);
        }
    }

    #[test]
    fn late_admission_after_recovery() {
        let dists = distributions();
        let mut rng = named_rng::<InfectionTestRng>(3);
        let mut p = person(Demography::Eldest);
        p.state = EpidemicState::Recovered;
        p.progression = InfectionProgress {
            hospitalization_threshold: 1,
            hospital_length_of_stay: 10,
            hospitalize_person: true,
            initialized: true,
            drawn: true,
            ..InfectionProgress::default()
        };
        advance(&mut p, &dists, |_| 0.0, &mut rng);
        assert!(!p.hospitalized);
        advance(&mut p, &dists, |_| 0.0, &mut rng);
        assert!(p.hospitalized);
    }

    #[test]
    fn ineligible_demography_is_never_admitted() {
        let dists = distributions();
        let mut rng = named_rng::<InfectionTestRng>(4);
        let mut p = person(Demography::PreSchoolChildren);
        p.state = EpidemicState::Recovered;
        for _ in 0..2000 {
            advance(&mut p, &dists, |_| 0.0, &mut rng);
        }
        assert!(!p.progression.hospitalize_person);
        assert!(!p.hospitalized);
    }

    #[test]
    fn seeding_draws_elapsed_time_below_threshold() {
        let dists = distributions();
        let mut rng = named_rng::<InfectionTestRng>(5);
        for _ in 0..100 {
            let mut p = person(Demography::MiddleAgeWorking);
            seed_person(&mut p, EpidemicState::Exposed, &dists, &mut rng);
            assert_eq!(p.state, EpidemicState::Exposed);
            assert!(p.progression.incubation_threshold > 0);
            assert!(p.progression.incubation_time < p.progression.incubation_threshold);

            let mut q = person(Demography::MiddleAgeWorking);
            seed_person(&mut q, EpidemicState::Infectious, &dists, &mut rng);
            let progress = q.progression;
            assert!(progress.infection_time <= progress.infection_threshold.max(1) - 1);
        }
    }

    #[test]
    fn incubation_threshold_is_near_scale() {
        // Weibull with shape 20 is tightly concentrated just below its scale.
        let dists = distributions();
        let mut rng = named_rng::<InfectionTestRng>(6);
        let mut progress = InfectionProgress::default();
        for _ in 0..100 {
            progress.draw_from_distributions(&dists, EpidemicState::Susceptible, &mut rng);
            assert!((60..=140).contains(&progress.incubation_threshold));
        }
    }

    #[test]
    fn invalid_distribution_parameters() {
        let mut parameters = Parameters::default();
        parameters.incubation.shape = -1.0;
        assert!(matches!(
            ProgressionDistributions::new(&parameters),
            Err(ModelError::InvalidParameter(_))
        ));
    }
}
