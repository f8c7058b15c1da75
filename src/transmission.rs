//! Hourly force of infection on a susceptible person.
//!
//! ```text
//! hazard = susceptibility[d] * beta(phase) * sleep_weight[hour_of_day]
//!        * sum_k mixing[situation][d][k] * fraction_infected[location][k]
//! ```
use crate::demography::{
    DemographyArray, ABSOLUTE_SUSCEPTIBILITY, AWAKE, HOURS_PER_DAY, NUM_DEMOGRAPHIES,
};
use crate::mixing::MixingModel;
use crate::parameters::{BetaMapping, Parameters};
use crate::person::Person;
use crate::statistics::PopulationStatistics;

/// Maps a phase index to its transmission rate.
pub fn phase_to_beta(betas: &[f64; 4], mapping: BetaMapping, phase: usize) -> f64 {
    match mapping {
        BetaMapping::Corrected => betas[phase.min(3)],
        BetaMapping::Legacy => match phase {
            0 => betas[0],
            1 => betas[1],
            _ => betas[3],
        },
    }
}

/// Sum over other demographies of contacts weighted by the fraction of them that is infectious.
pub fn mixing_sum(row: &DemographyArray<f64>, fractions: &DemographyArray<f64>) -> f64 {
    row.iter().zip(fractions).map(|(mix, fraction)| mix * fraction).sum()
}

#[derive(Debug, Clone)]
pub struct ForceOfInfection {
    /// Normalized to sum to the number of demographies.
    susceptibility: DemographyArray<f64>,
    /// Normalized to sum to one over the day.
    sleep_pattern: [f64; HOURS_PER_DAY],
    beta: f64,
}

impl ForceOfInfection {
    pub fn new(beta: f64) -> Self {
        let total: f64 = ABSOLUTE_SUSCEPTIBILITY.iter().sum();
        let susceptibility =
            ABSOLUTE_SUSCEPTIBILITY.map(|value| value / total * NUM_DEMOGRAPHIES as f64);
        let awake: f64 = AWAKE.iter().sum();
        let sleep_pattern = AWAKE.map(|value| value / awake);
        ForceOfInfection {
            susceptibility,
            sleep_pattern,
            beta,
        }
    }

    pub fn for_phase(parameters: &Parameters, phase: usize) -> Self {
        Self::new(phase_to_beta(
            &parameters.betas,
            parameters.beta_mapping,
            phase,
        ))
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn susceptibility(&self) -> &DemographyArray<f64> {
        &self.susceptibility
    }

    pub fn sleep_weight(&self, hour_of_day: usize) -> f64 {
        self.sleep_pattern[hour_of_day % HOURS_PER_DAY]
    }

    /// Hazard for `person` at `hour`, using the person's current situation and location.
    pub fn hazard(
        &self,
        person: &Person,
        hour: usize,
        mixing: &MixingModel,
        statistics: &PopulationStatistics,
    ) -> f64 {
        let fractions = statistics.fractions(person.location);
        let row = mixing.row(person.situation, person.demography);
        self.susceptibility[person.demography.index()]
            * self.beta
            * self.sleep_weight(hour)
            * mixing_sum(row, fractions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demography::{Demography, Gender, Situation};
    use assert_approx_eq::assert_approx_eq;
    use strum::EnumCount;

    const BETAS: [f64; 4] = [2.0, 0.1078, 0.4675, 0.1196];

    #[test]
    fn corrected_beta_mapping() {
        for phase in 0..4 {
            assert_eq!(
                phase_to_beta(&BETAS, BetaMapping::Corrected, phase),
                BETAS[phase]
            );
        }
    }

    #[test]
    fn legacy_beta_mapping() {
        assert_eq!(phase_to_beta(&BETAS, BetaMapping::Legacy, 0), 2.0);
        assert_eq!(phase_to_beta(&BETAS, BetaMapping::Legacy, 1), 0.1078);
        assert_eq!(phase_to_beta(&BETAS, BetaMapping::Legacy, 2), 0.1196);
        assert_eq!(phase_to_beta(&BETAS, BetaMapping::Legacy, 3), 0.1196);
    }

    #[test]
    fn normalized_tables() {
        let force = ForceOfInfection::new(1.0);
        assert_approx_eq!(force.susceptibility().iter().sum::<f64>(), 11.0);
        let day: f64 = (0..24).map(|h| force.sleep_weight(h)).sum();
        assert_approx_eq!(day, 1.0);
        assert_eq!(force.sleep_weight(3), 0.0);
        assert_approx_eq!(force.sleep_weight(12), 1.0 / 13.5);
    }

    #[test]
    fn mixing_sum_is_dot_product() {
        let mut row = [0.0; NUM_DEMOGRAPHIES];
        let mut fractions = [0.0; NUM_DEMOGRAPHIES];
        row[0] = 2.0;
        row[4] = 3.0;
        fractions[0] = 0.5;
        fractions[4] = 0.1;
        fractions[5] = 1.0;
        assert_approx_eq!(mixing_sum(&row, &fractions), 1.3);
    }

    #[test]
    fn hazard_combines_all_factors() {
        let mut matrices = [[[0.0; NUM_DEMOGRAPHIES]; NUM_DEMOGRAPHIES]; Situation::COUNT];
        matrices[Situation::Home.index()][Demography::Elderly.index()] =
            [1.0; NUM_DEMOGRAPHIES];
        let mixing = MixingModel::new(matrices);

        let mut statistics = PopulationStatistics::new(2);
        statistics.set_fraction(1, Demography::Elderly, 0.5);
        statistics.set_fraction(1, Demography::Eldest, 0.25);

        let person = Person::new(Demography::Elderly, 70, Gender::Female, 1);
        let force = ForceOfInfection::new(2.0);
        let expected =
            force.susceptibility()[Demography::Elderly.index()] * 2.0 * (1.0 / 13.5) * 0.75;
        assert_approx_eq!(force.hazard(&person, 12, &mixing, &statistics), expected);
        assert_eq!(force.hazard(&person, 2, &mixing, &statistics), 0.0);

        let elsewhere = Person::new(Demography::Elderly, 70, Gender::Female, 0);
        assert_eq!(force.hazard(&elsewhere, 12, &mixing, &statistics), 0.0);
    }
}
