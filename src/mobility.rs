//! Inter-municipality travel.
//!
//! Every person gets a fixed weekly schedule when created. A day is split into a block of
//! hours at home around midnight and a block of "away" hours in the middle of the day. The away
//! hours are distributed over municipalities by one Dirichlet draw per day whose concentration
//! comes from the commuting tables of the person's home municipality.
use rand::Rng;
use rand_distr::{Distribution, Gamma, Normal};

use crate::data_loader::{read_column, read_matrix_with_shape};
use crate::demography::{
    Demography, Municipality, TravelerType, DAYS_PER_WEEK, HOME_STAY_SCALING, HOURS_PER_DAY,
    HOURS_PER_WEEK,
};
use crate::error::ModelError;
use crate::log::debug;
use crate::parameters::Parameters;
use crate::person::WeeklySchedule;

/// Total concentration of the Dirichlet distribution a day's travel is drawn from.
const DIRICHLET_CONCENTRATION: f64 = 2.5;

#[derive(Debug, Clone)]
pub struct MobilityModel {
    population: Vec<u64>,
    frequent: Vec<Vec<f64>>,
    incidental: Vec<Vec<f64>>,
    codes: Vec<u32>,
    homestay: Normal<f64>,
}

impl MobilityModel {
    pub fn new(
        population: Vec<u64>,
        frequent: Vec<Vec<f64>>,
        incidental: Vec<Vec<f64>>,
        codes: Vec<u32>,
        homestay_mean: f64,
        homestay_sigma: f64,
    ) -> Result<Self, ModelError> {
        let m = population.len();
        for (name, table) in [("frequent", &frequent), ("incidental", &incidental)] {
            let columns = table.iter().map(Vec::len).find(|len| *len != m);
            if table.len() != m || columns.is_some() {
                return Err(ModelError::InvalidParameter(format!(
                    "{name} travel table must be {m}x{m}, got {} rows",
                    table.len()
                )));
            }
        }
        if codes.len() != m {
            return Err(ModelError::InvalidParameter(format!(
                "expected {m} municipality codes, got {}",
                codes.len()
            )));
        }
        if m > usize::from(Municipality::MAX) + 1 {
            return Err(ModelError::InvalidParameter(format!(
                "too many municipalities: {m}"
            )));
        }
        let homestay = Normal::new(homestay_mean, homestay_sigma).map_err(|e| {
            ModelError::InvalidParameter(format!(
                "home stay Normal({homestay_mean}, {homestay_sigma}): {e}"
            ))
        })?;
        Ok(MobilityModel {
            population,
            frequent,
            incidental,
            codes,
            homestay,
        })
    }

    pub fn load(parameters: &Parameters) -> Result<Self, ModelError> {
        let files = &parameters.files;
        let population: Vec<u64> =
            read_column(&parameters.data_path(&files.municipality_population), 1, true)?;
        let m = population.len();
        let frequent =
            read_matrix_with_shape(&parameters.data_path(&files.frequent_travel), m, m)?;
        let incidental =
            read_matrix_with_shape(&parameters.data_path(&files.incidental_travel), m, m)?;
        let codes: Vec<u32> =
            read_column(&parameters.data_path(&files.municipality_codes), 0, true)?;
        debug!("loaded mobility tables for {m} municipalities");
        Self::new(
            population,
            frequent,
            incidental,
            codes,
            parameters.homestay_mean,
            parameters.homestay_sigma,
        )
    }

    pub fn num_municipalities(&self) -> usize {
        self.population.len()
    }

    pub fn population(&self) -> &[u64] {
        &self.population
    }

    /// The municipality with the most inhabitants (first one on ties).
    pub fn most_populous(&self) -> Option<Municipality> {
        self.population
            .iter()
            .enumerate()
            .max_by(|(i, a), (j, b)| a.cmp(b).then(j.cmp(i)))
            .map(|(index, _)| index as Municipality)
    }

    /// Index of a municipality given its external code.
    pub fn municipality_to_location(&self, code: u32) -> Result<Municipality, ModelError> {
        self.codes
            .iter()
            .position(|c| *c == code)
            .map(|index| index as Municipality)
            .ok_or(ModelError::UnknownMunicipality(code))
    }

    /// Hours a day spent in the home municipality, between 1 and 23.
    pub fn draw_homestay_hours<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let hours = self.homestay.sample(rng).round();
        hours.clamp(1.0, (HOURS_PER_DAY - 1) as f64) as usize
    }

    fn concentrations(
        &self,
        traveler_type: TravelerType,
        demography: Demography,
        home: Municipality,
    ) -> Vec<f64> {
        let home = usize::from(home);
        let table = match traveler_type {
            TravelerType::Frequent => &self.frequent,
            TravelerType::Incidental => &self.incidental,
        };
        let mut alphas = table[home].clone();
        alphas[home] *= HOME_STAY_SCALING[demography.index()];

        let inhabitants = self.population[home];
        if inhabitants > 0 {
            for alpha in &mut alphas {
                *alpha /= inhabitants as f64;
            }
        }
        let sum: f64 = alphas.iter().sum();
        if sum > 0.0 {
            for alpha in &mut alphas {
                *alpha = DIRICHLET_CONCENTRATION * *alpha / sum;
            }
        }
        alphas
    }

    /// One day's away slots: exactly `away_hours` municipalities, in order of municipality index.
    pub fn draw_away_locations<R: Rng + ?Sized>(
        &self,
        traveler_type: TravelerType,
        demography: Demography,
        home: Municipality,
        away_hours: usize,
        rng: &mut R,
    ) -> Vec<Municipality> {
        let alphas = self.concentrations(traveler_type, demography, home);
        let shares = sample_dirichlet(&alphas, rng);

        let mut hours: Vec<u64> = shares
            .iter()
            .map(|share| (HOURS_PER_DAY as f64 * share).round() as u64)
            .collect();
        let total: u64 = hours.iter().sum();
        if total > 0 {
            for h in &mut hours {
                *h = HOURS_PER_DAY as u64 * *h / total;
            }
        }

        let mut allocation: Vec<(Municipality, u64)> = hours
            .iter()
            .enumerate()
            .filter(|(index, h)| **h > 0 && *index != usize::from(home))
            .map(|(index, h)| (index as Municipality, *h))
            .collect();

        if allocation.is_empty() {
            let fallback = alphas
                .iter()
                .enumerate()
                .filter(|(index, alpha)| *index != usize::from(home) && **alpha > 0.0)
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(index, _)| index as Municipality);
            return vec![fallback.unwrap_or(home); away_hours];
        }

        let sum: u64 = allocation.iter().map(|(_, h)| h).sum();
        for (_, h) in &mut allocation {
            *h = (away_hours as f64 * (*h as f64 / sum as f64)).round() as u64;
        }
        let sum: u64 = allocation.iter().map(|(_, h)| h).sum();
        if sum < away_hours as u64 {
            let shortfall = away_hours as u64 - sum;
            // First maximum, so ties go to the lowest municipality index.
            let mut most = 0;
            for (i, (_, h)) in allocation.iter().enumerate() {
                if *h > allocation[most].1 {
                    most = i;
                }
            }
            allocation[most].1 += shortfall;
        }

        allocation
            .iter()
            .flat_map(|(municipality, h)| std::iter::repeat_n(*municipality, *h as usize))
            .take(away_hours)
            .collect()
    }

    /// Seven days of travel for one person. Hours before `floor(homestay/2)` and from
    /// `24 - ceil(homestay/2)` on are spent at home; the rest come from
    /// [`MobilityModel::draw_away_locations`].
    pub fn weekly_schedule<R: Rng + ?Sized>(
        &self,
        traveler_type: TravelerType,
        demography: Demography,
        home: Municipality,
        rng: &mut R,
    ) -> WeeklySchedule {
        let homestay_hours = self.draw_homestay_hours(rng);
        let away_hours = HOURS_PER_DAY - homestay_hours;
        let first_half_home = homestay_hours / 2;
        let second_half_home = HOURS_PER_DAY - homestay_hours.div_ceil(2);

        let mut slots = Vec::with_capacity(HOURS_PER_WEEK);
        for _ in 0..DAYS_PER_WEEK {
            let away = self.draw_away_locations(traveler_type, demography, home, away_hours, rng);
            for hour in 0..HOURS_PER_DAY {
                if hour < first_half_home || hour >= second_half_home {
                    slots.push(home);
                } else {
                    slots.push(away[hour - first_half_home]);
                }
            }
        }
        WeeklySchedule::new(slots)
    }
}

/// A Dirichlet sample built from independent Gamma draws. Components with a non-positive
/// concentration are always zero; if every draw is zero the result is all zeros.
pub fn sample_dirichlet<R: Rng + ?Sized>(alphas: &[f64], rng: &mut R) -> Vec<f64> {
    let mut draws: Vec<f64> = alphas
        .iter()
        .map(|alpha| match Gamma::new(*alpha, 1.0) {
            Ok(gamma) if *alpha > 0.0 => gamma.sample(rng),
            _ => 0.0,
        })
        .collect();
    let total: f64 = draws.iter().sum();
    if total > 0.0 {
        for draw in &mut draws {
            *draw /= total;
        }
    }
    draws
}
