//! Per-hour population statistics, computed with a sharded parallel reduction.
//!
//! Each worker owns a [`Shard`] and scans one contiguous chunk of the population into it, so no
//! counter is ever shared between threads. The shards are then summed sequentially into a
//! [`PopulationStatistics`] snapshot that stays read-only for the rest of the hour.
use rayon::prelude::*;

use crate::demography::{
    Demography, DemographyArray, EpidemicState, Municipality, NUM_DEMOGRAPHIES,
};
use crate::person::Person;
use crate::random::chunk_len;

#[derive(Debug, Clone, Default)]
struct Shard {
    total: Vec<DemographyArray<u64>>,
    infected: Vec<DemographyArray<u64>>,
    infected_home: Vec<u64>,
}

impl Shard {
    fn new(num_municipalities: usize) -> Self {
        Shard {
            total: vec![[0; NUM_DEMOGRAPHIES]; num_municipalities],
            infected: vec![[0; NUM_DEMOGRAPHIES]; num_municipalities],
            infected_home: vec![0; num_municipalities],
        }
    }

    fn reset(&mut self) {
        self.total.fill([0; NUM_DEMOGRAPHIES]);
        self.infected.fill([0; NUM_DEMOGRAPHIES]);
        self.infected_home.fill(0);
    }

    fn record(&mut self, person: &Person) {
        let location = usize::from(person.location);
        let demography = person.demography.index();
        self.total[location][demography] += 1;
        if person.state == EpidemicState::Infectious {
            self.infected[location][demography] += 1;
            self.infected_home[usize::from(person.home_location)] += 1;
        }
    }
}

/// Counts by the municipality persons are currently in, except `infected_home`, which counts
/// infectious persons by their home municipality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationStatistics {
    total: Vec<DemographyArray<u64>>,
    infected: Vec<DemographyArray<u64>>,
    fractions: Vec<DemographyArray<f64>>,
    infected_home: Vec<u64>,
}

impl PopulationStatistics {
    pub fn new(num_municipalities: usize) -> Self {
        PopulationStatistics {
            total: vec![[0; NUM_DEMOGRAPHIES]; num_municipalities],
            infected: vec![[0; NUM_DEMOGRAPHIES]; num_municipalities],
            fractions: vec![[0.0; NUM_DEMOGRAPHIES]; num_municipalities],
            infected_home: vec![0; num_municipalities],
        }
    }

    pub fn num_municipalities(&self) -> usize {
        self.total.len()
    }

    pub fn total(&self, municipality: Municipality, demography: Demography) -> u64 {
        self.total[usize::from(municipality)][demography.index()]
    }

    pub fn infected(&self, municipality: Municipality, demography: Demography) -> u64 {
        self.infected[usize::from(municipality)][demography.index()]
    }

    pub fn fraction(&self, municipality: Municipality, demography: Demography) -> f64 {
        self.fractions[usize::from(municipality)][demography.index()]
    }

    /// Infectious fraction per demography among persons present in `municipality`.
    pub fn fractions(&self, municipality: Municipality) -> &DemographyArray<f64> {
        &self.fractions[usize::from(municipality)]
    }

    pub fn set_fraction(
        &mut self,
        municipality: Municipality,
        demography: Demography,
        value: f64,
    ) {
        self.fractions[usize::from(municipality)][demography.index()] = value;
    }

    pub fn infected_home(&self, municipality: Municipality) -> u64 {
        self.infected_home[usize::from(municipality)]
    }

    pub fn infected_home_all(&self) -> &[u64] {
        &self.infected_home
    }

    /// Persons present per municipality, summed over demographies.
    pub fn total_present(&self) -> Vec<u64> {
        self.total.iter().map(|row| row.iter().sum()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    shards: Vec<Shard>,
    statistics: PopulationStatistics,
}

impl StatisticsAggregator {
    pub fn new(num_municipalities: usize, workers: usize) -> Self {
        StatisticsAggregator {
            shards: vec![Shard::new(num_municipalities); workers.max(1)],
            statistics: PopulationStatistics::new(num_municipalities),
        }
    }

    pub fn statistics(&self) -> &PopulationStatistics {
        &self.statistics
    }

    /// Rebuilds the snapshot from scratch. Runs on the current rayon pool.
    pub fn update(&mut self, persons: &[Person]) {
        let chunk = chunk_len(persons.len(), self.shards.len());
        self.shards
            .par_iter_mut()
            .enumerate()
            .for_each(|(worker, shard)| {
                shard.reset();
                let start = (worker * chunk).min(persons.len());
                let end = (start + chunk).min(persons.len());
                for person in &persons[start..end] {
                    shard.record(person);
                }
            });
        self.reduce();
    }

    fn reduce(&mut self) {
        let statistics = &mut self.statistics;
        for m in 0..statistics.num_municipalities() {
            statistics.infected_home[m] = self.shards.iter().map(|s| s.infected_home[m]).sum();
            for d in 0..NUM_DEMOGRAPHIES {
                let total: u64 = self.shards.iter().map(|s| s.total[m][d]).sum();
                let infected: u64 = self.shards.iter().map(|s| s.infected[m][d]).sum();
                statistics.total[m][d] = total;
                statistics.infected[m][d] = infected;
                statistics.fractions[m][d] = if total == 0 {
                    0.0
                } else {
                    infected as f64 / total as f64
                };
            }
        }
    }
}
