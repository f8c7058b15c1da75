//! Output of a run: an hourly time series of the epidemic, optional per-municipality counts and
//! a copy of the parameters used.
//!
//! Rows are collected in memory while the simulation runs and written at the end with
//! [`ReportCollector::write`]:
//!
//! - `time_series.csv`: `hour,exposed,infectious,hospitalized`, one `hospitalized_<name>` column
//!   per tracked municipality, then (when enabled) `affected_<Demography>` columns and
//!   `avg_person_interactions`. Counts are scaled by the agent-to-person ratio.
//! - `municipality_counts.csv`: `hour,municipality,infected_home,total_present`, every
//!   `export_infected_per_timestep_frequency` hours.
//! - `parameters.json`
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::demography::{
    Demography, DemographyArray, EpidemicState, Municipality, NUM_DEMOGRAPHIES,
};
use crate::error::ModelError;
use crate::log::info;
use crate::mixing::MixingModel;
use crate::parameters::Parameters;
use crate::population::Population;
use crate::statistics::PopulationStatistics;

pub const TIME_SERIES_FILE: &str = "time_series.csv";
pub const MUNICIPALITY_COUNTS_FILE: &str = "municipality_counts.csv";
pub const PARAMETERS_FILE: &str = "parameters.json";

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow {
    pub hour: usize,
    pub exposed: f64,
    pub infectious: f64,
    pub hospitalized: f64,
    /// One per tracked municipality, in [`ReportCollector::tracked`] order.
    pub hospitalized_tracked: Vec<f64>,
    pub affected: Option<DemographyArray<f64>>,
    pub avg_person_interactions: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MunicipalityCountRow {
    pub hour: usize,
    pub municipality: Municipality,
    pub infected_home: u64,
    pub total_present: u64,
}

#[derive(Debug, Clone)]
pub struct ReportCollector {
    tracked: Vec<(String, Municipality)>,
    export_affected: bool,
    export_interactions: bool,
    municipality_frequency: usize,
    time_series: Vec<TimeSeriesRow>,
    municipality_counts: Vec<MunicipalityCountRow>,
}

impl ReportCollector {
    pub fn new(parameters: &Parameters) -> Self {
        ReportCollector {
            tracked: parameters
                .tracked_municipalities
                .iter()
                .map(|(name, m)| (name.clone(), *m))
                .collect(),
            export_affected: parameters.export_affected,
            export_interactions: parameters.export_interactions,
            municipality_frequency: parameters.export_infected_per_timestep_frequency,
            time_series: Vec::new(),
            municipality_counts: Vec::new(),
        }
    }

    pub fn tracked(&self) -> &[(String, Municipality)] {
        &self.tracked
    }

    pub fn time_series(&self) -> &[TimeSeriesRow] {
        &self.time_series
    }

    pub fn municipality_counts(&self) -> &[MunicipalityCountRow] {
        &self.municipality_counts
    }

    /// Records the end-of-hour state of the population. Counts are multiplied by `ratio`.
    pub fn collect(
        &mut self,
        hour: usize,
        ratio: f64,
        population: &Population,
        statistics: &PopulationStatistics,
        mixing: &MixingModel,
    ) {
        let mut states = [0usize; 4];
        let mut hospitalized = 0usize;
        let mut hospitalized_tracked = vec![0usize; self.tracked.len()];
        let mut affected = [0usize; NUM_DEMOGRAPHIES];
        let mut members = [0usize; NUM_DEMOGRAPHIES];
        let mut interactions = 0.0;

        for person in population.iter() {
            states[person.state.index()] += 1;
            members[person.demography.index()] += 1;
            if person.is_affected() {
                affected[person.demography.index()] += 1;
            }
            if person.hospitalized {
                hospitalized += 1;
                for (count, (_, m)) in hospitalized_tracked.iter_mut().zip(&self.tracked) {
                    if person.home_location == *m {
                        *count += 1;
                    }
                }
            }
            if self.export_interactions {
                interactions += mixing.count_interactions(person.situation, person.demography);
            }
        }

        let affected = self.export_affected.then(|| {
            let mut fractions = [0.0; NUM_DEMOGRAPHIES];
            for d in 0..NUM_DEMOGRAPHIES {
                if members[d] > 0 {
                    fractions[d] = affected[d] as f64 / members[d] as f64;
                }
            }
            fractions
        });
        let avg_person_interactions = self.export_interactions.then(|| {
            if population.is_empty() {
                0.0
            } else {
                interactions / population.len() as f64 * ratio
            }
        });

        self.time_series.push(TimeSeriesRow {
            hour,
            exposed: states[EpidemicState::Exposed.index()] as f64 * ratio,
            infectious: states[EpidemicState::Infectious.index()] as f64 * ratio,
            hospitalized: hospitalized as f64 * ratio,
            hospitalized_tracked: hospitalized_tracked
                .into_iter()
                .map(|count| count as f64 * ratio)
                .collect(),
            affected,
            avg_person_interactions,
        });

        if self.municipality_frequency != 0 && hour % self.municipality_frequency == 0 {
            let present = statistics.total_present();
            for (m, total_present) in present.into_iter().enumerate() {
                let municipality = m as Municipality;
                self.municipality_counts.push(MunicipalityCountRow {
                    hour,
                    municipality,
                    infected_home: statistics.infected_home(municipality),
                    total_present,
                });
            }
        }
    }

    fn time_series_header(&self) -> Vec<String> {
        let mut header: Vec<String> = ["hour", "exposed", "infectious", "hospitalized"]
            .iter()
            .map(ToString::to_string)
            .collect();
        header.extend(
            self.tracked
                .iter()
                .map(|(name, _)| format!("hospitalized_{}", name.replace(' ', "_"))),
        );
        if self.export_affected {
            header.extend(Demography::iter().map(|d| format!("affected_{d}")));
        }
        if self.export_interactions {
            header.push("avg_person_interactions".to_string());
        }
        header
    }

    /// Writes the collected reports into `output_dir`, creating it if needed. Returns the paths
    /// written.
    pub fn write(&self, output_dir: &Path) -> Result<Vec<PathBuf>, ModelError> {
        let mut written = Vec::new();

        let path = output_dir.join(TIME_SERIES_FILE);
        let mut writer = Writer::from_writer(generate_validate_filepath(&path)?);
        writer.write_record(self.time_series_header())?;
        for row in &self.time_series {
            let mut record = vec![
                row.hour.to_string(),
                row.exposed.to_string(),
                row.infectious.to_string(),
                row.hospitalized.to_string(),
            ];
            record.extend(row.hospitalized_tracked.iter().map(ToString::to_string));
            if let Some(affected) = &row.affected {
                record.extend(affected.iter().map(ToString::to_string));
            }
            if let Some(interactions) = row.avg_person_interactions {
                record.push(interactions.to_string());
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        written.push(path);

        if self.municipality_frequency != 0 {
            let path = output_dir.join(MUNICIPALITY_COUNTS_FILE);
            let mut writer = Writer::from_writer(generate_validate_filepath(&path)?);
            for row in &self.municipality_counts {
                writer.serialize(row)?;
            }
            writer.flush()?;
            written.push(path);
        }

        info!(
            "wrote {} report file(s) to {}",
            written.len(),
            output_dir.display()
        );
        Ok(written)
    }
}

/// Writes the parameters a run used next to its reports.
pub fn write_parameters(
    output_dir: &Path,
    parameters: &Parameters,
) -> Result<PathBuf, ModelError> {
    let path = output_dir.join(PARAMETERS_FILE);
    let file = generate_validate_filepath(&path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), parameters)?;
    Ok(path)
}

// Creates the file and any missing parent directories. Only CSV and JSON outputs are produced.
fn generate_validate_filepath(path: &Path) -> Result<File, ModelError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv" | "json") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            Ok(File::create(path)?)
        }
        _ => Err(ModelError::ModelError(format!(
            "report output files must be CSV or JSON, got {}",
            path.display()
        ))),
    }
}
