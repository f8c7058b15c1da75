//! Run configuration, loaded from a JSON file. Every field has a default, so a config file only
//! needs to list what it changes:
//!
//! ```json
//! {
//!   "population_size": 5000,
//!   "phase_hours": [48, 48, 48, 48],
//!   "data_dir": "data"
//! }
//! ```
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::demography::Municipality;
use crate::error::ModelError;
use crate::log::debug;

/// Which configured beta each phase uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetaMapping {
    /// Phase `i` uses `betas[i]`.
    #[default]
    Corrected,
    /// Phase 0 uses `betas[0]`, phase 1 uses `betas[1]`, every later phase uses `betas[3]`.
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullParams {
    pub shape: f64,
    /// In hours.
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogNormalParams {
    pub mu: f64,
    pub sigma: f64,
}

/// Names of the input files, relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    pub mixing_home: String,
    pub mixing_other: String,
    pub mixing_school: String,
    pub mixing_work: String,
    pub mixing_work_school: String,
    pub frequent_travel: String,
    pub incidental_travel: String,
    pub municipality_population: String,
    pub municipality_codes: String,
    pub initial_infected: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        DataFiles {
            mixing_home: "Mix_h.csv".to_string(),
            mixing_other: "Mix_o.csv".to_string(),
            mixing_school: "Mix_s.csv".to_string(),
            mixing_work: "Mix_w.csv".to_string(),
            mixing_work_school: "Mix_ws.csv".to_string(),
            frequent_travel: "M_freq.csv".to_string(),
            incidental_travel: "M_inc.csv".to_string(),
            municipality_population: "inwoners_gemeente_2018.csv".to_string(),
            municipality_codes: "Gemeenten2018.csv".to_string(),
            initial_infected: "initial_infected_per_municipality_per_day.csv".to_string(),
        }
    }
}

/// An elementwise reduction of every mixing matrix, applied when the scenario enters `phase`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixingReduction {
    pub phase: usize,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Number of agents. With register data, `0` means one agent per row.
    pub population_size: usize,
    /// Number of real persons the agents stand for.
    pub total_population_size: u64,
    /// Persons per agent; `0` derives it from the two sizes above.
    pub custom_agent_to_person_ratio: f64,
    pub avg_interactions: f64,
    pub empirical_avg_interactions: f64,
    /// Length of the seeding period in hours.
    pub init_infection_time: usize,
    /// Hours spent in each of the four phases after seeding.
    pub phase_hours: [usize; 4],
    pub phase_2_mobility_reduction: f64,
    pub phase_3_mobility_reduction: f64,
    pub phase_2_homeschooling_parents: f64,
    pub betas: [f64; 4],
    pub beta_mapping: BetaMapping,
    pub incubation: WeibullParams,
    pub infection: WeibullParams,
    pub hospitalization: WeibullParams,
    /// In days; multiplied by 24 when drawn.
    pub hospital_stay: LogNormalParams,
    pub homestay_mean: f64,
    pub homestay_sigma: f64,
    pub initial_exposed_infected_ratio: f64,
    pub export_affected: bool,
    pub export_interactions: bool,
    /// Record per-municipality counts every this many hours; `0` turns it off.
    pub export_infected_per_timestep_frequency: usize,
    /// Worker threads; `0` lets rayon decide.
    pub num_threads: usize,
    pub data_dir: PathBuf,
    pub files: DataFiles,
    pub mixing_reductions: Vec<MixingReduction>,
    /// Municipalities whose hospitalizations get their own report column.
    pub tracked_municipalities: BTreeMap<String, Municipality>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            population_size: 17000,
            total_population_size: 17_181_084,
            custom_agent_to_person_ratio: 0.0,
            avg_interactions: 13.4,
            empirical_avg_interactions: 140.3,
            init_infection_time: 408,
            phase_hours: [336, 264, 1176, 504],
            phase_2_mobility_reduction: 0.372,
            phase_3_mobility_reduction: 0.424,
            phase_2_homeschooling_parents: 0.12,
            betas: [2.0, 0.1078, 0.4675, 0.1196],
            beta_mapping: BetaMapping::Corrected,
            incubation: WeibullParams {
                shape: 20.0,
                scale: 4.6 * 24.0,
            },
            infection: WeibullParams {
                shape: 1.0,
                scale: 5.0 * 24.0,
            },
            hospitalization: WeibullParams {
                shape: 14.0,
                scale: 10.0 * 24.0,
            },
            hospital_stay: LogNormalParams {
                mu: 2.48,
                sigma: 0.913,
            },
            homestay_mean: 15.0,
            homestay_sigma: 6.0,
            initial_exposed_infected_ratio: 3.0,
            export_affected: false,
            export_interactions: false,
            export_infected_per_timestep_frequency: 0,
            num_threads: 0,
            data_dir: PathBuf::from("data"),
            files: DataFiles::default(),
            mixing_reductions: vec![
                MixingReduction {
                    phase: 1,
                    file: "mixmat_phase2.csv".to_string(),
                },
                MixingReduction {
                    phase: 3,
                    file: "mixmat_phase4.csv".to_string(),
                },
            ],
            tracked_municipalities: BTreeMap::from([
                ("Eindhoven".to_string(), 93),
                ("Groningen".to_string(), 118),
                ("Den Haag".to_string(), 117),
            ]),
        }
    }
}

impl Parameters {
    /// Reads and validates a JSON config file.
    pub fn load_from_json(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::FileNotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let parameters: Parameters = serde_json::from_reader(reader)?;
        parameters.validate()?;
        debug!("loaded parameters from {}", path.display());
        Ok(parameters)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, weibull) in [
            ("incubation", self.incubation),
            ("infection", self.infection),
            ("hospitalization", self.hospitalization),
        ] {
            if !(weibull.shape > 0.0 && weibull.scale > 0.0) {
                return Err(ModelError::InvalidParameter(format!(
                    "{name} Weibull needs a positive shape and scale, got {weibull:?}"
                )));
            }
        }
        if !(self.hospital_stay.sigma >= 0.0 && self.hospital_stay.mu.is_finite()) {
            return Err(ModelError::InvalidParameter(format!(
                "invalid hospital stay distribution {:?}",
                self.hospital_stay
            )));
        }
        if !(self.homestay_sigma >= 0.0 && self.homestay_mean.is_finite()) {
            return Err(ModelError::InvalidParameter(format!(
                "invalid home stay distribution (mean {}, sigma {})",
                self.homestay_mean, self.homestay_sigma
            )));
        }
        for (name, fraction) in [
            ("phase_2_mobility_reduction", self.phase_2_mobility_reduction),
            ("phase_3_mobility_reduction", self.phase_3_mobility_reduction),
            (
                "phase_2_homeschooling_parents",
                self.phase_2_homeschooling_parents,
            ),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(ModelError::InvalidParameter(format!(
                    "{name} must be in [0, 1], got {fraction}"
                )));
            }
        }
        if self.empirical_avg_interactions <= 0.0 || self.avg_interactions < 0.0 {
            return Err(ModelError::InvalidParameter(
                "interaction averages must be positive".to_string(),
            ));
        }
        if !(self.initial_exposed_infected_ratio >= 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "initial_exposed_infected_ratio must not be negative, got {}",
                self.initial_exposed_infected_ratio
            )));
        }
        if self.custom_agent_to_person_ratio < 0.0 {
            return Err(ModelError::InvalidParameter(
                "custom_agent_to_person_ratio must not be negative".to_string(),
            ));
        }
        if self.betas.iter().any(|beta| *beta < 0.0) {
            return Err(ModelError::InvalidParameter(
                "betas must not be negative".to_string(),
            ));
        }
        if let Some(reduction) = self.mixing_reductions.iter().find(|r| r.phase > 3) {
            return Err(ModelError::InvalidParameter(format!(
                "mixing reduction {} targets unknown phase {}",
                reduction.file, reduction.phase
            )));
        }
        Ok(())
    }

    /// Full path of a data file.
    pub fn data_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// How many real persons one agent stands for.
    pub fn agent_to_person_ratio(&self, num_agents: usize) -> f64 {
        if self.custom_agent_to_person_ratio != 0.0 {
            return self.custom_agent_to_person_ratio;
        }
        if num_agents == 0 || num_agents as u64 == self.total_population_size {
            return 1.0;
        }
        self.total_population_size as f64 / num_agents as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let file = write_config(r#"{"population_size": 500, "beta_mapping": "legacy"}"#);
        let parameters = Parameters::load_from_json(file.path()).unwrap();
        assert_eq!(parameters.population_size, 500);
        assert_eq!(parameters.beta_mapping, BetaMapping::Legacy);
        assert_eq!(parameters.phase_hours, [336, 264, 1176, 504]);
        assert_eq!(parameters.files.mixing_home, "Mix_h.csv");
        assert_eq!(parameters.tracked_municipalities["Eindhoven"], 93);
    }

    #[test]
    fn fractional_exposed_ratio() {
        let file = write_config(r#"{"initial_exposed_infected_ratio": 2.5}"#);
        let parameters = Parameters::load_from_json(file.path()).unwrap();
        assert_eq!(parameters.initial_exposed_infected_ratio, 2.5);

        let file = write_config(r#"{"initial_exposed_infected_ratio": -1.0}"#);
        let result = Parameters::load_from_json(file.path());
        assert!(matches!(result, Err(ModelError::InvalidParameter(_))));
    }

    #[test]
    fn json_dump_reads_back_exactly() {
        let parameters = Parameters::default();
        let json = serde_json::to_string(&parameters).unwrap();
        let saved: Parameters = serde_json::from_str(&json).unwrap();
        assert_eq!(saved.incubation.scale, 4.6 * 24.0);
        assert_eq!(saved, parameters);
    }

    #[test]
    fn missing_file() {
        let result = Parameters::load_from_json(Path::new("./does/not/exist.json"));
        assert!(matches!(result, Err(ModelError::FileNotFound(_))));
    }

    #[test]
    fn malformed_json() {
        let file = write_config(r#"{"population_size": "many"}"#);
        let result = Parameters::load_from_json(file.path());
        assert!(matches!(result, Err(ModelError::JsonError(_))));
    }

    #[test]
    fn rejects_bad_weibull() {
        let file = write_config(r#"{"infection": {"shape": 0.0, "scale": 120.0}}"#);
        let result = Parameters::load_from_json(file.path());
        assert!(matches!(result, Err(ModelError::InvalidParameter(_))));
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        let parameters = Parameters {
            phase_3_mobility_reduction: 1.5,
            ..Parameters::default()
        };
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn agent_to_person_ratio() {
        let parameters = Parameters {
            total_population_size: 10_000,
            ..Parameters::default()
        };
        assert_eq!(parameters.agent_to_person_ratio(10_000), 1.0);
        assert_eq!(parameters.agent_to_person_ratio(1000), 10.0);

        let custom = Parameters {
            custom_agent_to_person_ratio: 1.0,
            ..parameters
        };
        assert_eq!(custom.agent_to_person_ratio(1000), 1.0);
    }
}
