//! Contact mixing between demographies, one matrix per [`Situation`].
//!
//! Entry `[d][k]` is the number of contacts a person of demography `d` has per hour with persons
//! of demography `k`. The raw survey matrices count daily contacts, so they are scaled once at
//! load by `avg_interactions / empirical_avg_interactions`. Phase changes multiply every matrix
//! elementwise by a reduction matrix.
use strum::{EnumCount, IntoEnumIterator};

use crate::data_loader::read_square_matrix;
use crate::demography::{
    Demography, DemographyArray, DemographyMatrix, Situation, NUM_DEMOGRAPHIES,
};
use crate::error::ModelError;
use crate::log::{debug, info};
use crate::parameters::Parameters;

#[derive(Debug, Clone, PartialEq)]
pub struct MixingModel {
    matrices: [DemographyMatrix; Situation::COUNT],
}

impl MixingModel {
    /// Uses the matrices as given, without normalization.
    pub fn new(matrices: [DemographyMatrix; Situation::COUNT]) -> Self {
        MixingModel { matrices }
    }

    /// Reads the five situation matrices and normalizes them.
    pub fn load(parameters: &Parameters) -> Result<Self, ModelError> {
        let files = &parameters.files;
        let mut matrices = [[[0.0; NUM_DEMOGRAPHIES]; NUM_DEMOGRAPHIES]; Situation::COUNT];
        for situation in Situation::iter() {
            let file = match situation {
                Situation::Home => &files.mixing_home,
                Situation::Work => &files.mixing_work,
                Situation::School => &files.mixing_school,
                Situation::WorkSchool => &files.mixing_work_school,
                Situation::Other => &files.mixing_other,
            };
            matrices[situation.index()] = read_square_matrix(&parameters.data_path(file))?;
        }
        let mut model = MixingModel::new(matrices);
        model.normalize_interactions(
            parameters.avg_interactions / parameters.empirical_avg_interactions,
        );
        debug!("loaded mixing matrices from {}", parameters.data_dir.display());
        Ok(model)
    }

    pub fn normalize_interactions(&mut self, factor: f64) {
        for value in self.matrices.iter_mut().flatten().flatten() {
            *value *= factor;
        }
    }

    /// Multiplies every situation matrix elementwise by `reduction`.
    pub fn apply_reduction(&mut self, reduction: &DemographyMatrix) {
        for matrix in &mut self.matrices {
            for (row, reduction_row) in matrix.iter_mut().zip(reduction) {
                for (value, factor) in row.iter_mut().zip(reduction_row) {
                    *value *= factor;
                }
            }
        }
    }

    /// Reads a reduction matrix from disk and applies it.
    pub fn apply_reduction_file(
        &mut self,
        parameters: &Parameters,
        file: &str,
    ) -> Result<(), ModelError> {
        let reduction = read_square_matrix::<NUM_DEMOGRAPHIES>(&parameters.data_path(file))?;
        self.apply_reduction(&reduction);
        info!("applied mixing reduction {file}");
        Ok(())
    }

    pub fn matrix(&self, situation: Situation) -> &DemographyMatrix {
        &self.matrices[situation.index()]
    }

    pub fn row(&self, situation: Situation, demography: Demography) -> &DemographyArray<f64> {
        &self.matrices[situation.index()][demography.index()]
    }

    /// Expected contacts in one hour for someone of `demography` in `situation`.
    pub fn count_interactions(&self, situation: Situation, demography: Demography) -> f64 {
        self.row(situation, demography).iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::path::PathBuf;

    fn parameters() -> Parameters {
        Parameters {
            data_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data"),
            ..Parameters::default()
        }
    }

    const FACTOR: f64 = 13.4 / 140.3;

    #[test]
    fn loads_and_normalizes() {
        let mixing = MixingModel::load(&parameters()).unwrap();
        assert_approx_eq!(mixing.matrix(Situation::Home)[0][0], 1.0 * FACTOR);
        assert_approx_eq!(mixing.matrix(Situation::Work)[3][2], 0.36 * FACTOR);
        assert_approx_eq!(mixing.matrix(Situation::Other)[10][6], 0.88 * FACTOR);
        assert_approx_eq!(mixing.matrix(Situation::School)[2][1], 1.85 * FACTOR);
        assert_approx_eq!(mixing.matrix(Situation::WorkSchool)[1][1], 1.54 * FACTOR);
    }

    #[test]
    fn reductions_compose() {
        let parameters = parameters();
        let mut mixing = MixingModel::load(&parameters).unwrap();
        mixing
            .apply_reduction_file(&parameters, "mixmat_phase2.csv")
            .unwrap();
        assert_approx_eq!(mixing.matrix(Situation::Home)[0][0], 1.0 * FACTOR * 0.2);
        assert_approx_eq!(mixing.matrix(Situation::Work)[3][2], 0.36 * FACTOR * 0.25);

        mixing
            .apply_reduction_file(&parameters, "mixmat_phase4.csv")
            .unwrap();
        assert_approx_eq!(
            mixing.matrix(Situation::Home)[0][0],
            1.0 * FACTOR * 0.2 * 1.5
        );
        assert_approx_eq!(
            mixing.matrix(Situation::Work)[3][2],
            0.36 * FACTOR * 0.25 * 1.37
        );
    }

    #[test]
    fn counts_interactions_as_row_sum() {
        let mut matrices = [[[0.0; NUM_DEMOGRAPHIES]; NUM_DEMOGRAPHIES]; Situation::COUNT];
        matrices[Situation::School.index()][Demography::Students.index()] =
            [1.0; NUM_DEMOGRAPHIES];
        let mixing = MixingModel::new(matrices);
        assert_approx_eq!(
            mixing.count_interactions(Situation::School, Demography::Students),
            11.0
        );
        assert_approx_eq!(
            mixing.count_interactions(Situation::Home, Demography::Students),
            0.0
        );
    }

    #[test]
    fn missing_matrix_file() {
        let mut parameters = parameters();
        parameters.files.mixing_work = "nope.csv".to_string();
        assert!(matches!(
            MixingModel::load(&parameters),
            Err(ModelError::FileNotFound(_))
        ));
    }
}
