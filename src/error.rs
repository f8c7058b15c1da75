use std::fmt::{self, Debug, Display};
use std::io;
use std::path::PathBuf;

/// Provides `ModelError` and maps other errors to
/// convert to a `ModelError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum ModelError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    ThreadPoolError(rayon::ThreadPoolBuildError),
    FileNotFound(PathBuf),
    DimensionMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },
    ParseError {
        path: PathBuf,
        row: usize,
        column: usize,
        value: String,
    },
    InvalidParameter(String),
    UnknownMunicipality(u32),
    ModelError(String),
}

impl From<io::Error> for ModelError {
    fn from(error: io::Error) -> Self {
        ModelError::IoError(error)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(error: serde_json::Error) -> Self {
        ModelError::JsonError(error)
    }
}

impl From<csv::Error> for ModelError {
    fn from(error: csv::Error) -> Self {
        ModelError::CSVError(error)
    }
}

impl From<rayon::ThreadPoolBuildError> for ModelError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        ModelError::ThreadPoolError(error)
    }
}

impl From<String> for ModelError {
    fn from(error: String) -> Self {
        ModelError::ModelError(error)
    }
}

impl From<&str> for ModelError {
    fn from(error: &str) -> Self {
        ModelError::ModelError(error.to_string())
    }
}

impl std::error::Error for ModelError {}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::FileNotFound(path) => {
                write!(f, "Error: file not found: {}", path.display())
            }
            ModelError::DimensionMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "Error: size mismatch in {}: expected a ({}x{}) matrix, found ({}x{})",
                path.display(),
                expected.0,
                expected.1,
                found.0,
                found.1
            ),
            ModelError::ParseError {
                path,
                row,
                column,
                value,
            } => write!(
                f,
                "Error: could not parse '{value}' in {} at entry ({row},{column})",
                path.display()
            ),
            ModelError::UnknownMunicipality(code) => write!(
                f,
                "Error: could not find municipality '{code}' in list of valid municipalities"
            ),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
