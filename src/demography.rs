//! Population strata and the fixed per-demography tables of the model.
//!
//! All tables are indexed by [`Demography::index`].
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, FromRepr};

pub const HOURS_PER_DAY: usize = 24;
pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_WEEK: usize = HOURS_PER_DAY * DAYS_PER_WEEK;

/// Index of a municipality in the mobility tables.
pub type Municipality = u16;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    FromRepr,
)]
#[repr(u8)]
pub enum Demography {
    PreSchoolChildren,
    PrimarySchoolChildren,
    SecondarySchoolChildren,
    Students,
    NonStudyingAdolescents,
    MiddleAgeWorking,
    MiddleAgeUnemployed,
    HigherAgeWorking,
    HigherAgeUnemployed,
    Elderly,
    Eldest,
}

pub const NUM_DEMOGRAPHIES: usize = Demography::COUNT;

/// A value per demography.
pub type DemographyArray<T> = [T; NUM_DEMOGRAPHIES];

/// A `NUM_DEMOGRAPHIES x NUM_DEMOGRAPHIES` matrix, row = own demography.
pub type DemographyMatrix = [[f64; NUM_DEMOGRAPHIES]; NUM_DEMOGRAPHIES];

impl Demography {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }

    pub fn traveler_type(self) -> TravelerType {
        DEMOGRAPHY_TO_TRAVELER_TYPE[self.index()]
    }

    pub fn age_limits(self) -> (u8, u8) {
        AGE_LIMITS[self.index()]
    }

    pub fn hospitalization_probability(self) -> f64 {
        HOSPITALIZATION_PROBABILITY[self.index()]
    }

    pub fn is_child(self) -> bool {
        matches!(
            self,
            Demography::PreSchoolChildren
                | Demography::PrimarySchoolChildren
                | Demography::SecondarySchoolChildren
        )
    }

    pub fn is_working(self) -> bool {
        matches!(
            self,
            Demography::MiddleAgeWorking | Demography::HigherAgeWorking
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TravelerType {
    Frequent,
    Incidental,
}

/// The mixing context a person is in for the current hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
pub enum Situation {
    Home,
    Work,
    School,
    WorkSchool,
    Other,
}

impl Situation {
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumCount,
)]
#[strum(serialize_all = "lowercase")]
pub enum EpidemicState {
    Susceptible,
    Exposed,
    Infectious,
    Recovered,
}

impl EpidemicState {
    pub fn index(self) -> usize {
        self as usize
    }
}

use Demography as D;
use Situation as S;
use TravelerType::{Frequent, Incidental};

pub const DEMOGRAPHY_TO_TRAVELER_TYPE: DemographyArray<TravelerType> = [
    Incidental, Frequent, Frequent, Frequent, Incidental, Frequent, Incidental, Frequent,
    Incidental, Incidental, Incidental,
];

/// Daytime situation while in the home municipality.
pub const DAY_MIXING_HOME: DemographyArray<Situation> = [
    S::Home,
    S::School,
    S::School,
    S::WorkSchool,
    S::Work,
    S::Work,
    S::Home,
    S::Work,
    S::Home,
    S::Home,
    S::Home,
];

/// Daytime situation while in any other municipality.
pub const DAY_MIXING_AWAY: DemographyArray<Situation> = [
    S::Other,
    S::School,
    S::School,
    S::WorkSchool,
    S::Work,
    S::Work,
    S::Other,
    S::Work,
    S::Other,
    S::Other,
    S::Other,
];

/// Extra weight on staying in the home municipality when drawing daily travel.
pub const HOME_STAY_SCALING: DemographyArray<f64> =
    [1.5, 1.5, 1.5, 1.0, 1.0, 1.0, 1.5, 1.0, 1.5, 1.5, 1.5];

pub const NATIONAL_FRACTION: DemographyArray<f64> = [
    0.049, 0.075, 0.057, 0.062, 0.036, 0.318, 0.071, 0.093, 0.064, 0.122, 0.046,
];

pub const HOSPITALIZATION_PROBABILITY: DemographyArray<f64> = [
    0.0, 0.0, 0.0018, 0.0006, 0.0006, 0.0081, 0.0081, 0.0276, 0.0276, 0.0494, 0.0641,
];

/// Inclusive (min, max) age.
pub const AGE_LIMITS: DemographyArray<(u8, u8)> = [
    (0, 4),
    (5, 11),
    (12, 16),
    (17, 24),
    (17, 24),
    (25, 54),
    (25, 54),
    (55, 67),
    (55, 67),
    (68, 80),
    (80, 110),
];

/// Unnormalized likelihood of being awake at each hour of the day.
pub const AWAKE: [f64; HOURS_PER_DAY] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
    1.0, 0.8, 0.6, 0.4, 0.2, 0.0,
];

pub const ABSOLUTE_SUSCEPTIBILITY: DemographyArray<f64> =
    [1.0, 2.0, 3.051, 5.751, 5.751, 3.6, 3.6, 5.0, 5.0, 5.3, 7.2];

// Guard against accidental reordering of the enum.
const _: () = assert!(D::Eldest as usize == NUM_DEMOGRAPHIES - 1);
