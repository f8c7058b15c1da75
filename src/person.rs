use std::fmt::{self, Display};

use crate::demography::{
    Demography, EpidemicState, Gender, Municipality, Situation, TravelerType, HOURS_PER_WEEK,
};
use crate::infection_manager::InfectionProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PersonId(pub(crate) usize);

impl PersonId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a person is for every hour of the week. An empty schedule means the person never
/// leaves its current municipality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule(Vec<Municipality>);

impl WeeklySchedule {
    pub fn new(slots: Vec<Municipality>) -> Self {
        debug_assert!(slots.is_empty() || slots.len() == HOURS_PER_WEEK);
        WeeklySchedule(slots)
    }

    /// Location at an absolute simulation hour.
    pub fn location_at(&self, hour: usize) -> Option<Municipality> {
        if self.0.is_empty() {
            return None;
        }
        self.0.get(hour % self.0.len()).copied()
    }

    pub fn slots(&self) -> &[Municipality] {
        &self.0
    }

    pub fn is_stationary(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Person {
    pub demography: Demography,
    pub age: u8,
    pub gender: Gender,
    pub home_location: Municipality,
    pub location: Municipality,
    pub traveler_type: TravelerType,
    pub state: EpidemicState,
    pub situation: Situation,
    pub hospitalized: bool,
    /// Set by interventions; keeps the person home all day.
    pub home_stay: bool,
    pub progression: InfectionProgress,
    pub schedule: WeeklySchedule,
}

impl Person {
    /// A susceptible person at home, with no schedule.
    pub fn new(demography: Demography, age: u8, gender: Gender, home: Municipality) -> Self {
        Person {
            demography,
            age,
            gender,
            home_location: home,
            location: home,
            traveler_type: demography.traveler_type(),
            state: EpidemicState::Susceptible,
            situation: Situation::Home,
            hospitalized: false,
            home_stay: false,
            progression: InfectionProgress::default(),
            schedule: WeeklySchedule::default(),
        }
    }

    pub fn is_home(&self) -> bool {
        self.location == self.home_location
    }

    /// Exposed, infectious or recovered.
    pub fn is_affected(&self) -> bool {
        self.state != EpidemicState::Susceptible
    }

    /// Moves the person for the given hour: home when staying home, otherwise wherever the
    /// schedule says.
    pub fn travel(&mut self, hour: usize) {
        if self.home_stay {
            self.location = self.home_location;
        } else if let Some(location) = self.schedule.location_at(hour) {
            self.location = location;
        }
    }
}
