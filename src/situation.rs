//! Hourly situation of a person: where the contacts for this hour come from.
use crate::demography::{
    Demography, Situation, DAY_MIXING_AWAY, DAY_MIXING_HOME, HOURS_PER_DAY,
};
use crate::person::Person;

/// First and last hour of the day counted as daytime.
const DAY_START: usize = 9;
const DAY_END: usize = 17;

/// Outside daytime, persons are at `Home` in their home municipality and in `Other` elsewhere.
/// During the day the demography decides, unless the person has been told to stay home.
pub fn classify(
    hour_of_day: usize,
    is_home: bool,
    home_stay: bool,
    demography: Demography,
) -> Situation {
    let hour_of_day = hour_of_day % HOURS_PER_DAY;
    if !(DAY_START..=DAY_END).contains(&hour_of_day) {
        return if is_home {
            Situation::Home
        } else {
            Situation::Other
        };
    }
    if home_stay {
        Situation::Home
    } else if is_home {
        DAY_MIXING_HOME[demography.index()]
    } else {
        DAY_MIXING_AWAY[demography.index()]
    }
}

pub fn update_situation(person: &mut Person, hour: usize) {
    person.situation = classify(
        hour % HOURS_PER_DAY,
        person.is_home(),
        person.home_stay,
        person.demography,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demography::Gender;
    use strum::IntoEnumIterator;

    #[test]
    fn night_depends_only_on_location() {
        for demography in Demography::iter() {
            for hour in (0..9).chain(18..24) {
                assert_eq!(classify(hour, true, false, demography), Situation::Home);
                assert_eq!(classify(hour, false, false, demography), Situation::Other);
                assert_eq!(classify(hour, false, true, demography), Situation::Other);
            }
        }
    }

    #[test]
    fn daytime_tables() {
        assert_eq!(
            classify(9, true, false, Demography::PrimarySchoolChildren),
            Situation::School
        );
        assert_eq!(
            classify(12, true, false, Demography::MiddleAgeUnemployed),
            Situation::Home
        );
        assert_eq!(
            classify(12, false, false, Demography::MiddleAgeUnemployed),
            Situation::Other
        );
        assert_eq!(
            classify(17, false, false, Demography::Students),
            Situation::WorkSchool
        );
        assert_eq!(
            classify(13, false, false, Demography::HigherAgeWorking),
            Situation::Work
        );
    }

    #[test]
    fn home_stay_means_home_during_the_day() {
        for demography in Demography::iter() {
            assert_eq!(classify(10, false, true, demography), Situation::Home);
            assert_eq!(classify(10, true, true, demography), Situation::Home);
        }
    }

    #[test]
    fn idempotent_and_daily_periodic() {
        let mut person = Person::new(Demography::SecondarySchoolChildren, 14, Gender::Male, 2);
        person.location = 5;
        update_situation(&mut person, 24 * 3 + 11);
        let first = person.situation;
        update_situation(&mut person, 24 * 3 + 11);
        assert_eq!(person.situation, first);
        update_situation(&mut person, 11);
        assert_eq!(person.situation, first);
        assert_eq!(first, Situation::School);
    }
}
