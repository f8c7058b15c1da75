//! Storage of all agents plus the ways to visit them.
//!
//! Sequential visits follow the current visit order, which starts as insertion order and can be
//! shuffled with [`Population::randomize_order`]. Parallel visits split the storage into
//! contiguous chunks and run on whatever rayon pool is current; callers install the context's
//! pool around them.
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;

use crate::demography::{EpidemicState, NUM_DEMOGRAPHIES};
use crate::person::{Person, PersonId};
use crate::random::{chunk_len, RngStreams};

#[derive(Debug, Default, Clone)]
pub struct Population {
    persons: Vec<Person>,
    visit_order: Vec<PersonId>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_persons(persons: Vec<Person>) -> Self {
        let visit_order = (0..persons.len()).map(PersonId).collect();
        Population {
            persons,
            visit_order,
        }
    }

    pub fn add_person(&mut self, person: Person) -> PersonId {
        let id = PersonId(self.persons.len());
        self.persons.push(person);
        self.visit_order.push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn get(&self, id: PersonId) -> Option<&Person> {
        self.persons.get(id.0)
    }

    pub fn get_mut(&mut self, id: PersonId) -> Option<&mut Person> {
        self.persons.get_mut(id.0)
    }

    /// Persons in storage order.
    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.persons.iter()
    }

    pub fn randomize_order<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.visit_order.shuffle(rng);
    }

    /// Visits every person sequentially in the current visit order.
    pub fn for_each<F>(&mut self, mut f: F)
    where
        F: FnMut(PersonId, &mut Person),
    {
        for &id in &self.visit_order {
            f(id, &mut self.persons[id.0]);
        }
    }

    /// Like [`Population::for_each`], but only for persons matching `predicate`. The predicate
    /// is checked right before each visit, so earlier visits can change who matches.
    pub fn for_each_matching<P, F>(&mut self, predicate: P, mut f: F)
    where
        P: Fn(&Person) -> bool,
        F: FnMut(PersonId, &mut Person),
    {
        for &id in &self.visit_order {
            let person = &mut self.persons[id.0];
            if predicate(person) {
                f(id, person);
            }
        }
    }

    /// Sequential visit that stops as soon as `f` returns `false`.
    pub fn for_each_until<F>(&mut self, mut f: F)
    where
        F: FnMut(PersonId, &mut Person) -> bool,
    {
        for &id in &self.visit_order {
            if !f(id, &mut self.persons[id.0]) {
                break;
            }
        }
    }

    pub fn par_for_each<F>(&mut self, f: F)
    where
        F: Fn(&mut Person) + Sync + Send,
    {
        self.persons.par_iter_mut().for_each(f);
    }

    pub fn par_for_each_matching<P, F>(&mut self, predicate: P, f: F)
    where
        P: Fn(&Person) -> bool + Sync + Send,
        F: Fn(&mut Person) + Sync + Send,
    {
        self.persons
            .par_iter_mut()
            .filter(|person| predicate(person))
            .for_each(f);
    }

    /// Parallel visit in which chunk `i` of the storage is processed with stream `i`.
    pub fn par_for_each_with_rng<F>(&mut self, rngs: &mut RngStreams, f: F)
    where
        F: Fn(&mut Person, &mut SmallRng) + Sync + Send,
    {
        let chunk = chunk_len(self.persons.len(), rngs.len());
        self.persons
            .par_chunks_mut(chunk)
            .zip(rngs.as_mut_slice().par_iter_mut())
            .for_each(|(persons, rng)| {
                for person in persons {
                    f(person, rng);
                }
            });
    }

    /// Number of persons per epidemic state, indexed by [`EpidemicState::index`].
    pub fn count_states(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for person in &self.persons {
            counts[person.state.index()] += 1;
        }
        counts
    }

    pub fn count_hospitalized(&self) -> usize {
        self.persons.iter().filter(|p| p.hospitalized).count()
    }

    pub fn count_demographies(&self) -> [usize; NUM_DEMOGRAPHIES] {
        let mut counts = [0; NUM_DEMOGRAPHIES];
        for person in &self.persons {
            counts[person.demography.index()] += 1;
        }
        counts
    }

    pub fn count_in_state(&self, state: EpidemicState) -> usize {
        self.count_states()[state.index()]
    }
}
