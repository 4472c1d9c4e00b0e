//! Test-instance assembly.
//!
//! Packs each user's chronologically ordered observations into numbered test
//! slots. The n-th accepted observation of an exercise always lands in slot n
//! (Test n), so every exercise occupies a gap-free prefix of the slots.
//!
//! In constrained mode an observation is accepted only if it carries both
//! metrics and at least `min_days` whole days have passed since the last
//! accepted observation of the same exercise; rejected observations are
//! discarded, not deferred.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use log::debug;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::domain::{Exercise, Metric, Observation, Sex};

/// Display label of a zero-based slot index ("Test 1" for index 0).
pub fn test_label(index: usize) -> String {
    format!("Test {}", index + 1)
}

/// Raw values of one accepted observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub power: Option<f64>,
    pub acceleration: Option<f64>,
    pub recorded_at: NaiveDateTime,
}

impl Reading {
    fn from_observation(obs: &Observation) -> Self {
        Self {
            power: obs.power,
            acceleration: obs.acceleration,
            recorded_at: obs.timestamp,
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Power => self.power,
            Metric::Acceleration => self.acceleration,
        }
    }
}

/// One test instance: a reading slot for every exercise in the taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSlot {
    cells: [Option<Reading>; Exercise::COUNT],
}

impl TestSlot {
    fn empty() -> Self {
        Self {
            cells: [None; Exercise::COUNT],
        }
    }

    pub fn reading(&self, exercise: Exercise) -> Option<&Reading> {
        self.cells[exercise.index()].as_ref()
    }

    pub fn contains(&self, exercise: Exercise) -> bool {
        self.cells[exercise.index()].is_some()
    }

    pub fn value(&self, exercise: Exercise, metric: Metric) -> Option<f64> {
        self.reading(exercise).and_then(|r| r.metric(metric))
    }

    /// Exercises recorded in this slot, in taxonomy order.
    pub fn readings(&self) -> impl Iterator<Item = (Exercise, &Reading)> + '_ {
        Exercise::all().filter_map(|exercise| self.reading(exercise).map(|r| (exercise, r)))
    }

    /// Earliest timestamp among the slot's readings.
    pub fn started_at(&self) -> Option<NaiveDateTime> {
        self.readings().map(|(_, r)| r.recorded_at).min()
    }
}

impl Serialize for TestSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Exercise::COUNT))?;
        for exercise in Exercise::all() {
            map.serialize_entry(&exercise, &self.reading(exercise))?;
        }
        map.end()
    }
}

/// A user's test slots (Test 1, Test 2, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestInstanceMatrix {
    user: String,
    sex: Sex,
    slots: Vec<TestSlot>,
}

impl TestInstanceMatrix {
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn slots(&self) -> &[TestSlot] {
        &self.slots
    }

    /// Number of test instances.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_multi_test(&self) -> bool {
        self.slots.len() > 1
    }

    /// Raw value at a zero-based slot index.
    pub fn value(&self, slot: usize, exercise: Exercise, metric: Metric) -> Option<f64> {
        self.slots.get(slot).and_then(|s| s.value(exercise, metric))
    }

    /// Rows of raw values (one per taxonomy exercise) with one column per slot.
    pub fn metric_rows(&self, metric: Metric) -> Vec<(Exercise, Vec<Option<f64>>)> {
        Exercise::all()
            .map(|exercise| {
                let row = self.slots.iter().map(|s| s.value(exercise, metric)).collect();
                (exercise, row)
            })
            .collect()
    }

    /// Number of slots holding a reading for the exercise.
    pub fn occurrences(&self, exercise: Exercise) -> usize {
        self.slots.iter().filter(|s| s.contains(exercise)).count()
    }

    /// Elapsed days between the starts of consecutive slots.
    pub fn slot_intervals_days(&self) -> Vec<f64> {
        let starts: Vec<NaiveDateTime> = self.slots.iter().filter_map(TestSlot::started_at).collect();
        starts
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_seconds() as f64 / 86_400.0)
            .collect()
    }
}

/// How observations are admitted into slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyMode {
    /// Every observation is placed.
    Unconstrained,
    /// Repeats of an exercise must be at least this many whole days apart.
    MinimumDays(u32),
}

impl AssemblyMode {
    /// Zero days means no constraint.
    pub fn from_min_days(min_days: u32) -> Self {
        if min_days == 0 {
            AssemblyMode::Unconstrained
        } else {
            AssemblyMode::MinimumDays(min_days)
        }
    }
}

/// Packs observations into per-user test-instance matrices.
#[derive(Debug, Clone, Copy)]
pub struct TestInstanceAssembler {
    mode: AssemblyMode,
}

impl TestInstanceAssembler {
    pub fn new(mode: AssemblyMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> AssemblyMode {
        self.mode
    }

    /// Assembles a matrix for every user, keyed and ordered by user name.
    ///
    /// Users with no accepted observation are absent from the result.
    pub fn assemble(&self, observations: &[Observation]) -> BTreeMap<String, TestInstanceMatrix> {
        let mut by_user: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
        for obs in observations {
            by_user.entry(obs.user.as_str()).or_default().push(obs);
        }

        by_user
            .into_iter()
            .filter_map(|(user, user_obs)| {
                let matrix = self.assemble_user(user_obs);
                if matrix.is_none() {
                    debug!("User {} has no qualifying observations", user);
                }
                matrix.map(|m| (user.to_string(), m))
            })
            .collect()
    }

    /// Assembles one user's observations.
    ///
    /// Observations are processed by timestamp; equal timestamps keep input order.
    pub fn assemble_user(&self, mut observations: Vec<&Observation>) -> Option<TestInstanceMatrix> {
        let first = observations.first()?;
        let user = first.user.clone();
        let sex = first.sex;

        observations.sort_by_key(|obs| obs.timestamp);

        let mut slots: Vec<TestSlot> = Vec::new();
        // Next free slot per exercise; equals the exercise's placed count.
        let mut next_slot = [0usize; Exercise::COUNT];
        let mut last_accepted: [Option<NaiveDateTime>; Exercise::COUNT] = [None; Exercise::COUNT];

        for obs in observations {
            let idx = obs.exercise.index();

            if let AssemblyMode::MinimumDays(min_days) = self.mode {
                if !obs.has_both_metrics() {
                    debug!(
                        "{}: skipping {} at {} (missing metric)",
                        user, obs.exercise, obs.timestamp
                    );
                    continue;
                }
                if let Some(last) = last_accepted[idx]
                    && (obs.timestamp - last).num_days() < i64::from(min_days)
                {
                    debug!(
                        "{}: skipping {} at {} ({} days after previous test)",
                        user,
                        obs.exercise,
                        obs.timestamp,
                        (obs.timestamp - last).num_days()
                    );
                    continue;
                }
            }

            let slot = next_slot[idx];
            if slot == slots.len() {
                slots.push(TestSlot::empty());
            }
            slots[slot].cells[idx] = Some(Reading::from_observation(obs));
            next_slot[idx] += 1;
            last_accepted[idx] = Some(obs.timestamp);
        }

        if slots.is_empty() {
            return None;
        }

        Some(TestInstanceMatrix { user, sex, slots })
    }
}
