// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Motor records and the indexed roster that owns them.

use std::collections::HashMap;

use crate::error::LookupError;
use crate::wire::{DynamicEntry, MotorEntry};

/// Local mirror of one instrument motor.
///
/// Identified by a human-readable name and an instrument-assigned numeric
/// index; the two namespaces are independent and each is unique within a
/// roster. The four position fields are the "dynamic" fields: they are the
/// only ones overwritten by [`MotorRoster::apply_dynamic`], while the name,
/// index, and unit name stay fixed until a full roster reload.
#[derive(Debug, Clone, PartialEq)]
pub struct Motor {
    name: String,
    index: u32,
    actual_position: i32,
    target_position: i32,
    actual_position_in_units: f64,
    target_position_in_units: f64,
    unit_name: String,
}

impl Motor {
    /// Returns the motor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the instrument-assigned motor index.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the actual position in raw device units.
    #[must_use]
    pub fn actual_position(&self) -> i32 {
        self.actual_position
    }

    /// Returns the target position in raw device units.
    #[must_use]
    pub fn target_position(&self) -> i32 {
        self.target_position
    }

    /// Returns the actual position in physical units.
    #[must_use]
    pub fn actual_position_in_units(&self) -> f64 {
        self.actual_position_in_units
    }

    /// Returns the target position in physical units.
    #[must_use]
    pub fn target_position_in_units(&self) -> f64 {
        self.target_position_in_units
    }

    /// Returns the name of the physical unit.
    #[must_use]
    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    /// Overwrites the four dynamic fields from a partial update.
    fn apply_dynamic(&mut self, entry: &DynamicEntry) {
        self.actual_position = entry.actual_position;
        self.target_position = entry.target_position;
        self.actual_position_in_units = entry.actual_position_in_units;
        self.target_position_in_units = entry.target_position_in_units;
    }
}

impl From<MotorEntry> for Motor {
    fn from(entry: MotorEntry) -> Self {
        Self {
            name: entry.title,
            index: entry.index,
            actual_position: entry.actual_position,
            target_position: entry.target_position,
            actual_position_in_units: entry.actual_position_in_units,
            target_position_in_units: entry.target_position_in_units,
            unit_name: entry.unit_name,
        }
    }
}

/// The motor roster with its two lookup paths.
///
/// Motors live in one slot-indexed store; the name map and the index map
/// both resolve into it, so a lookup by name and a lookup by the motor's
/// index always reach the same record. Both maps are rebuilt together and
/// only by a full reload ([`MotorRoster::from_entries`]); dynamic refreshes
/// mutate records in place and never change the record set.
///
/// Duplicate indices in a roster payload are undefined behavior upstream
/// and are not validated here; the last entry wins.
#[derive(Debug, Clone, Default)]
pub struct MotorRoster {
    motors: Vec<Motor>,
    by_name: HashMap<String, usize>,
    by_index: HashMap<u32, usize>,
}

impl MotorRoster {
    /// Builds a roster from a full-properties payload, replacing any prior
    /// contents wholesale.
    #[must_use]
    pub fn from_entries(entries: Vec<MotorEntry>) -> Self {
        let motors: Vec<Motor> = entries.into_iter().map(Motor::from).collect();
        let by_name = motors
            .iter()
            .enumerate()
            .map(|(slot, m)| (m.name.clone(), slot))
            .collect();
        let by_index = motors
            .iter()
            .enumerate()
            .map(|(slot, m)| (m.index, slot))
            .collect();
        Self {
            motors,
            by_name,
            by_index,
        }
    }

    /// Returns the number of motors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.motors.len()
    }

    /// Returns `true` if the roster holds no motors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.motors.is_empty()
    }

    /// Looks up a motor by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Motor> {
        self.by_name.get(name).map(|&slot| &self.motors[slot])
    }

    /// Looks up a motor by instrument-assigned index.
    #[must_use]
    pub fn by_index(&self, index: u32) -> Option<&Motor> {
        self.by_index.get(&index).map(|&slot| &self.motors[slot])
    }

    /// Resolves a motor name to its instrument-assigned index.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownMotor`] if no motor has this name.
    pub fn index_of(&self, name: &str) -> Result<u32, LookupError> {
        self.by_name(name)
            .map(Motor::index)
            .ok_or_else(|| LookupError::UnknownMotor(name.to_string()))
    }

    /// Iterates over all motors in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &Motor> {
        self.motors.iter()
    }

    /// Overwrites the four dynamic fields of the motor carrying the entry's
    /// index. All other fields, the record set, and record identity are
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownIndex`] if the index is not in the
    /// roster, typically a sign that the roster is stale and needs a full
    /// reload.
    pub fn apply_dynamic(&mut self, entry: &DynamicEntry) -> Result<(), LookupError> {
        let slot = *self
            .by_index
            .get(&entry.index)
            .ok_or(LookupError::UnknownIndex(entry.index))?;
        self.motors[slot].apply_dynamic(entry);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a MotorRoster {
    type Item = &'a Motor;
    type IntoIter = std::slice::Iter<'a, Motor>;

    fn into_iter(self) -> Self::IntoIter {
        self.motors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, index: u32, actual: i32, target: i32) -> MotorEntry {
        MotorEntry {
            title: title.to_string(),
            index,
            actual_position: actual,
            target_position: target,
            actual_position_in_units: f64::from(actual) / 10.0,
            target_position_in_units: f64::from(target) / 10.0,
            unit_name: "nm".to_string(),
        }
    }

    fn sample_roster() -> MotorRoster {
        MotorRoster::from_entries(vec![
            entry("Delay 1", 86, 19, 89),
            entry("Crystal 1", 95, 47, 19),
        ])
    }

    #[test]
    fn motor_from_entry_round_trips() {
        let e = entry("Delay 1", 86, 19, 89);
        let motor = Motor::from(e.clone());
        assert_eq!(motor.name(), e.title);
        assert_eq!(motor.index(), e.index);
        assert_eq!(motor.actual_position(), e.actual_position);
        assert_eq!(motor.target_position(), e.target_position);
        assert!(
            (motor.actual_position_in_units() - e.actual_position_in_units).abs() < f64::EPSILON
        );
        assert!(
            (motor.target_position_in_units() - e.target_position_in_units).abs() < f64::EPSILON
        );
        assert_eq!(motor.unit_name(), e.unit_name);
    }

    #[test]
    fn both_lookup_paths_reach_the_same_records() {
        let roster = sample_roster();
        assert_eq!(roster.len(), 2);

        for motor in &roster {
            let via_name = roster.by_name(motor.name()).unwrap();
            let via_index = roster.by_index(motor.index()).unwrap();
            assert!(std::ptr::eq(via_name, via_index));
        }
    }

    #[test]
    fn apply_dynamic_updates_only_dynamic_fields() {
        let mut roster = sample_roster();
        let update = DynamicEntry {
            index: 86,
            actual_position: 75,
            target_position: 69,
            actual_position_in_units: 7.5,
            target_position_in_units: 6.9,
        };

        roster.apply_dynamic(&update).unwrap();

        assert_eq!(roster.len(), 2);

        let updated = roster.by_index(86).unwrap();
        assert_eq!(updated.name(), "Delay 1");
        assert_eq!(updated.unit_name(), "nm");
        assert_eq!(updated.actual_position(), 75);
        assert_eq!(updated.target_position(), 69);
        assert!((updated.actual_position_in_units() - 7.5).abs() < f64::EPSILON);
        assert!((updated.target_position_in_units() - 6.9).abs() < f64::EPSILON);

        // The other motor is untouched.
        let other = roster.by_index(95).unwrap();
        assert_eq!(other.actual_position(), 47);
        assert_eq!(other.target_position(), 19);
    }

    #[test]
    fn apply_dynamic_unknown_index_fails() {
        let mut roster = sample_roster();
        let update = DynamicEntry {
            index: 38,
            actual_position: 0,
            target_position: 0,
            actual_position_in_units: 0.0,
            target_position_in_units: 0.0,
        };

        let err = roster.apply_dynamic(&update).unwrap_err();
        assert_eq!(err, LookupError::UnknownIndex(38));
    }

    #[test]
    fn index_of_unknown_name_fails() {
        let roster = sample_roster();
        assert_eq!(roster.index_of("Delay 1").unwrap(), 86);
        assert_eq!(
            roster.index_of("Delay 9").unwrap_err(),
            LookupError::UnknownMotor("Delay 9".to_string())
        );
    }

    #[test]
    fn from_entries_replaces_wholesale() {
        let roster = sample_roster();
        let reloaded = MotorRoster::from_entries(vec![entry("Mixer", 12, 1, 2)]);
        assert_eq!(roster.len(), 2);
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.by_name("Delay 1").is_none());
        assert!(reloaded.by_index(12).is_some());
    }
}
