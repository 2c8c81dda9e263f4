// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire payloads of the WinTopas public API.
//!
//! The REST payloads are dictated by the instrument firmware and carry far
//! more fields than the mirror tracks (switch states, forbidden ranges,
//! super-unit calculators, ...). The structs here name only the fields the
//! library uses; everything else is deliberately ignored during
//! deserialization.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response of `GET /Motors/AllProperties`.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorList {
    /// The full motor roster.
    #[serde(rename = "Motors")]
    pub motors: Vec<MotorEntry>,
}

/// One motor record in the full-roster payload.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorEntry {
    /// Human-readable motor name, unique within the instrument.
    #[serde(rename = "Title")]
    pub title: String,
    /// Instrument-assigned motor index, unique within the instrument.
    #[serde(rename = "Index")]
    pub index: u32,
    /// Actual position in raw device units.
    #[serde(rename = "ActualPosition")]
    pub actual_position: i32,
    /// Target position in raw device units.
    #[serde(rename = "TargetPosition")]
    pub target_position: i32,
    /// Actual position in physical units.
    #[serde(rename = "ActualPositionInUnits")]
    pub actual_position_in_units: f64,
    /// Target position in physical units.
    #[serde(rename = "TargetPositionInUnits")]
    pub target_position_in_units: f64,
    /// Name of the physical unit (e.g. `"nm"`).
    #[serde(rename = "UnitName")]
    pub unit_name: String,
}

/// One entry of `GET /Motors/PropertiesThatChangeOften`.
///
/// Carries only the fields the firmware considers volatile; everything else
/// must be taken from the roster record with the same index.
#[derive(Debug, Clone, Deserialize)]
pub struct DynamicEntry {
    /// Instrument-assigned motor index.
    #[serde(rename = "Index")]
    pub index: u32,
    /// Actual position in raw device units.
    #[serde(rename = "ActualPosition")]
    pub actual_position: i32,
    /// Target position in raw device units.
    #[serde(rename = "TargetPosition")]
    pub target_position: i32,
    /// Actual position in physical units.
    #[serde(rename = "ActualPositionInUnits")]
    pub actual_position_in_units: f64,
    /// Target position in physical units.
    #[serde(rename = "TargetPositionInUnits")]
    pub target_position_in_units: f64,
}

/// One entry of `GET /Positions`.
#[derive(Debug, Clone, Deserialize)]
pub struct PresetEntry {
    /// User-chosen preset name; not unique.
    #[serde(rename = "Name")]
    pub name: String,
    /// Free-text comment.
    #[serde(rename = "Comment")]
    pub comment: String,
    /// Folder the preset is filed under.
    #[serde(rename = "Folder")]
    pub folder: String,
    /// Server-assigned unique identifier.
    #[serde(rename = "GUID")]
    pub guid: Uuid,
    /// Target position per motor index.
    #[serde(rename = "MotorPositions")]
    pub motor_positions: Vec<KeyValue>,
    /// Creation timestamp in the firmware's `/Date(ms+offset)/` encoding.
    #[serde(rename = "TimeCreated")]
    pub time_created: String,
}

/// A `(motor index, target position)` pair in a preset payload.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct KeyValue {
    /// Motor index.
    #[serde(rename = "Key")]
    pub key: u32,
    /// Target position in raw device units.
    #[serde(rename = "Value")]
    pub value: i32,
}

/// Body of `POST /SaveCurrent`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveRequest {
    /// Name for the new preset.
    #[serde(rename = "Name")]
    pub name: String,
    /// Folder for the new preset.
    #[serde(rename = "Folder")]
    pub folder: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motor_entry_ignores_extra_fields() {
        let json = r#"{
            "Acceleration": 25,
            "ActualPosition": 19,
            "ActualPositionInUnits": 0,
            "Current": 34,
            "Index": 86,
            "IsHoming": false,
            "TargetPosition": 89,
            "TargetPositionInUnits": 0,
            "Title": "Delay 1",
            "UnitName": "year",
            "ZeroOffset": 5
        }"#;
        let entry: MotorEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.title, "Delay 1");
        assert_eq!(entry.index, 86);
        assert_eq!(entry.actual_position, 19);
        assert_eq!(entry.target_position, 89);
        assert_eq!(entry.unit_name, "year");
    }

    #[test]
    fn dynamic_entry_parses() {
        let json = r#"{
            "ActualPosition": 75,
            "ActualPositionInUnits": 0.5,
            "Index": 38,
            "IsLeftSwitchPressed": false,
            "TargetPosition": 69,
            "TargetPositionInUnits": 0.25
        }"#;
        let entry: DynamicEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.index, 38);
        assert_eq!(entry.actual_position, 75);
        assert_eq!(entry.target_position, 69);
        assert!((entry.actual_position_in_units - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn preset_entry_parses() {
        let json = r#"{
            "Comment": "idler",
            "Folder": "daily",
            "GUID": "bdd385a8-15fc-40c4-ba00-62b2aa95deef",
            "MotorPositions": [
                {"Key": 65, "Value": 76},
                {"Key": 105, "Value": 230}
            ],
            "Name": "signal 1300nm",
            "TimeCreated": "\/Date(1500038173392+0300)\/"
        }"#;
        let entry: PresetEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.name, "signal 1300nm");
        assert_eq!(
            entry.guid,
            "bdd385a8-15fc-40c4-ba00-62b2aa95deef".parse::<Uuid>().unwrap()
        );
        assert_eq!(entry.motor_positions.len(), 2);
        assert_eq!(entry.motor_positions[1].key, 105);
        assert_eq!(entry.motor_positions[1].value, 230);
        assert_eq!(entry.time_created, "/Date(1500038173392+0300)/");
    }

    #[test]
    fn save_request_serializes_pascal_case() {
        let body = SaveRequest {
            name: "overnight".to_string(),
            folder: "scans".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"Name": "overnight", "Folder": "scans"}));
    }
}
