// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Saved multi-motor position presets.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use uuid::Uuid;

use crate::wire::PresetEntry;

/// A named snapshot of motor target positions stored on the instrument.
///
/// Presets are created server-side (`save_position`) and identified by a
/// server-assigned GUID; the name is user-chosen and not unique. The
/// creation timestamp is kept verbatim in the firmware's `/Date(...)/`
/// encoding, with [`PositionPreset::created_at`] as a decoded convenience
/// view.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionPreset {
    name: String,
    comment: String,
    folder: String,
    guid: Uuid,
    positions: Vec<(u32, i32)>,
    time_created: String,
}

impl PositionPreset {
    /// Returns the user-chosen preset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the free-text comment.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Returns the folder the preset is filed under.
    #[must_use]
    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Returns the server-assigned unique identifier.
    #[must_use]
    pub fn guid(&self) -> Uuid {
        self.guid
    }

    /// Returns the `(motor index, target position)` pairs in payload order.
    #[must_use]
    pub fn positions(&self) -> &[(u32, i32)] {
        &self.positions
    }

    /// Returns the raw creation timestamp as sent by the firmware.
    #[must_use]
    pub fn time_created(&self) -> &str {
        &self.time_created
    }

    /// Decodes the creation timestamp.
    ///
    /// The firmware uses the legacy .NET JSON encoding
    /// `/Date(<millis since epoch><±HHMM offset>)/`, e.g.
    /// `/Date(1500038173392+0300)/`. Returns `None` if the string does not
    /// follow that shape.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        parse_net_date(&self.time_created)
    }
}

impl From<PresetEntry> for PositionPreset {
    fn from(entry: PresetEntry) -> Self {
        Self {
            name: entry.name,
            comment: entry.comment,
            folder: entry.folder,
            guid: entry.guid,
            positions: entry
                .motor_positions
                .iter()
                .map(|kv| (kv.key, kv.value))
                .collect(),
            time_created: entry.time_created,
        }
    }
}

/// Parses the legacy .NET `/Date(ms±HHMM)/` JSON date encoding.
///
/// The offset part is optional; without it the instant is reported in UTC.
fn parse_net_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let inner = raw.strip_prefix("/Date(")?.strip_suffix(")/")?;
    if inner.is_empty() {
        return None;
    }

    // A sign after the first character starts the zone offset, not a
    // negative epoch. Search on char boundaries; the payload is not
    // guaranteed to be ASCII.
    let split = inner
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '+' || c == '-')
        .map_or(inner.len(), |(pos, _)| pos);
    let (millis_part, offset_part) = inner.split_at(split);

    let millis: i64 = millis_part.parse().ok()?;

    let offset_secs = if offset_part.is_empty() {
        0
    } else {
        let (sign, hhmm) = offset_part.split_at(1);
        if hhmm.len() != 4 || !hhmm.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hours: i32 = hhmm[..2].parse().ok()?;
        let minutes: i32 = hhmm[2..].parse().ok()?;
        let secs = hours * 3600 + minutes * 60;
        if sign == "-" { -secs } else { secs }
    };

    let offset = FixedOffset::east_opt(offset_secs)?;
    let utc = Utc.timestamp_millis_opt(millis).single()?;
    Some(utc.with_timezone(&offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::KeyValue;

    fn sample_entry() -> PresetEntry {
        PresetEntry {
            name: "signal 1300nm".to_string(),
            comment: "after realignment".to_string(),
            folder: "daily".to_string(),
            guid: "bdd385a8-15fc-40c4-ba00-62b2aa95deef".parse().unwrap(),
            motor_positions: vec![
                KeyValue { key: 65, value: 76 },
                KeyValue {
                    key: 105,
                    value: 230,
                },
            ],
            time_created: "/Date(1500038173392+0300)/".to_string(),
        }
    }

    #[test]
    fn preset_from_entry() {
        let preset = PositionPreset::from(sample_entry());
        assert_eq!(preset.name(), "signal 1300nm");
        assert_eq!(preset.comment(), "after realignment");
        assert_eq!(preset.folder(), "daily");
        assert_eq!(
            preset.guid(),
            "bdd385a8-15fc-40c4-ba00-62b2aa95deef".parse::<Uuid>().unwrap()
        );
        assert_eq!(preset.positions(), &[(65, 76), (105, 230)]);
        assert_eq!(preset.time_created(), "/Date(1500038173392+0300)/");
    }

    #[test]
    fn created_at_decodes_positive_offset() {
        let preset = PositionPreset::from(sample_entry());
        let dt = preset.created_at().unwrap();
        assert_eq!(dt.timestamp_millis(), 1_500_038_173_392);
        assert_eq!(dt.offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn net_date_negative_offset() {
        let dt = parse_net_date("/Date(1500038173392-0430)/").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_500_038_173_392);
        assert_eq!(dt.offset().local_minus_utc(), -(4 * 3600 + 30 * 60));
    }

    #[test]
    fn net_date_without_offset_is_utc() {
        let dt = parse_net_date("/Date(0)/").unwrap();
        assert_eq!(dt.timestamp_millis(), 0);
        assert_eq!(dt.offset().local_minus_utc(), 0);
    }

    #[test]
    fn net_date_malformed_is_none() {
        assert!(parse_net_date("2017-07-14T13:56:13Z").is_none());
        assert!(parse_net_date("/Date()/").is_none());
        assert!(parse_net_date("/Date(abc+0300)/").is_none());
        assert!(parse_net_date("/Date(1500038173392+03)/").is_none());
    }

    #[test]
    fn net_date_non_ascii_is_none() {
        assert!(parse_net_date("/Date(é+0300)/").is_none());
        assert!(parse_net_date("/Date(150003é173392+0300)/").is_none());
        assert!(parse_net_date("/Date(1500038173392+03é)/").is_none());
        assert!(parse_net_date("/Date(1500038173392±0300)/").is_none());
    }

    #[test]
    fn created_at_non_ascii_timestamp_is_none() {
        let mut entry = sample_entry();
        entry.time_created = "/Date(é+0300)/".to_string();
        assert!(PositionPreset::from(entry).created_at().is_none());
    }
}
