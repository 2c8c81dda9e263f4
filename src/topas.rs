// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device state mirror.
//!
//! [`Topas`] keeps a local mirror of the instrument's motor roster and
//! preset registry and funnels every remote operation through one
//! [`Transport`]. Reads of the mirror are pure; the network round-trips are
//! the explicit `refresh_*` / `load_*` calls. No operation retries, and
//! multi-step operations are non-transactional: a mid-sequence failure
//! leaves the instrument partially commanded and the caller reconciles with
//! a fresh refresh.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{Error, Result, TransportError};
use crate::motor::MotorRoster;
use crate::preset::PositionPreset;
use crate::transport::{Connection, ConnectionConfig, Transport};
use crate::wire::{DynamicEntry, MotorList, PresetEntry, SaveRequest};

mod paths {
    pub const ALL_PROPERTIES: &str = "/Motors/AllProperties";
    pub const CHANGING: &str = "/Motors/PropertiesThatChangeOften";
    pub const POSITIONS: &str = "/Positions";
    pub const SAVE_CURRENT: &str = "/SaveCurrent";
    pub const MOVE_TO_POSITION: &str = "/MoveMotorsToPosition";
    pub const IS_SHUTTER_OPEN: &str = "/ShutterInterlock/IsShutterOpen";
    pub const OPEN_CLOSE_SHUTTER: &str = "/ShutterInterlock/OpenCloseShutter";
    pub const CALLER_HAS_ACCESS: &str = "/CallerHasAccess";
}

fn decode<D: DeserializeOwned>(path: &str, value: Value) -> Result<D> {
    serde_json::from_value(value).map_err(|source| {
        Error::Transport(TransportError::Json {
            path: path.to_string(),
            source,
        })
    })
}

/// Local mirror of a Topas instrument.
///
/// Construction is eager: the full roster and the preset list are fetched
/// before the value is handed to the caller, so every mirror read is
/// meaningful from the start. The mirror then lives as long as the session;
/// there is no teardown.
///
/// # Examples
///
/// ```no_run
/// use topas_lib::{ConnectionConfig, Topas};
///
/// # async fn example() -> topas_lib::Result<()> {
/// let mut topas = Topas::connect(ConnectionConfig::new("127.0.0.1", "14187")).await?;
///
/// topas.refresh_dynamic().await?;
/// for (name, position) in topas.actual_positions() {
///     println!("{name}: {position}");
/// }
///
/// topas.move_motor("Delay 1", 1200).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Topas<T: Transport> {
    transport: T,
    roster: MotorRoster,
    presets: HashMap<Uuid, PositionPreset>,
}

impl Topas<Connection> {
    /// Connects to the instrument and performs the initial roster and
    /// preset fetch.
    ///
    /// # Errors
    ///
    /// Returns error if the connection cannot be created or either initial
    /// fetch fails.
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        let transport = config.into_connection().map_err(Error::Transport)?;
        Self::with_transport(transport).await
    }
}

impl<T: Transport> Topas<T> {
    /// Builds a mirror over an existing transport, performing the initial
    /// roster and preset fetch.
    ///
    /// # Errors
    ///
    /// Returns error if either initial fetch fails.
    pub async fn with_transport(transport: T) -> Result<Self> {
        let mut topas = Self {
            transport,
            roster: MotorRoster::default(),
            presets: HashMap::new(),
        };
        topas.refresh_roster().await?;
        topas.load_presets().await?;
        Ok(topas)
    }

    /// Returns the motor roster.
    #[must_use]
    pub fn roster(&self) -> &MotorRoster {
        &self.roster
    }

    /// Reloads the full motor roster, replacing the mirror wholesale.
    ///
    /// Both lookup paths (name and index) are rebuilt together from the
    /// fresh payload.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on any network or decoding failure.
    pub async fn refresh_roster(&mut self) -> Result<()> {
        let value = self.transport.get(paths::ALL_PROPERTIES).await?;
        let list: MotorList = decode(paths::ALL_PROPERTIES, value)?;
        self.roster = MotorRoster::from_entries(list.motors);
        tracing::debug!(motors = self.roster.len(), "motor roster reloaded");
        Ok(())
    }

    /// Fetches the frequently-changing motor fields and applies them to the
    /// mirror in place.
    ///
    /// This is the hot path for polling: it never rebuilds motor records,
    /// only overwrites their four position fields, so references into the
    /// roster stay meaningful across refreshes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LookupError::UnknownIndex`] if the payload carries
    /// an index the roster does not know; the roster is stale, so reload it
    /// with [`Topas::refresh_roster`] and retry. Earlier entries of the
    /// payload stay applied.
    pub async fn refresh_dynamic(&mut self) -> Result<()> {
        let value = self.transport.get(paths::CHANGING).await?;
        let entries: Vec<DynamicEntry> = decode(paths::CHANGING, value)?;
        for entry in &entries {
            self.roster.apply_dynamic(entry)?;
        }
        Ok(())
    }

    /// Returns a name → actual position snapshot of the mirror.
    ///
    /// Pure read; call [`Topas::refresh_dynamic`] first for fresh values.
    #[must_use]
    pub fn actual_positions(&self) -> HashMap<String, i32> {
        self.roster
            .iter()
            .map(|m| (m.name().to_string(), m.actual_position()))
            .collect()
    }

    /// Returns a name → target position snapshot of the mirror.
    ///
    /// Pure read; call [`Topas::refresh_dynamic`] first for fresh values.
    #[must_use]
    pub fn target_positions(&self) -> HashMap<String, i32> {
        self.roster
            .iter()
            .map(|m| (m.name().to_string(), m.target_position()))
            .collect()
    }

    /// Commands one motor to a raw target position.
    ///
    /// Fire-and-forget: the call does not wait for the move and does not
    /// touch the mirror; observe the effect with
    /// [`Topas::refresh_dynamic`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::LookupError::UnknownMotor`], without issuing any
    /// network call, if the name is not in the roster, or
    /// [`TransportError`] if the command cannot be sent.
    pub async fn move_motor(&self, name: &str, position: i32) -> Result<()> {
        let index = self.roster.index_of(name)?;
        let path = format!("/TargetPosition?id={index}");
        tracing::debug!(motor = name, index, position, "move motor");
        self.transport.put(&path, json!(position)).await?;
        Ok(())
    }

    /// Commands several motors, one [`Topas::move_motor`] per entry in
    /// iteration order.
    ///
    /// Not atomic: the sequence stops at the first failure, leaving earlier
    /// motors commanded and later ones not. Rollback is the caller's
    /// responsibility.
    ///
    /// # Errors
    ///
    /// Returns the first per-motor error.
    pub async fn move_motors<S, I>(&self, positions: I) -> Result<()>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, i32)>,
    {
        for (name, position) in positions {
            self.move_motor(name.as_ref(), position).await?;
        }
        Ok(())
    }

    /// Saves the instrument's current motor positions as a named preset and
    /// returns the server-issued identifier.
    ///
    /// The preset list is reloaded before returning, so the new preset is
    /// immediately visible in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the save or the follow-up reload
    /// fails; a failed reload leaves the save in effect on the instrument.
    pub async fn save_position(&mut self, name: &str, folder: &str) -> Result<Uuid> {
        let body = SaveRequest {
            name: name.to_string(),
            folder: folder.to_string(),
        };
        let body = serde_json::to_value(&body).map_err(|source| TransportError::Json {
            path: paths::SAVE_CURRENT.to_string(),
            source,
        })?;

        let response = self.transport.post(paths::SAVE_CURRENT, body).await?;
        let guid = parse_guid(&response)?;

        tracing::debug!(%guid, name, folder, "saved position preset");

        self.load_presets().await?;
        Ok(guid)
    }

    /// Reloads the preset registry, replacing it wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on any network or decoding failure.
    pub async fn load_presets(&mut self) -> Result<()> {
        let value = self.transport.get(paths::POSITIONS).await?;
        let entries: Vec<PresetEntry> = decode(paths::POSITIONS, value)?;
        self.presets = entries
            .into_iter()
            .map(|entry| {
                let preset = PositionPreset::from(entry);
                (preset.guid(), preset)
            })
            .collect();
        tracing::debug!(presets = self.presets.len(), "preset registry reloaded");
        Ok(())
    }

    /// Iterates over the preset registry.
    ///
    /// Iteration order is unspecified; presets are keyed by GUID.
    pub fn presets(&self) -> impl Iterator<Item = &PositionPreset> {
        self.presets.values()
    }

    /// Looks up a preset by its server-assigned identifier.
    #[must_use]
    pub fn preset_by_id(&self, guid: Uuid) -> Option<&PositionPreset> {
        self.presets.get(&guid)
    }

    /// Finds a preset by name.
    ///
    /// Preset names are not unique; with duplicates, which one is returned
    /// is unspecified.
    #[must_use]
    pub fn find_preset(&self, name: &str) -> Option<&PositionPreset> {
        self.presets.values().find(|p| p.name() == name)
    }

    /// Moves the motors to the preset with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PresetNotFound`] if no preset carries this name,
    /// or [`TransportError`] if the command cannot be sent.
    pub async fn goto_preset_by_name(&self, name: &str) -> Result<()> {
        let preset = self
            .find_preset(name)
            .ok_or_else(|| Error::PresetNotFound(name.to_string()))?;
        self.goto_preset_by_id(preset.guid()).await
    }

    /// Moves the motors to the preset with the given identifier.
    ///
    /// Fire-and-forget: the instrument drives the motors; observe the
    /// movement with [`Topas::refresh_dynamic`].
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the command cannot be sent.
    pub async fn goto_preset_by_id(&self, guid: Uuid) -> Result<()> {
        tracing::debug!(%guid, "move motors to preset");
        self.transport
            .put(paths::MOVE_TO_POSITION, json!(guid))
            .await?;
        Ok(())
    }

    /// Queries the shutter interlock state. Not cached locally.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on any network or decoding failure.
    pub async fn is_shutter_open(&self) -> Result<bool> {
        let value = self.transport.get(paths::IS_SHUTTER_OPEN).await?;
        decode(paths::IS_SHUTTER_OPEN, value)
    }

    /// Opens or closes the shutter.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the command cannot be sent.
    pub async fn set_shutter_open(&self, open: bool) -> Result<()> {
        self.transport
            .put(paths::OPEN_CLOSE_SHUTTER, json!(open))
            .await?;
        Ok(())
    }

    /// Queries whether this caller is authenticated with the instrument.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on any network or decoding failure.
    pub async fn is_authenticated(&self) -> Result<bool> {
        let value = self.transport.get(paths::CALLER_HAS_ACCESS).await?;
        decode(paths::CALLER_HAS_ACCESS, value)
    }
}

/// Parses the GUID the firmware returns from `POST /SaveCurrent`.
///
/// The body is a JSON-encoded string; a bare unquoted GUID is accepted too.
fn parse_guid(response: &str) -> Result<Uuid> {
    let trimmed = response.trim();
    serde_json::from_str(trimmed)
        .or_else(|_| serde_json::from_value(Value::String(trimmed.to_string())))
        .map_err(|source| {
            Error::Transport(TransportError::Json {
                path: paths::SAVE_CURRENT.to_string(),
                source,
            })
        })
}
