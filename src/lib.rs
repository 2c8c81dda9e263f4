// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `topas_lib` - A Rust library to control Topas optical parametric
//! amplifiers.
//!
//! This library talks to the WinTopas REST server that ships with Light
//! Conversion Topas/Orpheus instruments and keeps a local mirror of the
//! device state: the motor roster with its positions, and the saved
//! position presets.
//!
//! # Supported Features
//!
//! - **Motor control**: move single motors or batches to raw target
//!   positions
//! - **State mirroring**: full roster reload plus a cheap refresh of the
//!   frequently-changing position fields
//! - **Position presets**: list, save, and restore named multi-motor
//!   snapshots
//! - **Shutter interlock**: query and toggle the shutter, check caller
//!   authentication
//! - **Background polling**: a single-writer monitor task publishing
//!   immutable position snapshots
//!
//! # Quick Start
//!
//! ```no_run
//! use topas_lib::{ConnectionConfig, Topas};
//!
//! #[tokio::main]
//! async fn main() -> topas_lib::Result<()> {
//!     // Construction eagerly loads the motor roster and preset list.
//!     let mut topas = Topas::connect(ConnectionConfig::new("127.0.0.1", "14187")).await?;
//!
//!     // Refresh the volatile fields, then read the mirror.
//!     topas.refresh_dynamic().await?;
//!     for (name, position) in topas.actual_positions() {
//!         println!("{name}: {position}");
//!     }
//!
//!     // Command a motor; the mirror catches up on the next refresh.
//!     topas.move_motor("Delay 1", 1200).await?;
//!
//!     // Restore a saved alignment.
//!     topas.goto_preset_by_name("signal 1300nm").await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Reads Are Pure, Refreshes Are Explicit
//!
//! Accessors like [`Topas::actual_positions`] never touch the network; the
//! blocking round-trips are the explicit [`Topas::refresh_roster`],
//! [`Topas::refresh_dynamic`], and [`Topas::load_presets`] calls. Poll
//! `refresh_dynamic` for fresh positions; it updates motor records in
//! place and never rebuilds the roster.
//!
//! # Background Polling
//!
//! For GUIs, [`MotorMonitor`] owns the polling loop: it serializes all
//! mirror mutation behind one mutex and publishes immutable
//! [`MotorSnapshot`]s through a `watch` channel. See the [`monitor`]
//! module docs for an example.

pub mod error;
pub mod monitor;
mod motor;
mod preset;
mod topas;
pub mod transport;
pub mod wire;

pub use error::{Error, LookupError, Result, TransportError};
pub use monitor::{MotorMonitor, MotorSnapshot};
pub use motor::{Motor, MotorRoster};
pub use preset::PositionPreset;
pub use topas::Topas;
pub use transport::{Connection, ConnectionConfig, Transport};
