// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background polling of the frequently-changing motor fields.
//!
//! GUIs want motor positions on a fixed cadence without blocking their
//! render loop. [`MotorMonitor`] owns one background task that serializes
//! every mirror mutation behind a single `tokio::sync::Mutex` and publishes
//! immutable [`MotorSnapshot`]s through a `watch` channel. Readers never
//! touch the mirror concurrently with the poller; foreground code that
//! wants to command motors locks the same mutex.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::sync::Mutex;
//! use topas_lib::{ConnectionConfig, MotorMonitor, Topas};
//!
//! # async fn example() -> topas_lib::Result<()> {
//! let topas = Topas::connect(ConnectionConfig::new("127.0.0.1", "14187")).await?;
//! let topas = Arc::new(Mutex::new(topas));
//!
//! let monitor = MotorMonitor::spawn(Arc::clone(&topas), Duration::from_millis(250));
//! let mut positions = monitor.subscribe();
//!
//! positions.changed().await.ok();
//! for motor in positions.borrow().iter() {
//!     println!("{}: {}", motor.name(), motor.actual_position());
//! }
//!
//! // Foreground commands go through the same mutex.
//! topas.lock().await.move_motor("Delay 1", 1200).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::motor::{Motor, MotorRoster};
use crate::topas::Topas;
use crate::transport::Connection;

/// An immutable, name-ordered copy of the motor mirror at one poll instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotorSnapshot {
    motors: BTreeMap<String, Motor>,
}

impl MotorSnapshot {
    pub(crate) fn from_roster(roster: &MotorRoster) -> Self {
        Self {
            motors: roster
                .iter()
                .map(|m| (m.name().to_string(), m.clone()))
                .collect(),
        }
    }

    /// Returns the snapshot of the named motor.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Motor> {
        self.motors.get(name)
    }

    /// Iterates over the motors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Motor> {
        self.motors.values()
    }

    /// Returns the number of motors in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.motors.len()
    }

    /// Returns `true` if the snapshot is empty.
    ///
    /// The initial value of a fresh subscription is empty until the first
    /// poll completes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.motors.is_empty()
    }
}

/// Background poller for the motor mirror.
///
/// Spawned with a shared, mutex-guarded [`Topas`]; the polling task is the
/// only place that calls `refresh_dynamic` and it holds the mutex for the
/// duration of each refresh, so mirror mutation stays single-writer. Poll
/// failures are logged and the cadence continues; the task ends when every
/// snapshot receiver (including the monitor itself) is gone, or on
/// [`MotorMonitor::stop`].
#[derive(Debug)]
pub struct MotorMonitor {
    handle: JoinHandle<()>,
    rx: watch::Receiver<MotorSnapshot>,
}

impl MotorMonitor {
    /// Spawns the polling task with the given cadence.
    ///
    /// The first snapshot is published right away; subsequent ones follow
    /// every `period`.
    #[must_use]
    pub fn spawn(topas: Arc<Mutex<Topas<Connection>>>, period: Duration) -> Self {
        let (tx, rx) = watch::channel(MotorSnapshot::default());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let snapshot = {
                    let mut topas = topas.lock().await;
                    match topas.refresh_dynamic().await {
                        Ok(()) => MotorSnapshot::from_roster(topas.roster()),
                        Err(error) => {
                            tracing::warn!(%error, "motor poll failed");
                            continue;
                        }
                    }
                };

                if tx.send(snapshot).is_err() {
                    tracing::debug!("all snapshot receivers dropped, stopping poll");
                    break;
                }
            }
        });

        Self { handle, rx }
    }

    /// Creates a receiver for published snapshots.
    ///
    /// Receivers observe the latest snapshot only; intermediate ones may be
    /// skipped under load.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MotorSnapshot> {
        self.rx.clone()
    }

    /// Returns `true` if the polling task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the polling task.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::MotorEntry;

    fn entry(title: &str, index: u32) -> MotorEntry {
        MotorEntry {
            title: title.to_string(),
            index,
            actual_position: 10,
            target_position: 20,
            actual_position_in_units: 1.0,
            target_position_in_units: 2.0,
            unit_name: "mm".to_string(),
        }
    }

    #[test]
    fn snapshot_is_name_ordered() {
        let roster =
            MotorRoster::from_entries(vec![entry("Delay 2", 95), entry("Delay 1", 86)]);
        let snapshot = MotorSnapshot::from_roster(&roster);

        let names: Vec<&str> = snapshot.iter().map(Motor::name).collect();
        assert_eq!(names, vec!["Delay 1", "Delay 2"]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("Delay 1").unwrap().index(), 86);
    }

    #[test]
    fn default_snapshot_is_empty() {
        let snapshot = MotorSnapshot::default();
        assert!(snapshot.is_empty());
        assert!(snapshot.get("Delay 1").is_none());
    }
}
