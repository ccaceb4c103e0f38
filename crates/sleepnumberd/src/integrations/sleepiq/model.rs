//! Device model for SleepIQ beds and sleepers.
//!
//! Beds and sleepers are created once per session by the device client and
//! refreshed in place on every poll. Entities hold `Arc` references and only
//! ever read; the client is the single writer. Reads go through a read-write
//! lock because the tokio runtime schedules readers and the refresh task on
//! different threads.

use std::sync::Arc;
use std::sync::RwLock;

use strum::Display;
use strum::EnumString;

/// Side of the bed a sleeper occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Sensor readings for one sleeper, replaced wholesale on every successful
/// refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SleeperReadings {
    pub in_bed: bool,
    pub sleep_number: u8,
    pub pressure: i32,
}

/// One occupant-tracking side of a bed. Identity is `(bed.id, side)`.
#[derive(Debug)]
pub struct Sleeper {
    pub side: Side,
    pub name: String,
    readings: RwLock<SleeperReadings>,
}

impl Sleeper {
    pub fn new(side: Side, name: String, readings: SleeperReadings) -> Self {
        Self {
            side,
            name,
            readings: RwLock::new(readings),
        }
    }

    /// Current readings snapshot.
    pub fn readings(&self) -> SleeperReadings {
        match self.readings.read() {
            Ok(readings) => readings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Live occupancy flag.
    pub fn in_bed(&self) -> bool {
        self.readings().in_bed
    }

    /// Replace the readings. Called by the device client only.
    pub fn set_readings(&self, readings: SleeperReadings) {
        match self.readings.write() {
            Ok(mut guard) => *guard = readings,
            Err(poisoned) => *poisoned.into_inner() = readings,
        }
    }
}

/// A physical smart-mattress unit tracked by the cloud device service.
#[derive(Debug)]
pub struct Bed {
    /// Opaque identity token from the cloud service
    pub id: String,
    pub name: String,
    pub mac_addr: String,
    pub model: String,

    /// Ordered sleepers, deduplicated upstream
    pub sleepers: Vec<Arc<Sleeper>>,
}
