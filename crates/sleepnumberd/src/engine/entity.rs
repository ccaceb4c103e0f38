use serde::Deserialize;
use serde::Serialize;
use strum::Display;
use strum::EnumString;

use super::device::DeviceInfo;

/// Entity abstraction for sleepnumberd
///
/// All entities (occupancy sensors, numeric sensors, etc.) implement the
/// Entity trait.
pub trait Entity: Send + Sync {
    /// Serialize current state to JSON for Engine storage
    fn state_json(&self) -> serde_json::Value;

    /// Return the platform type of this entity (e.g. "binary_sensor", "sensor")
    fn platform(&self) -> &'static str;

    /// Globally unique identifier for this entity
    fn unique_id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Descriptor used to group entities under one physical device.
    /// Default implementation returns no device.
    fn device_info(&self) -> Option<&DeviceInfo> {
        None
    }

    /// Whether this entity initiates its own refresh. Coordinator-driven
    /// entities never poll.
    fn should_poll(&self) -> bool {
        false
    }
}

/// Device class for binary sensors, matching Home Assistant's binary_sensor
/// device classes.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BinarySensorDeviceClass {
    Battery,
    Connectivity,
    Door,
    Moisture,
    Motion,
    Occupancy,
    Opening,
    Plug,
    Power,
    Presence,
    Problem,
    Window,
    /// A device class not yet known to sleepnumberd
    #[strum(default)]
    Unknown(String),
}
