//! Type-safe message system for sleepnumberd
//!
//! Messages are split by direction to enforce correct usage at compile time:
//! - `FromIntegrationMessage`: Events from integrations to the engine
//! - `ToIntegrationMessage`: Commands from the engine to integrations

use super::device::DeviceInfo;

/// Messages FROM integrations TO the engine (events/state updates)
#[derive(Debug)]
pub enum FromIntegrationMessage {
    /// An entity was discovered and registered
    EntityDiscovered {
        entity_id: String,
        integration_name: String,
        device: Option<DeviceInfo>,
    },

    /// An entity was removed (integration unloaded, etc.)
    EntityRemoved { entity_id: String },

    /// A binary sensor's state changed (e.g., bed occupancy)
    BinarySensorStateChanged { entity_id: String, on: bool },

    /// A numeric sensor's value changed (e.g., sleep number setting)
    SensorValueChanged { entity_id: String, value: f64 },
}

/// Messages FROM the engine TO integrations (commands)
#[derive(Debug, Clone)]
pub enum ToIntegrationMessage {
    /// Request an immediate refresh of the integration's upstream data,
    /// outside the regular poll schedule.
    Refresh,
}
