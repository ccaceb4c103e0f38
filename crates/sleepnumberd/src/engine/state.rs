use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

/// State of a binary sensor entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BinarySensorState {
    /// Whether the sensor is active (meaning depends on device class:
    /// occupancy detected, door open, etc.)
    pub on: bool,
}

/// State of a numeric sensor entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorState {
    pub value: f64,
}

/// Centralized snapshot of the entire engine state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct State {
    pub binary_sensors: HashMap<String, BinarySensorState>,
    pub sensors: HashMap<String, SensorState>,
}
