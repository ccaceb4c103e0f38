//! Bed occupancy binary sensor.

use std::sync::Arc;

use crate::engine::BinarySensorDeviceClass;
use crate::engine::DeviceInfo;
use crate::engine::Entity;

use super::entity::SleepIqEntity;
use super::entity::SleepIqSensor;
use super::model::Bed;
use super::model::Sleeper;

pub const ICON_OCCUPIED: &str = "mdi:bed";

/// Presence sensor for one sleeper.
///
/// Unlike the cached numeric sensors, occupancy is read straight through to
/// the sleeper on every call. Do not unify the two: the pass-through keeps
/// `is_on` exact at read time even between coordinator cycles.
pub struct IsInBedBinarySensor {
    entity: SleepIqEntity,
    sleeper: Arc<Sleeper>,
    name: String,
    unique_id: String,
}

impl IsInBedBinarySensor {
    pub fn new(sleeper: Arc<Sleeper>, bed: Arc<Bed>) -> Self {
        let name = format!(
            "SleepNumber {} {} Is In Bed",
            bed.name, sleeper.name
        );
        let unique_id = format!("{}-{}-InBed", bed.id, sleeper.side);

        let sensor = Self {
            entity: SleepIqEntity::new(bed),
            sleeper,
            name,
            unique_id,
        };
        sensor.update_attrs();
        sensor
    }

    /// Live occupancy, read from the bound sleeper at call time.
    pub fn is_on(&self) -> bool {
        self.sleeper.in_bed()
    }

    pub fn device_class(&self) -> BinarySensorDeviceClass {
        BinarySensorDeviceClass::Occupancy
    }

    pub fn icon(&self) -> &'static str {
        ICON_OCCUPIED
    }
}

impl SleepIqSensor for IsInBedBinarySensor {
    fn update_attrs(&self) {
        // Occupancy is a pass-through read in `is_on`; there is no cache to
        // refresh. The coordinator notification still reaches the entity so
        // its state is forwarded to the engine each cycle.
    }
}

impl Entity for IsInBedBinarySensor {
    fn state_json(&self) -> serde_json::Value {
        serde_json::json!({ "on": self.is_on() })
    }

    fn platform(&self) -> &'static str {
        "binary_sensor"
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device_info(&self) -> Option<&DeviceInfo> {
        Some(self.entity.device_info())
    }

    fn should_poll(&self) -> bool {
        false
    }
}
