//! Numeric SleepIQ sensors following the cached-attribute pattern.

use std::sync::Arc;
use std::sync::RwLock;

use crate::engine::DeviceInfo;
use crate::engine::Entity;

use super::entity::SleepIqEntity;
use super::entity::SleepIqSensor;
use super::model::Bed;
use super::model::Sleeper;

/// The sleeper's firmness setting, cached on each coordinator notification.
///
/// Unlike the occupancy sensor, the value is a snapshot: reads between
/// notifications return whatever the last refresh computed.
pub struct SleepNumberSensor {
    entity: SleepIqEntity,
    sleeper: Arc<Sleeper>,
    name: String,
    unique_id: String,
    value: RwLock<u8>,
}

impl SleepNumberSensor {
    pub fn new(sleeper: Arc<Sleeper>, bed: Arc<Bed>) -> Self {
        let name = format!(
            "SleepNumber {} {} SleepNumber",
            bed.name, sleeper.name
        );
        let unique_id = format!("{}_{}_sleep_number", bed.id, sleeper.name);

        let sensor = Self {
            entity: SleepIqEntity::new(bed),
            sleeper,
            name,
            unique_id,
            value: RwLock::new(0),
        };
        sensor.update_attrs();
        sensor
    }

    /// Cached sleep number from the last notification.
    pub fn value(&self) -> u8 {
        match self.value.read() {
            Ok(value) => *value,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl SleepIqSensor for SleepNumberSensor {
    fn update_attrs(&self) {
        let current = self.sleeper.readings().sleep_number;
        match self.value.write() {
            Ok(mut value) => *value = current,
            Err(poisoned) => *poisoned.into_inner() = current,
        }
    }
}

impl Entity for SleepNumberSensor {
    fn state_json(&self) -> serde_json::Value {
        serde_json::json!({ "value": self.value() })
    }

    fn platform(&self) -> &'static str {
        "sensor"
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

#[cfg(test)]
mod tests {
    use super::super::model::Side;
    use super::super::model::SleeperReadings;
    use super::*;

    fn bed() -> Arc<Bed> {
        Arc::new(Bed {
            id: "1".to_string(),
            name: "A".to_string(),
            mac_addr: "aa:bb:cc:dd:ee:ff".to_string(),
            model: "360 c2".to_string(),
            sleepers: vec![Arc::new(Sleeper::new(
                Side::Left,
                "Left".to_string(),
                SleeperReadings {
                    in_bed: false,
                    sleep_number: 35,
                    pressure: 0,
                },
            ))],
        })
    }

    #[test]
    fn test_identity_formats() {
        let bed = bed();
        let sensor = SleepNumberSensor::new(Arc::clone(&bed.sleepers[0]), Arc::clone(&bed));

        assert_eq!(sensor.unique_id(), "1_Left_sleep_number");
        assert_eq!(sensor.name(), "SleepNumber A Left SleepNumber");
        assert_eq!(sensor.platform(), "sensor");
    }

    #[test]
    fn test_initial_value_computed_at_construction() {
        let bed = bed();
        let sensor = SleepNumberSensor::new(Arc::clone(&bed.sleepers[0]), Arc::clone(&bed));
        assert_eq!(sensor.value(), 35);
    }

    #[test]
    fn test_value_cached_until_notification() {
        let bed = bed();
        let sensor = SleepNumberSensor::new(Arc::clone(&bed.sleepers[0]), Arc::clone(&bed));

        bed.sleepers[0].set_readings(SleeperReadings {
            in_bed: true,
            sleep_number: 60,
            pressure: 1400,
        });

        // No notification yet: the cache holds
        assert_eq!(sensor.value(), 35);

        sensor.handle_coordinator_update();
        assert_eq!(sensor.value(), 60);
        assert_eq!(sensor.state_json()["value"], 60);
    }
}
