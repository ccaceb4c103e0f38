//! Shared entity plumbing for SleepIQ sensors.

use std::sync::Arc;

use crate::engine::DeviceInfo;

use super::model::Bed;

pub const DOMAIN: &str = "sleepiq";
pub const MANUFACTURER: &str = "SleepNumber";

/// Base for every SleepIQ entity: holds the bed reference and the device
/// descriptor derived from it.
///
/// The descriptor is computed once at construction and never again; bed
/// identity is stable for the session, and a renamed or swapped bed means
/// recreating its entities.
pub struct SleepIqEntity {
    pub bed: Arc<Bed>,
    device_info: DeviceInfo,
}

impl SleepIqEntity {
    pub fn new(bed: Arc<Bed>) -> Self {
        let mut device_info = DeviceInfo::new(bed.name.clone());
        device_info
            .identifiers
            .push((DOMAIN.to_string(), bed.id.clone()));
        device_info
            .connections
            .push(("mac".to_string(), bed.mac_addr.clone()));
        device_info.manufacturer = Some(MANUFACTURER.to_string());
        device_info.model = Some(bed.model.clone());

        Self { bed, device_info }
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }
}

/// A SleepIQ sensor driven by the shared status coordinator.
///
/// The one required operation recomputes the sensor's cached presentation
/// attributes from its bound sleeper/bed. It must always be computable and
/// must not touch anything beyond the sensor's own cache. A sensor type that
/// does not supply it cannot exist:
///
/// ```compile_fail
/// use sleepnumberd::integrations::sleepiq::SleepIqSensor;
///
/// struct Broken;
/// impl SleepIqSensor for Broken {}
/// ```
pub trait SleepIqSensor: Send + Sync {
    /// Recompute cached attributes from the bound sleeper/bed.
    fn update_attrs(&self);

    /// Called by the coordinator after every successful refresh.
    fn handle_coordinator_update(&self) {
        self.update_attrs();
    }
}

#[cfg(test)]
mod tests {
    use super::super::model::Side;
    use super::super::model::Sleeper;
    use super::super::model::SleeperReadings;
    use super::*;

    fn bed() -> Arc<Bed> {
        Arc::new(Bed {
            id: "7".to_string(),
            name: "Main".to_string(),
            mac_addr: "aa:bb:cc:dd:ee:ff".to_string(),
            model: "360 p6".to_string(),
            sleepers: vec![Arc::new(Sleeper::new(
                Side::Left,
                "Left".to_string(),
                SleeperReadings::default(),
            ))],
        })
    }

    #[test]
    fn test_device_info_derived_from_bed() {
        let entity = SleepIqEntity::new(bed());
        let info = entity.device_info();

        assert_eq!(info.connections, vec![(
            "mac".to_string(),
            "aa:bb:cc:dd:ee:ff".to_string()
        )]);
        assert_eq!(info.identifiers, vec![(
            "sleepiq".to_string(),
            "7".to_string()
        )]);
        assert_eq!(info.name, "Main");
        assert_eq!(info.manufacturer.as_deref(), Some("SleepNumber"));
        assert_eq!(info.model.as_deref(), Some("360 p6"));
    }

    #[test]
    fn test_same_bed_same_descriptor() {
        let bed = bed();
        let a = SleepIqEntity::new(Arc::clone(&bed));
        let b = SleepIqEntity::new(bed);
        assert_eq!(a.device_info(), b.device_info());
    }
}
