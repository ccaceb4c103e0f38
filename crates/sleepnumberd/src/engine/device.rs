use serde::Serialize;

/// Identity and grouping metadata presented for one physical device.
///
/// Derived once from the upstream device model and never recomputed for the
/// lifetime of the entities that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Domain-scoped identifiers, e.g. `("sleepiq", bed_id)`
    pub identifiers: Vec<(String, String)>,

    /// Network connections, e.g. `("mac", mac_addr)`
    pub connections: Vec<(String, String)>,

    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub sw_version: Option<String>,
}

impl DeviceInfo {
    pub fn new(name: String) -> Self {
        Self {
            identifiers: Vec::new(),
            connections: Vec::new(),
            name,
            manufacturer: None,
            model: None,
            sw_version: None,
        }
    }

    /// Stable registry key for this device, preferring the first identifier
    /// and falling back to the first connection.
    pub fn registry_key(&self) -> Option<String> {
        self.identifiers
            .first()
            .or_else(|| self.connections.first())
            .map(|(kind, value)| format!("{}:{}", kind, value))
    }
}

/// A device in the sleepnumberd system.
///
/// A device represents a physical unit (e.g. one bed) that contains one or
/// more entities.
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub info: DeviceInfo,
    pub entity_ids: Vec<String>,
}

impl Device {
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            entity_ids: Vec::new(),
        }
    }

    pub fn add_entity(&mut self, entity_id: String) {
        if !self.entity_ids.contains(&entity_id) {
            self.entity_ids.push(entity_id);
        }
    }
}
