use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::device::Device;
use super::integration::FromIntegrationReceiver;
use super::integration::FromIntegrationSender;
use super::integration::Integration;
use super::integration::ToIntegrationSender;
use super::message::FromIntegrationMessage;
use super::message::ToIntegrationMessage;
use super::state::BinarySensorState;
use super::state::SensorState;
use super::state::State;
use crate::engine::IntegrationContext;

/// sleepnumberd engine
///
/// The host-platform side of the adapter: it owns the flow of entity events,
/// maintains a view of the world with State, and routes commands back to the
/// integration that owns an entity.
pub struct Engine {
    /// Centralized state snapshot (readers load the Arc, writer stores a new one)
    state: ArcSwap<State>,

    /// Map of entity_id -> integration name for routing
    entity_integration_map: std::sync::Mutex<HashMap<String, String>>,

    /// Physical devices, keyed by their registry key, grouping entity ids
    devices: std::sync::Mutex<HashMap<String, Device>>,

    /// Communication channels to integrations (for commands)
    integration_channels: HashMap<String, ToIntegrationSender>,

    /// Receive messages from integrations (events)
    message_rx: Mutex<FromIntegrationReceiver>,

    /// Sender for integrations to report events back to the engine
    message_tx: FromIntegrationSender,

    /// Handles for integration tasks
    integration_handles: Vec<JoinHandle<()>>,
}

/// Capacity for the integration→engine message channel
/// Provides backpressure when integrations send faster than the engine can process
const FROM_INTEGRATION_CHANNEL_SIZE: usize = 1024;

impl Engine {
    /// Create a new Engine instance
    pub fn new() -> Self {
        let (message_tx, message_rx) = mpsc::channel(FROM_INTEGRATION_CHANNEL_SIZE);
        Self {
            state: ArcSwap::new(Arc::default()),
            entity_integration_map: std::sync::Mutex::new(HashMap::new()),
            devices: std::sync::Mutex::new(HashMap::new()),
            integration_channels: HashMap::new(),
            message_rx: Mutex::new(message_rx),
            message_tx,
            integration_handles: Vec::new(),
        }
    }

    /// Register integrations from configuration
    ///
    /// This is a convenience method that checks the config and registers
    /// any enabled integrations.
    pub fn register_integrations_from_config(
        &mut self,
        cfg: &crate::config::Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let ctx = IntegrationContext { config: cfg };
        for constr in super::integration::REGISTRY {
            let integration = match constr(&ctx) {
                Ok(Some(i)) => i,
                Err(e) => {
                    error!("failed to setup integration: {}", e);
                    continue;
                }
                Ok(None) => continue,
            };
            let name = integration.name().to_string();
            self.register_integration(name, integration);
        }

        Ok(())
    }

    /// Register an integration with the engine
    ///
    /// This spawns the integration in a background task, wires up channels,
    /// and starts its setup process.
    pub fn register_integration(&mut self, name: String, mut integration: Box<dyn Integration>) {
        let (to_integration_tx, mut to_integration_rx) = mpsc::unbounded_channel();
        let from_integration_tx = self.message_tx.clone();

        self.integration_channels
            .insert(name.clone(), to_integration_tx);

        // Spawn integration task
        let handle = tokio::spawn(async move {
            // Setup integration (gives it the sender for events)
            if let Err(e) = integration.setup(from_integration_tx).await {
                warn!("Integration '{}' setup failed: {}", name, e);
                return;
            }

            // Process commands from engine
            while let Some(msg) = to_integration_rx.recv().await {
                if let Err(e) = integration.handle_message(msg).await {
                    warn!("Integration '{}' failed to handle message: {}", name, e);
                }
            }

            if let Err(e) = integration.shutdown().await {
                warn!("Integration '{}' shutdown failed: {}", name, e);
            }
        });

        self.integration_handles.push(handle);
    }

    /// Ask an integration to refresh its upstream data immediately,
    /// outside the regular poll schedule.
    pub fn request_refresh(&self, integration_name: &str) -> Result<(), Box<dyn Error + Send>> {
        let tx = self
            .integration_channels
            .get(integration_name)
            .ok_or_else(|| -> Box<dyn Error + Send> {
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Integration channel not found: {}", integration_name),
                ))
            })?;

        tx.send(ToIntegrationMessage::Refresh)
            .map_err(|e| -> Box<dyn Error + Send> { Box::new(e) })
    }

    /// Run the engine's main event loop
    ///
    /// Processes incoming events from integrations and updates state.
    pub async fn run(&self) -> Result<(), Box<dyn Error + Send>> {
        info!("Engine starting");

        // Main event loop - only receives FromIntegration messages
        let mut rx = self.message_rx.lock().await;
        while let Some(msg) = rx.recv().await {
            if let Err(e) = self.handle_event(msg).await {
                warn!("Error handling event: {}", e);
            }
        }

        info!("Engine shutting down");
        Ok(())
    }

    /// Get a snapshot of the current engine state.
    ///
    /// Clones the `Arc` (atomic refcount bump), essentially free.
    pub fn state_snapshot(&self) -> Arc<State> {
        self.state.load_full()
    }

    /// Snapshot of all known physical devices and their entities.
    pub fn devices_snapshot(&self) -> Vec<Device> {
        match self.devices.lock() {
            Ok(devices) => devices.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Handle an event from an integration
    async fn handle_event(&self, msg: FromIntegrationMessage) -> Result<(), Box<dyn Error + Send>> {
        match msg {
            FromIntegrationMessage::EntityDiscovered {
                entity_id,
                integration_name,
                device,
            } => {
                info!(
                    "Entity discovered: {} (from {})",
                    entity_id, integration_name
                );

                // Record which integration owns this entity for command routing.
                // State is not populated until the first state-change message arrives.
                if let Ok(mut map) = self.entity_integration_map.lock() {
                    map.insert(entity_id.clone(), integration_name);
                }

                // Group the entity under its physical device
                if let Some(info) = device {
                    if let Some(key) = info.registry_key() {
                        if let Ok(mut devices) = self.devices.lock() {
                            devices
                                .entry(key)
                                .or_insert_with(|| Device::new(info))
                                .add_entity(entity_id);
                        }
                    }
                }
            }
            FromIntegrationMessage::EntityRemoved { entity_id } => {
                info!("Entity removed: {}", entity_id);

                {
                    let mut state = State::clone(&self.state.load());
                    state.binary_sensors.remove(&entity_id);
                    state.sensors.remove(&entity_id);
                    self.state.store(Arc::new(state));
                }

                // Remove from routing map and device grouping
                if let Ok(mut map) = self.entity_integration_map.lock() {
                    map.remove(&entity_id);
                }
                if let Ok(mut devices) = self.devices.lock() {
                    for device in devices.values_mut() {
                        device.entity_ids.retain(|id| id != &entity_id);
                    }
                }
            }
            FromIntegrationMessage::BinarySensorStateChanged { entity_id, on } => {
                info!("Binary sensor state changed: {} -> on={}", entity_id, on);

                let mut state = State::clone(&self.state.load());
                state
                    .binary_sensors
                    .insert(entity_id, BinarySensorState { on });
                self.state.store(Arc::new(state));
            }
            FromIntegrationMessage::SensorValueChanged { entity_id, value } => {
                info!("Sensor value changed: {} -> {}", entity_id, value);

                let mut state = State::clone(&self.state.load());
                state.sensors.insert(entity_id, SensorState { value });
                self.state.store(Arc::new(state));
            }
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::super::device::DeviceInfo;
    use super::*;

    fn bed_device() -> DeviceInfo {
        let mut info = DeviceInfo::new("Bed A".to_string());
        info.identifiers
            .push(("sleepiq".to_string(), "1".to_string()));
        info.connections
            .push(("mac".to_string(), "aa:bb:cc:dd:ee:ff".to_string()));
        info.manufacturer = Some("SleepNumber".to_string());
        info
    }

    #[tokio::test]
    async fn test_state_updates_from_messages() {
        let engine = Engine::new();

        engine
            .handle_event(FromIntegrationMessage::BinarySensorStateChanged {
                entity_id: "1-left-InBed".to_string(),
                on: true,
            })
            .await
            .unwrap();
        engine
            .handle_event(FromIntegrationMessage::SensorValueChanged {
                entity_id: "1_Left_sleep_number".to_string(),
                value: 40.0,
            })
            .await
            .unwrap();

        let state = engine.state_snapshot();
        assert!(state.binary_sensors["1-left-InBed"].on);
        assert_eq!(state.sensors["1_Left_sleep_number"].value, 40.0);
    }

    #[tokio::test]
    async fn test_discovery_groups_entities_under_device() {
        let engine = Engine::new();

        for entity_id in ["1-left-InBed", "1-right-InBed"] {
            engine
                .handle_event(FromIntegrationMessage::EntityDiscovered {
                    entity_id: entity_id.to_string(),
                    integration_name: "sleepiq".to_string(),
                    device: Some(bed_device()),
                })
                .await
                .unwrap();
        }

        let devices = engine.devices_snapshot();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].entity_ids.len(), 2);
        assert_eq!(devices[0].info.name, "Bed A");
    }

    #[tokio::test]
    async fn test_entity_removal_clears_state_and_device() {
        let engine = Engine::new();

        engine
            .handle_event(FromIntegrationMessage::EntityDiscovered {
                entity_id: "1-left-InBed".to_string(),
                integration_name: "sleepiq".to_string(),
                device: Some(bed_device()),
            })
            .await
            .unwrap();
        engine
            .handle_event(FromIntegrationMessage::BinarySensorStateChanged {
                entity_id: "1-left-InBed".to_string(),
                on: true,
            })
            .await
            .unwrap();
        engine
            .handle_event(FromIntegrationMessage::EntityRemoved {
                entity_id: "1-left-InBed".to_string(),
            })
            .await
            .unwrap();

        assert!(engine.state_snapshot().binary_sensors.is_empty());
        assert!(engine.devices_snapshot()[0].entity_ids.is_empty());
    }
}
