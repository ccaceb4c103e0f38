//! SleepIQ integration: exposes bed occupancy and sleeper state from the
//! smart-mattress device service as entities in the engine.
//!
//! Setup runs once: it enumerates every configured (bed, sleeper) pair,
//! creates one occupancy sensor and one sleep-number sensor per pair, hands
//! each to the engine exactly once, and binds each to the shared status
//! coordinator. No entities are added lazily afterwards.

mod binary_sensor;
mod client;
mod entity;
mod model;
mod sensor;

pub use binary_sensor::ICON_OCCUPIED;
pub use binary_sensor::IsInBedBinarySensor;
pub use client::SimulatedClient;
pub use client::SleepIqClient;
pub use client::SleepIqError;
pub use entity::DOMAIN;
pub use entity::MANUFACTURER;
pub use entity::SleepIqEntity;
pub use entity::SleepIqSensor;
pub use model::Bed;
pub use model::Side;
pub use model::Sleeper;
pub use model::SleeperReadings;
pub use sensor::SleepNumberSensor;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use linkme::distributed_slice;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::SleepIqConfig;
use crate::engine;
use crate::engine::Entity;
use crate::engine::FromIntegrationMessage;
use crate::engine::FromIntegrationSender;
use crate::engine::ToIntegrationMessage;
use crate::engine::UpdateCoordinator;

/// SleepIQ integration bound to the engine's integration trait system.
pub struct SleepIqIntegration {
    name: String,
    config: SleepIqConfig,
    coordinator: Option<Arc<UpdateCoordinator>>,
    poll_handle: Option<JoinHandle<()>>,
}

impl SleepIqIntegration {
    pub fn new(name: String, config: SleepIqConfig) -> Self {
        Self {
            name,
            config,
            coordinator: None,
            poll_handle: None,
        }
    }

    /// Announce one sensor to the engine and bind it to the coordinator.
    ///
    /// The entity was constructed with its attributes already computed, so
    /// the engine sees a real state immediately rather than stale defaults.
    async fn register_sensor<E>(
        sensor: Arc<E>,
        coordinator: &UpdateCoordinator,
        tx: &FromIntegrationSender,
        integration_name: &str,
        state_message: fn(&E) -> FromIntegrationMessage,
    ) -> Result<(), Box<dyn Error + Send>>
    where
        E: Entity + SleepIqSensor + 'static,
    {
        tx.send(FromIntegrationMessage::EntityDiscovered {
            entity_id: sensor.unique_id().to_string(),
            integration_name: integration_name.to_string(),
            device: sensor.device_info().cloned(),
        })
        .await
        .map_err(|e| -> Box<dyn Error + Send> { Box::new(e) })?;

        tx.send(state_message(&sensor))
            .await
            .map_err(|e| -> Box<dyn Error + Send> { Box::new(e) })?;

        let listener_tx = tx.clone();
        coordinator.add_listener(move || {
            sensor.handle_coordinator_update();
            // Listeners are synchronous; a full channel drops the update and
            // the next cycle resends current state anyway
            let _ = listener_tx.try_send(state_message(&sensor));
        });

        Ok(())
    }
}

#[async_trait]
impl engine::Integration for SleepIqIntegration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&mut self, tx: FromIntegrationSender) -> Result<(), Box<dyn Error + Send>> {
        info!("[{}] Setting up SleepIQ integration", self.name);

        let client = Arc::new(
            SimulatedClient::from_config(&self.config)
                .map_err(|e| -> Box<dyn Error + Send> { Box::new(e) })?,
        );

        // One fetch before any entity exists, so construction-time attribute
        // computation sees real data
        client
            .fetch_bed_statuses()
            .await
            .map_err(|e| -> Box<dyn Error + Send> { Box::new(e) })?;

        let fetch_client = Arc::clone(&client);
        let coordinator = UpdateCoordinator::new("sleepiq", move || {
            let client = Arc::clone(&fetch_client);
            async move {
                client.fetch_bed_statuses().await?;
                Ok(())
            }
        });

        for bed in client.beds() {
            for sleeper in &bed.sleepers {
                let occupancy = Arc::new(IsInBedBinarySensor::new(
                    Arc::clone(sleeper),
                    Arc::clone(bed),
                ));
                Self::register_sensor(occupancy, &coordinator, &tx, &self.name, |sensor| {
                    FromIntegrationMessage::BinarySensorStateChanged {
                        entity_id: sensor.unique_id().to_string(),
                        on: sensor.is_on(),
                    }
                })
                .await?;

                let sleep_number = Arc::new(SleepNumberSensor::new(
                    Arc::clone(sleeper),
                    Arc::clone(bed),
                ));
                Self::register_sensor(sleep_number, &coordinator, &tx, &self.name, |sensor| {
                    FromIntegrationMessage::SensorValueChanged {
                        entity_id: sensor.unique_id().to_string(),
                        value: f64::from(sensor.value()),
                    }
                })
                .await?;
            }
        }

        let interval = Duration::from_secs(self.config.poll_interval_secs);
        self.poll_handle = Some(coordinator.spawn(interval));
        self.coordinator = Some(coordinator);

        info!("[{}] SleepIQ integration started", self.name);
        Ok(())
    }

    async fn handle_message(
        &mut self,
        msg: ToIntegrationMessage,
    ) -> Result<(), Box<dyn Error + Send>> {
        match msg {
            ToIntegrationMessage::Refresh => {
                if let Some(coordinator) = &self.coordinator {
                    coordinator.refresh().await;
                }
            }
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), Box<dyn Error + Send>> {
        info!("[{}] Shutting down SleepIQ integration", self.name);

        if let Some(handle) = self.poll_handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.coordinator = None;

        Ok(())
    }
}

#[distributed_slice(engine::INTEGRATION_REGISTRY)]
fn init_sleepiq(ctx: &engine::IntegrationContext) -> engine::IntegrationFactoryResult {
    let sleepiq_config = if let Some(c) = &ctx.config.integrations.sleepiq {
        c
    } else {
        return Ok(None);
    };

    if !sleepiq_config.enabled {
        return Ok(None);
    }

    info!("Initializing SleepIQ integration");
    Ok(Some(Box::new(SleepIqIntegration::new(
        "sleepiq".to_string(),
        sleepiq_config.clone(),
    ))))
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use crate::config::BedConfig;
    use crate::config::SleeperConfig;
    use crate::engine::Engine;
    use crate::engine::Integration;

    use super::*;

    fn two_bed_config() -> SleepIqConfig {
        SleepIqConfig {
            enabled: true,
            poll_interval_secs: 3600,
            beds: vec![
                BedConfig {
                    id: "1".to_string(),
                    name: "A".to_string(),
                    mac_addr: "aa:aa:aa:aa:aa:aa".to_string(),
                    model: "360 c2".to_string(),
                    sleepers: vec![SleeperConfig {
                        side: "left".to_string(),
                        name: "Left".to_string(),
                        in_bed: false,
                        sleep_number: 40,
                    }],
                },
                BedConfig {
                    id: "2".to_string(),
                    name: "B".to_string(),
                    mac_addr: "bb:bb:bb:bb:bb:bb".to_string(),
                    model: "360 p6".to_string(),
                    sleepers: vec![SleeperConfig {
                        side: "right".to_string(),
                        name: "Right".to_string(),
                        in_bed: false,
                        sleep_number: 55,
                    }],
                },
            ],
        }
    }

    fn drain(rx: &mut mpsc::Receiver<FromIntegrationMessage>) -> Vec<FromIntegrationMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    #[tokio::test]
    async fn test_setup_registers_each_sensor_exactly_once() {
        let mut integration =
            SleepIqIntegration::new("sleepiq".to_string(), two_bed_config());
        let (tx, mut rx) = mpsc::channel(64);

        integration.setup(tx).await.unwrap();
        let messages = drain(&mut rx);

        let mut discovered: Vec<String> = messages
            .iter()
            .filter_map(|msg| match msg {
                FromIntegrationMessage::EntityDiscovered { entity_id, .. } => {
                    Some(entity_id.clone())
                }
                _ => None,
            })
            .collect();
        discovered.sort();

        assert_eq!(
            discovered,
            vec![
                "1-left-InBed",
                "1_Left_sleep_number",
                "2-right-InBed",
                "2_Right_sleep_number",
            ]
        );

        // One initial state per entity
        let binary_states = messages
            .iter()
            .filter(|msg| matches!(msg, FromIntegrationMessage::BinarySensorStateChanged { .. }))
            .count();
        let sensor_states = messages
            .iter()
            .filter(|msg| matches!(msg, FromIntegrationMessage::SensorValueChanged { .. }))
            .count();
        assert_eq!(binary_states, 2);
        assert_eq!(sensor_states, 2);

        integration.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_manual_refresh_fans_out_state() {
        let mut integration =
            SleepIqIntegration::new("sleepiq".to_string(), two_bed_config());
        let (tx, mut rx) = mpsc::channel(64);

        integration.setup(tx).await.unwrap();
        drain(&mut rx);

        integration
            .handle_message(ToIntegrationMessage::Refresh)
            .await
            .unwrap();

        // Every entity reports after the refresh cycle
        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().all(|msg| matches!(
            msg,
            FromIntegrationMessage::BinarySensorStateChanged { .. }
                | FromIntegrationMessage::SensorValueChanged { .. }
        )));

        integration.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_engine_state_reflects_initial_setup() {
        let mut engine = Engine::new();
        engine.register_integration(
            "sleepiq".to_string(),
            Box::new(SleepIqIntegration::new(
                "sleepiq".to_string(),
                two_bed_config(),
            )),
        );

        let engine = Arc::new(engine);
        let runner = Arc::clone(&engine);
        tokio::spawn(async move {
            let _ = runner.run().await;
        });

        for _ in 0..500 {
            let state = engine.state_snapshot();
            if state.binary_sensors.contains_key("1-left-InBed")
                && state.binary_sensors.contains_key("2-right-InBed")
                && state.sensors.contains_key("1_Left_sleep_number")
                && state.sensors.contains_key("2_Right_sleep_number")
            {
                // Two beds, each grouping its own pair of entities
                let devices = engine.devices_snapshot();
                assert_eq!(devices.len(), 2);
                assert!(devices.iter().all(|d| d.entity_ids.len() == 2));
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("engine never observed the initial sleepiq states");
    }
}
