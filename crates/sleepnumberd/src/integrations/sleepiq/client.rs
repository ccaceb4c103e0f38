//! Seam to the device library that owns all SleepIQ network and session
//! handling.
//!
//! The daemon never talks to the cloud service itself; it polls whatever
//! implements [`SleepIqClient`]. The shipped implementation is a simulated
//! client driven by config-defined beds, with deterministic readings so the
//! rest of the stack can be exercised end to end.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::model::Bed;
use super::model::Side;
use super::model::Sleeper;
use super::model::SleeperReadings;
use crate::config::SleepIqConfig;

#[derive(Debug, Error)]
pub enum SleepIqError {
    #[error("request to the SleepIQ service timed out")]
    Timeout,

    #[error("SleepIQ service unavailable (status {status})")]
    Unavailable { status: u16 },

    #[error("invalid bed side '{0}' (expected 'left' or 'right')")]
    InvalidSide(String),
}

/// Device-library collaborator: owns the beds and refreshes their sleeper
/// readings in place.
#[async_trait]
pub trait SleepIqClient: Send + Sync {
    /// All beds configured for the session, each populated with its sleepers.
    fn beds(&self) -> &[Arc<Bed>];

    /// Refresh every sleeper's readings in place from the upstream service.
    async fn fetch_bed_statuses(&self) -> Result<(), SleepIqError>;
}

/// In-process client serving beds defined in the configuration file.
///
/// Each refresh advances a tick counter and derives readings from it, so
/// occupancy flips on a fixed cadence without any network traffic.
#[derive(Debug)]
pub struct SimulatedClient {
    beds: Vec<Arc<Bed>>,
    tick: AtomicU64,
}

impl SimulatedClient {
    pub fn from_config(config: &SleepIqConfig) -> Result<Self, SleepIqError> {
        let mut beds = Vec::with_capacity(config.beds.len());
        for bed_config in &config.beds {
            let mut sleepers = Vec::with_capacity(bed_config.sleepers.len());
            for sleeper_config in &bed_config.sleepers {
                let side = Side::from_str(&sleeper_config.side)
                    .map_err(|_| SleepIqError::InvalidSide(sleeper_config.side.clone()))?;
                sleepers.push(Arc::new(Sleeper::new(
                    side,
                    sleeper_config.name.clone(),
                    SleeperReadings {
                        in_bed: sleeper_config.in_bed,
                        sleep_number: sleeper_config.sleep_number,
                        pressure: 0,
                    },
                )));
            }
            beds.push(Arc::new(Bed {
                id: bed_config.id.clone(),
                name: bed_config.name.clone(),
                mac_addr: bed_config.mac_addr.clone(),
                model: bed_config.model.clone(),
                sleepers,
            }));
        }

        Ok(Self {
            beds,
            tick: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl SleepIqClient for SimulatedClient {
    fn beds(&self) -> &[Arc<Bed>] {
        &self.beds
    }

    async fn fetch_bed_statuses(&self) -> Result<(), SleepIqError> {
        let tick = self.tick.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("simulated fetch, tick {}", tick);

        for (bed_index, bed) in self.beds.iter().enumerate() {
            for (sleeper_index, sleeper) in bed.sleepers.iter().enumerate() {
                let previous = sleeper.readings();
                // Occupancy alternates per refresh, offset per sleeper so
                // sides don't move in lockstep
                let in_bed = (tick + bed_index as u64 + sleeper_index as u64) % 2 == 0;
                sleeper.set_readings(SleeperReadings {
                    in_bed,
                    sleep_number: previous.sleep_number,
                    pressure: if in_bed { 1400 } else { 300 },
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BedConfig;
    use crate::config::SleeperConfig;

    fn config_with_sides(sides: &[&str]) -> SleepIqConfig {
        SleepIqConfig {
            enabled: true,
            poll_interval_secs: 60,
            beds: vec![BedConfig {
                id: "1".to_string(),
                name: "A".to_string(),
                mac_addr: "aa:bb:cc:dd:ee:ff".to_string(),
                model: "360 c2".to_string(),
                sleepers: sides
                    .iter()
                    .map(|side| SleeperConfig {
                        side: side.to_string(),
                        name: side.to_string(),
                        in_bed: false,
                        sleep_number: 45,
                    })
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_from_config_builds_beds() {
        let client = SimulatedClient::from_config(&config_with_sides(&["left", "right"])).unwrap();

        assert_eq!(client.beds().len(), 1);
        let bed = &client.beds()[0];
        assert_eq!(bed.sleepers.len(), 2);
        assert_eq!(bed.sleepers[0].side, Side::Left);
        assert_eq!(bed.sleepers[0].readings().sleep_number, 45);
    }

    #[test]
    fn test_from_config_rejects_bad_side() {
        let err = SimulatedClient::from_config(&config_with_sides(&["middle"])).unwrap_err();
        assert!(matches!(err, SleepIqError::InvalidSide(side) if side == "middle"));
    }

    #[tokio::test]
    async fn test_fetch_mutates_readings_in_place() {
        let client = SimulatedClient::from_config(&config_with_sides(&["left"])).unwrap();
        let sleeper = Arc::clone(&client.beds()[0].sleepers[0]);

        client.fetch_bed_statuses().await.unwrap();
        let first = sleeper.in_bed();
        client.fetch_bed_statuses().await.unwrap();
        let second = sleeper.in_bed();

        // Same Arc observed both refreshes; occupancy alternates per tick
        assert_ne!(first, second);
    }
}
