pub mod api;
pub mod config;
pub mod engine;
pub mod integrations;

pub use config::Config;
pub use config::LogLevel;
pub use engine::BinarySensorState;
pub use engine::Engine;
pub use engine::SensorState;
pub use engine::State;
pub use engine::UpdateCoordinator;
