pub mod clock;
pub mod config;
pub mod error;
pub mod poller;

pub use clock::ClockPlayer;
pub use config::{CONFIG_TEMPLATE as ENGINE_CONFIG_TEMPLATE, EngineConfig};
pub use error::EngineError;
pub use poller::PositionPoller;
