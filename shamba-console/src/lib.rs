pub mod api;
pub mod config;
pub mod sentinel;
pub mod session;

pub use config::{
    Config, OracleConfig, SentinelConfig, ServerConfig, SessionConfig, TelemetryConfig,
};
pub use session::{ClimateOutlook, Session, SessionHandle, SessionState, SweepReport};
