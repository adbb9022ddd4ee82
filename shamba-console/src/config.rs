use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use shamba_core::{AuditSource, Percentage, PlanTier, Position};
use shamba_oracle::{DEFAULT_DEEP_MODEL, DEFAULT_FAST_MODEL, ModelRoutes, RetryPolicy};
use shamba_oracle::gemini::DEFAULT_ENDPOINT;
use shamba_telemetry::FLEET_ORIGIN;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub telemetry: TelemetryConfig,
    pub oracle: OracleConfig,
    pub sentinel: SentinelConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Subscription tier; gates the threat sweep and strategic reports
    pub plan: PlanTier,
    /// Sensors below this battery percentage are reported as low
    pub battery_threshold: u8,
    /// Farm coordinates used for the climate outlook
    pub location: Option<Position>,
}

impl SessionConfig {
    pub fn battery_threshold(&self) -> Percentage {
        Percentage::saturating(self.battery_threshold)
    }

    /// Configured location, or the fleet origin when none is set.
    pub fn location(&self) -> Position {
        self.location.unwrap_or(FLEET_ORIGIN)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            plan: PlanTier::Master,
            battery_threshold: 25,
            location: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Interval in milliseconds between fleet ticks
    pub tick_interval_ms: u64,
}

impl TelemetryConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 3000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL of the generative-AI REST API
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub fast_model: String,
    pub deep_model: String,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
    /// Per-attempt HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

impl OracleConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }

    pub fn model_routes(&self) -> ModelRoutes {
        ModelRoutes {
            fast: self.fast_model.clone(),
            deep: self.deep_model.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            api_key_env: "GEMINI_API_KEY".to_owned(),
            fast_model: DEFAULT_FAST_MODEL.to_owned(),
            deep_model: DEFAULT_DEEP_MODEL.to_owned(),
            max_attempts: 5,
            base_delay_ms: 1000,
            max_jitter_ms: 500,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Interval in seconds between background threat sweeps
    pub sweep_interval_secs: u64,
    /// Audit log source assessed by each sweep
    pub source: AuditSource,
}

impl SentinelConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 180,
            source: AuditSource::Live,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address for the HTTP server to listen on
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
