//! Pipeline configuration: compiled-in defaults, overridable by an optional
//! TOML file and a handful of environment variables.

use serde::Deserialize;

/// Runtime configuration for the orchestrator and its network surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tick period, milliseconds. ~100ms matches a 10Hz radar scan rate.
    pub tick_interval_ms: u64,
    /// Bound on the retained raw-detection ring used by `/api/detections`.
    pub detection_ring_capacity: usize,
    /// HTTP/WS bind address.
    pub bind_addr: String,
    /// Broadcast channel capacity; subscribers that fall this many ticks
    /// behind are dropped rather than let the channel grow unbounded.
    pub broadcast_capacity: usize,
    /// Association gate passed to the tracker, meters.
    pub association_gate_m: f64,
    /// Max coast time passed to the tracker, seconds.
    pub max_coast_time_s: f64,
    pub sensors: SensorsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            detection_ring_capacity: 1000,
            bind_addr: "0.0.0.0:8080".to_string(),
            broadcast_capacity: 64,
            association_gate_m: radix_core::tracker::DEFAULT_ASSOCIATION_GATE_M,
            max_coast_time_s: radix_core::tracker::DEFAULT_MAX_COAST_TIME_S,
            sensors: SensorsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    pub fmcw: bool,
    pub pulse_doppler: bool,
    pub aesa: bool,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            fmcw: true,
            pulse_doppler: true,
            aesa: true,
        }
    }
}

impl PipelineConfig {
    /// Loads defaults, then an optional TOML file, then environment
    /// variable overrides — in that order, each layer winning over the last.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("reading config file {path}: {e}"))?;
                toml::from_str(&raw)?
            }
            None => PipelineConfig::default(),
        };

        if let Ok(v) = std::env::var("RADIX_TICK_INTERVAL_MS") {
            config.tick_interval_ms = v.parse()?;
        }
        if let Ok(v) = std::env::var("RADIX_BIND_ADDR") {
            config.bind_addr = v;
        }
        if let Ok(v) = std::env::var("PORT") {
            let port: u16 = v.parse()?;
            let host = config
                .bind_addr
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or("0.0.0.0");
            config.bind_addr = format!("{host}:{port}");
        }

        Ok(config)
    }
}
