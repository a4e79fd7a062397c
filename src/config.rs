use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IntersectionError, Result};
use crate::global_variables::{
    ADMISSION_POLL_MS, DEFAULT_CROSSING_MS, DEFAULT_MAX_APPROACH_MS, DEFAULT_VEHICLE_COUNT,
    LIGHT_POLL_MS, MAX_CYCLE_MS, MIN_CYCLE_MS, PHASE_SEND_DELAY_MS,
};

/// Timing knobs for a single traffic light.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightTiming {
    /// Shortest phase duration (inclusive).
    pub min_cycle_ms: u64,
    /// Longest phase duration (inclusive).
    pub max_cycle_ms: u64,
    /// Sleep between two checks of the elapsed phase time.
    pub poll_interval_ms: u64,
    /// Delay before each phase is pushed into the phase queue.
    pub send_delay_ms: u64,
    /// Fixed seed for the phase duration generator. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for LightTiming {
    fn default() -> Self {
        Self {
            min_cycle_ms: MIN_CYCLE_MS,
            max_cycle_ms: MAX_CYCLE_MS,
            poll_interval_ms: LIGHT_POLL_MS,
            send_delay_ms: PHASE_SEND_DELAY_MS,
            seed: None,
        }
    }
}

impl LightTiming {
    /// Same bounds for every phase, handy when a test needs a predictable cycle.
    pub fn fixed(cycle_ms: u64) -> Self {
        Self {
            min_cycle_ms: cycle_ms,
            max_cycle_ms: cycle_ms,
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_cycle_ms > self.max_cycle_ms {
            return Err(IntersectionError::ConfigInvalid(format!(
                "min_cycle_ms ({}) is greater than max_cycle_ms ({})",
                self.min_cycle_ms, self.max_cycle_ms
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(IntersectionError::ConfigInvalid(
                "light poll_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for one intersection and the light it owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionConfig {
    pub admission: AdmissionTiming,
    pub light: LightTiming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionTiming {
    /// Sleep between two passes of the admission loop.
    pub poll_interval_ms: u64,
}

impl Default for AdmissionTiming {
    fn default() -> Self {
        Self {
            poll_interval_ms: ADMISSION_POLL_MS,
        }
    }
}

impl IntersectionConfig {
    pub fn with_light(light: LightTiming) -> Self {
        Self {
            light,
            ..Self::default()
        }
    }

    pub fn admission_poll_interval(&self) -> Duration {
        Duration::from_millis(self.admission.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.admission.poll_interval_ms == 0 {
            return Err(IntersectionError::ConfigInvalid(
                "admission poll_interval_ms must be at least 1".to_string(),
            ));
        }
        self.light.validate()
    }
}

/// Top level config consumed by the demo driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub intersection: IntersectionConfig,
    pub vehicle_count: usize,
    pub crossing_ms: u64,
    pub max_approach_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            intersection: IntersectionConfig::default(),
            vehicle_count: DEFAULT_VEHICLE_COUNT,
            crossing_ms: DEFAULT_CROSSING_MS,
            max_approach_ms: DEFAULT_MAX_APPROACH_MS,
        }
    }
}

impl SimulationConfig {
    /// Reads a JSON config file. Missing fields fall back to the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| IntersectionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(raw)?;
        config.intersection.validate()?;
        Ok(config)
    }
}
