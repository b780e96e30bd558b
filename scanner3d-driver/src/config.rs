//! Scanner configuration, stored as TOML.
//!
//! Every field has a default, so a config file only needs the values that
//! differ from the reference rig:
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//!
//! [rig]
//! travel_limit = 150
//! ```

use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_DEGREES_PER_STEP, DEFAULT_EVENT_CAPACITY, DEFAULT_HEIGHT_DIVISOR,
    DEFAULT_PORT, DEFAULT_RADIUS_DIVISOR, DEFAULT_READ_TIMEOUT_MS, DEFAULT_RECONNECT_BACKOFF_MS,
    DEFAULT_TRAVEL_LIMIT,
};
use crate::error::ScannerError;
use scanner3d_data::ScanVolume;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub serial: SerialConfig,
    pub rig: RigConfig,
    pub commands: CommandSet,
    pub events: EventConfig,
    pub volume: ScanVolume,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port name such as `/dev/ttyACM0` or `COM3`.
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    /// Fixed delay between reconnect attempts.
    pub reconnect_backoff_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            reconnect_backoff_ms: DEFAULT_RECONNECT_BACKOFF_MS,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }
}

/// Conversion from raw rig units to scan space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub degrees_per_step: f64,
    /// Highest sensor position that still produces a sample.
    pub travel_limit: i32,
    pub height_divisor: f64,
    pub radius_divisor: f64,
}

impl Default for RigConfig {
    fn default() -> Self {
        RigConfig {
            degrees_per_step: DEFAULT_DEGREES_PER_STEP,
            travel_limit: DEFAULT_TRAVEL_LIMIT,
            height_divisor: DEFAULT_HEIGHT_DIVISOR,
            radius_divisor: DEFAULT_RADIUS_DIVISOR,
        }
    }
}

/// Host to device command verbs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSet {
    pub scan: String,
    pub pause: String,
    pub resume: String,
    pub reset: String,
    pub stop: String,
    pub calibrate: String,
    pub status: String,
    pub move_sensor: String,
    pub rotate_plate: String,
}

impl Default for CommandSet {
    fn default() -> Self {
        CommandSet {
            scan: "scan".to_string(),
            pause: "pause".to_string(),
            resume: "resume".to_string(),
            reset: "reset".to_string(),
            stop: "stop".to_string(),
            calibrate: "calibrate".to_string(),
            status: "status".to_string(),
            move_sensor: "m_sensor".to_string(),
            rotate_plate: "m_base".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Per-subscriber queue length. Events are dropped for a full queue.
    pub capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        EventConfig {
            capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ScannerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScannerError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ScannerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config {:?}, using defaults: {}", path, e);
                ScannerConfig::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScannerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ScannerError> {
        if self.serial.port.trim().is_empty() {
            return Err(ScannerError::InvalidConfig("serial port is empty".into()));
        }
        if self.serial.baud_rate == 0 {
            return Err(ScannerError::InvalidConfig("baud rate must be positive".into()));
        }
        if self.rig.height_divisor == 0. || self.rig.radius_divisor == 0. {
            return Err(ScannerError::InvalidConfig(
                "rig divisors must be non-zero".into(),
            ));
        }
        if self.events.capacity == 0 {
            return Err(ScannerError::InvalidConfig(
                "event capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}
