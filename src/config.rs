//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the rain-config.toml file.
//! It provides a centralized way to configure serial port settings, polling intervals,
//! and the battery-saver sleep policy.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration loaded from rain-config.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Debug mode: echoes raw sensor output and diagnostic messages.
    /// Kept ahead of the tables so TOML serialization stays valid.
    #[serde(default)]
    pub debug: bool,
    /// Sensor polling and startup configuration
    pub sensor: SensorConfig,
    /// Battery-saver sleep policy configuration
    pub battery: BatteryConfig,
    /// Serial port configuration
    pub serial: SerialConfig,
}

/// Polling and startup-handshake configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct SensorConfig {
    /// Fixed polling interval for mains-powered operation (seconds)
    pub poll_interval_seconds: u64,
    /// Initial delay for sensor power-up before the handshake (seconds)
    pub boot_delay_seconds: u64,
    /// Max handshake attempts to get a data-bearing response
    pub max_retries: u32,
    /// Delay between handshake attempts (seconds)
    pub retry_delay_seconds: u64,
}

/// Battery-saver sleep policy
#[derive(Debug, Deserialize, Serialize)]
pub struct BatteryConfig {
    /// How often to check for rain while idle (minutes)
    pub battery_poll_minutes: u64,
    /// Shorter interval used while rain is detected (minutes)
    pub rain_poll_minutes: u64,
    /// Suspend depth: light wakes faster (~1.3mA), deep saves the most (~0.8mA)
    /// Deep suspend is a restart boundary: all volatile state is redone on wake.
    pub sleep_mode: SleepMode,
}

/// Serial port configuration (the RG-15 link is always 8N1)
#[derive(Debug, Deserialize, Serialize)]
pub struct SerialConfig {
    /// Serial device path (e.g. "/dev/serial0" on a Pi)
    pub device: String,
    /// Baud rate; the RG-15 factory default is 9600
    pub baud: u32,
}

/// Power-saving suspend depth, chosen statically in configuration
/// (never per cycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepMode {
    /// Timed suspend, program state survives
    Light,
    /// Maximum savings; wake is a full restart from the Booting state
    Deep,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debug: false,
            sensor: SensorConfig {
                poll_interval_seconds: 15,
                boot_delay_seconds: 2,
                max_retries: 5,
                retry_delay_seconds: 1,
            },
            battery: BatteryConfig {
                battery_poll_minutes: 5,
                rain_poll_minutes: 1,
                sleep_mode: SleepMode::Light,
            },
            serial: SerialConfig {
                device: "/dev/serial0".to_string(),
                baud: 9600,
            },
        }
    }
}

impl Config {
    /// Load configuration from rain-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("rain-config.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    eprintln!(
                        "Loaded configuration: {} @ {} baud",
                        config.serial.device, config.serial.baud
                    );
                    config
                }
                Err(e) => {
                    eprintln!("Warning: Invalid config file format: {}", e);
                    eprintln!("Using default configuration (/dev/serial0 @ 9600)");
                    Self::default()
                }
            },
            Err(_) => {
                eprintln!("Info: No config file found, using default configuration (/dev/serial0 @ 9600)");
                Self::default()
            }
        }
    }

    /// Save current configuration to rain-config.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("rain-config.toml", contents)?;
        eprintln!("Configuration saved to rain-config.toml");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sensor.poll_interval_seconds, 15);
        assert_eq!(config.sensor.max_retries, 5);
        assert_eq!(config.battery.battery_poll_minutes, 5);
        assert_eq!(config.battery.rain_poll_minutes, 1);
        assert_eq!(config.battery.sleep_mode, SleepMode::Light);
        assert_eq!(config.serial.device, "/dev/serial0");
        assert_eq!(config.serial.baud, 9600);
        assert!(!config.debug);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.serial.device, parsed.serial.device);
        assert_eq!(config.battery.sleep_mode, parsed.battery.sleep_mode);
        assert_eq!(
            config.sensor.poll_interval_seconds,
            parsed.sensor.poll_interval_seconds
        );
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.serial.baud, 9600);
    }

    #[test]
    fn test_sleep_mode_lowercase_names() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
debug = true

[sensor]
poll_interval_seconds = 30
boot_delay_seconds = 1
max_retries = 3
retry_delay_seconds = 1

[battery]
battery_poll_minutes = 10
rain_poll_minutes = 2
sleep_mode = "deep"

[serial]
device = "/dev/ttyUSB0"
baud = 9600
"#
        )
        .unwrap();

        let config = Config::load_from_path(file.path());
        assert!(config.debug);
        assert_eq!(config.battery.sleep_mode, SleepMode::Deep);
        assert_eq!(config.battery.battery_poll_minutes, 10);
        assert_eq!(config.serial.device, "/dev/ttyUSB0");
    }
}
