use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Slowest accepted host refresh, in records per second.
pub const MIN_UPDATE_RATE: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub teleop: TeleopConfig,
    pub stick: StickConfig,
    pub transport: TransportConfig,
    pub viewer: ViewerConfig,
    pub controls: ControlsConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeleopConfig {
    pub max_linear: f64,  // m/s
    pub max_angular: f64, // rad/s
    pub max_distance: f64, // stick radius in px
    pub send_period_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickConfig {
    pub size: f64,
    pub threshold: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub cmd_vel_topic: String,
    pub message_type: String,
    pub telemetry_period_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub max_update_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsConfig {
    pub mouse_enabled: bool,
    pub gamepad: GamepadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamepadConfig {
    pub enabled: bool,
    pub x_axis: String,
    pub y_axis: String,
    pub invert_x: bool,
    pub invert_y: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    pub log_file: String,
    pub log_commands: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            teleop: TeleopConfig {
                max_linear: 5.0,
                max_angular: 2.0,
                max_distance: 75.0,
                send_period_ms: 25,
            },
            stick: StickConfig {
                size: 150.0,
                threshold: 0.1,
                color: "red".to_string(),
            },
            transport: TransportConfig {
                cmd_vel_topic: "/cmd_vel".to_string(),
                message_type: "geometry_msgs/Twist".to_string(),
                telemetry_period_ms: 100,
            },
            viewer: ViewerConfig {
                max_update_rate: 30.0,
            },
            controls: ControlsConfig {
                mouse_enabled: true,
                gamepad: GamepadConfig {
                    enabled: true,
                    x_axis: "LeftStickX".to_string(),
                    y_axis: "LeftStickY".to_string(),
                    invert_x: false,
                    invert_y: false,
                },
            },
            debug: DebugConfig {
                log_file: "twist_panel.log".to_string(),
                log_commands: false,
            },
        }
    }
}

impl Config {
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };

        let config = if path.exists() {
            let content = fs::read_to_string(path).map_err(io_err)?;
            toml::from_str::<Config>(&content)?
        } else {
            let default_config = Config::default();
            let toml_string = toml::to_string_pretty(&default_config)?;
            fs::write(path, toml_string).map_err(io_err)?;
            log::info!("Created default config file at {}", path.display());
            default_config
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("teleop.max_linear", self.teleop.max_linear),
            ("teleop.max_angular", self.teleop.max_angular),
            ("teleop.max_distance", self.teleop.max_distance),
            ("stick.size", self.stick.size),
            ("viewer.max_update_rate", self.viewer.max_update_rate),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(invalid(field, format!("must be positive, got {}", value)));
            }
        }

        if self.viewer.max_update_rate < MIN_UPDATE_RATE {
            return Err(invalid(
                "viewer.max_update_rate",
                format!("must be at least {} Hz, got {}", MIN_UPDATE_RATE, self.viewer.max_update_rate),
            ));
        }

        if self.teleop.send_period_ms == 0 {
            return Err(invalid("teleop.send_period_ms", "must be non-zero".to_string()));
        }
        if self.transport.telemetry_period_ms == 0 {
            return Err(invalid("transport.telemetry_period_ms", "must be non-zero".to_string()));
        }
        if !(0.0..1.0).contains(&self.stick.threshold) {
            return Err(invalid(
                "stick.threshold",
                format!("must be in [0, 1), got {}", self.stick.threshold),
            ));
        }
        if self.transport.cmd_vel_topic.is_empty() {
            return Err(invalid("transport.cmd_vel_topic", "must not be empty".to_string()));
        }

        let gamepad = &self.controls.gamepad;
        for (field, name) in [("controls.gamepad.x_axis", &gamepad.x_axis), ("controls.gamepad.y_axis", &gamepad.y_axis)] {
            if parse_axis_name(name).is_none() {
                return Err(invalid(field, format!("unknown axis '{}'", name)));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason,
    }
}

// Helper to parse axis names to gilrs Axis enum
pub fn parse_axis_name(name: &str) -> Option<gilrs::Axis> {
    match name {
        "LeftStickX" => Some(gilrs::Axis::LeftStickX),
        "LeftStickY" => Some(gilrs::Axis::LeftStickY),
        "LeftZ" => Some(gilrs::Axis::LeftZ),
        "RightStickX" => Some(gilrs::Axis::RightStickX),
        "RightStickY" => Some(gilrs::Axis::RightStickY),
        "RightZ" => Some(gilrs::Axis::RightZ),
        "DPadX" => Some(gilrs::Axis::DPadX),
        "DPadY" => Some(gilrs::Axis::DPadY),
        _ => None,
    }
}

/// Parses the stick colour name used by the canvas.
pub fn parse_color_name(name: &str) -> ratatui::style::Color {
    use ratatui::style::Color;
    match name.to_ascii_lowercase().as_str() {
        "red" => Color::Red,
        "green" => Color::Green,
        "blue" => Color::Blue,
        "yellow" => Color::Yellow,
        "cyan" => Color::Cyan,
        "magenta" => Color::Magenta,
        "white" => Color::White,
        _ => Color::LightRed,
    }
}
