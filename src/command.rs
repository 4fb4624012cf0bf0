//! Velocity commands and their `geometry_msgs/Twist` wire shape.

use serde::{Deserialize, Serialize};

/// Linear/angular speed pair sent to the device. No identity beyond its values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityCommand {
    pub linear: f64,  // m/s
    pub angular: f64, // rad/s
}

impl VelocityCommand {
    pub const STOP: VelocityCommand = VelocityCommand {
        linear: 0.0,
        angular: 0.0,
    };

    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    pub fn is_stop(&self) -> bool {
        self.linear == 0.0 && self.angular == 0.0
    }

    /// Only `linear.x` and `angular.z` are populated.
    pub fn to_twist(self) -> TwistMessage {
        TwistMessage {
            linear: Vector3 {
                x: self.linear,
                y: 0.0,
                z: 0.0,
            },
            angular: Vector3 {
                x: 0.0,
                y: 0.0,
                z: self.angular,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 3D-linear/3D-angular velocity message.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TwistMessage {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl TwistMessage {
    pub fn to_command(&self) -> VelocityCommand {
        VelocityCommand::new(self.linear.x, self.angular.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twist_carries_only_forward_and_yaw() {
        let twist = VelocityCommand::new(1.5, -0.25).to_twist();
        let json = serde_json::to_value(twist).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "linear": {"x": 1.5, "y": 0.0, "z": 0.0},
                "angular": {"x": 0.0, "y": 0.0, "z": -0.25}
            })
        );
    }

    #[test]
    fn stop_is_all_zero() {
        assert!(VelocityCommand::STOP.is_stop());
        assert_eq!(VelocityCommand::STOP.to_twist(), TwistMessage::default());
    }
}
