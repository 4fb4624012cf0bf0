use crate::command::TwistMessage;
use crate::error::TransportError;
use crate::status::LifecycleEvent;
use crate::teleop::CommandSink;
use crate::telemetry::TelemetryRecord;
use serde_json::json;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Lifecycle(LifecycleEvent),
    Message(TelemetryRecord),
}

/// Connection to the remote device. Reconnects and retries are the transport's business.
pub trait Transport: CommandSink {
    /// Next pending event, if any. Never blocks.
    fn poll_event(&mut self, now: Instant) -> Option<TransportEvent>;

    fn is_connected(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Pose2D {
    /// Unicycle integration over `dt` seconds.
    pub fn advance(&mut self, linear: f64, angular: f64, dt: f64) {
        self.theta += angular * dt;
        self.x += linear * self.theta.cos() * dt;
        self.y += linear * self.theta.sin() * dt;
    }
}

/// In-process simulated differential-drive robot.
///
/// Accepts twists on the command topic and reports what it is doing on the
/// telemetry topic every `telemetry_period`.
pub struct LoopbackTransport {
    command_topic: String,
    command_type: String,
    telemetry_topic: String,
    telemetry_period: Duration,
    connected: bool,
    pending: VecDeque<TransportEvent>,
    last_twist: TwistMessage,
    received: u64,
    pose: Pose2D,
    last_step: Option<Instant>,
    next_report: Option<Instant>,
    device_id: [u8; 16],
}

impl LoopbackTransport {
    pub fn new(command_topic: impl Into<String>, command_type: impl Into<String>, telemetry_period: Duration) -> Self {
        let command_topic = command_topic.into();
        Self {
            telemetry_topic: command_topic.clone(),
            command_topic,
            command_type: command_type.into(),
            telemetry_period,
            connected: false,
            pending: VecDeque::new(),
            last_twist: TwistMessage::default(),
            received: 0,
            pose: Pose2D::default(),
            last_step: None,
            next_report: None,
            device_id: [
                0x7a, 0x1c, 0x03, 0xe9, 0x5b, 0x42, 0x4f, 0x10, 0x9d, 0x06, 0xc2, 0x38, 0x81, 0xfa, 0x00, 0x5e,
            ],
        }
    }

    pub fn open(&mut self) {
        if self.connected {
            return;
        }
        self.connected = true;
        self.next_report = None;
        self.last_step = None;
        self.pending.push_back(TransportEvent::Lifecycle(LifecycleEvent::Connection));
        log::info!(
            "Loopback device connected, accepting {} on {}",
            self.command_type, self.command_topic
        );
    }

    pub fn close(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        self.last_twist = TwistMessage::default();
        self.pending.push_back(TransportEvent::Lifecycle(LifecycleEvent::Close));
        log::info!("Loopback device closed");
    }

    /// Reports an error and drops the link; the close follows the error.
    pub fn inject_fault(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Loopback device fault: {}", reason);
        self.pending
            .push_back(TransportEvent::Lifecycle(LifecycleEvent::Error(reason)));
        self.close();
    }

    pub fn command_type(&self) -> &str {
        &self.command_type
    }

    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn last_twist(&self) -> TwistMessage {
        self.last_twist
    }

    fn step(&mut self, now: Instant) {
        if let Some(last) = self.last_step {
            let dt = now.saturating_duration_since(last).as_secs_f64();
            self.pose
                .advance(self.last_twist.linear.x, self.last_twist.angular.z, dt);
        }
        self.last_step = Some(now);
    }

    fn report(&self) -> TelemetryRecord {
        let twist = &self.last_twist;
        let moving = twist.linear.x != 0.0 || twist.angular.z != 0.0;
        TelemetryRecord::new()
            .with_field("_topic_name", json!(self.telemetry_topic))
            .with_field("_topic_type", json!("geometry_msgs/msg/Twist"))
            .with_field("__comp", json!(["scan"]))
            .with_field("linear", json!(twist.linear))
            .with_field("angular", json!(twist.angular))
            .with_field("moving", json!(moving))
            .with_field(
                "pose",
                json!({"x": self.pose.x, "y": self.pose.y, "theta": self.pose.theta}),
            )
            .with_field("commands", json!(self.received))
            .with_field("device", json!({"uuid": self.device_id}))
            .with_field("scan", json!("eJzLSM3JyVcozy/KSQEAGgQEXQ=="))
    }
}

/// ROS 1 and ROS 2 spellings of the velocity message.
fn is_twist_type(message_type: &str) -> bool {
    matches!(message_type, "geometry_msgs/Twist" | "geometry_msgs/msg/Twist")
}

impl CommandSink for LoopbackTransport {
    fn publish(&mut self, topic: &str, message: &TwistMessage) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if topic != self.command_topic {
            return Err(TransportError::UnknownTopic(topic.to_string()));
        }
        if !is_twist_type(&self.command_type) {
            return Err(TransportError::UnsupportedType(self.command_type.clone()));
        }
        self.last_twist = *message;
        self.received += 1;
        Ok(())
    }
}

impl Transport for LoopbackTransport {
    fn poll_event(&mut self, now: Instant) -> Option<TransportEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        if !self.connected {
            return None;
        }

        self.step(now);
        let due = *self.next_report.get_or_insert(now);
        if now < due {
            return None;
        }
        self.next_report = Some(now + self.telemetry_period);
        Some(TransportEvent::Message(self.report()))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
