//! The joystick viewer widget: sends stick gestures as velocity commands and
//! shows incoming telemetry as a live field table.
//!
//! The two flows never touch each other's state. The host feeds gestures
//! and transport events in one at a time from a single loop.

use crate::config::Config;
use crate::status::ConnectionStatus;
use crate::table::FieldTable;
use crate::teleop::{CommandSink, CommandTranslator, StickGesture, TeleopState};
use crate::telemetry::TelemetryRecord;
use crate::transport::TransportEvent;
use std::time::{Duration, Instant};

/// Capability metadata handed to the host at registration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerInfo {
    pub friendly_name: &'static str,
    pub supported_types: &'static [&'static str],
    pub max_update_rate: f64,
}

impl ViewerInfo {
    pub fn supports(&self, message_type: &str) -> bool {
        self.supported_types.contains(&message_type)
    }
}

pub const JOYSTICK_VIEWER_INFO: ViewerInfo = ViewerInfo {
    friendly_name: "Control plot and override",
    supported_types: &["geometry_msgs/msg/Twist"],
    max_update_rate: 30.0,
};

pub struct JoystickViewer {
    translator: CommandTranslator,
    table: FieldTable,
    status: ConnectionStatus,
    default_label: String,
}

impl JoystickViewer {
    pub fn new(config: &Config) -> Self {
        let translator = CommandTranslator::new(&config.teleop, config.transport.cmd_vel_topic.clone())
            .with_command_logging(config.debug.log_commands);
        Self {
            translator,
            table: FieldTable::new(),
            status: ConnectionStatus::default(),
            default_label: config.transport.cmd_vel_topic.clone(),
        }
    }

    pub fn info() -> &'static ViewerInfo {
        &JOYSTICK_VIEWER_INFO
    }

    pub fn on_gesture(&mut self, gesture: &StickGesture, now: Instant, sink: &mut dyn CommandSink) {
        self.translator.on_gesture(gesture, now, sink);
    }

    /// Drives the send timer.
    pub fn tick(&mut self, now: Instant, sink: &mut dyn CommandSink) {
        self.translator.poll(now, sink);
    }

    pub fn time_to_next_tick(&self, now: Instant) -> Option<Duration> {
        self.translator.time_to_next_tick(now)
    }

    pub fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Lifecycle(lifecycle) => {
                let next = self.status.on_event(&lifecycle);
                if next != self.status {
                    log::info!("Connection status {} -> {}", self.status, next);
                }
                self.status = next;
                // the row itself only appears with the first record
                if self.table.status_row().is_some() {
                    self.table.render_status(self.status);
                }
            }
            TransportEvent::Message(record) => self.on_data(&record),
        }
    }

    pub fn on_data(&mut self, record: &TelemetryRecord) {
        let label = record
            .source_label()
            .unwrap_or(self.default_label.as_str())
            .to_string();
        self.table.on_record(record, &label, self.status);
    }

    pub fn toggle_field(&mut self, name: &str) -> bool {
        self.table.toggle(name)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn table(&self) -> &FieldTable {
        &self.table
    }

    pub fn teleop(&self) -> TeleopState {
        self.translator.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::LifecycleEvent;
    use serde_json::json;

    #[test]
    fn metadata() {
        let info = JoystickViewer::info();
        assert_eq!(info.friendly_name, "Control plot and override");
        assert!(info.supports("geometry_msgs/msg/Twist"));
        assert!(!info.supports("sensor_msgs/msg/Image"));
        assert_eq!(info.max_update_rate, 30.0);
    }

    #[test]
    fn status_row_waits_for_first_record() {
        let mut viewer = JoystickViewer::new(&Config::default());
        viewer.on_transport_event(TransportEvent::Lifecycle(LifecycleEvent::Connection));
        assert!(viewer.table().is_empty());
        assert_eq!(viewer.status(), ConnectionStatus::Connected);

        viewer.on_transport_event(TransportEvent::Message(TelemetryRecord::from_value(json!({"a": 1}))));
        assert_eq!(viewer.table().status_row().unwrap().cell.text, "Connected");

        viewer.on_transport_event(TransportEvent::Lifecycle(LifecycleEvent::Error("boom".into())));
        assert_eq!(viewer.table().status_row().unwrap().cell.text, "Error");
    }

    #[test]
    fn missing_topic_name_uses_command_topic() {
        let mut viewer = JoystickViewer::new(&Config::default());
        viewer.on_data(&TelemetryRecord::from_value(json!({"a": 1})));
        assert_eq!(viewer.table().title(), "/cmd_vel");
    }
}
