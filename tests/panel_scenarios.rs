use serde_json::json;
use std::f64::consts::PI;
use std::time::{Duration, Instant};
use twist_panel::input::StickSurface;
use twist_panel::table::Tone;
use twist_panel::{
    CommandSink, Config, ConnectionStatus, GesturePhase, JoystickViewer, LifecycleEvent, LoopbackTransport,
    StickGesture, TelemetryRecord, Transport, TransportError, TransportEvent, TwistMessage, VelocityCommand,
};

#[derive(Default)]
struct RecordingSink {
    sent: Vec<(String, TwistMessage)>,
}

impl RecordingSink {
    fn commands(&self) -> Vec<VelocityCommand> {
        self.sent.iter().map(|(_, twist)| twist.to_command()).collect()
    }
}

impl CommandSink for RecordingSink {
    fn publish(&mut self, topic: &str, message: &TwistMessage) -> Result<(), TransportError> {
        self.sent.push((topic.to_string(), *message));
        Ok(())
    }
}

fn gesture(angle: f64, distance: f64, phase: GesturePhase) -> StickGesture {
    StickGesture::from_polar(angle, distance, 75.0, phase)
}

#[test]
fn test_hold_right_then_release() {
    let mut viewer = JoystickViewer::new(&Config::default());
    let mut sink = RecordingSink::default();
    let t0 = Instant::now();

    viewer.on_gesture(&gesture(0.0, 0.0, GesturePhase::Start), t0, &mut sink);
    viewer.on_gesture(&gesture(0.0, 75.0, GesturePhase::Move), t0, &mut sink);
    viewer.tick(t0 + Duration::from_millis(30), &mut sink);
    viewer.on_gesture(&gesture(0.0, 0.0, GesturePhase::End), t0 + Duration::from_millis(35), &mut sink);
    viewer.tick(t0 + Duration::from_millis(200), &mut sink);

    let commands = sink.commands();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].linear.abs() < 1e-9);
    assert!((commands[0].angular + 2.0).abs() < 1e-9);
    assert_eq!(commands[1], VelocityCommand::STOP);
    assert!(sink.sent.iter().all(|(topic, _)| topic == "/cmd_vel"));

    let (_, twist) = &sink.sent[0];
    assert_eq!(twist.linear.y, 0.0);
    assert_eq!(twist.angular.x, 0.0);
}

#[test]
fn test_speed_bounds_over_full_circle() {
    let mut viewer = JoystickViewer::new(&Config::default());
    let mut sink = RecordingSink::default();
    let t0 = Instant::now();
    viewer.on_gesture(&gesture(0.0, 0.0, GesturePhase::Start), t0, &mut sink);

    for step in 0..360 {
        let angle = step as f64 * 2.0 * PI / 360.0;
        for distance in [0.0, 20.0, 74.9, 75.0, 500.0] {
            viewer.on_gesture(&gesture(angle, distance, GesturePhase::Move), t0, &mut sink);
            let state = viewer.teleop();
            assert!(state.linear_speed.abs() <= 5.0 + 1e-12);
            assert!(state.angular_speed.abs() <= 2.0 + 1e-12);
        }
    }
}

#[test]
fn test_stick_surface_drives_viewer() {
    let config = Config::default();
    let mut stick = StickSurface::new(&config.stick, config.teleop.max_distance);
    let mut viewer = JoystickViewer::new(&config);
    let mut sink = RecordingSink::default();
    let t0 = Instant::now();

    for g in stick.press(0.0, 75.0) {
        viewer.on_gesture(&g, t0, &mut sink);
    }
    viewer.tick(t0 + Duration::from_millis(25), &mut sink);
    viewer.tick(t0 + Duration::from_millis(50), &mut sink);
    if let Some(g) = stick.release() {
        viewer.on_gesture(&g, t0 + Duration::from_millis(60), &mut sink);
    }

    let commands = sink.commands();
    assert_eq!(commands.len(), 3);
    assert!((commands[0].linear - 5.0).abs() < 1e-9);
    assert!((commands[1].linear - 5.0).abs() < 1e-9);
    assert!(commands[2].is_stop());
}

#[test]
fn test_press_inside_dead_zone_sends_only_zero() {
    let config = Config::default();
    let mut stick = StickSurface::new(&config.stick, config.teleop.max_distance);
    let mut viewer = JoystickViewer::new(&config);
    let mut sink = RecordingSink::default();
    let t0 = Instant::now();

    // 7 of 75 is under the 0.1 threshold
    for g in stick.press(7.0, 0.0) {
        viewer.on_gesture(&g, t0, &mut sink);
    }
    assert!(stick.drag(7.0, 0.0).is_none());
    viewer.tick(t0 + Duration::from_millis(25), &mut sink);
    viewer.tick(t0 + Duration::from_millis(50), &mut sink);
    if let Some(g) = stick.release() {
        viewer.on_gesture(&g, t0 + Duration::from_millis(60), &mut sink);
    }

    let commands = sink.commands();
    assert_eq!(commands.len(), 3);
    assert!(commands.iter().all(VelocityCommand::is_stop));
}

#[test]
fn test_first_record_scenario() {
    let mut viewer = JoystickViewer::new(&Config::default());
    viewer.on_data(&TelemetryRecord::from_value(json!({"a": true, "b": [1, 2, 3]})));

    let table = viewer.table();
    let names: Vec<&str> = table.field_rows().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(table.row("a").unwrap().cell.text, "true");
    assert_eq!(table.row("a").unwrap().cell.tone, Tone::True);
    assert_eq!(table.row("b").unwrap().cell.text, "[\n  1,\n  2,\n  3\n]");
    assert_eq!(table.status_row().unwrap().cell.text, "Closed");
}

#[test]
fn test_status_follows_transport_events() {
    let mut viewer = JoystickViewer::new(&Config::default());
    viewer.on_data(&TelemetryRecord::from_value(json!({"a": 1})));

    let mut shown = Vec::new();
    for event in [
        LifecycleEvent::Error("refused".to_string()),
        LifecycleEvent::Close,
        LifecycleEvent::Connection,
    ] {
        viewer.on_transport_event(TransportEvent::Lifecycle(event));
        viewer.on_data(&TelemetryRecord::from_value(json!({"a": 1})));
        shown.push(viewer.table().status_row().unwrap().cell.text.clone());
    }
    assert_eq!(shown, vec!["Error", "Closed", "Connected"]);
    assert_eq!(viewer.status(), ConnectionStatus::Connected);
}

#[test]
fn test_toggle_persists_across_sparse_records() {
    let mut viewer = JoystickViewer::new(&Config::default());
    viewer.on_data(&TelemetryRecord::from_value(json!({"pose": {"x": 1}, "seq": 1})));
    assert!(viewer.toggle_field("pose"));
    viewer.on_data(&TelemetryRecord::from_value(json!({"seq": 2})));

    let pose = viewer.table().row("pose").unwrap();
    assert!(pose.expanded);
    assert_eq!(pose.cell.text, "{\n  \"x\": 1\n}");
    assert_eq!(viewer.table().row("seq").unwrap().cell.text, "2");
}

#[test]
fn test_loopback_round_trip() {
    let config = Config::default();
    let mut viewer = JoystickViewer::new(&config);
    let mut transport = LoopbackTransport::new("/cmd_vel", "geometry_msgs/Twist", Duration::from_millis(100));
    let t0 = Instant::now();
    transport.open();

    viewer.on_gesture(&gesture(PI / 2.0, 75.0, GesturePhase::Start), t0, &mut transport);
    viewer.on_gesture(&gesture(PI / 2.0, 75.0, GesturePhase::Move), t0, &mut transport);
    viewer.tick(t0 + Duration::from_millis(25), &mut transport);
    assert!(transport.is_connected());
    assert_eq!(transport.last_twist().linear.x, 5.0);

    while let Some(event) = transport.poll_event(t0 + Duration::from_millis(25)) {
        viewer.on_transport_event(event);
    }

    let table = viewer.table();
    assert_eq!(table.title(), "/cmd_vel");
    assert_eq!(table.status_row().unwrap().cell.text, "Connected");
    assert_eq!(table.row("moving").unwrap().cell.text, "true");
    assert_eq!(table.row("scan").unwrap().cell.text, "(compressed)");
    assert_eq!(table.row("device").unwrap().cell.tone, Tone::Muted);
    assert_eq!(table.row("device").unwrap().cell.text.len(), 32);
}
