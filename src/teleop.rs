use crate::command::{TwistMessage, VelocityCommand};
use crate::config::TeleopConfig;
use crate::error::TransportError;
use std::time::{Duration, Instant};

/// Where translated commands go. Implemented by every transport.
pub trait CommandSink {
    fn publish(&mut self, topic: &str, message: &TwistMessage) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Start,
    Move,
    End,
}

/// One sample from the input surface. Consumed immediately, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickGesture {
    pub angle_radians: f64,
    pub distance_ratio: f64, // [0, 1]
    pub phase: GesturePhase,
}

impl StickGesture {
    /// Normalizes a raw distance against the reference radius, clamped to [0, 1].
    pub fn from_polar(angle_radians: f64, distance: f64, max_distance: f64, phase: GesturePhase) -> Self {
        Self {
            angle_radians,
            distance_ratio: clamp_ratio(distance / max_distance),
            phase,
        }
    }
}

fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) }
}

/// The repeating send task of one held gesture.
#[derive(Debug, Clone, Copy)]
struct SendTimer {
    period: Duration,
    next_due: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TeleopState {
    pub linear_speed: f64,
    pub angular_speed: f64,
    pub active: bool,
    pub sent: u64,
}

pub struct CommandTranslator {
    max_linear: f64,
    max_angular: f64,
    period: Duration,
    topic: String,
    log_commands: bool,
    linear_speed: f64,
    angular_speed: f64,
    timer: Option<SendTimer>,
    sent: u64,
}

impl CommandTranslator {
    pub fn new(config: &TeleopConfig, topic: impl Into<String>) -> Self {
        Self {
            max_linear: config.max_linear,
            max_angular: config.max_angular,
            period: Duration::from_millis(config.send_period_ms),
            topic: topic.into(),
            log_commands: false,
            linear_speed: 0.0,
            angular_speed: 0.0,
            timer: None,
            sent: 0,
        }
    }

    pub fn with_command_logging(mut self, enabled: bool) -> Self {
        self.log_commands = enabled;
        self
    }

    /// Arms the send timer. Starting again while armed keeps the existing timer.
    pub fn on_gesture_start(&mut self, now: Instant) {
        if self.timer.is_some() {
            log::debug!("Gesture start while already active, keeping existing timer");
            return;
        }
        self.timer = Some(SendTimer {
            period: self.period,
            next_due: now + self.period,
        });
        log::debug!("Gesture started, sending every {:?}", self.period);
    }

    /// Updates the stored speeds. Never sends.
    pub fn on_gesture_move(&mut self, sample: &StickGesture) {
        let ratio = clamp_ratio(sample.distance_ratio);
        self.linear_speed = sample.angle_radians.sin() * self.max_linear * ratio;
        self.angular_speed = -sample.angle_radians.cos() * self.max_angular * ratio;
    }

    /// Stops the timer, then sends one zero command.
    pub fn on_gesture_end(&mut self, sink: &mut dyn CommandSink) {
        self.cancel_timer();
        self.linear_speed = 0.0;
        self.angular_speed = 0.0;
        self.send(sink, VelocityCommand::STOP);
    }

    pub fn on_gesture(&mut self, sample: &StickGesture, now: Instant, sink: &mut dyn CommandSink) {
        match sample.phase {
            // start only arms the timer; speeds come from moves past the dead zone
            GesturePhase::Start => self.on_gesture_start(now),
            GesturePhase::Move => self.on_gesture_move(sample),
            GesturePhase::End => self.on_gesture_end(sink),
        }
    }

    /// Timer tick. Sends at most one command per call; missed periods are not replayed.
    pub fn poll(&mut self, now: Instant, sink: &mut dyn CommandSink) {
        let Some(timer) = self.timer.as_mut() else {
            return;
        };
        if now < timer.next_due {
            return;
        }
        timer.next_due = now + timer.period;
        let command = self.current_command();
        self.send(sink, command);
    }

    /// Time left until the next tick, if a gesture is held.
    pub fn time_to_next_tick(&self, now: Instant) -> Option<Duration> {
        self.timer
            .map(|timer| timer.next_due.saturating_duration_since(now))
    }

    pub fn current_command(&self) -> VelocityCommand {
        VelocityCommand::new(self.linear_speed, self.angular_speed)
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    pub fn state(&self) -> TeleopState {
        TeleopState {
            linear_speed: self.linear_speed,
            angular_speed: self.angular_speed,
            active: self.is_active(),
            sent: self.sent,
        }
    }

    fn cancel_timer(&mut self) {
        if self.timer.take().is_some() {
            log::debug!("Gesture ended, send timer cancelled");
        }
    }

    fn send(&mut self, sink: &mut dyn CommandSink, command: VelocityCommand) {
        if self.log_commands {
            log::debug!(
                "{} <- linear={:.3} angular={:.3}",
                self.topic, command.linear, command.angular
            );
        }
        match sink.publish(&self.topic, &command.to_twist()) {
            Ok(()) => self.sent += 1,
            Err(e) => log::warn!("Failed to publish on {}: {}", self.topic, e),
        }
    }
}
