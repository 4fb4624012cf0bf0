use crate::config::{GamepadConfig, StickConfig, parse_axis_name};
use crate::teleop::{GesturePhase, StickGesture};
use gilrs::Axis;
use std::collections::HashMap;

/// Virtual stick. Turns pointer positions (relative to the stick centre,
/// y up) into start/move/end gestures.
#[derive(Debug, Clone)]
pub struct StickSurface {
    radius: f64,
    max_distance: f64,
    threshold: f64,
    active: bool,
    knob: (f64, f64),
}

impl StickSurface {
    /// `max_distance` is the reference radius speeds are normalized against.
    pub fn new(config: &StickConfig, max_distance: f64) -> Self {
        Self {
            radius: config.size / 2.0,
            max_distance,
            threshold: config.threshold,
            active: false,
            knob: (0.0, 0.0),
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Knob offset from the centre, clamped to the stick radius.
    pub fn knob(&self) -> (f64, f64) {
        self.knob
    }

    pub fn press(&mut self, x: f64, y: f64) -> Vec<StickGesture> {
        let mut gestures = Vec::new();
        if !self.active {
            self.active = true;
            gestures.push(self.sample(x, y, GesturePhase::Start));
        }
        gestures.extend(self.drag(x, y));
        gestures
    }

    /// `None` while inactive or inside the dead zone.
    pub fn drag(&mut self, x: f64, y: f64) -> Option<StickGesture> {
        if !self.active {
            return None;
        }
        let sample = self.sample(x, y, GesturePhase::Move);
        if sample.distance_ratio < self.threshold {
            return None;
        }
        Some(sample)
    }

    pub fn release(&mut self) -> Option<StickGesture> {
        if !self.active {
            return None;
        }
        self.active = false;
        self.knob = (0.0, 0.0);
        Some(StickGesture {
            angle_radians: 0.0,
            distance_ratio: 0.0,
            phase: GesturePhase::End,
        })
    }

    fn sample(&mut self, x: f64, y: f64, phase: GesturePhase) -> StickGesture {
        let distance = x.hypot(y).min(self.radius);
        let angle = y.atan2(x).rem_euclid(std::f64::consts::TAU);
        self.knob = (distance * angle.cos(), distance * angle.sin());
        StickGesture::from_polar(angle, distance, self.max_distance, phase)
    }
}

/// Drives a `StickSurface` from a gamepad stick. The stick counts as held
/// while it is outside the dead zone.
pub struct GamepadStick {
    x_axis: Axis,
    y_axis: Axis,
    invert_x: bool,
    invert_y: bool,
    axes: HashMap<Axis, f32>,
}

impl GamepadStick {
    pub fn new(config: &GamepadConfig) -> Option<Self> {
        Some(Self {
            x_axis: parse_axis_name(&config.x_axis)?,
            y_axis: parse_axis_name(&config.y_axis)?,
            invert_x: config.invert_x,
            invert_y: config.invert_y,
            axes: HashMap::new(),
        })
    }

    /// Records an axis change and returns the resulting gestures.
    pub fn on_axis(&mut self, axis: Axis, value: f32, surface: &mut StickSurface) -> Vec<StickGesture> {
        if axis != self.x_axis && axis != self.y_axis {
            return Vec::new();
        }
        self.axes.insert(axis, value);

        let (x, y) = self.position();
        let ratio = x.hypot(y);
        let radius = surface.radius();
        let held = ratio >= surface.threshold && ratio > 0.0;

        match (held, surface.is_active()) {
            (true, false) => surface.press(x * radius, y * radius),
            (true, true) => surface.drag(x * radius, y * radius).into_iter().collect(),
            (false, true) => surface.release().into_iter().collect(),
            (false, false) => Vec::new(),
        }
    }

    fn position(&self) -> (f64, f64) {
        let read = |axis: Axis, invert: bool| {
            let value = self.axes.get(&axis).copied().unwrap_or(0.0) as f64;
            if invert { -value } else { value }
        };
        (read(self.x_axis, self.invert_x), read(self.y_axis, self.invert_y))
    }
}
