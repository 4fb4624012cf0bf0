use crate::config::Config;
use crate::error::{PanelError, Result};
use crate::input::{GamepadStick, StickSurface};
use crate::teleop::{GesturePhase, StickGesture};
use crate::telemetry::TelemetryRecord;
use crate::transport::{LoopbackTransport, Transport, TransportEvent};
use crate::viewer::JoystickViewer;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use gilrs::{Event, EventType, Gilrs};
use ratatui::layout::Rect;
use ratatui::widgets::TableState;
use std::time::{Duration, Instant};

/// Delivers at most `rate` records per second; the latest record wins.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Option<Instant>,
    pending: Option<TelemetryRecord>,
}

impl RateLimiter {
    /// Rates too small for a representable interval never release a second record.
    pub fn new(rate: f64) -> Self {
        Self {
            min_interval: Duration::try_from_secs_f64(1.0 / rate).unwrap_or(Duration::MAX),
            last: None,
            pending: None,
        }
    }

    pub fn offer(&mut self, record: TelemetryRecord) {
        self.pending = Some(record);
    }

    pub fn take(&mut self, now: Instant) -> Option<TelemetryRecord> {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.min_interval {
                return None;
            }
        }
        let record = self.pending.take()?;
        self.last = Some(now);
        Some(record)
    }
}

/// Screen regions from the last draw, used for mouse hit-testing.
#[derive(Debug, Default, Clone, Copy)]
pub struct HitAreas {
    pub stick: Rect,
    pub table: Rect,
}

pub struct App {
    pub config: Config,
    pub viewer: JoystickViewer,
    pub transport: LoopbackTransport,
    pub stick: StickSurface,
    pub table_state: TableState,
    pub areas: HitAreas,
    pub running: bool,
    gilrs: Option<Gilrs>,
    gamepad: Option<GamepadStick>,
    pub gamepad_name: Option<String>,
    limiter: RateLimiter,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let (gilrs, gamepad) = if config.controls.gamepad.enabled {
            let gilrs = Gilrs::new().map_err(|e| PanelError::Gamepad(e.to_string()))?;
            (Some(gilrs), GamepadStick::new(&config.controls.gamepad))
        } else {
            (None, None)
        };

        let mut transport = LoopbackTransport::new(
            config.transport.cmd_vel_topic.clone(),
            config.transport.message_type.clone(),
            Duration::from_millis(config.transport.telemetry_period_ms),
        );
        transport.open();

        Ok(App {
            viewer: JoystickViewer::new(&config),
            stick: StickSurface::new(&config.stick, config.teleop.max_distance),
            limiter: RateLimiter::new(
                config
                    .viewer
                    .max_update_rate
                    .min(JoystickViewer::info().max_update_rate),
            ),
            table_state: TableState::default(),
            areas: HitAreas::default(),
            running: true,
            gilrs,
            gamepad,
            gamepad_name: None,
            transport,
            config,
        })
    }

    pub fn update(&mut self, now: Instant) {
        self.poll_gamepad(now);

        while let Some(event) = self.transport.poll_event(now) {
            match event {
                TransportEvent::Message(record) => self.limiter.offer(record),
                lifecycle => self.viewer.on_transport_event(lifecycle),
            }
        }
        if let Some(record) = self.limiter.take(now) {
            self.viewer.on_data(&record);
        }

        self.viewer.tick(now, &mut self.transport);
    }

    /// How long the loop may sleep before the next command is due.
    pub fn poll_timeout(&self, now: Instant, frame: Duration) -> Duration {
        match self.viewer.time_to_next_tick(now) {
            Some(tick) => tick.min(frame),
            None => frame,
        }
    }

    fn poll_gamepad(&mut self, now: Instant) {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return;
        };
        let mut gestures = Vec::new();
        while let Some(Event { id, event, .. }) = gilrs.next_event() {
            match event {
                EventType::AxisChanged(axis, value, _) => {
                    if let Some(pad) = self.gamepad.as_mut() {
                        gestures.extend(pad.on_axis(axis, value, &mut self.stick));
                    }
                }
                EventType::Connected => {
                    let name = gilrs.gamepad(id).name().to_string();
                    log::info!("Gamepad connected: {}", name);
                    self.gamepad_name = Some(name);
                }
                EventType::Disconnected => {
                    log::info!("Gamepad disconnected");
                    self.gamepad_name = None;
                    gestures.extend(self.stick.release());
                }
                _ => {}
            }
        }
        self.dispatch(&gestures, now);
    }

    fn dispatch(&mut self, gestures: &[StickGesture], now: Instant) {
        for gesture in gestures {
            self.viewer.on_gesture(gesture, now, &mut self.transport);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.release_stick(now);
                self.running = false;
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => self.release_stick(now),
            KeyCode::Up => self.select_offset(-1),
            KeyCode::Down => self.select_offset(1),
            KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('c') => {
                if self.transport.is_connected() {
                    self.transport.close();
                } else {
                    self.transport.open();
                }
            }
            KeyCode::Char('e') => self.transport.inject_fault("fault injected from panel"),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let inner = inner_area(self.areas.stick);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.config.controls.mouse_enabled && contains(inner, mouse.column, mouse.row) {
                    let (x, y) = self.to_stick(inner, mouse.column, mouse.row);
                    let gestures = self.stick.press(x, y);
                    self.dispatch(&gestures, now);
                } else if contains(inner_area(self.areas.table), mouse.column, mouse.row) {
                    self.click_table(mouse.row);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let (x, y) = self.to_stick(inner, mouse.column, mouse.row);
                if let Some(gesture) = self.stick.drag(x, y) {
                    self.dispatch(&[gesture], now);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(gesture) = self.stick.release() {
                    self.dispatch(&[gesture], now);
                }
            }
            _ => {}
        }
    }

    fn release_stick(&mut self, now: Instant) {
        match self.stick.release() {
            Some(gesture) => self.dispatch(&[gesture], now),
            // nothing held: still send a stop
            None => self.viewer.on_gesture(
                &StickGesture {
                    angle_radians: 0.0,
                    distance_ratio: 0.0,
                    phase: GesturePhase::End,
                },
                now,
                &mut self.transport,
            ),
        }
    }

    /// Terminal cell to stick coordinates (px units, y up, origin at centre).
    fn to_stick(&self, inner: Rect, column: u16, row: u16) -> (f64, f64) {
        let radius = self.stick.radius();
        let width = inner.width.max(1) as f64;
        let height = inner.height.max(1) as f64;
        let fx = (column as f64 - inner.x as f64 + 0.5) / width;
        let fy = (row as f64 - inner.y as f64 + 0.5) / height;
        (fx * 2.0 * radius - radius, radius - fy * 2.0 * radius)
    }

    fn select_offset(&mut self, delta: isize) {
        let len = self.viewer.table().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.table_state.select(Some(next));
    }

    fn toggle_selected(&mut self) {
        let Some(selected) = self.table_state.selected() else {
            return;
        };
        let name = self.viewer.table().rows().nth(selected).map(|row| row.name.clone());
        if let Some(name) = name {
            self.viewer.toggle_field(&name);
        }
    }

    fn click_table(&mut self, row: u16) {
        let inner = inner_area(self.areas.table);
        let mut y = inner.y;
        let offset = self.table_state.offset();
        let hit = self
            .viewer
            .table()
            .rows()
            .enumerate()
            .skip(offset)
            .find(|(_, field)| {
                let height = crate::ui::row_height(field);
                let hit = row >= y && row < y.saturating_add(height);
                y = y.saturating_add(height);
                hit
            })
            .map(|(idx, _)| idx);
        if let Some(idx) = hit {
            self.table_state.select(Some(idx));
            self.toggle_selected();
        }
    }
}

fn inner_area(area: Rect) -> Rect {
    area.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    })
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rate_limiter_caps_and_keeps_latest() {
        let mut limiter = RateLimiter::new(10.0);
        let t0 = Instant::now();
        limiter.offer(TelemetryRecord::from_value(json!({"n": 1})));
        assert!(limiter.take(t0).is_some());

        limiter.offer(TelemetryRecord::from_value(json!({"n": 2})));
        limiter.offer(TelemetryRecord::from_value(json!({"n": 3})));
        assert!(limiter.take(t0 + Duration::from_millis(50)).is_none());

        let record = limiter.take(t0 + Duration::from_millis(100)).unwrap();
        assert_eq!(record.get("n"), Some(&json!(3)));
        assert!(limiter.take(t0 + Duration::from_millis(300)).is_none());
    }

    #[test]
    fn tiny_rate_holds_back_after_first_record() {
        let mut limiter = RateLimiter::new(5e-324);
        let t0 = Instant::now();
        limiter.offer(TelemetryRecord::from_value(json!({"n": 1})));
        assert!(limiter.take(t0).is_some());
        limiter.offer(TelemetryRecord::from_value(json!({"n": 2})));
        assert!(limiter.take(t0 + Duration::from_secs(3600)).is_none());

        assert!(RateLimiter::new(0.0).take(t0).is_none());
    }

    #[test]
    fn contains_is_half_open() {
        let area = Rect::new(2, 2, 4, 3);
        assert!(contains(area, 2, 2));
        assert!(contains(area, 5, 4));
        assert!(!contains(area, 6, 4));
        assert!(!contains(area, 5, 5));
    }
}
