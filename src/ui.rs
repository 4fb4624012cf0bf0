use crate::app::App;
use crate::config::parse_color_name;
use crate::status::ConnectionStatus;
use crate::table::FieldRow;
use crate::viewer::JoystickViewer;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::canvas::{Canvas, Circle, Line as CanvasLine},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
};

pub fn row_height(row: &FieldRow) -> u16 {
    if row.expanded {
        row.cell.display_lines().len().max(1) as u16
    } else {
        1
    }
}

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    draw_header(frame, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40), // Stick and command readout
            Constraint::Percentage(60), // Field table
        ])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(8)])
        .split(body[0]);

    draw_stick(frame, left[0], app);
    draw_command(frame, left[1], app);
    draw_table(frame, body[1], app);

    app.areas.stick = left[0];
    app.areas.table = body[1];

    let help = Paragraph::new(
        "drag stick: drive | space/x: stop | ↑↓ Enter/click: expand field | c: connect/close | e: fault | q: quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[2]);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = app.viewer.table().title();
    let title = if title.is_empty() { "(no data yet)" } else { title };
    let gamepad = match &app.gamepad_name {
        Some(name) => format!("🎮 {}", name),
        None => "🎮 none".to_string(),
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("🕹️  {} ", JoystickViewer::info().friendly_name),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!("| {} | {}", title, gamepad)),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_stick(frame: &mut Frame, area: Rect, app: &App) {
    let radius = app.stick.radius();
    let (knob_x, knob_y) = app.stick.knob();
    let knob_color = parse_color_name(&app.config.stick.color);
    let dead_zone = radius * app.config.stick.threshold;
    let active = app.stick.is_active();

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title("🕹️  Stick"))
        .paint(|ctx| {
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius,
                color: Color::White,
            });
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius: dead_zone,
                color: Color::DarkGray,
            });
            ctx.draw(&CanvasLine {
                x1: -radius * 0.2,
                y1: 0.0,
                x2: radius * 0.2,
                y2: 0.0,
                color: Color::Gray,
            });
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: -radius * 0.2,
                x2: 0.0,
                y2: radius * 0.2,
                color: Color::Gray,
            });
            ctx.draw(&Circle {
                x: knob_x,
                y: knob_y,
                radius: radius * 0.12,
                color: if active { knob_color } else { Color::DarkGray },
            });
        })
        .x_bounds([-radius, radius])
        .y_bounds([-radius, radius]);
    frame.render_widget(canvas, area);
}

fn draw_command(frame: &mut Frame, area: Rect, app: &App) {
    let teleop = app.viewer.teleop();
    let max_linear = app.config.teleop.max_linear;
    let max_angular = app.config.teleop.max_angular;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("📤 {} ({} sent)", app.config.transport.cmd_vel_topic, teleop.sent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3)])
        .split(inner);

    let gauges = [
        ("linear.x (m/s)", teleop.linear_speed, max_linear, Color::LightRed),
        ("angular.z (rad/s)", teleop.angular_speed, max_angular, Color::LightBlue),
    ];
    for (i, (label, value, max, color)) in gauges.into_iter().enumerate() {
        let percentage = (((value / max) + 1.0) * 50.0).clamp(0.0, 100.0) as u16;
        let gauge = Gauge::default()
            .block(Block::default().title(label))
            .gauge_style(Style::default().fg(color))
            .percent(percentage)
            .label(format!("{:+.3}", value));
        frame.render_widget(gauge, rows[i]);
    }
}

fn draw_table(frame: &mut Frame, area: Rect, app: &mut App) {
    let table = app.viewer.table();
    let rows: Vec<Row> = table
        .rows()
        .map(|field| {
            let lines: Vec<Line> = field.cell.display_lines().into_iter().map(Line::from).collect();
            Row::new(vec![
                Cell::from(Span::styled(
                    field.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Cell::from(Text::from(lines)).style(Style::default().fg(field.cell.tone.color())),
            ])
            .height(row_height(field))
        })
        .collect();

    let border_color = match app.viewer.status() {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Closed => Color::Yellow,
        ConnectionStatus::Error => Color::Red,
    };
    let widget = Table::new(rows, [Constraint::Percentage(40), Constraint::Percentage(60)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title("📊 Telemetry"),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(widget, area, &mut app.table_state);
}
