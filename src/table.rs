use crate::status::ConnectionStatus;
use crate::telemetry::{FieldValue, TelemetryRecord, hex_fingerprint};
use ratatui::style::Color;
use serde_json::Value;
use std::collections::HashMap;

pub const STATUS_ROW: &str = "Status";
pub const COMPRESSED_PLACEHOLDER: &str = "(compressed)";
const NBSP: char = '\u{a0}';
// 2^53, the largest float that still maps to an exact integer
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Cell colour roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Plain,
    Muted,
    Warning,
    Connected,
    Failure,
    True,
    False,
}

impl Tone {
    pub fn color(self) -> Color {
        match self {
            Tone::Plain => Color::Reset,
            Tone::Muted => Color::Rgb(0x80, 0x80, 0x80),
            Tone::Warning => Color::Rgb(0xff, 0xff, 0x00),
            Tone::Connected => Color::Rgb(0x00, 0xff, 0x00),
            Tone::Failure => Color::Rgb(0xff, 0x00, 0x00),
            Tone::True => Color::Rgb(0x80, 0xff, 0x80),
            Tone::False => Color::Rgb(0xff, 0x80, 0x80),
        }
    }
}

/// How a cell's whitespace is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Whitespace {
    /// Runs of whitespace flow into single spaces.
    #[default]
    Collapse,
    /// Line breaks kept, spaces shown as non-breaking.
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
    pub whitespace: Whitespace,
}

impl Cell {
    fn plain(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
            whitespace: Whitespace::Collapse,
        }
    }

    pub fn display_lines(&self) -> Vec<String> {
        match self.whitespace {
            Whitespace::Collapse => vec![self.text.split_whitespace().collect::<Vec<_>>().join(" ")],
            Whitespace::Preserve => self
                .text
                .split('\n')
                .map(|line| line.replace(' ', &NBSP.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    pub name: String,
    pub cell: Cell,
    pub expanded: bool,
}

impl FieldRow {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cell: Cell::default(),
            expanded: false,
        }
    }
}

/// Rows in order of first appearance, looked up by name. Rows are never freed.
#[derive(Debug, Default)]
pub struct FieldTable {
    title: String,
    status: Option<FieldRow>,
    rows: Vec<FieldRow>,
    index: HashMap<String, usize>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full in-place re-render from the latest record.
    pub fn on_record(&mut self, record: &TelemetryRecord, source_label: &str, status: ConnectionStatus) {
        self.title = source_label.to_string();
        self.render_status(status);

        for (name, value) in record.visible_fields() {
            let idx = self.ensure_row(name);
            let row = &mut self.rows[idx];
            row.cell = render_value(record.classify(name, value), row.expanded);
        }
    }

    /// Refreshes only the status row, e.g. on a lifecycle event between records.
    pub fn render_status(&mut self, status: ConnectionStatus) {
        let row = self.status.get_or_insert_with(|| FieldRow::new(STATUS_ROW));
        row.cell = Cell::plain(status.label(), status.tone());
    }

    /// Click handler: flips the field's expanded flag. Takes effect on the next record.
    pub fn toggle(&mut self, name: &str) -> bool {
        if name == STATUS_ROW {
            if let Some(row) = self.status.as_mut() {
                row.expanded = !row.expanded;
                return true;
            }
            return false;
        }
        match self.index.get(name) {
            Some(&idx) => {
                let row = &mut self.rows[idx];
                row.expanded = !row.expanded;
                true
            }
            None => false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status_row(&self) -> Option<&FieldRow> {
        self.status.as_ref()
    }

    pub fn field_rows(&self) -> &[FieldRow] {
        &self.rows
    }

    pub fn row(&self, name: &str) -> Option<&FieldRow> {
        if name == STATUS_ROW {
            return self.status.as_ref();
        }
        self.index.get(name).map(|&idx| &self.rows[idx])
    }

    /// Status row first, then fields in order of first appearance.
    pub fn rows(&self) -> impl Iterator<Item = &FieldRow> {
        self.status.iter().chain(self.rows.iter())
    }

    pub fn len(&self) -> usize {
        self.status.iter().count() + self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_row(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.rows.len();
        self.rows.push(FieldRow::new(name));
        self.index.insert(name.to_string(), idx);
        log::debug!("New telemetry field '{}'", name);
        idx
    }
}

fn render_value(value: FieldValue<'_>, expanded: bool) -> Cell {
    match value {
        FieldValue::Uuid(bytes) => Cell::plain(hex_fingerprint(&bytes), Tone::Muted),
        FieldValue::Bool(true) => Cell::plain("true", Tone::True),
        FieldValue::Bool(false) => Cell::plain("false", Tone::False),
        FieldValue::Compressed => Cell::plain(COMPRESSED_PLACEHOLDER, Tone::Plain),
        FieldValue::Structured(value) => {
            let value = integral_floats(value);
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            Cell {
                text,
                tone: Tone::Plain,
                whitespace: if expanded { Whitespace::Preserve } else { Whitespace::Collapse },
            }
        }
    }
}

/// Whole-number floats print without a fraction (`1`, not `1.0`), as a browser would.
fn integral_floats(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => Value::from(f as i64),
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(integral_floats).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), integral_floats(field)))
                .collect(),
        ),
        _ => value.clone(),
    }
}
