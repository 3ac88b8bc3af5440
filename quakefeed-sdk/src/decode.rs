//! Channel decoder: turns `(channel, payload)` into a [`DisplayRecord`].
//!
//! Decoding is a pure, total function. Known fields for a channel come first
//! in a fixed order and are omitted when absent; every other field follows in
//! payload order. Compound values in that second pass are rendered as compact
//! JSON so nothing is lost.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

pub const JMX_SEISMOLOGY: &str = "jmx-seismology";
pub const QUAKE_ONE: &str = "quake-one";
pub const EEW: &str = "eew";

/// Channels with dedicated decoding rules.
pub const KNOWN_CHANNELS: [&str; 3] = [JMX_SEISMOLOGY, QUAKE_ONE, EEW];

const JMX_FIELDS: [&str; 5] = ["EventID", "InfoType", "Title", "DateTime", "Status"];
const QUAKE_ONE_EARTHQUAKE_FIELDS: [&str; 4] = ["magnitude", "hypocenter", "depth", "time"];
const QUAKE_ONE_INTENSITY_FIELDS: [&str; 2] = ["max", "regions"];
/// Max regions listed for a QUAKE.ONE intensity report.
const MAX_REGIONS: usize = 5;

/// One labeled line of a rendered record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayLine {
    pub label: String,
    pub value: String,
}

/// Channel-specific rendering of a single payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRecord {
    pub channel: String,
    pub title: String,
    /// Short summary line (EEW only).
    pub headline: Option<String>,
    pub lines: Vec<DisplayLine>,
}

impl DisplayRecord {
    fn new(channel: &str, title: &str) -> Self {
        Self {
            channel: channel.to_string(),
            title: title.to_string(),
            headline: None,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.lines.push(DisplayLine {
            label: label.into(),
            value: value.into(),
        });
    }

    /// Value of the first line with this label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|l| l.label == label)
            .map(|l| l.value.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.label.as_str())
    }
}

impl fmt::Display for DisplayRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.title)?;
        if let Some(ref headline) = self.headline {
            writeln!(f, "  🔥 {headline}")?;
        }
        for line in &self.lines {
            // Pretty-printed JSON spans several lines; keep it indented.
            let value = line.value.replace('\n', "\n    ");
            writeln!(f, "  {}: {}", line.label, value)?;
        }
        Ok(())
    }
}

/// Decode a payload received on `channel`.
pub fn decode(channel: &str, payload: &Value) -> DisplayRecord {
    match channel {
        JMX_SEISMOLOGY => decode_jmx(payload),
        QUAKE_ONE => decode_quake_one(payload),
        EEW => decode_eew(payload),
        _ => decode_generic(channel, payload),
    }
}

/// Render a JSON value for display: strings verbatim, everything else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn push_remaining(record: &mut DisplayRecord, obj: &Map<String, Value>, skip: &[&str]) {
    for (key, value) in obj {
        if !skip.contains(&key.as_str()) {
            record.push(key.as_str(), render_value(value));
        }
    }
}

fn decode_jmx(payload: &Value) -> DisplayRecord {
    let mut record = DisplayRecord::new(JMX_SEISMOLOGY, "JMX seismology");
    let Some(obj) = payload.as_object() else {
        record.push("data", render_value(payload));
        return record;
    };
    for key in JMX_FIELDS {
        if let Some(value) = obj.get(key) {
            record.push(key, render_value(value));
        }
    }
    push_remaining(&mut record, obj, &JMX_FIELDS);
    record
}

fn decode_quake_one(payload: &Value) -> DisplayRecord {
    let mut record = DisplayRecord::new(QUAKE_ONE, "QUAKE.ONE earthquake");
    let Some(obj) = payload.as_object() else {
        record.push("data", render_value(payload));
        return record;
    };

    let mut consumed: Vec<&str> = Vec::new();
    // Unmatched nested fields go after every known field.
    let mut nested_extra: Vec<(String, String)> = Vec::new();

    if let Some(eq) = obj.get("earthquake").and_then(Value::as_object) {
        consumed.push("earthquake");
        for key in QUAKE_ONE_EARTHQUAKE_FIELDS {
            let Some(value) = eq.get(key) else { continue };
            let rendered = render_value(value);
            if key == "depth" && (value.is_number() || value.is_string()) {
                record.push(key, format!("{rendered} km"));
            } else {
                record.push(key, rendered);
            }
        }
        for (key, value) in eq {
            if !QUAKE_ONE_EARTHQUAKE_FIELDS.contains(&key.as_str()) {
                nested_extra.push((format!("earthquake.{key}"), render_value(value)));
            }
        }
    }

    if let Some(intensity) = obj.get("intensity").and_then(Value::as_object) {
        consumed.push("intensity");
        if let Some(max) = intensity.get("max") {
            record.push("max intensity", render_value(max));
        }
        if let Some(regions) = intensity.get("regions") {
            let listing = match regions.as_array() {
                Some(list) => list
                    .iter()
                    .take(MAX_REGIONS)
                    .map(render_value)
                    .collect::<Vec<_>>()
                    .join(", "),
                None => render_value(regions),
            };
            record.push("regions", listing);
        }
        for (key, value) in intensity {
            if !QUAKE_ONE_INTENSITY_FIELDS.contains(&key.as_str()) {
                nested_extra.push((format!("intensity.{key}"), render_value(value)));
            }
        }
    }

    for (label, value) in nested_extra {
        record.push(label, value);
    }

    push_remaining(&mut record, obj, &consumed);
    record
}

fn decode_eew(payload: &Value) -> DisplayRecord {
    let mut record = DisplayRecord::new(EEW, "Earthquake Early Warning (EEW)");
    let Some(obj) = payload.as_object() else {
        record.push("data", render_value(payload));
        return record;
    };

    let magnitude = obj.get("magnitude");
    let max_intensity = obj.get("maxIntensity").or_else(|| obj.get("max_intensity"));
    let hypocenter = obj.get("hypocenter");

    let fields: [(&str, Option<&Value>); 6] = [
        ("magnitude", magnitude),
        ("max intensity", max_intensity),
        ("origin time", obj.get("origin_time")),
        ("hypocenter", hypocenter),
        ("arrival time", obj.get("arrival_time")),
        ("warning time", obj.get("warning_time")),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            record.push(label, render_value(value));
        }
    }

    let mut headline = Vec::new();
    if let Some(m) = magnitude {
        headline.push(format!("M{}", render_value(m)));
    }
    if let Some(i) = max_intensity {
        headline.push(format!("max intensity {}", render_value(i)));
    }
    if let Some(h) = hypocenter {
        headline.push(render_value(h));
    }
    if !headline.is_empty() {
        record.headline = Some(headline.join(" / "));
    }

    push_remaining(
        &mut record,
        obj,
        &[
            "magnitude",
            "maxIntensity",
            "max_intensity",
            "origin_time",
            "hypocenter",
            "arrival_time",
            "warning_time",
        ],
    );
    record
}

fn decode_generic(channel: &str, payload: &Value) -> DisplayRecord {
    let mut record = DisplayRecord::new(channel, channel);
    let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    record.push("payload", pretty);
    record
}
