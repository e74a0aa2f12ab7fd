use chrono::DateTime;
use serde::Serialize;
use serde_json::Value;

/// Presentation hint attached to a value. Never consulted when choosing
/// generated types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Renderer {
    #[default]
    None,
    Bytes,
    Duration,
    Percentage,
    Timestamp,
    Other(String),
}

impl Renderer {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Self::None,
            Some("bytes") => Self::Bytes,
            Some("duration") => Self::Duration,
            Some("percentage") | Some("fraction_as_percentage") => Self::Percentage,
            Some("timestamp") | Some("timestamp_gmt") => Self::Timestamp,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

const BYTE_UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

pub fn format_value(renderer: &Renderer, value: &Value) -> String {
    let formatted = match (renderer, value.as_f64()) {
        (Renderer::Bytes, Some(n)) => Some(format_bytes(n)),
        (Renderer::Duration, Some(n)) => Some(format_duration(n)),
        (Renderer::Percentage, Some(n)) => Some(format!("{:.2}%", n * 100.0)),
        (Renderer::Timestamp, Some(n)) => format_timestamp(n),
        _ => None,
    };
    formatted.unwrap_or_else(|| raw_text(value))
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn format_bytes(bytes: f64) -> String {
    let mut size = bytes;
    let mut unit = 0;
    while size >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes as i64, BYTE_UNITS[0])
    } else {
        format!("{:.2} {}", size, BYTE_UNITS[unit])
    }
}

fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    }
}

fn format_timestamp(seconds: f64) -> Option<String> {
    DateTime::from_timestamp(seconds as i64, 0).map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}
