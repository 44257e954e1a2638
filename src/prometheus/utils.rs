use std::fmt::{Display, Write};

pub(super) fn write_type_line(buffer: &mut String, name: &str, metric_type: &str) {
    buffer.push_str("# TYPE ");
    buffer.push_str(name);
    buffer.push(' ');
    buffer.push_str(metric_type);
    buffer.push('\n');
}

/// Formats a `key="value"` label pair
pub(super) fn label(key: &str, value: &str) -> String {
    let mut out = String::with_capacity(key.len() + value.len() + 3);
    out.push_str(key);
    out.push_str("=\"");
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Writes `name[_suffix][{labels}] value`
pub(super) fn write_metric_line<T, T2>(
    buffer: &mut String,
    name: &str,
    suffix: Option<&'static str>,
    labels: &[String],
    additional_label: Option<(&'static str, T)>,
    value: T2,
) where
    T: Display,
    T2: Display,
{
    buffer.push_str(name);
    if let Some(suffix) = suffix {
        buffer.push('_');
        buffer.push_str(suffix);
    }

    let extra = additional_label.map(|(key, v)| format!("{}=\"{}\"", key, v));
    let all: Vec<&str> = labels
        .iter()
        .map(String::as_str)
        .chain(extra.as_deref())
        .collect();
    if !all.is_empty() {
        buffer.push('{');
        buffer.push_str(&all.join(","));
        buffer.push('}');
    }

    // Writing into a String cannot fail
    let _ = writeln!(buffer, " {}", value);
}
