pub const PLACEHOLDER: &str = "---";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Health {
    Good,
    Warning,
    Poor,
}

pub fn success_rate_health(rate: f64) -> Health {
    if rate >= 0.9 {
        Health::Good
    } else if rate >= 0.7 {
        Health::Warning
    } else {
        Health::Poor
    }
}

pub fn format_count(value: Option<f64>) -> String {
    let Some(value) = value.filter(|value| value.is_finite()) else {
        return PLACEHOLDER.to_string();
    };

    const SUFFIXES: [(&str, f64); 5] = [
        ("", 1.0),
        ("k", 1_000.0),
        ("M", 1_000_000.0),
        ("G", 1_000_000_000.0),
        ("T", 1_000_000_000_000.0),
    ];
    let (suffix, scaled) = scale(value, &SUFFIXES, 1_000.0, 2);
    let precision = if suffix.is_empty() { 2 } else { 1 };
    format!("{}{suffix}", trim_decimals(format!("{scaled:.precision$}")))
}

pub fn format_byte_rate(value: Option<f64>) -> String {
    let Some(value) = value.filter(|value| value.is_finite()) else {
        return PLACEHOLDER.to_string();
    };

    const UNITS: [(&str, f64); 5] = [
        ("B/s", 1.0),
        ("KiB/s", 1_024.0),
        ("MiB/s", 1_048_576.0),
        ("GiB/s", 1_073_741_824.0),
        ("TiB/s", 1_099_511_627_776.0),
    ];
    match scale(value, &UNITS, 1_024.0, 1) {
        ("B/s", scaled) => format!("{} B/s", trim_decimals(format!("{scaled:.1}"))),
        (suffix, scaled) => format!("{scaled:.1} {suffix}"),
    }
}

// Unit is chosen after rounding.
fn scale(
    value: f64,
    units: &[(&'static str, f64)],
    step: f64,
    base_precision: i32,
) -> (&'static str, f64) {
    let magnitude = value.abs();
    let mut index = units
        .iter()
        .rposition(|(_, unit)| magnitude >= *unit)
        .unwrap_or(0);
    loop {
        let (suffix, unit) = units[index];
        let factor = 10_f64.powi(if index == 0 { base_precision } else { 1 });
        let rounded = (value / unit * factor).round() / factor;
        if rounded.abs() >= step && index + 1 < units.len() {
            index += 1;
            continue;
        }
        return (suffix, rounded);
    }
}

// Input is in milliseconds.
pub fn format_latency(value: Option<f64>) -> String {
    let Some(millis) = value.filter(|value| value.is_finite()) else {
        return PLACEHOLDER.to_string();
    };

    if millis.abs() >= 1_000.0 {
        format!("{:.2} s", millis / 1_000.0)
    } else {
        format!("{} ms", trim_decimals(format!("{millis:.1}")))
    }
}

pub fn format_success_rate(value: Option<f64>) -> String {
    match value.filter(|value| value.is_finite()) {
        Some(rate) => format!("{:.2}%", rate * 100.0),
        None => PLACEHOLDER.to_string(),
    }
}

fn trim_decimals(formatted: String) -> String {
    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
