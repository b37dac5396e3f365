//! Conversion between byte counts and human-readable sizes.
//!
//! Units are binary: `KB` and `KiB` both mean 1024 bytes.

const UNITS: [(&str, u64); 5] = [
    ("B", 1),
    ("KB", 1 << 10),
    ("MB", 1 << 20),
    ("GB", 1 << 30),
    ("TB", 1 << 40),
];

/// Display value used when a site does not report a size.
pub const UNKNOWN_SIZE: &str = "Unknown";

/// Formats a byte count as a human-readable string with two decimals.
///
/// ```
/// use torrent_search::size::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let (unit, factor) = UNITS
        .iter()
        .rev()
        .find(|(_, factor)| bytes >= *factor)
        .copied()
        .unwrap_or(UNITS[0]);
    format!("{:.2} {}", bytes as f64 / factor as f64, unit)
}

/// Parses a human-readable size such as `"1.5 GB"`, `"700 MiB"` or
/// `"1,024 KB"` into a byte count.
///
/// Returns 0 for anything that cannot be parsed, including `"Unknown"`.
pub fn parse_size(text: &str) -> u64 {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();

    let split = cleaned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(cleaned.len());
    let (number, unit) = cleaned.split_at(split);

    let value: f64 = match number.parse() {
        Ok(v) => v,
        Err(_) => return 0,
    };
    match unit_factor(unit.trim()) {
        Some(factor) => (value * factor as f64) as u64,
        None => 0,
    }
}

fn unit_factor(unit: &str) -> Option<u64> {
    let unit = unit.to_ascii_uppercase();
    match unit.as_str() {
        "" | "B" | "BYTES" => Some(1),
        "KB" | "KIB" => Some(1 << 10),
        "MB" | "MIB" => Some(1 << 20),
        "GB" | "GIB" => Some(1 << 30),
        "TB" | "TIB" => Some(1 << 40),
        _ => None,
    }
}

/// Normalizes a site-reported size string into `(display, bytes)`.
///
/// The display keeps the site's own text; empty input becomes `"Unknown"`.
pub fn normalize_size(text: &str) -> (String, u64) {
    let text = text.trim();
    if text.is_empty() {
        return (UNKNOWN_SIZE.to_string(), 0);
    }
    (text.to_string(), parse_size(text))
}
