const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

// Binary units, at most two decimals, trailing zeros dropped: 1536 -> "1.5KB".
pub fn human_bytes(n: u64) -> String {
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        return format!("{}{}", n, UNITS[0]);
    }
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", s, UNITS[unit])
}
