// src/util.rs

/// Number of decimal digits needed to print `n`. Zero still needs one digit.
///
/// Used to size the zero-padded index column of a numbered manifest, so
/// `decimal_width(9) == 1`, `decimal_width(10) == 2`, `decimal_width(1000) == 4`.
pub fn decimal_width(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Compact, filesystem-safe local timestamp (e.g. `20250810_140359`).
pub fn now_ts_compact() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// RFC3339 local timestamp, seconds precision.
pub fn now_rfc3339() -> String {
    use chrono::{Local, SecondsFormat};
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
