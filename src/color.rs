use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// An 8-hex-digit color literal of the form `#RRGGBBAA`.
    static ref HEX8: Regex = Regex::new("^#([0-9a-fA-F]{8})$").unwrap();
}

/// Converts an 8-hex-digit `#RRGGBBAA` literal into an explicit
/// `rgba(r, g, b, a)` representation. Channels are integers 0-255 parsed
/// from the hex pairs; alpha is `alpha_byte / 255` with no extra rounding.
///
/// Anything that is not an 8-digit hex literal is returned unchanged;
/// normalization is opportunistic, not an error.
#[must_use]
pub fn normalize_color(value: &str) -> String {
    let Some(caps) = HEX8.captures(value) else {
        return value.to_string();
    };
    let Ok(bits) = u32::from_str_radix(&caps[1], 16) else {
        return value.to_string();
    };
    let r = (bits >> 24) as u8;
    let g = (bits >> 16) as u8;
    let b = (bits >> 8) as u8;
    let alpha = (bits & 0xff) as f64 / 255.0;
    format!("rgba({r}, {g}, {b}, {alpha})")
}
