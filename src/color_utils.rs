//! Color utility functions shared by the screen and print projections.

/// Build a CSS `rgba(...)` string from a note background and fill opacity.
///
/// Accepts `#rgb`, `#rrggbb` (with or without `#`). Strings already in
/// `rgb(`/`rgba(` form are returned unchanged, since they carry their own
/// alpha. Unparsable channels fall back to 255.
pub fn hex_to_rgba(color: &str, alpha: f64) -> String {
    let trimmed = color.trim();
    if trimmed.starts_with("rgb") {
        return trimmed.to_string();
    }

    let hex = trimmed.trim_start_matches('#');
    let expanded: String = if hex.chars().count() == 3 {
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };

    let channel = |range: std::ops::Range<usize>| -> u8 {
        expanded
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(255)
    };
    let (r, g, b) = (channel(0..2), channel(2..4), channel(4..6));
    let a = if alpha.is_finite() { alpha } else { 1.0 };

    format!("rgba({},{},{},{})", r, g, b, a)
}
