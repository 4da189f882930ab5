//! Assertion utilities for testing.
//!
//! Helpers for comparing marker colors in JSON responses.

use happymap::RgbColor;

/// Assert that a JSON marker has the given fill color.
///
/// # Panics
///
/// Panics if the marker has no `color` string or it differs from `expected`.
pub fn assert_marker_color(marker: &serde_json::Value, expected: RgbColor) {
    let actual = marker["color"]
        .as_str()
        .unwrap_or_else(|| panic!("Marker has no color: {}", marker));
    assert_eq!(
        actual,
        expected.to_hex(),
        "Marker {} has color {}, expected {}",
        marker["country"],
        actual,
        expected
    );
}

/// Assert that two colors differ by at most `tolerance` on every channel.
pub fn assert_color_near(actual: RgbColor, expected: RgbColor, tolerance: u8) {
    let close = actual
        .to_array()
        .iter()
        .zip(expected.to_array().iter())
        .all(|(a, e)| a.abs_diff(*e) <= tolerance);
    assert!(
        close,
        "Colors not within {}: actual = {}, expected = {}",
        tolerance, actual, expected
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_color_near() {
        assert_color_near(RgbColor::new(10, 20, 30), RgbColor::new(11, 19, 30), 1);
    }

    #[test]
    fn test_assert_marker_color() {
        let marker = serde_json::json!({"country": "Chad", "color": "#E74C3C"});
        assert_marker_color(&marker, RgbColor::from_u32(0xE74C3C));
    }
}
