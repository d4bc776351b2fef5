//! Color constants and auto-scaling helpers for the TUI.

use ratatui::style::Color;

/// Measured solar line color.
pub const ACTUAL_COLOR: Color = Color::Yellow;
/// Forecast solar line color.
pub const PREDICTED_COLOR: Color = Color::Cyan;
/// Household consumption line color.
pub const CONSUMPTION_COLOR: Color = Color::LightRed;
/// SOC gauge color when high (>= 50%).
pub const SOC_HIGH: Color = Color::Green;
/// SOC gauge color when medium (>= 20%).
pub const SOC_MID: Color = Color::Yellow;
/// SOC gauge color when low (< 20%).
pub const SOC_LOW: Color = Color::Red;
pub const HEADER_FG: Color = Color::White;
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Highlight for the selected slider.
pub const SELECTED: Color = Color::Magenta;
/// Error text color.
pub const ERROR_FG: Color = Color::Red;

/// Returns a color based on the battery state of charge.
pub fn soc_color(soc: f64) -> Color {
    if soc >= 0.5 {
        SOC_HIGH
    } else if soc >= 0.2 {
        SOC_MID
    } else {
        SOC_LOW
    }
}

/// Y-axis bounds over every series, padded by 10% of the range.
pub fn auto_bounds_y(series: &[&[(f64, f64)]]) -> [f64; 2] {
    let all = series.iter().flat_map(|s| s.iter()).map(|&(_, y)| y);
    let min = all.clone().fold(f64::INFINITY, f64::min);
    let max = all.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [-1.0, 1.0];
    }
    let range = (max - min).max(0.1);
    let pad = range * 0.1;
    [min - pad, max + pad]
}

/// Text bar of `width` cells filled to `fraction`.
pub fn slider_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
