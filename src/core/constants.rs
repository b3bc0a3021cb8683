//! A collection of constants.

/// Hue given to the lowest value of a heat scale (blue with a faint purple tone).
pub const HEAT_LOWER_HUE: f64 = 0.7;
/// Hue given to the highest value of a heat scale (red).
pub const HEAT_UPPER_HUE: f64 = 0.0;
/// Normalized position used when a heat scale has no span.
pub const HEAT_DEGENERATE_T: f64 = 0.5;

/// Saturation shared by heat and label colours.
pub const COLOR_SATURATION: f64 = 0.95;
/// Lightness shared by heat and label colours.
pub const COLOR_LIGHTNESS: f64 = 0.55;

/// Number of characters sampled from an input text when fingerprinting it.
pub const FINGERPRINT_SAMPLES: usize = 20;

/// Share of lines probed for the column count of untrusted input.
pub const COLUMN_PROBE_FRACTION: f64 = 0.05;
/// Lines probed for the column count on top of the fraction.
pub const COLUMN_PROBE_EXTRA: f64 = 10.0;

/// `fraction` never shrinks a data set below this many lines.
pub const MIN_FRACTION_LINES: usize = 3;

/// Default grid resolution per unit length.
pub const DEFAULT_RESOLUTION: u32 = 20;
/// Default plot length per axis.
pub const DEFAULT_AXIS_LENGTH: f64 = 1.0;

/// Space between two bars, as a share of one grid step.
pub const DEFAULT_BAR_PADDING: f64 = 0.5;
/// Size of a scatterplot sprite.
pub const DEFAULT_POINT_SIZE: f64 = 0.04;
/// Packed RGB used when no colour column is configured (black).
pub const DEFAULT_COLOR: u32 = 0x00_0000;

/// The left and right border characters of the terminal preview
pub const BORDER_WIDTH: usize = 2;
/// Terminal preview must be at least 7 rows tall
pub const MIN_PREVIEW_HEIGHT: usize = 7;
/// Terminal preview must be at least 14 columns wide
pub const MIN_PREVIEW_WIDTH: usize = 14;

/// Numbers in the preview and legend are rounded to two decimals.
pub const DECIMAL_PRECISION: usize = 2;
