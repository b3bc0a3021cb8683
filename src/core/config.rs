//! Run-time plot options + fluent builder, and the plot dimensions.

use serde::Serialize;
use tracing::warn;

use crate::core::{
    color::ColorValue,
    color_map::ColorRequest,
    constants::{
        DEFAULT_AXIS_LENGTH, DEFAULT_BAR_PADDING, DEFAULT_COLOR, DEFAULT_POINT_SIZE,
        DEFAULT_RESOLUTION,
    },
    data::{ParseOptions, Separator},
    error::PlotError,
};

/// How rows are turned into geometry.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotMode {
    #[default]
    Scatterplot,
    Lineplot,
    Barchart,
    /// Height field sampled from a formula; formula plots only.
    Polygon,
}

impl PlotMode {
    /// Unknown names fall back to scatterplot with a warning.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "scatterplot" | "scatter" => Self::Scatterplot,
            "lineplot" | "line" => Self::Lineplot,
            "barchart" | "bar" | "bars" => Self::Barchart,
            "polygon" | "surface" => Self::Polygon,
            other => {
                warn!(mode = other, "unrecognized mode, assuming scatterplot");
                Self::Scatterplot
            }
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Scatterplot => "scatterplot",
            Self::Lineplot => "lineplot",
            Self::Barchart => "barchart",
            Self::Polygon => "polygon",
        }
    }
}

/// Column index per axis.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct AxisColumns {
    pub x1: usize,
    pub x2: usize,
    pub x3: usize,
}

impl Default for AxisColumns {
    fn default() -> Self {
        Self { x1: 0, x2: 1, x3: 2 }
    }
}

impl AxisColumns {
    #[must_use]
    pub fn new(x1: usize, x2: usize, x3: usize) -> Self {
        Self { x1, x2, x3 }
    }

    #[must_use]
    pub fn max(&self) -> usize {
        self.x1.max(self.x2).max(self.x3)
    }
}

/// Size of the plot box and of the bar/formula grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Dimensions {
    x_res: u32,
    z_res: u32,
    x_len: f64,
    y_len: f64,
    z_len: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(
            DEFAULT_RESOLUTION,
            DEFAULT_RESOLUTION,
            DEFAULT_AXIS_LENGTH,
            DEFAULT_AXIS_LENGTH,
            DEFAULT_AXIS_LENGTH,
        )
    }
}

impl Dimensions {
    /// Resolutions are at least 1, lengths are taken by magnitude.
    #[must_use]
    pub fn new(x_res: u32, z_res: u32, x_len: f64, y_len: f64, z_len: f64) -> Self {
        Self {
            x_res: x_res.max(1),
            z_res: z_res.max(1),
            x_len: x_len.abs(),
            y_len: y_len.abs(),
            z_len: z_len.abs(),
        }
    }

    #[inline]
    #[must_use]
    pub fn x_res(&self) -> f64 {
        f64::from(self.x_res)
    }
    #[inline]
    #[must_use]
    pub fn z_res(&self) -> f64 {
        f64::from(self.z_res)
    }
    #[inline]
    #[must_use]
    pub fn x_len(&self) -> f64 {
        self.x_len
    }
    #[inline]
    #[must_use]
    pub fn y_len(&self) -> f64 {
        self.y_len
    }
    #[inline]
    #[must_use]
    pub fn z_len(&self) -> f64 {
        self.z_len
    }

    /// Grid steps along x: `round(x_len * x_res)`, at least 1.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn x_vertices(&self) -> usize {
        ((self.x_len * self.x_res()).round() as usize).max(1)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn z_vertices(&self) -> usize {
        ((self.z_len * self.z_res()).round() as usize).max(1)
    }
}

/// Per-axis normalization switch and title.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisOptions {
    /// Fit the axis to the data range.
    pub normalize: bool,
    /// Divisor used when `normalize` is off.
    pub scale: f64,
    /// `None` takes the header name, or `x1`/`x2`/`x3`.
    pub title: Option<String>,
}

impl Default for AxisOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            scale: 1.0,
            title: None,
        }
    }
}

/// Immutable parameters for one plot call.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotOptions {
    pub mode: PlotMode,
    pub columns: AxisColumns,
    pub title: String,
    pub header: Option<bool>,
    pub separator: Option<Separator>,
    pub trust_input: bool,
    pub fraction: f64,
    pub color_column: Option<usize>,
    pub default_color: ColorValue,
    pub labeled: bool,
    pub filter_color: bool,
    pub hue_offset: f64,
    pub x1: AxisOptions,
    pub x2: AxisOptions,
    pub x3: AxisOptions,
    pub keep_old_plot: bool,
    pub update_cache: bool,
    pub bar_padding: f64,
    pub bar_size_threshold: f64,
    pub data_point_size: f64,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            mode: PlotMode::default(),
            columns: AxisColumns::default(),
            title: String::new(),
            header: None,
            separator: None,
            trust_input: false,
            fraction: 1.0,
            color_column: None,
            default_color: ColorValue::Packed(DEFAULT_COLOR),
            labeled: false,
            filter_color: true,
            hue_offset: 0.0,
            x1: AxisOptions::default(),
            x2: AxisOptions::default(),
            x3: AxisOptions::default(),
            keep_old_plot: false,
            update_cache: true,
            bar_padding: DEFAULT_BAR_PADDING,
            bar_size_threshold: 0.0,
            data_point_size: DEFAULT_POINT_SIZE,
        }
    }
}

impl PlotOptions {
    #[inline]
    #[must_use]
    pub fn builder() -> PlotOptionsBuilder {
        PlotOptionsBuilder::default()
    }

    #[must_use]
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            separator: self.separator.clone(),
            header: self.header,
            trust_input: self.trust_input,
            fraction: self.fraction,
        }
    }

    #[must_use]
    pub fn color_request(&self) -> ColorRequest {
        ColorRequest {
            column: self.color_column,
            default_color: self.default_color.clone(),
            labeled: self.labeled,
            filter_to_heat: self.filter_color,
            hue_offset: self.hue_offset,
        }
    }

    /// Apply the recoverable validation policy: bad values are reset to a
    /// safe default and reported.
    #[must_use]
    pub fn validated(mut self) -> Self {
        if !(0.0..1.0).contains(&self.bar_padding) {
            let e = PlotError::InvalidConfiguration(format!(
                "bar padding {} is outside [0, 1)",
                self.bar_padding
            ));
            warn!("{e}, continuing with 0");
            self.bar_padding = 0.0;
        }
        if !(self.fraction > 0.0 && self.fraction <= 1.0) {
            let e = PlotError::InvalidConfiguration(format!(
                "fraction {} is outside (0, 1]",
                self.fraction
            ));
            warn!("{e}, continuing with 1");
            self.fraction = 1.0;
        }
        if !(0.0..=1.0).contains(&self.bar_size_threshold) {
            let clamped = if self.bar_size_threshold.is_nan() {
                0.0
            } else {
                self.bar_size_threshold.clamp(0.0, 1.0)
            };
            warn!(
                bar_size_threshold = self.bar_size_threshold,
                clamped, "bar size threshold must be in [0, 1]"
            );
            self.bar_size_threshold = clamped;
        }
        if self.data_point_size <= 0.0 {
            warn!(data_point_size = self.data_point_size, "data points will be invisible");
        }
        if !self.hue_offset.is_finite() {
            warn!("hue offset is not finite, continuing with 0");
            self.hue_offset = 0.0;
        }
        self
    }
}

/// Fluent builder; `build` validates.
#[derive(Debug, Default)]
pub struct PlotOptionsBuilder {
    opts: PlotOptions,
}

impl PlotOptionsBuilder {
    #[inline]
    #[must_use]
    pub fn mode(mut self, m: PlotMode) -> Self {
        self.opts.mode = m;
        self
    }
    #[inline]
    #[must_use]
    pub fn columns(mut self, x1: usize, x2: usize, x3: usize) -> Self {
        self.opts.columns = AxisColumns::new(x1, x2, x3);
        self
    }
    #[inline]
    #[must_use]
    pub fn title(mut self, t: impl Into<String>) -> Self {
        self.opts.title = t.into();
        self
    }
    #[inline]
    #[must_use]
    pub fn header(mut self, h: bool) -> Self {
        self.opts.header = Some(h);
        self
    }
    #[inline]
    #[must_use]
    pub fn header_opt(mut self, h: Option<bool>) -> Self {
        self.opts.header = h;
        self
    }
    /// The empty string means auto-detect.
    #[inline]
    #[must_use]
    pub fn separator(mut self, s: &str) -> Self {
        self.opts.separator = Separator::literal(s);
        self
    }
    #[inline]
    #[must_use]
    pub fn trust_input(mut self, t: bool) -> Self {
        self.opts.trust_input = t;
        self
    }
    #[inline]
    #[must_use]
    pub fn fraction(mut self, f: f64) -> Self {
        self.opts.fraction = f;
        self
    }
    #[inline]
    #[must_use]
    pub fn color_column(mut self, c: Option<usize>) -> Self {
        self.opts.color_column = c;
        self
    }
    #[inline]
    #[must_use]
    pub fn default_color<C: Into<ColorValue>>(mut self, c: C) -> Self {
        self.opts.default_color = c.into();
        self
    }
    #[inline]
    #[must_use]
    pub fn labeled(mut self, l: bool) -> Self {
        self.opts.labeled = l;
        self
    }
    #[inline]
    #[must_use]
    pub fn filter_color(mut self, f: bool) -> Self {
        self.opts.filter_color = f;
        self
    }
    #[inline]
    #[must_use]
    pub fn hue_offset(mut self, h: f64) -> Self {
        self.opts.hue_offset = h;
        self
    }
    #[inline]
    #[must_use]
    pub fn normalize(mut self, x1: bool, x2: bool, x3: bool) -> Self {
        self.opts.x1.normalize = x1;
        self.opts.x2.normalize = x2;
        self.opts.x3.normalize = x3;
        self
    }
    #[inline]
    #[must_use]
    pub fn scales(mut self, x1: f64, x2: f64, x3: f64) -> Self {
        self.opts.x1.scale = x1;
        self.opts.x2.scale = x2;
        self.opts.x3.scale = x3;
        self
    }
    #[inline]
    #[must_use]
    pub fn axis_titles(mut self, x1: &str, x2: &str, x3: &str) -> Self {
        self.opts.x1.title = Some(x1.to_owned());
        self.opts.x2.title = Some(x2.to_owned());
        self.opts.x3.title = Some(x3.to_owned());
        self
    }
    #[inline]
    #[must_use]
    pub fn keep_old_plot(mut self, k: bool) -> Self {
        self.opts.keep_old_plot = k;
        self
    }
    #[inline]
    #[must_use]
    pub fn update_cache(mut self, u: bool) -> Self {
        self.opts.update_cache = u;
        self
    }
    #[inline]
    #[must_use]
    pub fn bar_padding(mut self, p: f64) -> Self {
        self.opts.bar_padding = p;
        self
    }
    #[inline]
    #[must_use]
    pub fn bar_size_threshold(mut self, t: f64) -> Self {
        self.opts.bar_size_threshold = t;
        self
    }
    #[inline]
    #[must_use]
    pub fn data_point_size(mut self, s: f64) -> Self {
        self.opts.data_point_size = s;
        self
    }

    #[must_use]
    pub fn build(self) -> PlotOptions {
        self.opts.validated()
    }
}

impl From<PlotOptionsBuilder> for PlotOptions {
    fn from(b: PlotOptionsBuilder) -> Self {
        b.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let o = PlotOptions::builder().build();
        assert_eq!(o.mode, PlotMode::Scatterplot);
        assert_eq!(o.bar_padding, DEFAULT_BAR_PADDING);
        assert_eq!(o.default_color, ColorValue::Packed(0));
        assert!(o.filter_color && o.update_cache && !o.keep_old_plot);
        assert!(o.x1.normalize && o.x2.normalize && o.x3.normalize);
    }

    #[test]
    fn test_bad_padding_resets_to_zero() {
        assert_eq!(PlotOptions::builder().bar_padding(1.0).build().bar_padding, 0.0);
        assert_eq!(PlotOptions::builder().bar_padding(-0.2).build().bar_padding, 0.0);
        assert_eq!(PlotOptions::builder().bar_padding(0.25).build().bar_padding, 0.25);
    }

    #[test]
    fn test_bad_fraction_resets_to_one() {
        assert_eq!(PlotOptions::builder().fraction(0.0).build().fraction, 1.0);
        assert_eq!(PlotOptions::builder().fraction(1.5).build().fraction, 1.0);
        assert_eq!(PlotOptions::builder().fraction(0.5).build().fraction, 0.5);
    }

    #[test]
    fn test_threshold_clamped() {
        assert_eq!(PlotOptions::builder().bar_size_threshold(3.0).build().bar_size_threshold, 1.0);
    }

    #[test]
    fn test_empty_separator_means_detect() {
        assert_eq!(PlotOptions::builder().separator("").build().separator, None);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(PlotMode::from_name("BarChart"), PlotMode::Barchart);
        assert_eq!(PlotMode::from_name("wat"), PlotMode::Scatterplot);
    }

    #[test]
    fn test_dimensions_vertices() {
        let d = Dimensions::default();
        assert_eq!((d.x_vertices(), d.z_vertices()), (20, 20));
        let d = Dimensions::new(0, 10, -2.0, 1.0, 0.01);
        assert_eq!(d.x_res(), 1.0);
        assert_eq!(d.x_vertices(), 2);
        assert_eq!(d.z_vertices(), 1);
    }
}
