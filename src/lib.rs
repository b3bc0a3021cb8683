//! Public-facing crate root: re-exports + one-shot helper.

pub mod cli;
pub mod core;
pub mod pipeline;
pub mod render;

pub use core::{
    bounds::{AxisNormalization, Normalization, compute_axis_normalization},
    color::{ColorError, ColorValue, Rgb, heat, parse_color},
    color_map::{ColorMapping, ColorOutcome, ColorRequest, LabelColorMap, map_colors},
    config::{AxisColumns, Dimensions, PlotMode, PlotOptions, PlotOptionsBuilder},
    data::{Cell, ParseOptions, Separator, Table, parse_table},
    error::PlotError,
    session::{Fingerprint, Session},
};

pub use pipeline::{DataRow, PointUpdate, add_data_point, plot_csv_str, plot_formula, plot_table};
pub use render::{
    Geometry, Grid, GridCell, Legend, PlotFrame, natural_size, render_preview, splat,
};

/// Plot a delimited text once, without keeping a session around.
pub fn plot_csv(text: &str, opts: &PlotOptions) -> Result<PlotFrame, PlotError> {
    plot_csv_str(&mut Session::new(), text, opts)
}
