//! Aggregates the data pipeline layer.

pub mod bounds;
pub mod color;
pub mod color_map;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod formula;
pub mod rng;
pub mod session;

// re-export frequently-used items for convenience
pub use bounds::{Axis, AxisNormalization, Normalization, compute_axis_normalization};
pub use color::{AnsiCode, ColorError, ColorValue, Rgb, colorize, heat, parse_color};
pub use color_map::{ColorMapping, ColorOutcome, ColorRequest, LabelColorMap, map_colors};
pub use config::{AxisColumns, Dimensions, PlotMode, PlotOptions, PlotOptionsBuilder};
pub use data::{Cell, ParseOptions, Separator, Table, parse_table};
pub use error::PlotError;
pub use session::{Fingerprint, Session};
