pub mod frame;
pub mod grid;
pub mod terminal;

pub use frame::{Geometry, Legend, PlotFrame};
pub use grid::{Grid, GridCell, splat};
pub use terminal::{natural_size, render_preview};
