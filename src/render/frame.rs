//! Render-ready output of one plot call.
//!
//! A [`PlotFrame`] is everything an external 3D renderer needs: positions
//! and colours for point modes, bars for the aggregated mode, a height field
//! for formula surfaces, plus legend material. All of it serializes to JSON.

use serde::Serialize;

use crate::core::{
    bounds::Normalization, color::Rgb, color_map::LabelColorMap, config::PlotMode,
};

/// Position in plot space, `[0, len]` per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vertex {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Scatter plot payload. `positions[i]` is drawn in `colors[i]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PointCloud {
    pub positions: Vec<Vertex>,
    pub colors: Vec<Rgb>,
    /// Index of the source row per position.
    pub rows: Vec<usize>,
    pub point_size: f64,
}

impl PointCloud {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub(crate) fn push(&mut self, row: usize, v: Vertex, c: Rgb) {
        self.positions.push(v);
        self.colors.push(c);
        self.rows.push(row);
    }
}

/// Line between two positions of a [`PointCloud`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Segment {
    pub from: usize,
    pub to: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LineStrip {
    pub points: PointCloud,
    /// Consecutive pairs `(i-1, i)`, coloured by their endpoints.
    pub segments: Vec<Segment>,
}

/// One aggregated bar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bar {
    /// Grid cell.
    pub cell: (usize, usize),
    /// Base centre: `(x / x_res, 0, z / z_res)`.
    pub base: Vertex,
    /// Accumulated value.
    pub value: f64,
    /// Top of the bar in plot space.
    pub height: f64,
    pub color: Rgb,
    pub visible: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BarChart {
    pub bars: Vec<Bar>,
    /// Bar width along x and z.
    pub footprint: (f64, f64),
    /// Grid cells per data unit along x and z.
    pub scale_x: f64,
    pub scale_z: f64,
    /// Running `(min, max)` of the grid.
    pub value_range: (f64, f64),
}

impl BarChart {
    pub fn visible(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter().filter(|b| b.visible)
    }
}

/// Height field of a formula, `(x_count × z_count)` vertices.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Surface {
    pub x_count: usize,
    pub z_count: usize,
    /// Row-major by x. `None` marks a hole.
    pub heights: Vec<Option<f64>>,
    pub colors: Vec<Option<Rgb>>,
    pub scale: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Points(PointCloud),
    Lines(LineStrip),
    Bars(BarChart),
    Surface(Surface),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AxisTitles {
    pub x1: String,
    pub x2: String,
    pub x3: String,
}

/// Legend material.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub axis_titles: AxisTitles,
    /// Only present for labeled colouring outside bar mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<LabelColorMap>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotFrame {
    pub mode: PlotMode,
    /// The renderer must drop the previous mesh before drawing this one.
    pub dispose_previous: bool,
    pub geometry: Geometry,
    pub legend: Legend,
    pub normalization: Normalization,
}

impl PlotFrame {
    #[must_use]
    pub fn points(&self) -> Option<&PointCloud> {
        match &self.geometry {
            Geometry::Points(p) => Some(p),
            Geometry::Lines(l) => Some(&l.points),
            _ => None,
        }
    }

    #[must_use]
    pub fn bars(&self) -> Option<&BarChart> {
        match &self.geometry {
            Geometry::Bars(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn surface(&self) -> Option<&Surface> {
        match &self.geometry {
            Geometry::Surface(s) => Some(s),
            _ => None,
        }
    }

    /// Pretty JSON for an external renderer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(geometry: Geometry) -> PlotFrame {
        PlotFrame {
            mode: PlotMode::Scatterplot,
            dispose_previous: true,
            geometry,
            legend: Legend::default(),
            normalization: Normalization::default(),
        }
    }

    #[test]
    fn test_json_is_tagged() {
        let mut pc = PointCloud::default();
        pc.push(0, Vertex::new(0.0, 0.5, 1.0), Rgb::new(1.0, 0.0, 0.0));
        let json = frame(Geometry::Points(pc)).to_json().unwrap();
        assert!(json.contains("\"kind\": \"points\""));
        assert!(json.contains("\"mode\": \"scatterplot\""));
        assert!(!json.contains("\"labels\""));
    }

    #[test]
    fn test_accessors() {
        let f = frame(Geometry::Lines(LineStrip::default()));
        assert!(f.points().is_some());
        assert!(f.bars().is_none());
        assert!(f.surface().is_none());
    }
}
