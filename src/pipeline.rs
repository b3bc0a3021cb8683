//! Plot entry points: text, tables and formulas in, [`PlotFrame`] out.
//!
//! Every call runs against a caller-owned [`Session`]:
//! * text  -> fingerprint -> parse (or cached table)
//! * table -> colours + per-axis normalization
//! * mode  -> points, line segments, bars (grid splat) or surface
//!
//! Timing of each stage is reported as `debug!` events.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::{
    core::{
        bounds::{AxisNormalization, Normalization, compute_axis_normalization},
        color::{Rgb, heat},
        color_map::{ColorMapping, ColorOutcome, ColorRequest, map_colors},
        config::{AxisColumns, AxisOptions, PlotMode, PlotOptions},
        data::{Cell, Separator, Table, parse_row, parse_table},
        error::PlotError,
        formula::{sample_rows, sample_surface},
        session::{ColorCache, Fingerprint, PlotState, Session},
    },
    render::{
        frame::{
            AxisTitles, Bar, BarChart, Geometry, Legend, LineStrip, PlotFrame, PointCloud,
            Segment, Surface, Vertex,
        },
        grid::{SplatColumns, SplatTransform, splat},
    },
};

#[inline]
fn stamp(started: Instant, stage: &'static str) {
    let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    debug!(elapsed_us, stage);
}

// --- Entry points ---

/// Plot delimited text. An unchanged text (same fingerprint) reuses the
/// session's table without parsing.
pub fn plot_csv_str(
    session: &mut Session,
    text: &str,
    opts: &PlotOptions,
) -> Result<PlotFrame, PlotError> {
    let started = Instant::now();
    let parse = opts.parse_options();
    let fp = Fingerprint::of(text, &opts.title, &parse);

    if !session.should_reparse(&fp) {
        info!(title = %opts.title, "input unchanged, using the cached table");
        let (table, state) = session.split_mut();
        let table = table.ok_or(PlotError::EmptyInput)?;
        return plot_rows(table, opts, state, started);
    }

    let table = parse_table(text, &parse)?;
    stamp(started, "parsed text");
    session.remember_separator(table.separator());

    if opts.update_cache {
        session.store(table, fp);
        let (table, state) = session.split_mut();
        let table = table.ok_or(PlotError::EmptyInput)?;
        plot_rows(table, opts, state, started)
    } else {
        plot_rows(&table, opts, session.state_mut(), started)
    }
}

/// Plot an already typed table.
pub fn plot_table(
    session: &mut Session,
    table: Table,
    opts: &PlotOptions,
) -> Result<PlotFrame, PlotError> {
    let started = Instant::now();
    if opts.update_cache {
        session.store_table(table);
        let (table, state) = session.split_mut();
        let table = table.ok_or(PlotError::EmptyInput)?;
        plot_rows(table, opts, state, started)
    } else {
        plot_rows(&table, opts, session.state_mut(), started)
    }
}

/// Plot `x2 = f(x1, x3)` sampled over the session's vertex grid.
///
/// Scatter and bar modes sample rows and colour them by height. Any other
/// mode draws a surface.
pub fn plot_formula<F>(session: &mut Session, f: F, opts: &PlotOptions) -> Result<PlotFrame, PlotError>
where
    F: Fn(f64, f64) -> f64,
{
    let started = Instant::now();
    session.clear_fingerprint();
    let dims = session.dimensions();

    match opts.mode {
        PlotMode::Scatterplot | PlotMode::Barchart => {
            let table = sample_rows(&f, &dims, opts.mode);
            stamp(started, "sampled formula");
            let opts = PlotOptions {
                columns: AxisColumns::default(),
                color_column: Some(1),
                labeled: false,
                header: Some(false),
                ..opts.clone()
            };
            plot_rows(&table, &opts, session.state_mut(), started)
        }
        mode => {
            if mode != PlotMode::Polygon {
                warn!(mode = mode.name(), "mode not available for formulas, assuming polygon");
            }
            Ok(plot_surface(session.state_mut(), &f, opts, started))
        }
    }
}

/// A row handed to [`add_data_point`].
#[derive(Clone, Debug, PartialEq)]
pub enum DataRow {
    /// Split with the session's separator.
    Text(String),
    Cells(Vec<Cell>),
}

impl From<&str> for DataRow {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<Vec<Cell>> for DataRow {
    fn from(c: Vec<Cell>) -> Self {
        Self::Cells(c)
    }
}

impl From<Vec<f64>> for DataRow {
    fn from(v: Vec<f64>) -> Self {
        Self::Cells(v.into_iter().map(Cell::Number).collect())
    }
}

/// Overrides for [`add_data_point`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointUpdate {
    /// Re-fit `x1`, `x2`, `x3` with the new row. Axes left off keep the
    /// cached range.
    pub normalize: [bool; 3],
    pub keep_old_plot: bool,
}

impl Default for PointUpdate {
    fn default() -> Self {
        Self {
            normalize: [false; 3],
            keep_old_plot: true,
        }
    }
}

/// Append one row to the cached table and draw just that row on top of
/// the previous plot, with the options of the previous plot.
pub fn add_data_point(
    session: &mut Session,
    row: impl Into<DataRow>,
    update: &PointUpdate,
) -> Result<PlotFrame, PlotError> {
    let started = Instant::now();
    let cells = match row.into() {
        DataRow::Cells(c) => c,
        DataRow::Text(line) => {
            let sep = match session.separator() {
                Some(s) => s.clone(),
                None => Separator::detect(&line)?,
            };
            parse_row(&line, &sep)
        }
    };

    match session.table_mut() {
        Some(t) => t.push_row(cells.clone())?,
        None => session.store_table(Table::from_rows(vec![cells.clone()])),
    }

    let base = session.last_options().cloned().unwrap_or_default();
    let [n1, n2, n3] = update.normalize;
    let opts = PlotOptions {
        keep_old_plot: update.keep_old_plot,
        header: Some(false),
        update_cache: false,
        x1: AxisOptions {
            normalize: n1,
            ..base.x1.clone()
        },
        x2: AxisOptions {
            normalize: n2,
            ..base.x2.clone()
        },
        x3: AxisOptions {
            normalize: n3,
            ..base.x3.clone()
        },
        ..base
    };

    let single = Table::from_rows(vec![cells]);
    plot_rows(&single, &opts, session.state_mut(), started)
}

// --- Table plotting ---

fn plot_rows(
    table: &Table,
    opts: &PlotOptions,
    state: &mut PlotState,
    started: Instant,
) -> Result<PlotFrame, PlotError> {
    if table.is_empty() {
        return Err(PlotError::EmptyInput);
    }
    let mode = if opts.mode == PlotMode::Polygon {
        warn!("polygon mode needs a formula, plotting a scatterplot");
        PlotMode::Scatterplot
    } else {
        opts.mode
    };

    let cols = resolve_columns(table, opts.columns);
    let request = ColorRequest {
        column: resolve_color_column(table, opts.color_column),
        ..opts.color_request()
    };

    let dispose_previous = state.begin_mesh(mode, opts.keep_old_plot);
    let extend = opts.keep_old_plot && !dispose_previous;

    let mapping = assign_colors(table, request.clone())?;
    stamp(started, "assigned colours");

    let previous = if extend { state.normalization } else { None };
    let mut norm = Normalization {
        x1: normalize_axis(table, cols.x1, &opts.x1, previous.map(|n| n.x1), extend),
        x2: normalize_axis(table, cols.x2, &opts.x2, previous.map(|n| n.x2), extend),
        x3: normalize_axis(table, cols.x3, &opts.x3, previous.map(|n| n.x3), extend),
    };
    stamp(started, "normalized");

    let geometry = match mode {
        PlotMode::Barchart => Geometry::Bars(bar_chart(table, cols, opts, state, extend, &mut norm)),
        PlotMode::Lineplot => Geometry::Lines(line_strip(point_cloud(
            table, cols, &norm, &mapping, opts, state,
        ))),
        _ => Geometry::Points(point_cloud(table, cols, &norm, &mapping, opts, state)),
    };
    stamp(started, "built geometry");

    let labels = (mode != PlotMode::Barchart && !mapping.labels.is_empty())
        .then(|| mapping.labels.clone());
    let legend = Legend {
        title: opts.title.clone(),
        axis_titles: AxisTitles {
            x1: axis_title(table, cols.x1, &opts.x1, "x1"),
            x2: axis_title(table, cols.x2, &opts.x2, "x2"),
            x3: axis_title(table, cols.x3, &opts.x3, "x3"),
        },
        labels,
    };

    state.normalization = Some(norm);
    state.colors = Some(ColorCache {
        request,
        labels: mapping.labels,
    });
    state.options = Some(PlotOptions {
        columns: cols,
        ..opts.clone()
    });

    Ok(PlotFrame {
        mode,
        dispose_previous,
        geometry,
        legend,
        normalization: norm,
    })
}

/// Out-of-range axis columns fall back to the rightmost numeric column
/// among the first three.
fn resolve_columns(table: &Table, req: AxisColumns) -> AxisColumns {
    let width = table.width();
    if req.max() < width {
        return req;
    }
    let probe = usize::from(table.len() > 1);
    let fallback = (0..width.min(3))
        .rev()
        .find(|&c| table.cell(probe, c).is_some_and(Cell::is_number))
        .unwrap_or(0);

    let fix = |column: usize, axis: &'static str| {
        if column < width {
            return column;
        }
        let e = PlotError::ColumnIndexOutOfRange { column, width };
        warn!(axis, fallback, "{e}, clamping");
        fallback
    };
    AxisColumns::new(fix(req.x1, "x1"), fix(req.x2, "x2"), fix(req.x3, "x3"))
}

fn resolve_color_column(table: &Table, column: Option<usize>) -> Option<usize> {
    let width = table.width();
    column.filter(|&c| {
        let ok = c < width;
        if !ok {
            let e = PlotError::ColumnIndexOutOfRange { column: c, width };
            warn!("{e}, colour column ignored");
        }
        ok
    })
}

/// Map colours, retrying once as labels when the column holds text that is
/// not a colour.
fn assign_colors(table: &Table, req: ColorRequest) -> Result<ColorMapping, PlotError> {
    match map_colors(table, &req) {
        ColorOutcome::Mapped(m) => Ok(m),
        ColorOutcome::RetryAsLabeled => {
            warn!(column = ?req.column, "colour column is not made of colours, treating it as labels");
            let req = ColorRequest {
                labeled: true,
                ..req
            };
            map_colors(table, &req).mapped().ok_or_else(|| {
                PlotError::UnrecognizedColorFormat("labeled colouring failed".to_owned())
            })
        }
    }
}

fn normalize_axis(
    table: &Table,
    column: usize,
    axis: &AxisOptions,
    previous: Option<AxisNormalization>,
    extend: bool,
) -> AxisNormalization {
    match (axis.normalize, previous) {
        (true, prev) => compute_axis_normalization(table, column, prev.as_ref(), extend),
        // extending without re-fitting keeps the old placement
        (false, Some(prev)) if extend => prev,
        (false, _) => AxisNormalization::fixed(axis.scale),
    }
}

fn axis_title(table: &Table, column: usize, axis: &AxisOptions, fallback: &str) -> String {
    axis.title
        .clone()
        .or_else(|| table.column_title(column))
        .unwrap_or_else(|| fallback.to_owned())
}

fn point_cloud(
    table: &Table,
    cols: AxisColumns,
    norm: &Normalization,
    mapping: &ColorMapping,
    opts: &PlotOptions,
    state: &PlotState,
) -> PointCloud {
    let dims = state.dimensions;
    let mut cloud = PointCloud {
        point_size: opts.data_point_size,
        ..PointCloud::default()
    };
    let mut skipped = 0usize;

    for (i, row) in table.rows().iter().enumerate() {
        let get = |c: usize| row.get(c).and_then(Cell::as_finite);
        let (Some(x), Some(y), Some(z)) = (get(cols.x1), get(cols.x2), get(cols.x3)) else {
            skipped += 1;
            continue;
        };
        let v = Vertex::new(
            norm.x1.project(x, dims.x_len()),
            norm.x2.project(y, dims.y_len()),
            norm.x3.project(z, dims.z_len()),
        );
        let color = mapping.row_colors.get(i).copied().unwrap_or(Rgb::BLACK);
        cloud.push(i, v, color);
    }
    if skipped > 0 {
        warn!(skipped, "rows without numeric coordinates were skipped");
    }
    cloud
}

fn line_strip(points: PointCloud) -> LineStrip {
    let segments = (1..points.len())
        .map(|i| Segment { from: i - 1, to: i })
        .collect();
    LineStrip { points, segments }
}

#[allow(clippy::cast_precision_loss)]
fn bar_chart(
    table: &Table,
    cols: AxisColumns,
    opts: &PlotOptions,
    state: &mut PlotState,
    extend: bool,
    norm: &mut Normalization,
) -> BarChart {
    let dims = state.dimensions;
    let grid = state.grid_mut();
    if !extend {
        grid.reset();
    }

    let tf = SplatTransform {
        x_scale: dims.x_vertices() as f64 / norm.x1.scale,
        z_scale: dims.z_vertices() as f64 / norm.x3.scale,
        min_x: norm.x1.min,
        min_z: norm.x3.min,
    };
    let columns = SplatColumns {
        x: cols.x1,
        value: cols.x2,
        z: cols.x3,
    };
    let report = splat(table, columns, grid, tf);
    let (min, max) = (report.min, report.max);

    let scale = if opts.x2.normalize {
        AxisNormalization::new(min, max).scale
    } else {
        AxisNormalization::fixed(opts.x2.scale).scale
    };
    norm.x2 = AxisNormalization {
        min: 0.0,
        max,
        scale,
    };

    let threshold = opts.bar_size_threshold * max.abs().max(min.abs());
    let bars = grid
        .touched()
        .map(|(x, z, cell)| Bar {
            cell: (x, z),
            base: Vertex::new(x as f64 / dims.x_res(), 0.0, z as f64 / dims.z_res()),
            value: cell.value,
            height: cell.value / scale * dims.y_len(),
            color: heat(cell.value, min, max, opts.hue_offset),
            visible: cell.value.abs() > threshold,
        })
        .collect();

    let width = 1.0 - opts.bar_padding;
    BarChart {
        bars,
        footprint: (width / dims.x_res(), width / dims.z_res()),
        scale_x: tf.x_scale,
        scale_z: tf.z_scale,
        value_range: (min, max),
    }
}

// --- Formula surface ---

#[allow(clippy::cast_precision_loss)]
fn plot_surface<F>(state: &mut PlotState, f: &F, opts: &PlotOptions, started: Instant) -> PlotFrame
where
    F: Fn(f64, f64) -> f64,
{
    let dims = state.dimensions;
    let samples = sample_surface(f, &dims);
    stamp(started, "sampled surface");

    // the surface is rewritten in place, so only a mode change disposes
    let dispose_previous = state.begin_mesh(PlotMode::Polygon, true);

    let scale = if opts.x2.normalize {
        samples.hybrid_scale()
    } else {
        AxisNormalization::fixed(opts.x2.scale).scale
    };
    let heights = samples
        .heights
        .iter()
        .map(|h| h.map(|v| v / scale * dims.y_len()))
        .collect();
    let colors = samples
        .heights
        .iter()
        .map(|h| h.map(|v| heat(v, samples.min, samples.max, opts.hue_offset)))
        .collect();

    let norm = Normalization {
        x1: AxisNormalization::new(0.0, dims.x_vertices() as f64 / dims.x_res()),
        x2: AxisNormalization {
            min: samples.min,
            max: samples.max,
            scale,
        },
        x3: AxisNormalization::new(0.0, dims.z_vertices() as f64 / dims.z_res()),
    };
    state.normalization = Some(norm);
    state.options = Some(opts.clone());
    stamp(started, "built surface");

    let title = |axis: &AxisOptions, fallback: &str| {
        axis.title.clone().unwrap_or_else(|| fallback.to_owned())
    };
    PlotFrame {
        mode: PlotMode::Polygon,
        dispose_previous,
        geometry: Geometry::Surface(Surface {
            x_count: samples.x_count,
            z_count: samples.z_count,
            heights,
            colors,
            scale,
        }),
        legend: Legend {
            title: opts.title.clone(),
            axis_titles: AxisTitles {
                x1: title(&opts.x1, "x1"),
                x2: title(&opts.x2, "x2"),
                x3: title(&opts.x3, "x3"),
            },
            labels: None,
        },
        normalization: norm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Dimensions;

    const EPS: f64 = 1e-9;

    fn opts() -> PlotOptions {
        PlotOptions::builder().build()
    }

    #[test]
    fn test_scatter_vertices_are_normalized() {
        let mut s = Session::new();
        let f = plot_csv_str(&mut s, "0;0;0\n2;4;8\n1;2;4", &opts()).unwrap();
        let p = f.points().unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.positions[1], Vertex::new(1.0, 1.0, 1.0));
        assert_eq!(p.positions[2], Vertex::new(0.5, 0.5, 0.5));
        assert!(f.dispose_previous);
    }

    #[test]
    fn test_out_of_range_columns_clamp() {
        let t = Table::from_rows(vec![
            vec![Cell::Number(1.0), Cell::Number(2.0)],
            vec![Cell::Number(3.0), Cell::Text("x".into())],
        ]);
        // probe row 1: column 1 is text, column 0 numeric
        assert_eq!(resolve_columns(&t, AxisColumns::new(0, 1, 5)), AxisColumns::new(0, 1, 0));
        assert_eq!(resolve_color_column(&t, Some(2)), None);
        assert_eq!(resolve_color_column(&t, Some(1)), Some(1));
    }

    #[test]
    fn test_text_color_column_retries_as_labels() {
        let mut s = Session::new();
        let o = PlotOptions::builder().color_column(Some(3)).build();
        let f = plot_csv_str(&mut s, "1;2;3;cat\n4;5;6;dog\n7;8;9;cat", &o).unwrap();
        let labels = f.legend.labels.as_ref().unwrap();
        assert_eq!(labels.len(), 2);
        let p = f.points().unwrap();
        assert_eq!(p.colors[0], p.colors[2]);
        assert_ne!(p.colors[0], p.colors[1]);
    }

    #[test]
    fn test_lineplot_segments() {
        let mut s = Session::new();
        let o = PlotOptions::builder().mode(PlotMode::Lineplot).build();
        let f = plot_csv_str(&mut s, "0;0;0\n1;1;1\nx;1;1\n2;2;2", &o).unwrap();
        let Geometry::Lines(l) = &f.geometry else {
            panic!("expected lines");
        };
        assert_eq!(l.points.len(), 3);
        assert_eq!(l.segments, vec![Segment { from: 0, to: 1 }, Segment { from: 1, to: 2 }]);
    }

    #[test]
    fn test_bar_heights_and_threshold() {
        let mut s = Session::with_dimensions(Dimensions::new(2, 2, 1.0, 1.0, 1.0));
        let o = PlotOptions::builder()
            .mode(PlotMode::Barchart)
            .bar_size_threshold(0.5)
            .build();
        // x and z span [0, 1] -> factor 2 -> cells 0 and 2
        let f = plot_csv_str(&mut s, "0;1;0\n1;4;1", &o).unwrap();
        let b = f.bars().unwrap();
        assert_eq!(b.bars.len(), 2);
        assert_eq!(b.value_range, (0.0, 4.0));
        assert_eq!(f.normalization.x2.min, 0.0);
        let small = b.bars.iter().find(|b| b.cell == (0, 0)).unwrap();
        let big = b.bars.iter().find(|b| b.cell == (2, 2)).unwrap();
        assert!(!small.visible && big.visible);
        assert!((big.height - 1.0).abs() < EPS);
        assert!((small.height - 0.25).abs() < EPS);
        assert!((b.footprint.0 - 0.25).abs() < EPS);
        assert!(f.legend.labels.is_none());
    }

    #[test]
    fn test_formula_surface() {
        let mut s = Session::with_dimensions(Dimensions::new(2, 2, 1.0, 1.0, 1.0));
        let o = PlotOptions::builder().mode(PlotMode::Polygon).build();
        let f = plot_formula(&mut s, |x, z| if x > 0.9 { f64::NAN } else { x + z }, &o).unwrap();
        let surf = f.surface().unwrap();
        assert_eq!(surf.heights.len(), 9);
        assert!(surf.heights[6].is_none());
        // largest finite value: f(0.5, 1) = 1.5, smallest f(0, 0) = 0
        assert!((surf.scale - 1.5).abs() < EPS);
        assert_eq!(s.active_mesh(), Some(PlotMode::Polygon));
    }

    #[test]
    fn test_formula_clears_fingerprint() {
        let mut s = Session::new();
        plot_csv_str(&mut s, "1;2;3\n4;5;6", &opts()).unwrap();
        assert!(s.fingerprint().is_some());
        plot_formula(&mut s, |x, z| x * z, &opts()).unwrap();
        assert!(s.fingerprint().is_none());
    }

    #[test]
    fn test_add_data_point_width_mismatch() {
        let mut s = Session::new();
        plot_csv_str(&mut s, "1;2;3\n4;5;6", &opts()).unwrap();
        let e = add_data_point(&mut s, "7;8", &PointUpdate::default()).unwrap_err();
        assert!(matches!(e, PlotError::RowWidthMismatch { expected: 3, got: 2 }));
        assert_eq!(s.load().map(Table::len), Some(2));
    }
}
