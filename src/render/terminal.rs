//! Static terminal preview of a [`PlotFrame`].
//!
//! Point modes are drawn as an `x1 × x2` side view, bars and surfaces as an
//! `x1 × x3` top view coloured by value. The box chrome follows the usual
//! layout:
//!
//! ```text
//! ┌──────  title ──────┐
//! │ ...  canvas  ...   │
//! └──── x1 · x2 · x3 ──┘
//!   ■ label  ■ label
//! ```

use std::fmt::Write as _;

use crate::{
    core::{
        color::{AnsiCode, Rgb, colorize},
        constants::{BORDER_WIDTH, DECIMAL_PRECISION},
    },
    render::frame::{BarChart, Geometry, LineStrip, PlotFrame, PointCloud, Surface},
};

/// Two spaces in front, one space behind
const TITLE_PADDING: usize = 3;

// Box-drawing glyphs
const TL: &str = "┌";
const TR: &str = "┐";
const BL: &str = "└";
const BR: &str = "┘";
const H: &str = "─";
const V: &str = "│";

const POINT: char = '•';
const TRAIL: char = '·';
const BLOCK: char = '█';
const HIDDEN: char = '░';
const SWATCH: &str = "■";

/// Default canvas for point modes.
const POINT_CANVAS: (usize, usize) = (64, 20);

// --- Helpers ---

/// Write centred colored text between horizontal rules.
fn push_centered(buf: &mut String, text: &str, width: usize, color: &AnsiCode) {
    let inner = width.saturating_sub(TITLE_PADDING);
    let len = text.chars().count();
    if len == 0 || len > inner {
        buf.push_str(&H.repeat(width));
        return;
    }
    let pad_left = (inner - len) / 2;
    let pad_right = inner - len - pad_left;

    buf.push_str(&H.repeat(pad_left));
    buf.push_str("  ");
    buf.push_str(&colorize(color, text));
    buf.push(' ');
    buf.push_str(&H.repeat(pad_right));
}

#[derive(Clone, Copy)]
struct Glyph {
    ch: char,
    color: Option<Rgb>,
}

const BLANK: Glyph = Glyph {
    ch: ' ',
    color: None,
};

struct Canvas {
    cols: usize,
    rows: usize,
    cells: Vec<Glyph>,
}

impl Canvas {
    fn new(cols: usize, rows: usize) -> Self {
        let (cols, rows) = (cols.max(1), rows.max(1));
        Self {
            cols,
            rows,
            cells: vec![BLANK; cols * rows],
        }
    }

    /// `row` counts from the top.
    fn put(&mut self, col: usize, row: usize, g: Glyph) {
        if col < self.cols && row < self.rows {
            self.cells[row * self.cols + col] = g;
        }
    }

    fn get(&self, col: usize, row: usize) -> Glyph {
        self.cells[row * self.cols + col]
    }
}

/// Map `v` in `[lo, hi]` onto `0..n`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn bucket(v: f64, lo: f64, hi: f64, n: usize) -> usize {
    let span = hi - lo;
    let t = if span > 0.0 { (v - lo) / span } else { 0.5 };
    ((t * (n - 1) as f64).round().max(0.0) as usize).min(n - 1)
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

// --- Geometry painters ---

fn paint_points(c: &mut Canvas, p: &PointCloud) -> Vec<(usize, usize)> {
    let (x_lo, x_hi) = extent(p.positions.iter().map(|v| v.x));
    let (y_lo, y_hi) = extent(p.positions.iter().map(|v| v.y));
    let mut spots = Vec::with_capacity(p.len());
    for (v, color) in p.positions.iter().zip(&p.colors) {
        let col = bucket(v.x, x_lo, x_hi, c.cols);
        let row = c.rows - 1 - bucket(v.y, y_lo, y_hi, c.rows);
        c.put(
            col,
            row,
            Glyph {
                ch: POINT,
                color: Some(*color),
            },
        );
        spots.push((col, row));
    }
    spots
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]
fn paint_lines(c: &mut Canvas, l: &LineStrip) {
    let spots = paint_points(c, &l.points);
    for s in &l.segments {
        let (Some(&(c0, r0)), Some(&(c1, r1))) = (spots.get(s.from), spots.get(s.to)) else {
            continue;
        };
        let color = l.points.colors.get(s.from).copied();
        let steps = c0.abs_diff(c1).max(r0.abs_diff(r1));
        for k in 1..steps {
            let t = k as f64 / steps as f64;
            let col = (c0 as f64 + (c1 as f64 - c0 as f64) * t).round() as usize;
            let row = (r0 as f64 + (r1 as f64 - r0 as f64) * t).round() as usize;
            if c.get(col.min(c.cols - 1), row.min(c.rows - 1)).ch == ' ' {
                c.put(col, row, Glyph { ch: TRAIL, color });
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn paint_bars(c: &mut Canvas, b: &BarChart) {
    let x_n = b.bars.iter().map(|b| b.cell.0).max().unwrap_or(0) + 1;
    let z_n = b.bars.iter().map(|b| b.cell.1).max().unwrap_or(0) + 1;
    for bar in &b.bars {
        let col = bucket(bar.cell.0 as f64, 0.0, (x_n - 1) as f64, c.cols.min(x_n));
        let row = bucket(bar.cell.1 as f64, 0.0, (z_n - 1) as f64, c.rows.min(z_n));
        let ch = if bar.visible { BLOCK } else { HIDDEN };
        c.put(
            col,
            row,
            Glyph {
                ch,
                color: Some(bar.color),
            },
        );
    }
}

#[allow(clippy::cast_precision_loss)]
fn paint_surface(c: &mut Canvas, s: &Surface) {
    for x in 0..s.x_count {
        for z in 0..s.z_count {
            let i = x * s.z_count + z;
            let Some(color) = s.colors.get(i).copied().flatten() else {
                continue;
            };
            let col = bucket(x as f64, 0.0, (s.x_count - 1) as f64, c.cols.min(s.x_count));
            let row = bucket(z as f64, 0.0, (s.z_count - 1) as f64, c.rows.min(s.z_count));
            c.put(
                col,
                row,
                Glyph {
                    ch: BLOCK,
                    color: Some(color),
                },
            );
        }
    }
}

// --- Public API ---

/// Canvas size the frame would like, before fitting it to the terminal.
#[must_use]
pub fn natural_size(frame: &PlotFrame) -> (usize, usize) {
    match &frame.geometry {
        Geometry::Bars(b) => (
            b.bars.iter().map(|b| b.cell.0).max().map_or(1, |m| m + 1),
            b.bars.iter().map(|b| b.cell.1).max().map_or(1, |m| m + 1),
        ),
        Geometry::Surface(s) => (s.x_count, s.z_count),
        Geometry::Points(_) | Geometry::Lines(_) => POINT_CANVAS,
    }
}

/// Draw `frame` into a `cols × rows` canvas with box chrome and legend.
#[must_use]
pub fn render_preview(frame: &PlotFrame, (cols, rows): (usize, usize)) -> String {
    let mut canvas = Canvas::new(cols, rows);
    match &frame.geometry {
        Geometry::Points(p) => {
            paint_points(&mut canvas, p);
        }
        Geometry::Lines(l) => paint_lines(&mut canvas, l),
        Geometry::Bars(b) => paint_bars(&mut canvas, b),
        Geometry::Surface(s) => paint_surface(&mut canvas, s),
    }

    let accent = AnsiCode::dim();
    let line_len = canvas.cols + BORDER_WIDTH;
    let mut out = String::new();

    // --- top ---
    out.push_str(TL);
    push_centered(&mut out, &frame.legend.title, line_len - BORDER_WIDTH, &accent);
    out.push_str(TR);
    out.push('\n');

    // --- canvas ---
    for r in 0..canvas.rows {
        out.push_str(V);
        for c in 0..canvas.cols {
            let g = canvas.get(c, r);
            match g.color {
                Some(rgb) => out.push_str(&colorize(&AnsiCode::from(rgb), &g.ch.to_string())),
                None => out.push(g.ch),
            }
        }
        out.push_str(V);
        out.push('\n');
    }

    // --- bottom ---
    let t = &frame.legend.axis_titles;
    let axes = match frame.geometry {
        Geometry::Points(_) | Geometry::Lines(_) => format!("{} → · {} ↑", t.x1, t.x2),
        _ => format!("{} → · {} ↓", t.x1, t.x3),
    };
    out.push_str(BL);
    push_centered(&mut out, &axes, line_len - BORDER_WIDTH, &accent);
    out.push_str(BR);
    out.push('\n');

    // --- legend ---
    let n = &frame.normalization;
    let _ = writeln!(
        out,
        "  {}: [{:.p$}, {:.p$}]  {}: [{:.p$}, {:.p$}]  {}: [{:.p$}, {:.p$}]",
        t.x1,
        n.x1.min,
        n.x1.max,
        t.x2,
        n.x2.min,
        n.x2.max,
        t.x3,
        n.x3.min,
        n.x3.max,
        p = DECIMAL_PRECISION
    );
    if let Some(labels) = &frame.legend.labels {
        out.push(' ');
        for (label, rgb) in labels.iter() {
            let _ = write!(out, " {} {label}", colorize(&AnsiCode::from(rgb), SWATCH));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{bounds::Normalization, color_map::LabelColorMap, config::PlotMode},
        render::frame::{Bar, Legend, Vertex},
    };

    fn frame(geometry: Geometry) -> PlotFrame {
        PlotFrame {
            mode: PlotMode::Scatterplot,
            dispose_previous: true,
            geometry,
            legend: Legend {
                title: "demo".into(),
                ..Legend::default()
            },
            normalization: Normalization::default(),
        }
    }

    #[test]
    fn test_bucket_edges() {
        assert_eq!(bucket(0.0, 0.0, 1.0, 10), 0);
        assert_eq!(bucket(1.0, 0.0, 1.0, 10), 9);
        assert_eq!(bucket(5.0, 5.0, 5.0, 11), 5);
    }

    #[test]
    fn test_preview_has_chrome() {
        let mut p = PointCloud::default();
        p.push(0, Vertex::new(0.0, 0.0, 0.0), Rgb::new(1.0, 0.0, 0.0));
        p.push(1, Vertex::new(1.0, 1.0, 0.0), Rgb::new(0.0, 1.0, 0.0));
        let s = render_preview(&frame(Geometry::Points(p)), (20, 5));
        let lines: Vec<&str> = s.lines().collect();
        assert!(lines[0].starts_with(TL) && lines[0].ends_with(TR));
        assert!(lines[0].contains("demo"));
        assert!(lines[6].starts_with(BL));
        assert_eq!(s.matches(POINT).count(), 2);
    }

    #[test]
    fn test_bars_hidden_glyph() {
        let bar = |cell, visible| Bar {
            cell,
            base: Vertex::default(),
            value: 1.0,
            height: 1.0,
            color: Rgb::BLACK,
            visible,
        };
        let b = BarChart {
            bars: vec![bar((0, 0), true), bar((1, 1), false)],
            ..BarChart::default()
        };
        let f = frame(Geometry::Bars(b));
        assert_eq!(natural_size(&f), (2, 2));
        let s = render_preview(&f, (2, 2));
        assert_eq!(s.matches(BLOCK).count(), 1);
        assert_eq!(s.matches(HIDDEN).count(), 1);
    }

    #[test]
    fn test_label_legend_line() {
        let mut f = frame(Geometry::Points(PointCloud::default()));
        f.legend.labels = Some(LabelColorMap::default());
        let s = render_preview(&f, (4, 2));
        assert_eq!(s.lines().count(), 6);
    }
}
