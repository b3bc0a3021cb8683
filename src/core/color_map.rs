//! Per-row colour assignment.
//!
//! Exactly one strategy applies per call, checked in this order:
//! * no colour column      - every row gets the default colour
//! * labeled               - one evenly spaced hue per distinct value
//! * literal colour text   - `rgb(...)`, `hsl(...)`, `#rrggbb` per row
//! * numeric + heat filter - heat scale over the column's min/max
//! * numeric, unfiltered   - values are packed `0xRRGGBB` integers

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::core::{
    color::{ColorValue, Rgb, heat, looks_like_color, parse_color, parse_color_str},
    constants::{COLOR_LIGHTNESS, COLOR_SATURATION, DEFAULT_COLOR},
    data::{Cell, Table},
};

/// What to colour by.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRequest {
    /// `None` paints every row with `default_color`.
    pub column: Option<usize>,
    pub default_color: ColorValue,
    /// Treat the column as class labels.
    pub labeled: bool,
    /// Run numeric columns through the heat scale instead of reading them
    /// as packed RGB.
    pub filter_to_heat: bool,
    pub hue_offset: f64,
}

impl Default for ColorRequest {
    fn default() -> Self {
        Self {
            column: None,
            default_color: ColorValue::Packed(DEFAULT_COLOR),
            labeled: false,
            filter_to_heat: true,
            hue_offset: 0.0,
        }
    }
}

/// Which strategy produced a [`ColorMapping`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorStrategy {
    Uniform,
    Labeled,
    Literal,
    Heat,
    Packed,
}

/// Label → colour, in the order labels were first seen.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LabelColorMap {
    entries: Vec<(String, Rgb)>,
}

impl LabelColorMap {
    #[must_use]
    pub fn get(&self, label: &str) -> Option<Rgb> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, c)| *c)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorMapping {
    /// One colour per table row, same order.
    pub row_colors: Vec<Rgb>,
    /// Filled in labeled mode only.
    pub labels: LabelColorMap,
    pub strategy: ColorStrategy,
}

/// Result of [`map_colors`].
#[derive(Clone, Debug, PartialEq)]
pub enum ColorOutcome {
    Mapped(ColorMapping),
    /// The column holds text that is not a colour; call again with
    /// `labeled = true`.
    RetryAsLabeled,
}

impl ColorOutcome {
    #[must_use]
    pub fn mapped(self) -> Option<ColorMapping> {
        match self {
            Self::Mapped(m) => Some(m),
            Self::RetryAsLabeled => None,
        }
    }
}

/// Assign a colour to every row of `table`.
#[must_use]
pub fn map_colors(table: &Table, req: &ColorRequest) -> ColorOutcome {
    let Some(col) = req.column else {
        return ColorOutcome::Mapped(uniform(table, &req.default_color));
    };

    if req.labeled {
        return ColorOutcome::Mapped(labeled(table, col));
    }

    match table.cell(0, col) {
        Some(Cell::Text(first)) => literal(table, col, first),
        _ if req.filter_to_heat => ColorOutcome::Mapped(heat_scaled(table, col, req.hue_offset)),
        _ => ColorOutcome::Mapped(packed(table, col)),
    }
}

fn mapping(row_colors: Vec<Rgb>, strategy: ColorStrategy) -> ColorMapping {
    ColorMapping {
        row_colors,
        labels: LabelColorMap::default(),
        strategy,
    }
}

fn uniform(table: &Table, default_color: &ColorValue) -> ColorMapping {
    let color = parse_color(default_color).unwrap_or_else(|e| {
        warn!(color = %default_color, error = %e, "invalid default colour, using black");
        Rgb::BLACK
    });
    mapping(vec![color; table.len()], ColorStrategy::Uniform)
}

#[allow(clippy::cast_precision_loss)]
fn labeled(table: &Table, col: usize) -> ColorMapping {
    if let Some(Cell::Text(first)) = table.cell(0, col) {
        if looks_like_color(first) {
            warn!(
                value = %first,
                column = col,
                "colour column looks like colour literals but labeled mode is on"
            );
        }
    }

    let mut classes: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let ids: Vec<usize> = table
        .column(col)
        .map(|cell| {
            let label = cell.to_string();
            *classes.entry(label).or_insert_with_key(|l| {
                order.push(l.clone());
                order.len() - 1
            })
        })
        .collect();

    let hue_step = 1.0 / order.len().max(1) as f64;
    let palette: Vec<Rgb> = (0..order.len())
        .map(|id| Rgb::from_hsl(id as f64 * hue_step, COLOR_SATURATION, COLOR_LIGHTNESS))
        .collect();

    ColorMapping {
        row_colors: ids.iter().map(|&id| palette[id]).collect(),
        labels: LabelColorMap {
            entries: order.into_iter().zip(palette).collect(),
        },
        strategy: ColorStrategy::Labeled,
    }
}

fn literal(table: &Table, col: usize, first: &str) -> ColorOutcome {
    let lower = first.trim().to_ascii_lowercase();
    if !(lower.starts_with("rgb") || lower.starts_with("hsl") || lower.starts_with('#')) {
        warn!(
            value = %first,
            column = col,
            "colour column holds unrecognized text; expected numbers, #rrggbb, rgb(r,g,b) or hsl(h,s,l)"
        );
        return ColorOutcome::RetryAsLabeled;
    }

    let colors = table
        .column(col)
        .enumerate()
        .map(|(row, cell)| {
            let parsed = match cell {
                Cell::Text(s) => parse_color_str(s),
                other => parse_color(&ColorValue::Literal(other.to_string())),
            };
            parsed.unwrap_or_else(|e| {
                warn!(row, error = %e, "skipping bad colour cell");
                Rgb::BLACK
            })
        })
        .collect();
    ColorOutcome::Mapped(mapping(colors, ColorStrategy::Literal))
}

fn heat_scaled(table: &Table, col: usize, hue_offset: f64) -> ColorMapping {
    let (min, max) = table
        .column(col)
        .filter_map(Cell::as_finite)
        .fold(None, |acc: Option<(f64, f64)>, v| {
            Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
        })
        .unwrap_or((0.0, 0.0));

    let colors = table
        .column(col)
        .enumerate()
        .map(|(row, cell)| match cell.as_finite() {
            Some(v) => heat(v, min, max, hue_offset),
            None => {
                warn!(row, value = %cell, "non-numeric value in heat colour column");
                Rgb::BLACK
            }
        })
        .collect();
    mapping(colors, ColorStrategy::Heat)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn packed(table: &Table, col: usize) -> ColorMapping {
    let colors = table
        .column(col)
        .enumerate()
        .map(|(row, cell)| match cell.as_finite() {
            Some(v) => Rgb::from_packed((v.trunc() as i64) as u32 & 0x00FF_FFFF),
            None => {
                warn!(row, value = %cell, "non-numeric value in packed colour column");
                Rgb::BLACK
            }
        })
        .collect();
    mapping(colors, ColorStrategy::Packed)
}
