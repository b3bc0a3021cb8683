//! Delimited-text loader: separator detection, column-count repair and cell
//! typing with `lexical-core` float parsing.

use std::{
    borrow::Cow,
    fmt::{self, Display},
    io::Read,
};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{
    constants::{COLUMN_PROBE_EXTRA, COLUMN_PROBE_FRACTION, MIN_FRACTION_LINES},
    error::PlotError,
};

// --- Cells & Tables ---

/// One typed value of a table.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    /// Padding for rows shorter than the table.  Reads as `0.0` wherever a
    /// number is expected.
    Missing,
}

impl Cell {
    /// Numeric view of the cell. Text has none, padding counts as zero.
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Missing => Some(0.0),
            Self::Text(_) => None,
        }
    }

    /// Like [`Cell::as_number`] but drops `NaN` and infinities.
    #[inline]
    #[must_use]
    pub fn as_finite(&self) -> Option<f64> {
        self.as_number().filter(|v| v.is_finite())
    }

    #[inline]
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Type a raw field: strip one pair of wrapping quotes, then try a float.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let s = strip_quotes(raw.trim());
        match parse_number(s) {
            Some(v) => Self::Number(v),
            None => Self::Text(s.trim().to_owned()),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("0"),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Rectangular table. Every row is exactly `width` cells wide.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Table {
    header: Option<Vec<Cell>>,
    rows: Vec<Vec<Cell>>,
    width: usize,
    #[serde(skip)]
    separator: Option<Separator>,
}

impl Table {
    /// Build from loose rows, padding to the widest one.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows.into_iter().map(|r| fit_row(r, width)).collect();
        Self {
            header: None,
            rows,
            width,
            separator: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, header: Vec<Cell>) -> Self {
        self.header = Some(fit_row(header, self.width));
        self
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[inline]
    #[must_use]
    pub fn header(&self) -> Option<&[Cell]> {
        self.header.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Separator the text was split with, if the table came from text.
    #[must_use]
    pub fn separator(&self) -> Option<&Separator> {
        self.separator.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |r| r.get(col))
    }

    /// Header text of a column, if there is a header.
    #[must_use]
    pub fn column_title(&self, col: usize) -> Option<String> {
        self.header
            .as_ref()
            .and_then(|h| h.get(col))
            .map(ToString::to_string)
    }

    /// Append one row. It must match the table width exactly.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), PlotError> {
        if self.width != 0 && row.len() != self.width {
            return Err(PlotError::RowWidthMismatch {
                expected: self.width,
                got: row.len(),
            });
        }
        if self.width == 0 {
            self.width = row.len();
        }
        self.rows.push(row);
        Ok(())
    }
}

fn fit_row(mut row: Vec<Cell>, width: usize) -> Vec<Cell> {
    row.truncate(width);
    row.resize(width, Cell::Missing);
    row
}

// --- Separators ---

/// Column delimiter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Separator {
    Literal(String),
    /// Two or more consecutive whitespace characters (column-aligned text).
    WhitespaceRun,
}

impl Separator {
    /// `None` for the empty string, which means "detect".
    #[must_use]
    pub fn literal(s: &str) -> Option<Self> {
        (!s.is_empty()).then(|| Self::Literal(s.to_owned()))
    }

    /// Probe `;`, `,` and then whitespace runs against `line`.
    pub fn detect(line: &str) -> Result<Self, PlotError> {
        [
            Self::Literal(";".into()),
            Self::Literal(",".into()),
            Self::WhitespaceRun,
        ]
        .into_iter()
        .find(|s| s.occurs_in(line))
        .ok_or_else(|| PlotError::Format {
            line: line.to_owned(),
        })
    }

    #[must_use]
    pub fn occurs_in(&self, line: &str) -> bool {
        match self {
            Self::Literal(s) => line.contains(s.as_str()),
            Self::WhitespaceRun => !whitespace_runs(line).is_empty(),
        }
    }

    #[must_use]
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Self::Literal(s) => line.split(s.as_str()).collect(),
            Self::WhitespaceRun => {
                let mut out = Vec::new();
                let mut start = 0;
                for (lo, hi) in whitespace_runs(line) {
                    out.push(&line[start..lo]);
                    start = hi;
                }
                out.push(&line[start..]);
                out
            }
        }
    }
}

impl Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => f.write_str(s),
            Self::WhitespaceRun => f.write_str("<whitespace run>"),
        }
    }
}

/// Byte ranges of every run of 2+ whitespace characters.
fn whitespace_runs(line: &str) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut run: Option<(usize, usize)> = None; // (start, chars)
    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            run = Some(run.map_or((i, 1), |(s, n)| (s, n + 1)));
        } else if let Some((s, n)) = run.take() {
            if n >= 2 {
                runs.push((s, i));
            }
        }
    }
    if let Some((s, n)) = run {
        if n >= 2 {
            runs.push((s, line.len()));
        }
    }
    runs
}

// --- Helpers ---

#[inline]
fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Replace U+2212 MINUS SIGN with an ASCII hyphen.
#[inline]
#[must_use]
pub fn normalize_unicode_minus(s: &str) -> Cow<'_, str> {
    if s.contains('\u{2212}') {
        Cow::Owned(s.replace('\u{2212}', "-"))
    } else {
        Cow::Borrowed(s)
    }
}

/// Strict float parse of a trimmed field.
#[inline]
#[must_use]
pub fn parse_number(s: &str) -> Option<f64> {
    let s = normalize_unicode_minus(s.trim());
    lexical_core::parse::<f64>(s.as_bytes()).ok()
}

fn looks_like_header(first: Option<&str>, second: Option<&str>) -> bool {
    let numeric = |s: Option<&str>| s.is_some_and(|s| parse_number(strip_quotes(s.trim())).is_some());
    first.is_some() && !numeric(first) && numeric(second)
}

// --- Parser ---

/// How to read a text blob.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseOptions {
    /// `None` auto-detects.
    pub separator: Option<Separator>,
    /// `None` auto-detects on the first column.
    pub header: Option<bool>,
    /// Skip the per-cell type probe and the column-count repair.
    pub trust_input: bool,
    /// Share of lines to keep, in `(0, 1]`.
    pub fraction: f64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            separator: None,
            header: None,
            trust_input: false,
            fraction: 1.0,
        }
    }
}

/// Split `text` into non-empty lines, dropping a blank first and last line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split(['\n', '\r']).filter(|l| !l.is_empty()).collect();
    if lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// Parse delimited text into a [`Table`].
pub fn parse_table(text: &str, opts: &ParseOptions) -> Result<Table, PlotError> {
    let mut lines = split_lines(text);
    if lines.is_empty() {
        return Err(PlotError::EmptyInput);
    }

    if opts.fraction < 1.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let keep = ((lines.len() as f64 * opts.fraction) as usize)
            .max(MIN_FRACTION_LINES.min(lines.len()));
        lines.truncate(keep);
    }

    let separator = match &opts.separator {
        Some(sep) if sep.occurs_in(lines[0]) => sep.clone(),
        requested => {
            let detected = Separator::detect(lines[0])?;
            if let Some(sep) = requested {
                warn!(requested = %sep, detected = %detected, "separator not found in first line");
            } else {
                debug!(detected = %detected, "separator detected");
            }
            detected
        }
    };

    let mut table = if opts.trust_input {
        parse_trusted(&lines, &separator, opts.header)
    } else {
        parse_untrusted(&lines, &separator, opts.header)
    }?;
    table.separator = Some(separator);
    Ok(table)
}

fn decide_header(header: Option<bool>, rows: &[Vec<&str>]) -> bool {
    header.unwrap_or_else(|| {
        let first = rows.first().and_then(|r| r.first()).copied();
        let second = rows.get(1).and_then(|r| r.first()).copied();
        let detected = looks_like_header(first, second);
        if detected {
            info!("detected a header row; pass header=false to plot it");
        }
        detected
    })
}

fn parse_untrusted(
    lines: &[&str],
    sep: &Separator,
    header: Option<bool>,
) -> Result<Table, PlotError> {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let probe = {
        let n = lines.len() as f64;
        n.min(n * COLUMN_PROBE_FRACTION + COLUMN_PROBE_EXTRA).ceil() as usize
    };
    let width = lines
        .iter()
        .take(probe)
        .map(|l| sep.split(l).len())
        .max()
        .unwrap_or(0);

    let raw: Vec<Vec<&str>> = lines.iter().map(|l| sep.split(l.trim())).collect();
    let has_header = decide_header(header, &raw);

    let mut typed = raw
        .iter()
        .map(|r| fit_row(r.iter().map(|s| Cell::parse(s)).collect(), width));
    let header_row = if has_header { typed.next() } else { None };
    let rows: Vec<Vec<Cell>> = typed.collect();

    finish(header_row, rows, width)
}

/// Fast path: each column is typed once from its first data row.
fn parse_trusted(
    lines: &[&str],
    sep: &Separator,
    header: Option<bool>,
) -> Result<Table, PlotError> {
    let raw: Vec<Vec<&str>> = lines.iter().map(|l| sep.split(l)).collect();
    let width = raw.first().map_or(0, Vec::len);
    let has_header = decide_header(header, &raw);
    let data = if has_header { &raw[1..] } else { &raw[..] };

    let numeric: Vec<bool> = (0..width)
        .map(|c| {
            data.first()
                .and_then(|r| r.get(c))
                .is_some_and(|s| parse_number(s).is_some())
        })
        .collect();

    let rows = data
        .iter()
        .map(|r| {
            (0..width)
                .map(|c| match r.get(c) {
                    None => Cell::Missing,
                    Some(s) if numeric[c] => Cell::Number(parse_number(s).unwrap_or(f64::NAN)),
                    Some(s) => Cell::Text((*s).to_owned()),
                })
                .collect()
        })
        .collect();

    let header_row =
        has_header.then(|| fit_row(raw[0].iter().map(|s| Cell::parse(s)).collect(), width));
    finish(header_row, rows, width)
}

fn finish(
    header: Option<Vec<Cell>>,
    rows: Vec<Vec<Cell>>,
    width: usize,
) -> Result<Table, PlotError> {
    if rows.is_empty() {
        return Err(if header.is_some() {
            PlotError::HeaderOnly
        } else {
            PlotError::EmptyInput
        });
    }
    Ok(Table {
        header,
        rows,
        width,
        separator: None,
    })
}

/// Split a single text row the way the parser does.
#[must_use]
pub fn parse_row(line: &str, sep: &Separator) -> Vec<Cell> {
    sep.split(line.trim()).into_iter().map(Cell::parse).collect()
}

/// Read a whole file (or stdin for `-`) into memory.
pub fn read_text_from_path(path: &str) -> Result<String, PlotError> {
    let mut text = String::new();
    if path == "-" {
        std::io::stdin().read_to_string(&mut text)?;
    } else {
        std::fs::File::open(path)?.read_to_string(&mut text)?;
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(sep: Option<&str>, header: Option<bool>) -> ParseOptions {
        ParseOptions {
            separator: sep.and_then(Separator::literal),
            header,
            ..ParseOptions::default()
        }
    }

    fn numbers(table: &Table) -> Vec<Vec<f64>> {
        table
            .rows()
            .iter()
            .map(|r| r.iter().map(|c| c.as_number().unwrap()).collect())
            .collect()
    }

    #[test]
    fn test_header_row_is_removed() {
        let t = parse_table("x;y\n1;2\n3;4\n5;6", &opts(Some(";"), Some(true))).unwrap();
        assert_eq!(numbers(&t), vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        assert_eq!(t.column_title(0).as_deref(), Some("x"));
        assert_eq!(t.column_title(1).as_deref(), Some("y"));
    }

    #[test]
    fn test_header_autodetect() {
        let t = parse_table("a,b\n1,2\n3,4", &opts(None, None)).unwrap();
        assert_eq!(t.len(), 2);
        assert!(t.header().is_some());

        let t = parse_table("1,2\n3,4", &opts(None, None)).unwrap();
        assert_eq!(t.len(), 2);
        assert!(t.header().is_none());
    }

    #[test]
    fn test_separator_detection_order() {
        let t = parse_table("1;2,5\n3;4,5", &opts(None, Some(false))).unwrap();
        assert_eq!(t.separator(), Some(&Separator::Literal(";".into())));
        assert_eq!(t.width(), 2);

        let t = parse_table("1,2\n3,4", &opts(None, Some(false))).unwrap();
        assert_eq!(t.separator(), Some(&Separator::Literal(",".into())));

        let t = parse_table("1  2   3\n4\t\t5  6", &opts(None, Some(false))).unwrap();
        assert_eq!(t.separator(), Some(&Separator::WhitespaceRun));
        assert_eq!(numbers(&t), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_requested_separator_falls_back_when_absent() {
        let t = parse_table("1;2\n3;4", &opts(Some("|"), Some(false))).unwrap();
        assert_eq!(t.separator(), Some(&Separator::Literal(";".into())));
    }

    #[test]
    fn test_no_separator_is_format_error() {
        let err = parse_table("abc\ndef", &opts(None, Some(false))).unwrap_err();
        assert!(matches!(err, PlotError::Format { .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            parse_table("", &ParseOptions::default()),
            Err(PlotError::EmptyInput)
        ));
        assert!(matches!(
            parse_table("\n\r\n", &ParseOptions::default()),
            Err(PlotError::EmptyInput)
        ));
        assert!(matches!(
            parse_table("x;y", &opts(None, Some(true))),
            Err(PlotError::HeaderOnly)
        ));
    }

    #[test]
    fn test_rows_padded_and_truncated() {
        let text = "1;2;3\n4;5\n6;7;8;9\n10";
        let t = parse_table(text, &opts(Some(";"), Some(false))).unwrap();
        assert_eq!(t.width(), 4);
        assert!(t.rows().iter().all(|r| r.len() == 4));
        assert_eq!(t.cell(1, 2), Some(&Cell::Missing));
        assert_eq!(t.cell(3, 3).and_then(Cell::as_number), Some(0.0));
    }

    #[test]
    fn test_width_comes_from_probe_lines_only() {
        // 12 lines probe ceil(min(12, 10.6)) = 11 lines; the wide 12th is cut.
        let mut text = String::new();
        for _ in 0..11 {
            text.push_str("1;2\n");
        }
        text.push_str("1;2;3");
        let t = parse_table(&text, &opts(Some(";"), Some(false))).unwrap();
        assert_eq!(t.width(), 2);
        assert_eq!(t.rows()[11].len(), 2);
    }

    #[test]
    fn test_quotes_and_strings() {
        let t = parse_table("\"1.5\";\" cat \";rgb(1,0,0)", &opts(Some(";"), Some(false))).unwrap();
        assert_eq!(t.cell(0, 0), Some(&Cell::Number(1.5)));
        assert_eq!(t.cell(0, 1), Some(&Cell::Text("cat".into())));
        assert_eq!(t.cell(0, 2), Some(&Cell::Text("rgb(1,0,0)".into())));
    }

    #[test]
    fn test_unicode_minus() {
        let t = parse_table("\u{2212}2;3", &opts(Some(";"), Some(false))).unwrap();
        assert_eq!(t.cell(0, 0), Some(&Cell::Number(-2.0)));
    }

    #[test]
    fn test_leading_and_trailing_blank_lines_dropped() {
        let t = parse_table("\n  \n1;2\r\n3;4\n   ", &opts(Some(";"), Some(false))).unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_trusted_types_columns_from_first_row() {
        let mut o = opts(Some(","), Some(true));
        o.trust_input = true;
        let t = parse_table("a,b\n1,x\noops,2", &o).unwrap();
        assert_eq!(t.cell(0, 0), Some(&Cell::Number(1.0)));
        // numeric column is parsed blindly
        assert!(t.cell(1, 0).and_then(Cell::as_number).is_some_and(f64::is_nan));
        // text column is never probed again
        assert_eq!(t.cell(1, 1), Some(&Cell::Text("2".into())));
        assert_eq!(t.column_title(1).as_deref(), Some("b"));
    }

    #[test]
    fn test_fraction_keeps_leading_lines() {
        let text = (0..100).map(|i| format!("{i};{i}")).collect::<Vec<_>>().join("\n");
        let mut o = opts(Some(";"), Some(false));
        o.fraction = 0.25;
        assert_eq!(parse_table(&text, &o).unwrap().len(), 25);
        o.fraction = 0.001;
        assert_eq!(parse_table(&text, &o).unwrap().len(), 3);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "h1;h2\n1;\"a\"\n2;b\n3";
        let o = opts(None, None);
        assert_eq!(parse_table(text, &o).unwrap(), parse_table(text, &o).unwrap());
    }

    #[test]
    fn test_parse_row() {
        let row = parse_row(" 1 ; dog ;3 ", &Separator::Literal(";".into()));
        assert_eq!(row, vec![Cell::Number(1.0), Cell::Text("dog".into()), Cell::Number(3.0)]);
    }

    #[test]
    fn test_push_row_width_check() {
        let mut t = Table::from_rows(vec![vec![1.0.into(), 2.0.into()]]);
        assert!(t.push_row(vec![3.0.into(), 4.0.into()]).is_ok());
        assert!(matches!(
            t.push_row(vec![5.0.into()]),
            Err(PlotError::RowWidthMismatch { expected: 2, got: 1 })
        ));
    }
}
