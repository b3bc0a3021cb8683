//! Per-visualization cache: the last parsed table, its fingerprint and the
//! derived state (normalization, bar grid, colour setup, active mesh).
//!
//! A [`Session`] is owned by the caller and handed to every pipeline call by
//! `&mut`. It is not shared between threads.

use tracing::debug;

use crate::{
    core::{
        bounds::Normalization,
        color_map::{ColorRequest, LabelColorMap},
        config::{Dimensions, PlotMode, PlotOptions},
        constants::FINGERPRINT_SAMPLES,
        data::{ParseOptions, Separator, Table},
    },
    render::grid::Grid,
};

/// Cheap digest of an input blob. Not collision-proof, only meant to spot
/// an unchanged text quickly.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Fingerprint {
    title: String,
    len: usize,
    samples: Vec<u8>,
    fraction: u64,
    separator: String,
    header: Option<bool>,
    trust_input: bool,
}

impl Fingerprint {
    /// Length, title, every `len/20`-th byte and every parse option that
    /// changes the resulting table.
    #[must_use]
    pub fn of(text: &str, title: &str, parse: &ParseOptions) -> Self {
        let bytes = text.as_bytes();
        let stride = (bytes.len() / FINGERPRINT_SAMPLES).max(1);
        Self {
            title: title.to_owned(),
            len: bytes.len(),
            samples: bytes.iter().step_by(stride).copied().collect(),
            fraction: parse.fraction.to_bits(),
            separator: parse.separator.as_ref().map(ToString::to_string).unwrap_or_default(),
            header: parse.header,
            trust_input: parse.trust_input,
        }
    }
}

/// Colour setup of the last plot.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorCache {
    pub request: ColorRequest,
    pub labels: LabelColorMap,
}

/// Everything derived from a plot, kept for extension mode.
#[derive(Debug, Default)]
pub struct PlotState {
    pub(crate) normalization: Option<Normalization>,
    pub(crate) grid: Option<Grid>,
    pub(crate) colors: Option<ColorCache>,
    /// Options of the last plot, replayed by `add_data_point`.
    pub(crate) options: Option<PlotOptions>,
    pub(crate) dimensions: Dimensions,
    active_mesh: Option<PlotMode>,
    mesh_valid: bool,
}

impl PlotState {
    /// Record that a mesh of `mode` is about to be drawn. Returns whether
    /// the previous mesh has to go.
    pub(crate) fn begin_mesh(&mut self, mode: PlotMode, keep_old_plot: bool) -> bool {
        let dispose = !keep_old_plot || !self.mesh_valid || self.active_mesh != Some(mode);
        self.active_mesh = Some(mode);
        self.mesh_valid = true;
        dispose
    }

    /// Grid sized for the current dimensions, allocated on first use.
    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        let dims = self.dimensions;
        let grid = self.grid.get_or_insert_with(|| Grid::for_dimensions(&dims));
        if !grid.fits(&dims) {
            *grid = Grid::for_dimensions(&dims);
        }
        grid
    }
}

/// Session-scoped cache.
#[derive(Debug, Default)]
pub struct Session {
    table: Option<Table>,
    fingerprint: Option<Fingerprint>,
    separator: Option<Separator>,
    state: PlotState,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dimensions(dims: Dimensions) -> Self {
        let mut s = Self::default();
        s.state.dimensions = dims;
        s
    }

    // --- Change detection ---

    /// False only for an identical fingerprint over a non-empty cache.
    #[must_use]
    pub fn should_reparse(&self, fp: &Fingerprint) -> bool {
        let cached = self.table.as_ref().is_some_and(|t| !t.is_empty());
        !(cached && self.fingerprint.as_ref() == Some(fp))
    }

    pub fn store(&mut self, table: Table, fp: Fingerprint) {
        self.remember_separator(table.separator());
        self.table = Some(table);
        self.fingerprint = Some(fp);
    }

    /// Cache a table that did not come from text.
    pub fn store_table(&mut self, table: Table) {
        self.remember_separator(table.separator());
        self.table = Some(table);
        self.fingerprint = None;
    }

    #[must_use]
    pub fn load(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub(crate) fn table_mut(&mut self) -> Option<&mut Table> {
        self.table.as_mut()
    }

    /// Make the next text plot re-parse even if the text is unchanged.
    pub fn clear_fingerprint(&mut self) {
        self.fingerprint = None;
    }

    #[must_use]
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    /// Drop table, fingerprint, normalization, grid and colour setup
    /// together.
    pub fn reset(&mut self) {
        debug!("session cache reset");
        self.table = None;
        self.fingerprint = None;
        self.separator = None;
        self.state.normalization = None;
        self.state.grid = None;
        self.state.colors = None;
        self.state.options = None;
    }

    // --- Derived state ---

    /// Separator of the last parsed text.
    #[must_use]
    pub fn separator(&self) -> Option<&Separator> {
        self.separator.as_ref()
    }

    pub(crate) fn remember_separator(&mut self, sep: Option<&Separator>) {
        if let Some(sep) = sep {
            self.separator = Some(sep.clone());
        }
    }

    #[must_use]
    pub fn normalization(&self) -> Option<&Normalization> {
        self.state.normalization.as_ref()
    }

    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.state.grid.as_ref()
    }

    #[must_use]
    pub fn colors(&self) -> Option<&ColorCache> {
        self.state.colors.as_ref()
    }

    #[must_use]
    pub fn last_options(&self) -> Option<&PlotOptions> {
        self.state.options.as_ref()
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.state.dimensions
    }

    /// New plot box / grid size. The mesh becomes invalid and the grid is
    /// dropped.
    pub fn set_dimensions(&mut self, dims: Dimensions) {
        self.state.dimensions = dims;
        self.state.grid = None;
        self.state.mesh_valid = false;
    }

    // --- Mesh lifecycle ---

    #[must_use]
    pub fn active_mesh(&self) -> Option<PlotMode> {
        self.state.active_mesh.filter(|_| self.state.mesh_valid)
    }

    /// The renderer threw the current mesh away.
    pub fn mesh_disposed(&mut self) {
        self.state.mesh_valid = false;
    }

    pub(crate) fn state_mut(&mut self) -> &mut PlotState {
        &mut self.state
    }

    /// Cached table next to the mutable plot state.
    pub(crate) fn split_mut(&mut self) -> (Option<&Table>, &mut PlotState) {
        (self.table.as_ref(), &mut self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::Cell;

    fn fp(text: &str, title: &str) -> Fingerprint {
        Fingerprint::of(text, title, &ParseOptions::default())
    }

    fn table() -> Table {
        Table::from_rows(vec![vec![Cell::Number(1.0), Cell::Number(2.0)]])
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fp("1;2\n3;4", "t");
        let b = fp("1;2\n3;4", "t");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_sees_context() {
        let base = fp("1;2\n3;4", "t");
        assert_ne!(base, fp("1;2\n3;4", "u"));
        assert_ne!(base, fp("1;2\n3;5", "t"));
        assert_ne!(base, fp("1;2\n3;4\n", "t"));
    }

    #[test]
    fn test_fingerprint_sees_parse_options() {
        let text = "1;2\n3;4";
        let base = fp(text, "t");
        let with = |o: ParseOptions| Fingerprint::of(text, "t", &o);
        assert_ne!(base, with(ParseOptions { fraction: 0.5, ..ParseOptions::default() }));
        assert_ne!(
            base,
            with(ParseOptions {
                separator: Separator::literal(","),
                ..ParseOptions::default()
            })
        );
        assert_ne!(base, with(ParseOptions { header: Some(true), ..ParseOptions::default() }));
        assert_ne!(base, with(ParseOptions { header: Some(false), ..ParseOptions::default() }));
        assert_ne!(base, with(ParseOptions { trust_input: true, ..ParseOptions::default() }));
    }

    #[test]
    fn test_short_text_samples_every_byte() {
        let fp = fp("abc", "");
        assert_eq!(fp.samples, b"abc");
    }

    #[test]
    fn test_should_reparse_needs_cache() {
        let mut s = Session::new();
        let fp = fp("1;2", "");
        assert!(s.should_reparse(&fp));
        s.store(table(), fp.clone());
        assert!(!s.should_reparse(&fp));
        s.clear_fingerprint();
        assert!(s.should_reparse(&fp));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut s = Session::new();
        s.store(table(), fp("1;2", ""));
        s.state_mut().normalization = Some(Normalization::default());
        s.state_mut().grid_mut();
        s.reset();
        assert!(s.load().is_none());
        assert!(s.fingerprint().is_none());
        assert!(s.normalization().is_none());
        assert!(s.grid().is_none());
        assert!(s.colors().is_none());
        assert!(s.last_options().is_none());
    }

    #[test]
    fn test_mesh_lifecycle() {
        let mut s = Session::new();
        assert!(s.state_mut().begin_mesh(PlotMode::Barchart, true));
        assert!(!s.state_mut().begin_mesh(PlotMode::Barchart, true));
        assert!(s.state_mut().begin_mesh(PlotMode::Barchart, false));
        assert!(s.state_mut().begin_mesh(PlotMode::Scatterplot, true));
        s.mesh_disposed();
        assert_eq!(s.active_mesh(), None);
        assert!(s.state_mut().begin_mesh(PlotMode::Scatterplot, true));
        assert_eq!(s.active_mesh(), Some(PlotMode::Scatterplot));
    }

    #[test]
    fn test_set_dimensions_drops_grid() {
        let mut s = Session::new();
        s.state_mut().grid_mut();
        s.state_mut().begin_mesh(PlotMode::Barchart, false);
        s.set_dimensions(Dimensions::new(5, 5, 1.0, 1.0, 1.0));
        assert!(s.grid().is_none());
        assert_eq!(s.active_mesh(), None);
        assert_eq!(s.state_mut().grid_mut().x_count(), 6);
    }
}
