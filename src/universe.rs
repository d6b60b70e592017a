pub(crate) mod pattern;

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use fixedbitset::FixedBitSet;
use log::{trace, warn};
use thiserror::Error;

use crate::reader::Encoding;
pub use crate::universe::pattern::{InitialConditions, Pattern, PATTERN_MENU};

pub const DEFAULT_WIDTH: u32 = 64;
pub const DEFAULT_HEIGHT: u32 = 64;

/// Engine side of the renderer boundary. The renderer only ever reads
/// `cells()` through `get_index`, and calls `tick` once per drawn frame.
pub trait Engine {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Exported cell buffer, laid out according to `encoding()`.
    fn cells(&self) -> &[u8];
    fn encoding(&self) -> Encoding;
    /// Engine-defined linear index of a cell.
    fn get_index(&self, row: u32, col: u32) -> usize;
    /// Advance exactly one generation in place.
    fn tick(&mut self);
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Dead = 0,
    Alive = 1,
}

impl From<bool> for Cell {
    fn from(alive: bool) -> Self {
        if alive { Cell::Alive } else { Cell::Dead }
    }
}

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("pattern `{pattern}` does not fit a {width}x{height} grid")]
    GridTooSmall {
        pattern: &'static str,
        width: u32,
        height: u32,
    },

    #[error("failed to gather entropy for a random seed")]
    Entropy(#[from] getrandom::Error),
}

/// Toroidal Game of Life grid backed by a bitset.
pub struct Universe {
    width: u32,
    height: u32,
    cells: FixedBitSet,
    scratch_cells: FixedBitSet,
    encoding: Encoding,
    exported: Vec<u8>,
    generation: u64,
}

impl Universe {
    /// A 64x64 bit-packed universe seeded from `pattern`. Unknown or empty
    /// names seed the default fill.
    pub fn new(pattern: &str) -> Self {
        Self::with_options(DEFAULT_WIDTH, DEFAULT_HEIGHT, Encoding::default(), pattern)
    }

    /// Like `new`, but a pattern that cannot be placed (or a random seed that
    /// cannot be drawn) also falls back to the default fill.
    pub fn with_options(width: u32, height: u32, encoding: Encoding, pattern: &str) -> Self {
        let mut universe = Self::blank(width, height, encoding);
        let seeded = InitialConditions::from_name(pattern)
            .and_then(|conditions| universe.seed(&conditions));
        if let Err(err) = seeded {
            warn!("{err}; seeding the default fill instead");
            universe.seed_default();
        }
        universe
    }

    pub fn try_with_options(
        width: u32,
        height: u32,
        encoding: Encoding,
        pattern: &str,
    ) -> Result<Self, UniverseError> {
        let mut universe = Self::blank(width, height, encoding);
        universe.seed(&InitialConditions::from_name(pattern)?)?;
        Ok(universe)
    }

    /// Every cell dead.
    pub fn blank(width: u32, height: u32, encoding: Encoding) -> Self {
        let size = width as usize * height as usize;
        let mut universe = Self {
            width,
            height,
            cells: FixedBitSet::with_capacity(size),
            scratch_cells: FixedBitSet::with_capacity(size),
            encoding,
            exported: Vec::new(),
            generation: 0,
        };
        universe.export();
        universe
    }

    /// Replace the current cells with `conditions`. Leaves the universe
    /// untouched on error.
    pub fn seed(&mut self, conditions: &InitialConditions) -> Result<(), UniverseError> {
        let next = conditions.cells(self.width, self.height)?;
        self.cells = next;
        self.generation = 0;
        self.export();
        Ok(())
    }

    fn seed_default(&mut self) {
        let size = self.cells.len();
        self.cells = pattern::default_fill(size);
        self.generation = 0;
        self.export();
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn contains(&self, row: u32, col: u32) -> bool {
        row < self.height && col < self.width
    }

    /// Cells outside the grid read as dead.
    pub fn is_alive(&self, row: u32, col: u32) -> bool {
        self.contains(row, col) && self.cells[self.get_index(row, col)]
    }

    /// Mark each `(row, col)` alive. Coordinates outside the grid are skipped.
    pub fn set_cells(&mut self, cells: &[(u32, u32)]) {
        for &(row, col) in cells {
            if !self.contains(row, col) {
                warn!("cell ({row}, {col}) is outside the {}x{} grid", self.width, self.height);
                continue;
            }
            let idx = self.get_index(row, col);
            self.cells.insert(idx);
        }
        self.export();
    }

    /// Resize horizontally. All cells die.
    pub fn set_width(&mut self, width: u32) {
        self.width = width;
        self.reset_cells_to_dead();
    }

    /// Resize vertically. All cells die.
    pub fn set_height(&mut self, height: u32) {
        self.height = height;
        self.reset_cells_to_dead();
    }

    /// Text rendering of the grid, one line per row.
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn reset_cells_to_dead(&mut self) {
        let size = self.width as usize * self.height as usize;
        self.cells = FixedBitSet::with_capacity(size);
        self.scratch_cells = FixedBitSet::with_capacity(size);
        self.export();
    }

    fn live_neighbour_count(&self, row: u32, col: u32) -> u8 {
        let mut count = 0;

        // height - 1 and width - 1 step backwards once taken modulo the size
        for delta_row in [self.height - 1, 0, 1] {
            for delta_col in [self.width - 1, 0, 1] {
                if delta_row == 0 && delta_col == 0 {
                    continue;
                }

                let neighbour_row = (row + delta_row) % self.height;
                let neighbour_col = (col + delta_col) % self.width;
                count += self.cells[self.get_index(neighbour_row, neighbour_col)] as u8;
            }
        }
        count
    }

    /// Refresh the exported buffer from the bitset.
    fn export(&mut self) {
        let len = self.encoding.byte_len(self.width, self.height);
        match self.encoding {
            Encoding::BitPacked => {
                let blocks = self.cells.as_slice();
                self.exported.resize(blocks.len() * 4, 0);
                LittleEndian::write_u32_into(blocks, &mut self.exported);
                self.exported.truncate(len);
            }
            Encoding::BytePerCell => {
                self.exported.clear();
                self.exported
                    .extend((0..len).map(|i| Cell::from(self.cells[i]) as u8));
            }
        }
    }
}

impl Engine for Universe {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn cells(&self) -> &[u8] {
        &self.exported
    }

    fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn get_index(&self, row: u32, col: u32) -> usize {
        pattern::get_index(self.width, row, col)
    }

    fn tick(&mut self) {
        for row in 0..self.height {
            for col in 0..self.width {
                let idx = self.get_index(row, col);
                let alive = self.cells[idx];
                let next = matches!(
                    (alive, self.live_neighbour_count(row, col)),
                    (true, 2 | 3) | (false, 3)
                );

                // Write into scratch_cells, since we're still reading from `self.cells`
                self.scratch_cells.set(idx, next);
            }
        }
        std::mem::swap(&mut self.scratch_cells, &mut self.cells);
        self.generation += 1;
        self.export();
        trace!("universe advanced to generation {}", self.generation);
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in 0..self.height {
            for col in 0..self.width {
                let symbol = if self.is_alive(row, col) { '◼' } else { '◻' };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
