use thiserror::Error;

use crate::universe::{Cell, Engine};

/// Byte value an engine writes for a dead cell in the byte-per-cell layout.
pub const DEAD_SENTINEL: u8 = Cell::Dead as u8;

/// How an engine lays out its exported cell buffer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Encoding {
    /// One byte per cell, `DEAD_SENTINEL` for dead.
    BytePerCell,
    /// One bit per cell, least significant bit first within each byte.
    #[default]
    BitPacked,
}

impl Encoding {
    /// Exact number of bytes a `width` x `height` buffer occupies.
    pub fn byte_len(self, width: u32, height: u32) -> usize {
        let cells = width as usize * height as usize;
        match self {
            Encoding::BytePerCell => cells,
            Encoding::BitPacked => cells.div_ceil(8),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CellBufferError {
    /// The engine exported a buffer whose length does not match its
    /// dimensions. Usually means the engine and renderer disagree on the
    /// encoding.
    #[error("cell buffer holds {actual} bytes but {expected} were expected")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// The engine mapped a cell to an index past the end of the grid.
    #[error("cell index {index} is outside a grid of {len} cells")]
    OutOfRange { index: usize, len: usize },
}

/// Read-only view over an exported cell buffer.
#[derive(Copy, Clone, Debug)]
pub struct CellBufferView<'a> {
    bytes: &'a [u8],
    width: u32,
    height: u32,
    encoding: Encoding,
}

impl<'a> CellBufferView<'a> {
    pub fn new(
        bytes: &'a [u8],
        width: u32,
        height: u32,
        encoding: Encoding,
    ) -> Result<Self, CellBufferError> {
        let expected = encoding.byte_len(width, height);
        if bytes.len() != expected {
            return Err(CellBufferError::BufferSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        Ok(Self { bytes, width, height, encoding })
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn encoding(&self) -> Encoding { self.encoding }

    /// Number of cells covered by the view.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cell at linear `index` is alive.
    pub fn is_alive_at(&self, index: usize) -> Result<bool, CellBufferError> {
        let len = self.len();
        if index >= len {
            return Err(CellBufferError::OutOfRange { index, len });
        }

        Ok(match self.encoding {
            Encoding::BytePerCell => self.bytes[index] != DEAD_SENTINEL,
            Encoding::BitPacked => {
                let mask = 1u8 << (index % 8);
                self.bytes[index / 8] & mask == mask
            }
        })
    }
}

/// Resolves grid coordinates to cell states through an engine's own index
/// mapping.
pub struct CellReader<'a, E: Engine + ?Sized> {
    engine: &'a E,
    view: CellBufferView<'a>,
}

impl<'a, E: Engine + ?Sized> CellReader<'a, E> {
    pub fn new(engine: &'a E) -> Result<Self, CellBufferError> {
        let view = CellBufferView::new(
            engine.cells(),
            engine.width(),
            engine.height(),
            engine.encoding(),
        )?;
        Ok(Self { engine, view })
    }

    pub fn view(&self) -> &CellBufferView<'a> {
        &self.view
    }

    pub fn is_alive(&self, row: u32, col: u32) -> Result<bool, CellBufferError> {
        self.view.is_alive_at(self.engine.get_index(row, col))
    }

    /// Every cell state in row-major order. Fails without yielding partial
    /// results if any lookup is out of range.
    pub fn decode_all(&self) -> Result<Vec<bool>, CellBufferError> {
        let mut states = Vec::with_capacity(self.view.len());
        for row in 0..self.view.height() {
            for col in 0..self.view.width() {
                states.push(self.is_alive(row, col)?);
            }
        }
        Ok(states)
    }
}
