use fixedbitset::FixedBitSet;
use log::info;

use crate::universe::UniverseError;

/// Pattern names in menu order. Index 0 selects the default fill.
pub const PATTERN_MENU: [&str; 4] = ["", "random", "copper_head_spaceship", "glider"];

/// A fixed set of live cells, given as `(col, row)` offsets from the grid
/// centre.
#[derive(Debug)]
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(u32, u32)],
}

pub const GLIDER: Pattern = Pattern {
    name: "glider",
    cells: &[(1, 2), (2, 3), (3, 1), (3, 2), (3, 3)],
};

pub const COPPER_HEAD: Pattern = Pattern {
    name: "copper_head_spaceship",
    cells: &[
        (2, 1), (3, 1), (6, 1), (7, 1), (4, 2), (5, 2), (4, 3),
        (5, 3), (1, 4), (3, 4), (6, 4), (8, 4), (1, 5), (8, 5),
        (1, 7), (8, 7), (2, 8), (3, 8), (6, 8), (7, 8), (3, 9),
        (4, 9), (5, 9), (6, 9), (4, 11), (5, 11), (4, 12), (5, 12),
    ],
};

const PATTERNS: [&Pattern; 2] = [&COPPER_HEAD, &GLIDER];

impl Pattern {
    pub fn find(name: &str) -> Option<&'static Pattern> {
        PATTERNS.iter().copied().find(|pattern| pattern.name == name)
    }

    /// Linear indices of the pattern placed at the centre of the grid.
    fn indices(&self, width: u32, height: u32) -> Result<Vec<usize>, UniverseError> {
        self.cells
            .iter()
            .map(|&(col, row)| {
                let (row, col) = (row + height / 2, col + width / 2);
                if row < height && col < width {
                    Ok(get_index(width, row, col))
                } else {
                    Err(UniverseError::GridTooSmall {
                        pattern: self.name,
                        width,
                        height,
                    })
                }
            })
            .collect()
    }
}

/// How a fresh universe is populated.
#[derive(Debug)]
pub enum InitialConditions {
    Pattern(&'static Pattern),
    /// Each cell alive with probability one half.
    Random { seed: (u64, u64) },
    /// Cell `i` alive when `i` is even or a multiple of seven.
    Default,
}

impl InitialConditions {
    /// Resolve a pattern name. Anything unrecognised, including the empty
    /// name, resolves to `Default`; only `random` can fail.
    pub fn from_name(name: &str) -> Result<Self, UniverseError> {
        if let Some(pattern) = Pattern::find(name) {
            return Ok(InitialConditions::Pattern(pattern));
        }

        match name {
            "random" => Ok(InitialConditions::Random { seed: generate_seed()? }),
            "" => Ok(InitialConditions::Default),
            other => {
                info!("unknown pattern `{other}`, using the default fill");
                Ok(InitialConditions::Default)
            }
        }
    }

    pub(crate) fn cells(&self, width: u32, height: u32) -> Result<FixedBitSet, UniverseError> {
        let size = width as usize * height as usize;
        match self {
            InitialConditions::Pattern(pattern) => {
                let mut cells = FixedBitSet::with_capacity(size);
                for idx in pattern.indices(width, height)? {
                    cells.insert(idx);
                }
                Ok(cells)
            }
            InitialConditions::Random { seed } => {
                let mut rng: randomize::PCG32 = (*seed).into();
                let mut cells = FixedBitSet::with_capacity(size);
                for i in 0..size {
                    cells.set(i, randomize::f32_half_open_right(rng.next_u32()) < 0.5);
                }
                Ok(cells)
            }
            InitialConditions::Default => Ok(default_fill(size)),
        }
    }
}

pub(crate) fn default_fill(size: usize) -> FixedBitSet {
    let mut cells = FixedBitSet::with_capacity(size);
    for i in 0..size {
        cells.set(i, i % 2 == 0 || i % 7 == 0);
    }
    cells
}

pub(crate) fn get_index(width: u32, row: u32, col: u32) -> usize {
    row as usize * width as usize + col as usize
}

/// Generate a pseudorandom seed for the PRNG.
fn generate_seed() -> Result<(u64, u64), getrandom::Error> {
    use byteorder::{ByteOrder, NativeEndian};
    use getrandom::getrandom;

    let mut seed = [0_u8; 16];

    getrandom(&mut seed)?;

    Ok((
        NativeEndian::read_u64(&seed[0..8]),
        NativeEndian::read_u64(&seed[8..16]),
    ))
}
