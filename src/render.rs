use crate::reader::{CellBufferError, CellReader};
use crate::universe::Engine;

pub type Rgba = [u8; 4];

/// Parse a `#RRGGBB` colour. Returns `None` for anything else.
pub fn parse_hex(color: &str) -> Option<Rgba> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?, 0xff])
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Palette {
    pub grid: Rgba,
    pub dead: Rgba,
    pub alive: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            grid: [0xcc, 0xcc, 0xcc, 0xff],
            dead: [0xff, 0xff, 0xff, 0xff],
            alive: [0x00, 0x00, 0x00, 0xff],
        }
    }
}

/// Pixel layout of a grid with one-pixel lines between cells.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GridGeometry {
    pub width: u32,
    pub height: u32,
    pub cell_size: u32,
}

impl GridGeometry {
    pub fn new(width: u32, height: u32, cell_size: u32) -> Self {
        Self { width, height, cell_size }
    }

    fn pitch(&self) -> u32 {
        self.cell_size + 1
    }

    pub fn canvas_width(&self) -> u32 {
        self.pitch() * self.width + 1
    }

    pub fn canvas_height(&self) -> u32 {
        self.pitch() * self.height + 1
    }

    /// Pixel coordinate of grid line `i`.
    pub fn line_offset(&self, i: u32) -> u32 {
        i * self.pitch()
    }

    /// Pixel coordinate of the first pixel inside cell `i`.
    pub fn cell_origin(&self, i: u32) -> u32 {
        i * self.pitch() + 1
    }
}

/// Drawing surface the grid and cells are painted onto.
pub trait Canvas {
    /// Stroke a one-pixel line between two points, both inclusive.
    fn stroke_line(&mut self, from: (u32, u32), to: (u32, u32), color: Rgba);
    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba);
}

/// RGBA8 framebuffer, as handed out by `pixels::Pixels::frame_mut`.
pub struct Frame<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Frame<'a> {
    /// Wrap `data`. Rows beyond what `data` holds are clipped away.
    pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Self {
        let rows = if width == 0 { 0 } else { data.len() / (width as usize * 4) };
        Self { data, width, height: height.min(rows as u32) }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let i = self.offset(x, y)?;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.data[i..i + 4]);
        Some(rgba)
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    fn put(&mut self, x: u32, y: u32, color: Rgba) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 4].copy_from_slice(&color);
        }
    }
}

impl Canvas for Frame<'_> {
    fn stroke_line(&mut self, from: (u32, u32), to: (u32, u32), color: Rgba) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let line = ((from.0 as isize, from.1 as isize), (to.0 as isize, to.1 as isize));
        let clip = ((0, 0), (self.width as isize - 1, self.height as isize - 1));
        clipline::clipline(line, clip, |x, y| self.put(x as u32, y as u32, color));
    }

    fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba) {
        let right = x.saturating_add(width).min(self.width);
        let bottom = y.saturating_add(height).min(self.height);
        for row in y..bottom {
            for col in x..right {
                self.put(col, row, color);
            }
        }
    }
}

/// `width + 1` vertical and `height + 1` horizontal lines.
pub fn draw_grid<C: Canvas + ?Sized>(canvas: &mut C, geometry: &GridGeometry, color: Rgba) {
    let right = geometry.line_offset(geometry.width);
    let bottom = geometry.line_offset(geometry.height);

    for i in 0..=geometry.width {
        let x = geometry.line_offset(i);
        canvas.stroke_line((x, 0), (x, bottom), color);
    }

    for j in 0..=geometry.height {
        let y = geometry.line_offset(j);
        canvas.stroke_line((0, y), (right, y), color);
    }
}

/// Paint row-major `states` into the cells of `geometry`.
pub fn draw_cells<C: Canvas + ?Sized>(
    canvas: &mut C,
    geometry: &GridGeometry,
    palette: &Palette,
    states: &[bool],
) {
    let columns = geometry.width as usize;
    if columns == 0 {
        return;
    }
    for (i, &alive) in states.iter().enumerate() {
        let (row, col) = ((i / columns) as u32, (i % columns) as u32);
        let color = if alive { palette.alive } else { palette.dead };
        canvas.fill_rect(
            geometry.cell_origin(col),
            geometry.cell_origin(row),
            geometry.cell_size,
            geometry.cell_size,
            color,
        );
    }
}

/// Paints an engine's current generation: grid lines, then every cell.
#[derive(Copy, Clone, Debug)]
pub struct Renderer {
    pub cell_size: u32,
    pub palette: Palette,
}

impl Renderer {
    pub fn new(cell_size: u32, palette: Palette) -> Self {
        Self { cell_size, palette }
    }

    pub fn geometry<E: Engine + ?Sized>(&self, engine: &E) -> GridGeometry {
        GridGeometry::new(engine.width(), engine.height(), self.cell_size)
    }

    /// Decodes every cell before touching the canvas, so a bad buffer
    /// leaves the previous frame intact.
    pub fn draw<E, C>(&self, canvas: &mut C, engine: &E) -> Result<(), CellBufferError>
    where
        E: Engine + ?Sized,
        C: Canvas + ?Sized,
    {
        let states = CellReader::new(engine)?.decode_all()?;
        let geometry = self.geometry(engine);

        draw_grid(canvas, &geometry, self.palette.grid);
        draw_cells(canvas, &geometry, &self.palette, &states);
        Ok(())
    }
}
