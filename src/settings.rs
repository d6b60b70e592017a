use clap::Parser;

use crate::reader::Encoding;
use crate::render::{parse_hex, Palette, Rgba};
use crate::universe::{DEFAULT_HEIGHT, DEFAULT_WIDTH, PATTERN_MENU};

pub const CELL_SIZE: u32 = 5;
pub const MAX_SPEED: u32 = 150;
pub const TIME_BETWEEN_TICKS_MS: u32 = 60;
pub const WINDOW_SCALE: f64 = 2.;

/// Conway's Game of Life drawn into a window.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Initial pattern, by name or by index into the pattern menu
    /// (0 default fill, 1 random, 2 copper_head_spaceship, 3 glider).
    #[arg(value_name = "PATTERN", value_parser = parse_pattern)]
    pattern: Option<String>,
    /// Draw and tick a single generation, then stop.
    #[arg(long)]
    once: bool,
    /// Export one byte per cell instead of one bit.
    #[arg(long)]
    byte_cells: bool,
    /// Milliseconds to wait between generations.
    #[arg(
        long,
        value_name = "MILLISECONDS",
        default_value_t = TIME_BETWEEN_TICKS_MS,
        value_parser = clap::value_parser!(u32).range(0..=MAX_SPEED as i64)
    )]
    delay: u32,
    #[arg(long, value_name = "#RRGGBB", value_parser = parse_color)]
    alive_color: Option<Rgba>,
    #[arg(long, value_name = "#RRGGBB", value_parser = parse_color)]
    dead_color: Option<Rgba>,
    #[arg(long, value_name = "#RRGGBB", value_parser = parse_color)]
    grid_color: Option<Rgba>,
}

fn parse_pattern(value: &str) -> Result<String, String> {
    match value.parse::<usize>() {
        Ok(i) => PATTERN_MENU
            .get(i)
            .map(|name| name.to_string())
            .ok_or_else(|| format!("there is no pattern number {i}")),
        Err(_) => Ok(value.to_string()),
    }
}

fn parse_color(value: &str) -> Result<Rgba, String> {
    parse_hex(value).ok_or_else(|| format!("`{value}` is not a #RRGGBB colour"))
}

/// Start-up configuration. Defaults reproduce the stock harness.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Initial pattern name, see `PATTERN_MENU`.
    pub pattern: String,
    pub run_once: bool,
    pub time_between_ticks_ms: u32,
    /// Upper bound of the speed slider, and of the delay.
    pub max_speed: u32,
    pub cell_size: u32,
    pub width: u32,
    pub height: u32,
    pub encoding: Encoding,
    pub palette: Palette,
    pub window_scale: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pattern: PATTERN_MENU[0].to_string(),
            run_once: false,
            time_between_ticks_ms: TIME_BETWEEN_TICKS_MS,
            max_speed: MAX_SPEED,
            cell_size: CELL_SIZE,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            encoding: Encoding::default(),
            palette: Palette::default(),
            window_scale: WINDOW_SCALE,
        }
    }
}

impl From<CliArgs> for Settings {
    fn from(args: CliArgs) -> Self {
        let defaults = Settings::default();
        Self {
            pattern: args.pattern.unwrap_or(defaults.pattern),
            run_once: args.once,
            time_between_ticks_ms: args.delay,
            encoding: if args.byte_cells { Encoding::BytePerCell } else { defaults.encoding },
            palette: Palette {
                alive: args.alive_color.unwrap_or(defaults.palette.alive),
                dead: args.dead_color.unwrap_or(defaults.palette.dead),
                grid: args.grid_color.unwrap_or(defaults.palette.grid),
            },
            ..defaults
        }
    }
}

impl Settings {
    /// Settings from the process arguments. Exits with usage on bad input.
    pub fn from_cli() -> Self {
        CliArgs::parse().into()
    }

    /// Settings from `args`, the first of which is the program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        CliArgs::try_parse_from(args).map(Settings::from)
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    fn parse(args: &[&str]) -> Result<Settings, clap::Error> {
        Settings::try_parse_from(std::iter::once("life-canvas").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }

    #[test]
    fn defaults_match_stock_harness() {
        let settings = parse(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.pattern, "");
        assert!(!settings.run_once);
        assert_eq!(settings.time_between_ticks_ms, 60);
        assert_eq!(settings.max_speed, 150);
        assert_eq!(settings.encoding, Encoding::BitPacked);
        assert_eq!((settings.width, settings.height, settings.cell_size), (64, 64, 5));
    }

    #[test]
    fn pattern_by_index_or_name() {
        assert_eq!(parse(&["3"]).unwrap().pattern, "glider");
        assert_eq!(parse(&["random"]).unwrap().pattern, "random");
        assert_eq!(parse(&["9"]).unwrap_err().kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn options() {
        let settings = parse(&[
            "--once",
            "glider",
            "--byte-cells",
            "--delay",
            "150",
            "--alive-color",
            "#ff0000",
        ])
        .unwrap();
        assert!(settings.run_once);
        assert_eq!(settings.pattern, "glider");
        assert_eq!(settings.encoding, Encoding::BytePerCell);
        assert_eq!(settings.time_between_ticks_ms, 150);
        assert_eq!(settings.palette.alive, [0xff, 0, 0, 0xff]);
        assert_eq!(settings.palette.dead, Palette::default().dead);
    }

    #[test]
    fn bad_input() {
        let kind = |args: &[&str]| parse(args).unwrap_err().kind();
        assert_eq!(kind(&["--delay"]), ErrorKind::InvalidValue);
        assert_eq!(kind(&["--delay", "soon"]), ErrorKind::ValueValidation);
        assert_eq!(kind(&["--delay", "500"]), ErrorKind::ValueValidation);
        assert_eq!(kind(&["--fast"]), ErrorKind::UnknownArgument);
        assert_eq!(kind(&["glider", "random"]), ErrorKind::UnknownArgument);
        assert_eq!(kind(&["--grid-color", "grey"]), ErrorKind::ValueValidation);
    }
}
