#![forbid(unsafe_code)]

use life_canvas::settings::Settings;

fn main() -> Result<(), life_canvas::Error> {
    life_canvas::run(Settings::from_cli())
}
