//! Shows a 240x240 BMP and rotates it a quarter turn on every press of A.
//!
//! `cargo run --example rotate --features rpi,bmp -- image.bmp`

use std::error::Error;
use std::sync::atomic::AtomicBool;

use st7789_pirate::board::PirateAudio;
use st7789_pirate::{BUF_SIZE, Button, Config, RECOMMENDED_SPI_CLOCK_HZ, Rgb888, Rotation};

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: rotate <image.bmp>")?;
    let image = std::fs::read(&path)?;

    let board = PirateAudio::open(RECOMMENDED_SPI_CLOCK_HZ)?;
    let mut buffer = [0u8; BUF_SIZE];
    let (mut display, listeners) = board.split(Config::default(), &mut buffer)?;

    display.fill_screen(Rgb888::new(0, 0, 0))?;
    display.draw_bmp(&image)?;

    let mut button_a = listeners
        .into_iter()
        .find(|l| l.button() == Button::A)
        .ok_or("button A is not wired")?;

    let cancel = AtomicBool::new(false);
    let mut rotation = Rotation::None;
    button_a.run(&cancel, |_| {
        rotation = rotation.next();
        // rotate before pushing pixels so the image lands rotated
        let redraw = display
            .fill_screen(Rgb888::new(0, 0, 0))
            .and_then(|()| display.set_rotation(rotation))
            .and_then(|()| display.draw_bmp(&image));
        match redraw {
            Ok(()) => println!("rotation {}", rotation.degrees()),
            Err(e) => eprintln!("redraw failed: {e}"),
        }
    })?;
    Ok(())
}
