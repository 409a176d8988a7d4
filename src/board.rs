//! Raspberry Pi wiring of the board, through `rppal`.
//!
//! SPI0 with chip select CE1, DC on GPIO9, backlight on GPIO13, the reset
//! line is not connected. Buttons are on the pins [`Button::gpio`] names.

use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, OutputPin, Trigger};
use rppal::spi::{Bus, Mode, SimpleHalSpiDevice, SlaveSelect, Spi};
use thiserror::Error;

use crate::{Button, EdgeListener, FallingEdge};

pub const DC_GPIO: u8 = 9;
pub const BACKLIGHT_GPIO: u8 = 13;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("GPIO access failed: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    #[error("SPI open failed: {0}")]
    Spi(#[from] rppal::spi::Error),

    #[error("display setup failed: {0}")]
    Display(#[from] crate::Error<rppal::spi::Error>),
}

/// Opens the GPIO peripheral. Safe to call more than once; every handle
/// shares the same underlying state.
pub fn open_platform() -> Result<Gpio, BoardError> {
    Ok(Gpio::new()?)
}

/// Bus and lines of one board, claimed and configured.
pub struct PirateAudio {
    pub spi: SimpleHalSpiDevice,
    pub dc: OutputPin,
    pub backlight: OutputPin,
    /// Inputs with pull-ups enabled, in [`Button::ALL`] order.
    pub buttons: Vec<(Button, InputPin)>,
}

impl PirateAudio {
    /// Claims SPI0/CE1 at `spi_clock_hz` (mode 0) and the board's GPIO lines.
    /// See [`RECOMMENDED_SPI_CLOCK_HZ`](crate::RECOMMENDED_SPI_CLOCK_HZ).
    pub fn open(spi_clock_hz: u32) -> Result<Self, BoardError> {
        let gpio = open_platform()?;
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss1, spi_clock_hz, Mode::Mode0)?;

        let dc = gpio.get(DC_GPIO)?.into_output_low();
        let backlight = gpio.get(BACKLIGHT_GPIO)?.into_output_low();

        let mut buttons = Vec::with_capacity(Button::ALL.len());
        for button in Button::ALL {
            buttons.push((button, gpio.get(button.gpio())?.into_input_pullup()));
        }

        log::debug!(
            "board open: SPI0/CE1 at {} Hz, DC=GPIO{}, BL=GPIO{}",
            spi_clock_hz,
            DC_GPIO,
            BACKLIGHT_GPIO
        );

        Ok(Self {
            spi: SimpleHalSpiDevice::new(spi),
            dc,
            backlight,
            buttons,
        })
    }

    /// Arms every button line and wraps it in an [`EdgeListener`].
    pub fn edge_listeners(
        buttons: Vec<(Button, InputPin)>,
    ) -> Result<Vec<EdgeListener<InputPin>>, BoardError> {
        buttons
            .into_iter()
            .map(|(button, mut pin)| {
                arm_falling_edge(&mut pin)?;
                Ok(EdgeListener::new(button, pin))
            })
            .collect()
    }
}

/// Requires [`arm_falling_edge`] first. Edges that arrive while the handler
/// runs stay queued for the next call.
impl FallingEdge for InputPin {
    type Error = rppal::gpio::Error;

    fn wait_falling_edge(&mut self, timeout: Duration) -> Result<bool, Self::Error> {
        Ok(self.poll_interrupt(false, Some(timeout))?.is_some())
    }
}

/// Enables the falling-edge interrupt on a button line.
pub fn arm_falling_edge(pin: &mut InputPin) -> Result<(), BoardError> {
    Ok(pin.set_interrupt(Trigger::FallingEdge, None)?)
}

#[cfg(not(feature = "async"))]
mod blocking {
    use std::thread;
    use std::time::Duration;

    use rppal::gpio::{InputPin, OutputPin};
    use rppal::spi::SimpleHalSpiDevice;

    use super::{BoardError, PirateAudio};
    use crate::{Config, EdgeListener, NoPin, St7789, Timer};

    /// [`Timer`] that sleeps the calling thread.
    pub struct StdTimer;

    impl Timer for StdTimer {
        fn delay_ms(milliseconds: u64) {
            thread::sleep(Duration::from_millis(milliseconds));
        }
    }

    pub type PirateDisplay<'b> =
        St7789<'b, SimpleHalSpiDevice, OutputPin, NoPin, OutputPin, StdTimer>;

    impl PirateAudio {
        /// Initializes the panel and hands out one interrupt-driven listener
        /// per button.
        pub fn split<'b>(
            self,
            config: Config,
            buffer: &'b mut [u8],
        ) -> Result<(PirateDisplay<'b>, Vec<EdgeListener<InputPin>>), BoardError> {
            let listeners = PirateAudio::edge_listeners(self.buttons)?;
            let display = St7789::new(config, self.spi, self.dc, NoPin, self.backlight, buffer)?;
            Ok((display, listeners))
        }
    }
}

#[cfg(not(feature = "async"))]
pub use blocking::{PirateDisplay, StdTimer};
