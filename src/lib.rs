#![cfg_attr(not(any(test, feature = "rpi")), no_std)]
#![allow(async_fn_in_trait)]

//! Driver for the ST7789 240×240 SPI panel and the four buttons of the
//! Pirate Audio style add-on board.
//!
//! The driver is blocking by default; the `async` feature builds the same
//! API on `embedded-hal-async`.
//!
//! ```ignore
//! let mut buffer = [0u8; st7789_pirate::BUF_SIZE];
//! let mut display: St7789<_, _, _, _, _, MyTimer> =
//!     St7789::new(Config::default(), spi, dc, NoPin, backlight, &mut buffer)?;
//! display.fill_screen(Rgb888::new(255, 0, 0))?;
//! display.set_rotation(Rotation::Deg90)?;
//! ```

use core::fmt;
use core::marker::PhantomData;

use embedded_hal::digital::{ErrorKind as PinErrorKind, ErrorType, OutputPin};
#[cfg(not(feature = "async"))]
use embedded_hal::spi::SpiDevice;
#[cfg(feature = "async")]
use embedded_hal_async::spi::SpiDevice;

pub mod buttons;
mod color;
pub mod raster;
pub mod registers;
mod rotation;

#[cfg(feature = "rpi")]
pub mod board;

#[cfg(all(test, not(feature = "async")))]
mod mock;

pub use buttons::{Button, ButtonListener, EdgeListener, FallingEdge};
pub use color::{rgba_to_565, to_rgb565};
pub use embedded_graphics_core::pixelcolor::{Rgb565, Rgb888};
#[cfg(feature = "bmp")]
pub use raster::decode_bmp;
pub use raster::{ImageError, RgbaImage, RgbaRaster};
pub use registers::{FrameRate, Instruction};
pub use rotation::{Rotation, RotationState};

use color::pixel_bytes;
use registers::*;

// Panel dimensions of the 1.3" 240x240 module
pub const SCREEN_WIDTH: u16 = 240;
pub const SCREEN_HEIGHT: u16 = 240;

/// Largest payload a single bus transaction may carry.
pub const MAX_TRANSFER: usize = 4096;
/// Scratch buffer size that lets every chunk reach [`MAX_TRANSFER`].
pub const BUF_SIZE: usize = MAX_TRANSFER;

/// Datasheet-recommended SPI clock. The bus clock is always chosen by the
/// caller when opening the bus; this is only a starting point.
pub const RECOMMENDED_SPI_CLOCK_HZ: u32 = 16_000_000;

const RESET_PULSE_MS: u64 = 100;
const SOFTWARE_RESET_MS: u64 = 150;
const SLEEP_IN_MS: u64 = 5;
const SLEEP_OUT_MS: u64 = 120;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub width: u16,
    pub height: u16,
    pub rotation: Rotation,
    /// Swap red and blue in MADCTL.
    pub bgr: bool,
    /// Addressing offsets of the unrotated panel inside display RAM.
    pub row_offset: u16,
    pub column_offset: u16,
    /// Payload bound of the underlying transport, in bytes.
    pub max_transfer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            rotation: Rotation::None,
            bgr: false,
            row_offset: 0,
            column_offset: 0,
            max_transfer: MAX_TRANSFER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Width or height is zero
    ZeroSize,
    /// Scratch buffer cannot hold a single pixel
    BufferTooSmall,
    /// `max_transfer` cannot carry a single pixel
    TransferTooSmall,
    /// An offset pushes the addressing window past the 16-bit RAM address range
    OffsetTooLarge,
}

#[derive(Debug)]
pub enum Error<E = ()> {
    /// Communication error
    Comm(E),
    /// Control line could not be driven
    Pin(PinErrorKind),
    /// Rejected at construction
    Configuration(ConfigError),
    /// Rectangle outside the rotated panel
    OutOfBounds,
    /// Image could not be decoded into a raster
    ImageDecode(ImageError),
    /// Raster size differs from the panel size
    DimensionMismatch {
        expected: (u16, u16),
        actual: (u16, u16),
    },
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Comm(e) => write!(f, "bus write failed: {e:?}"),
            Error::Pin(kind) => write!(f, "control line failed: {kind:?}"),
            Error::Configuration(e) => write!(f, "invalid configuration: {e:?}"),
            Error::OutOfBounds => f.write_str("rectangle outside display area"),
            Error::ImageDecode(e) => write!(f, "image decode failed: {e}"),
            Error::DimensionMismatch { expected, actual } => write!(
                f,
                "image is {}x{}, display is {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

fn pin_error<P: embedded_hal::digital::Error, E>(e: P) -> Error<E> {
    Error::Pin(e.kind())
}

// Pixel count of an inclusive span, `None` when it does not fit an i32.
fn line_extent(start: i32, end: i32) -> Option<i32> {
    end.checked_sub(start)?.checked_add(1)
}

/// Output line for boards that do not wire one (e.g. no reset line).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct St7789<'b, SPI, DC, RST, BL, TIMER>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    TIMER: Timer,
{
    spi: SPI,
    dc: DC,
    rst: RST,
    backlight: BL,
    config: Config,
    buffer: &'b mut [u8],
    rotation: Rotation,
    row_offset: u16,
    column_offset: u16,
    bgr: bool,
    sleeping: bool,
    _timer: PhantomData<TIMER>,
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "St7789",),
    async(feature = "async", keep_self)
)]
impl<'b, SPI, DC, RST, BL, E, TIMER> St7789<'b, SPI, DC, RST, BL, TIMER>
where
    SPI: SpiDevice<Error = E>,
    DC: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    TIMER: Timer,
{
    /// Takes ownership of the bus and lines, pulses reset, runs the panel
    /// initialization sequence and turns the backlight on.
    ///
    /// `buffer` is scratch space for pixel transfers; chunks are bounded by
    /// both its length and `config.max_transfer`.
    pub async fn new(
        config: Config,
        spi: SPI,
        dc: DC,
        rst: RST,
        backlight: BL,
        buffer: &'b mut [u8],
    ) -> Result<Self, Error<E>> {
        if config.width == 0 || config.height == 0 {
            return Err(Error::Configuration(ConfigError::ZeroSize));
        }
        if buffer.len() < 2 {
            return Err(Error::Configuration(ConfigError::BufferTooSmall));
        }
        if config.max_transfer < 2 {
            return Err(Error::Configuration(ConfigError::TransferTooSmall));
        }
        // Rotation can pair either offset with either dimension.
        let reach = config.width.max(config.height) - 1;
        if config.row_offset.checked_add(reach).is_none()
            || config.column_offset.checked_add(reach).is_none()
        {
            return Err(Error::Configuration(ConfigError::OffsetTooLarge));
        }

        let state = RotationState::derive(
            config.rotation,
            config.width,
            config.bgr,
            config.row_offset,
            config.column_offset,
        );
        let mut display = Self {
            spi,
            dc,
            rst,
            backlight,
            config,
            buffer,
            rotation: config.rotation,
            row_offset: state.row_offset,
            column_offset: state.column_offset,
            bgr: config.bgr,
            sleeping: false,
            _timer: PhantomData,
        };

        display.dc.set_low().map_err(pin_error)?;
        display.reset().await?;
        display.init().await?;
        display.power_on()?;

        log::debug!(
            "st7789 ready: {}x{}, rotation {}",
            config.width,
            config.height,
            config.rotation.degrees()
        );
        Ok(display)
    }

    /// Hardware reset: hold the reset line low for 100ms, then release it.
    pub async fn reset(&mut self) -> Result<(), Error<E>> {
        self.rst.set_low().map_err(pin_error)?;
        TIMER::delay_ms(RESET_PULSE_MS).await;
        self.rst.set_high().map_err(pin_error)?;
        Ok(())
    }

    async fn init(&mut self) -> Result<(), Error<E>> {
        self.write_command(Instruction::SoftwareReset, &[]).await?;
        TIMER::delay_ms(SOFTWARE_RESET_MS).await;

        self.write_command(
            Instruction::MemoryAccessControl,
            &[MADCTL_MX_RL | MADCTL_MV_REV | MADCTL_ML_BT],
        )
        .await?;
        self.write_command(Instruction::PorchControl, &PORCH_CONTROL)
            .await?;
        self.write_command(Instruction::PixelFormatSet, &[COLMOD_CTRL_65K])
            .await?;
        self.write_command(Instruction::GateControl, &[GATE_CONTROL])
            .await?;
        self.write_command(Instruction::VcomSetting, &[VCOM_SETTING])
            .await?;
        // XOR bits for the mechanical mounting of this module
        self.write_command(
            Instruction::LcmControl,
            &[LCMCTRL_XBGR | LCMCTRL_XMH | LCMCTRL_XMV],
        )
        .await?;
        self.write_command(Instruction::VdvVrhEnable, &[VDVVRHEN_CMDEN_WRITE])
            .await?;
        self.write_command(Instruction::VrhSet, &[VRH_SETTING])
            .await?;
        self.write_command(Instruction::VdvSet, &[VDV_SETTING])
            .await?;
        self.write_command(Instruction::PowerControl1, &POWER_CONTROL)
            .await?;
        self.write_command(Instruction::FrameRateControl2, &[FrameRate::Hz60.code()])
            .await?;
        self.write_command(Instruction::PositiveGamma, &POSITIVE_GAMMA)
            .await?;
        self.write_command(Instruction::NegativeGamma, &NEGATIVE_GAMMA)
            .await?;

        self.write_command(Instruction::DisplayInversionOn, &[])
            .await?;
        self.write_command(Instruction::SleepOut, &[]).await?;
        self.write_command(Instruction::DisplayOn, &[]).await?;
        Ok(())
    }

    /// Drives the command/data line low and writes `bytes` as command bytes.
    pub async fn send_command(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.dc.set_low().map_err(pin_error)?;
        self.spi.write(bytes).await.map_err(Error::Comm)
    }

    /// Drives the command/data line high and writes `bytes` as parameter or pixel data.
    pub async fn send_data(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.dc.set_high().map_err(pin_error)?;
        self.spi.write(bytes).await.map_err(Error::Comm)
    }

    pub async fn command(&mut self, code: u8) -> Result<(), Error<E>> {
        self.send_command(&[code]).await
    }

    pub async fn data(&mut self, byte: u8) -> Result<(), Error<E>> {
        self.send_data(&[byte]).await
    }

    /// Write command with optional parameters
    pub async fn write_command(
        &mut self,
        instruction: Instruction,
        params: &[u8],
    ) -> Result<(), Error<E>> {
        self.command(instruction.into()).await?;
        if !params.is_empty() {
            self.send_data(params).await?;
        }
        Ok(())
    }

    /// Sends the first `len` bytes of the scratch buffer as data.
    async fn write_buffer(&mut self, len: usize) -> Result<(), Error<E>> {
        self.dc.set_high().map_err(pin_error)?;
        self.spi
            .write(&self.buffer[..len])
            .await
            .map_err(Error::Comm)
    }

    /// Addresses the whole panel and opens a memory write. Pixel data sent
    /// afterwards fills it row by row.
    pub async fn set_window(&mut self) -> Result<(), Error<E>> {
        let x0 = self.column_offset;
        let y0 = self.row_offset;
        let x1 = x0 + (self.config.width - 1);
        let y1 = y0 + (self.config.height - 1);
        log::trace!("window columns {}..={}, rows {}..={}", x0, x1, y0, y1);

        self.write_command(Instruction::ColumnAddressSet, &address_range(x0, x1))
            .await?;
        self.write_command(Instruction::RowAddressSet, &address_range(y0, y1))
            .await?;
        self.write_command(Instruction::MemoryWrite, &[]).await
    }

    /// Fill a rectangular area with a color.
    ///
    /// The rectangle is checked against the rotated panel size. Exactly
    /// `width * height` pixels are streamed into the panel window.
    pub async fn fill_rectangle(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Rgb888,
    ) -> Result<(), Error<E>> {
        let (panel_width, panel_height) = self.size();
        let (panel_width, panel_height) = (panel_width as i32, panel_height as i32);
        if x < 0
            || y < 0
            || width <= 0
            || height <= 0
            || width > panel_width - x
            || height > panel_height - y
        {
            return Err(Error::OutOfBounds);
        }

        self.set_window().await?;

        let pixel = pixel_bytes(color);
        let row = (self.config.width as usize * 2).min(self.chunk_len());
        for px in self.buffer[..row].chunks_exact_mut(2) {
            px.copy_from_slice(&pixel);
        }

        let mut remaining = width as usize * height as usize * 2;
        log::trace!("fill {}x{} at ({}, {}): {} bytes", width, height, x, y, remaining);
        while remaining > 0 {
            let len = remaining.min(row);
            self.write_buffer(len).await?;
            remaining -= len;
        }
        Ok(())
    }

    /// Draw a single pixel
    pub async fn set_pixel(&mut self, x: i32, y: i32, color: Rgb888) -> Result<(), Error<E>> {
        self.fill_rectangle(x, y, 1, 1, color).await
    }

    /// Fill entire screen with a single color
    pub async fn fill_screen(&mut self, color: Rgb888) -> Result<(), Error<E>> {
        let (width, height) = self.size();
        self.fill_rectangle(0, 0, width as i32, height as i32, color)
            .await
    }

    pub async fn draw_fast_vline(
        &mut self,
        x: i32,
        y0: i32,
        y1: i32,
        color: Rgb888,
    ) -> Result<(), Error<E>> {
        let (top, bottom) = (y0.min(y1), y0.max(y1));
        let height = line_extent(top, bottom).ok_or(Error::OutOfBounds)?;
        self.fill_rectangle(x, top, 1, height, color).await
    }

    pub async fn draw_fast_hline(
        &mut self,
        x0: i32,
        x1: i32,
        y: i32,
        color: Rgb888,
    ) -> Result<(), Error<E>> {
        let (left, right) = (x0.min(x1), x0.max(x1));
        let width = line_extent(left, right).ok_or(Error::OutOfBounds)?;
        self.fill_rectangle(left, y, width, 1, color).await
    }

    /// Streams a full-panel raster.
    ///
    /// The raster must be exactly `width × height` of the configured panel.
    /// Pixels go out column by column, right-most column first, which is
    /// what the panel's mounting expects, in chunks no larger than the
    /// transfer bound.
    pub async fn draw_image<R: RgbaRaster>(&mut self, image: &R) -> Result<(), Error<E>> {
        self.set_window().await?;

        let (width, height) = (self.config.width, self.config.height);
        let actual = image.dimensions();
        if actual != (width, height) {
            return Err(Error::DimensionMismatch {
                expected: (width, height),
                actual,
            });
        }

        let chunk = self.chunk_len();
        let mut filled = 0;
        for column in (0..width).rev() {
            for row in 0..height {
                let [r, g, b, _] = image.rgba(column, row);
                let pixel = rgba_to_565(r, g, b).to_be_bytes();
                self.buffer[filled..filled + 2].copy_from_slice(&pixel);
                filled += 2;
                if filled == chunk {
                    self.write_buffer(filled).await?;
                    filled = 0;
                }
            }
        }
        if filled > 0 {
            self.write_buffer(filled).await?;
        }
        Ok(())
    }

    /// Decodes a BMP file and draws it with [`draw_image`](Self::draw_image).
    #[cfg(feature = "bmp")]
    pub async fn draw_bmp(&mut self, data: &[u8]) -> Result<(), Error<E>> {
        let bmp = raster::decode_bmp(data).map_err(Error::ImageDecode)?;
        self.draw_image(&bmp).await
    }

    /// Changes the orientation, clockwise. Integers are taken modulo 4.
    pub async fn set_rotation(&mut self, rotation: impl Into<Rotation>) -> Result<(), Error<E>> {
        let rotation = rotation.into();
        let state = RotationState::derive(
            rotation,
            self.config.width,
            self.bgr,
            self.config.row_offset,
            self.config.column_offset,
        );

        self.write_command(Instruction::MemoryAccessControl, &[state.madctl])
            .await?;
        // Scroll the visible rows into place on the 240-row module
        self.write_command(
            Instruction::VerticalScrollStartAddress,
            &vertical_scroll_offset(state.scroll_offset),
        )
        .await?;

        self.rotation = rotation;
        self.row_offset = state.row_offset;
        self.column_offset = state.column_offset;
        log::debug!("rotation {} (MADCTL {:#04x})", rotation.degrees(), state.madctl);
        Ok(())
    }

    /// Inverts the colors of the screen
    pub async fn invert(&mut self, invert: bool) -> Result<(), Error<E>> {
        let instruction = if invert {
            Instruction::DisplayInversionOn
        } else {
            Instruction::DisplayInversionOff
        };
        self.write_command(instruction, &[]).await
    }

    pub async fn set_display_on(&mut self, on: bool) -> Result<(), Error<E>> {
        let instruction = if on {
            Instruction::DisplayOn
        } else {
            Instruction::DisplayOff
        };
        self.write_command(instruction, &[]).await
    }

    pub async fn set_frame_rate(&mut self, rate: FrameRate) -> Result<(), Error<E>> {
        self.write_command(Instruction::FrameRateControl2, &[rate.code()])
            .await
    }

    pub async fn set_porch(&mut self, porch: &[u8; 5]) -> Result<(), Error<E>> {
        self.write_command(Instruction::PorchControl, porch).await
    }

    /// Replaces the positive and negative gamma curves.
    pub async fn set_gamma(
        &mut self,
        positive: &[u8; 14],
        negative: &[u8; 14],
    ) -> Result<(), Error<E>> {
        self.write_command(Instruction::PositiveGamma, positive)
            .await?;
        self.write_command(Instruction::NegativeGamma, negative)
            .await
    }

    /// Puts the panel logic into sleep mode. The backlight is not touched.
    pub async fn sleep(&mut self) -> Result<(), Error<E>> {
        self.write_command(Instruction::SleepIn, &[]).await?;
        TIMER::delay_ms(SLEEP_IN_MS).await;
        self.sleeping = true;
        log::debug!("panel sleeping");
        Ok(())
    }

    pub async fn wake(&mut self) -> Result<(), Error<E>> {
        self.write_command(Instruction::SleepOut, &[]).await?;
        TIMER::delay_ms(SLEEP_OUT_MS).await;
        self.sleeping = false;
        log::debug!("panel awake");
        Ok(())
    }

    /// Turns the backlight on.
    pub fn power_on(&mut self) -> Result<(), Error<E>> {
        self.backlight.set_high().map_err(pin_error)
    }

    /// Turns the backlight off; the panel keeps its contents.
    pub fn power_off(&mut self) -> Result<(), Error<E>> {
        self.backlight.set_low().map_err(pin_error)
    }
}

impl<'b, SPI, DC, RST, BL, TIMER> St7789<'b, SPI, DC, RST, BL, TIMER>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    TIMER: Timer,
{
    /// Panel size for the current rotation.
    pub fn size(&self) -> (u16, u16) {
        if self.rotation.is_swapped() {
            (self.config.height, self.config.width)
        } else {
            (self.config.width, self.config.height)
        }
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pixel_count(&self) -> u32 {
        self.config.width as u32 * self.config.height as u32
    }

    /// Row and column addressing offsets for the current rotation.
    pub fn offsets(&self) -> (u16, u16) {
        (self.row_offset, self.column_offset)
    }

    pub fn is_bgr(&self) -> bool {
        self.bgr
    }

    /// Selects BGR channel order; takes effect on the next `set_rotation`.
    pub fn set_bgr(&mut self, bgr: bool) {
        self.bgr = bgr;
    }

    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Hands the bus and lines back to the caller.
    pub fn release(self) -> (SPI, DC, RST, BL) {
        (self.spi, self.dc, self.rst, self.backlight)
    }

    // Largest even payload both the scratch buffer and the transport accept.
    fn chunk_len(&self) -> usize {
        self.buffer.len().min(self.config.max_transfer) & !1
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Timer",),
    async(feature = "async", keep_self)
)]
/// Simplified timer trait for delay operations.
pub trait Timer {
    /// Delay for the specified number of milliseconds.
    async fn delay_ms(milliseconds: u64);
}

/// [`Timer`] backed by `embassy-time`.
#[cfg(all(feature = "async", feature = "embassy-time"))]
pub struct EmbassyTimer;

#[cfg(all(feature = "async", feature = "embassy-time"))]
impl Timer for EmbassyTimer {
    async fn delay_ms(milliseconds: u64) {
        embassy_time::Timer::after_millis(milliseconds).await;
    }
}
