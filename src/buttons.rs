//! Push-button listeners for the board's four momentary switches.
//!
//! Each button gets its own listener, run as one blocking loop on whatever
//! thread or task the application gives it. The handler runs on that same
//! context, on every falling edge, with no debounce.
//!
//! [`EdgeListener`] sleeps until the line reports an edge, so short presses
//! are not lost. [`ButtonListener`] samples any `InputPin` and only sees
//! presses that outlast its poll interval. If handlers drive
//! the display, the application must keep two listeners from touching the
//! [`St7789`](crate::St7789) at the same time (e.g. behind a mutex).

use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

#[cfg(not(feature = "async"))]
use embedded_hal::digital::InputPin;
#[cfg(feature = "async")]
use embedded_hal_async::digital::Wait;

#[cfg(not(feature = "async"))]
use crate::Timer;

/// Buttons on the board, active low with pull-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    A,
    B,
    X,
    Y,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::A, Button::B, Button::X, Button::Y];

    /// BCM GPIO number the button is wired to.
    pub fn gpio(self) -> u8 {
        match self {
            Button::A => 5,
            Button::B => 6,
            Button::X => 16,
            Button::Y => 24,
        }
    }
}

/// Default polling period of the blocking listener.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

pub struct ButtonListener<P, TIMER> {
    button: Button,
    pin: P,
    poll_interval_ms: u64,
    _timer: PhantomData<TIMER>,
}

impl<P, TIMER> ButtonListener<P, TIMER> {
    pub fn new(button: Button, pin: P) -> Self {
        Self {
            button,
            pin,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            _timer: PhantomData,
        }
    }

    /// Sets how often the blocking listener samples the line.
    pub fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms.max(1);
        self
    }

    pub fn button(&self) -> Button {
        self.button
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(not(feature = "async"))]
impl<P, TIMER> ButtonListener<P, TIMER>
where
    P: InputPin,
    TIMER: Timer,
{
    /// Samples the line until `cancel` is set, calling `handler` on each
    /// high-to-low transition. A button already held when the loop starts
    /// does not fire until it is released and pressed again.
    pub fn run(
        &mut self,
        cancel: &AtomicBool,
        mut handler: impl FnMut(Button),
    ) -> Result<(), P::Error> {
        log::debug!("listening on button {:?} (GPIO{})", self.button, self.button.gpio());

        let mut was_low = self.pin.is_low()?;
        while !cancel.load(Ordering::Acquire) {
            let low = self.pin.is_low()?;
            if low && !was_low {
                handler(self.button);
            }
            was_low = low;
            TIMER::delay_ms(self.poll_interval_ms);
        }
        Ok(())
    }
}

/// Input line that can block until its next falling edge.
pub trait FallingEdge {
    type Error;

    /// Waits at most `timeout`. Returns `Ok(true)` for an edge, `Ok(false)`
    /// on timeout. Edges arriving between calls must not be dropped.
    fn wait_falling_edge(&mut self, timeout: Duration) -> Result<bool, Self::Error>;
}

/// How long [`EdgeListener`] blocks before looking at the cancel flag again.
pub const DEFAULT_CANCEL_CHECK: Duration = Duration::from_millis(100);

pub struct EdgeListener<P> {
    button: Button,
    pin: P,
    cancel_check: Duration,
}

impl<P: FallingEdge> EdgeListener<P> {
    pub fn new(button: Button, pin: P) -> Self {
        Self {
            button,
            pin,
            cancel_check: DEFAULT_CANCEL_CHECK,
        }
    }

    /// Bounds how late `run` notices that `cancel` was set.
    pub fn with_cancel_check(mut self, cancel_check: Duration) -> Self {
        self.cancel_check = cancel_check;
        self
    }

    pub fn button(&self) -> Button {
        self.button
    }

    pub fn release(self) -> P {
        self.pin
    }

    /// Blocks on the line until `cancel` is set, calling `handler` once per
    /// falling edge.
    pub fn run(
        &mut self,
        cancel: &AtomicBool,
        mut handler: impl FnMut(Button),
    ) -> Result<(), P::Error> {
        log::debug!("waiting for edges on button {:?} (GPIO{})", self.button, self.button.gpio());

        while !cancel.load(Ordering::Acquire) {
            if self.pin.wait_falling_edge(self.cancel_check)? {
                handler(self.button);
            }
        }
        Ok(())
    }
}

#[cfg(feature = "async")]
impl<P, TIMER> ButtonListener<P, TIMER>
where
    P: Wait,
{
    /// Awaits falling edges until `cancel` is set, calling `handler` on each.
    /// Dropping the future also stops the listener.
    pub async fn run(
        &mut self,
        cancel: &AtomicBool,
        mut handler: impl FnMut(Button),
    ) -> Result<(), P::Error> {
        log::debug!("listening on button {:?} (GPIO{})", self.button, self.button.gpio());

        while !cancel.load(Ordering::Acquire) {
            self.pin.wait_for_falling_edge().await?;
            if cancel.load(Ordering::Acquire) {
                break;
            }
            handler(self.button);
        }
        Ok(())
    }
}
