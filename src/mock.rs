//! Recording bus and line doubles for the blocking driver.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use embedded_hal::{digital, spi};

use crate::buttons::FallingEdge;
use crate::{Config, Error, St7789, Timer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Dc(bool),
    Reset(bool),
    Backlight(bool),
    Write(Vec<u8>),
}

/// One SPI write tagged with the command/data line level it went out under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Command(Vec<u8>),
    Data(Vec<u8>),
}

#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<Event>>>);

impl Log {
    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn frames(&self) -> Vec<Frame> {
        let mut dc_high = false;
        let mut frames = Vec::new();
        for event in self.0.borrow().iter() {
            match event {
                Event::Dc(level) => dc_high = *level,
                Event::Write(bytes) if dc_high => frames.push(Frame::Data(bytes.clone())),
                Event::Write(bytes) => frames.push(Frame::Command(bytes.clone())),
                _ => {}
            }
        }
        frames
    }

    /// Register writes as `(opcode, parameters)`, parameter frames joined.
    pub fn commands(&self) -> Vec<(u8, Vec<u8>)> {
        let mut commands: Vec<(u8, Vec<u8>)> = Vec::new();
        for frame in self.frames() {
            match frame {
                Frame::Command(bytes) => {
                    for byte in bytes {
                        commands.push((byte, Vec::new()));
                    }
                }
                Frame::Data(bytes) => {
                    if let Some((_, params)) = commands.last_mut() {
                        params.extend_from_slice(&bytes);
                    }
                }
            }
        }
        commands
    }

    /// Data frames that follow the last command byte.
    pub fn payload_after(&self, opcode: u8) -> Vec<Vec<u8>> {
        let frames = self.frames();
        let start = frames
            .iter()
            .rposition(|f| matches!(f, Frame::Command(b) if b.as_slice() == [opcode]))
            .map_or(frames.len(), |i| i + 1);
        frames[start..]
            .iter()
            .filter_map(|f| match f {
                Frame::Data(bytes) => Some(bytes.clone()),
                Frame::Command(_) => None,
            })
            .collect()
    }
}

pub struct MockSpi {
    log: Log,
    /// Writes allowed before every further write fails.
    pub fail_after: Option<usize>,
    writes: usize,
}

impl MockSpi {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            fail_after: None,
            writes: 0,
        }
    }
}

impl spi::ErrorType for MockSpi {
    type Error = spi::ErrorKind;
}

impl spi::SpiDevice for MockSpi {
    fn transaction(
        &mut self,
        operations: &mut [spi::Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            if let spi::Operation::Write(bytes) = op {
                if self.fail_after.is_some_and(|n| self.writes >= n) {
                    return Err(spi::ErrorKind::Other);
                }
                self.writes += 1;
                self.log.push(Event::Write(bytes.to_vec()));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
pub enum Line {
    Dc,
    Reset,
    Backlight,
}

pub struct MockPin {
    log: Log,
    line: Line,
    pub broken: bool,
}

impl MockPin {
    pub fn new(log: &Log, line: Line) -> Self {
        Self {
            log: log.clone(),
            line,
            broken: false,
        }
    }

    fn set(&mut self, level: bool) -> Result<(), digital::ErrorKind> {
        if self.broken {
            return Err(digital::ErrorKind::Other);
        }
        self.log.push(match self.line {
            Line::Dc => Event::Dc(level),
            Line::Reset => Event::Reset(level),
            Line::Backlight => Event::Backlight(level),
        });
        Ok(())
    }
}

impl digital::ErrorType for MockPin {
    type Error = digital::ErrorKind;
}

impl digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true)
    }
}

thread_local! {
    static DELAYS: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Returns immediately, remembering each requested delay on this thread.
pub struct NoDelay;

impl NoDelay {
    pub fn take() -> Vec<u64> {
        DELAYS.with(|d| d.take())
    }
}

impl Timer for NoDelay {
    fn delay_ms(milliseconds: u64) {
        DELAYS.with(|d| d.borrow_mut().push(milliseconds));
    }
}

/// Input line that replays a fixed sequence of levels (`true` = high) and
/// raises `cancel` once the sequence is used up.
pub struct ScriptedInput<'a> {
    levels: Vec<bool>,
    reads: Cell<usize>,
    cancel: &'a AtomicBool,
}

impl<'a> ScriptedInput<'a> {
    pub fn new(levels: &[bool], cancel: &'a AtomicBool) -> Self {
        Self {
            levels: levels.to_vec(),
            reads: Cell::new(0),
            cancel,
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    fn level(&self) -> bool {
        let n = self.reads.get();
        self.reads.set(n + 1);
        if n + 1 >= self.levels.len() {
            self.cancel.store(true, Ordering::Release);
        }
        self.levels[n.min(self.levels.len() - 1)]
    }
}

impl digital::ErrorType for ScriptedInput<'_> {
    type Error = core::convert::Infallible;
}

impl digital::InputPin for ScriptedInput<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

/// Edge source that replays a fixed sequence of wait outcomes and raises
/// `cancel` after the last one.
pub struct ScriptedEdges<'a> {
    outcomes: Vec<Result<bool, ()>>,
    timeouts: Vec<Duration>,
    cancel: &'a AtomicBool,
}

impl<'a> ScriptedEdges<'a> {
    pub fn new(outcomes: &[Result<bool, ()>], cancel: &'a AtomicBool) -> Self {
        Self {
            outcomes: outcomes.to_vec(),
            timeouts: Vec::new(),
            cancel,
        }
    }

    pub fn waits(&self) -> usize {
        self.timeouts.len()
    }

    /// Timeout passed to each wait, in call order.
    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.clone()
    }
}

impl FallingEdge for ScriptedEdges<'_> {
    type Error = ();

    fn wait_falling_edge(&mut self, timeout: Duration) -> Result<bool, ()> {
        let n = self.timeouts.len();
        self.timeouts.push(timeout);
        if n + 1 >= self.outcomes.len() {
            self.cancel.store(true, Ordering::Release);
        }
        self.outcomes.get(n).copied().unwrap_or(Ok(false))
    }
}

pub type MockDisplay<'b> = St7789<'b, MockSpi, MockPin, MockPin, MockPin, NoDelay>;

pub struct Harness {
    pub log: Log,
    pub spi: MockSpi,
    pub dc: MockPin,
    pub rst: MockPin,
    pub backlight: MockPin,
}

impl Harness {
    pub fn new() -> Self {
        let log = Log::default();
        Self {
            spi: MockSpi::new(&log),
            dc: MockPin::new(&log, Line::Dc),
            rst: MockPin::new(&log, Line::Reset),
            backlight: MockPin::new(&log, Line::Backlight),
            log,
        }
    }

    pub fn build(
        self,
        config: Config,
        buffer: &mut [u8],
    ) -> Result<(MockDisplay<'_>, Log), Error<spi::ErrorKind>> {
        let display =
            St7789::new(config, self.spi, self.dc, self.rst, self.backlight, buffer)?;
        Ok((display, self.log))
    }
}

/// Initialized display with an empty log and no recorded delays.
pub fn display(config: Config, buffer: &mut [u8]) -> (MockDisplay<'_>, Log) {
    let (display, log) = Harness::new().build(config, buffer).unwrap();
    log.clear();
    NoDelay::take();
    (display, log)
}
