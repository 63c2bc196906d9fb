//! TM1637 display operations
//!
//! Every operation encodes its text before the bus is locked, so a bad
//! character never produces partial traffic. The bus sits behind a mutex
//! shared with the worker thread; each screen update holds the lock for one
//! whole session, so updates from the caller and from an animation never
//! interleave on the wire.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, info};
use pilight_core::command::{self, Brightness, DIGITS};
use pilight_core::segment::{encode_into, encode_iter};
use pilight_core::text::{clock_field, number_field, temperature_field, ScrollWindows};
use pilight_core::SegmentPattern;
use pilight_hal::FlexPin;

use super::bus::{SerialBus, SessionError};
use crate::clock::{SystemClock, WallClock};
use crate::error::Error;
use crate::task::BackgroundTask;

/// Pause between scroll steps unless told otherwise
pub const DEFAULT_SCROLL_DELAY: Duration = Duration::from_millis(250);

/// Countdown tick
pub const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Colon on and colon off time of the clock animation
const COLON_HALF_PERIOD: Duration = Duration::from_millis(500);

/// Bus plus the control settings sent with every session
struct Screen<CLK, DIO> {
    bus: SerialBus<CLK, DIO>,
    brightness: Brightness,
    on: bool,
}

impl<CLK, DIO, E> Screen<CLK, DIO>
where
    CLK: OutputPin<Error = E>,
    DIO: FlexPin<Error = E>,
{
    fn write(&mut self, patterns: &[SegmentPattern], address: u8) -> Result<(), Error<E>> {
        let control = command::display_control(self.brightness, self.on);
        self.bus
            .set_segments(patterns, address, control)
            .map_err(|e| match e {
                SessionError::OutOfRange(r) => Error::AddressOutOfRange {
                    address: r.address,
                    len: r.len,
                },
                SessionError::Pin(e) => Error::Pin(e),
            })
    }
}

type SharedScreen<CLK, DIO> = Arc<Mutex<Screen<CLK, DIO>>>;

fn lock<CLK, DIO>(screen: &Mutex<Screen<CLK, DIO>>) -> MutexGuard<'_, Screen<CLK, DIO>> {
    // A panic mid-session leaves the bus undefined either way; keep going
    screen.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Encode up to four characters and write them from address 0
fn show_text<CLK, DIO, E>(
    screen: &Mutex<Screen<CLK, DIO>>,
    text: &str,
    colon: bool,
) -> Result<(), Error<E>>
where
    CLK: OutputPin<Error = E>,
    DIO: FlexPin<Error = E>,
{
    let mut cells = [SegmentPattern::BLANK; DIGITS];
    let len = encode_into(text, &mut cells)?;
    for cell in &mut cells[..len] {
        *cell = cell.with_point(colon);
    }
    lock(screen).write(&cells[..len], 0)
}

/// 4-digit TM1637 display
///
/// Owns the bus and at most one background animation (clock or countdown).
/// Starting an animation, or calling [`clear`](Self::clear), stops and joins
/// the previous one first.
pub struct SegmentDisplay<CLK, DIO, C = SystemClock>
where
    CLK: ErrorType,
{
    screen: SharedScreen<CLK, DIO>,
    clock: Arc<C>,
    task: Option<BackgroundTask<CLK::Error>>,
}

impl<CLK, DIO, E> SegmentDisplay<CLK, DIO, SystemClock>
where
    CLK: OutputPin<Error = E> + Send + 'static,
    DIO: FlexPin<Error = E> + Send + 'static,
    E: fmt::Debug + Send + 'static,
{
    /// Create a display at full brightness
    pub fn new(clk: CLK, dio: DIO) -> Result<Self, Error<E>> {
        Self::with_brightness(clk, dio, Brightness::default())
    }

    /// Create a display with an initial brightness
    pub fn with_brightness(clk: CLK, dio: DIO, brightness: Brightness) -> Result<Self, Error<E>> {
        Self::with_clock(clk, dio, brightness, SystemClock)
    }
}

impl<CLK, DIO, C, E> SegmentDisplay<CLK, DIO, C>
where
    CLK: OutputPin<Error = E> + Send + 'static,
    DIO: FlexPin<Error = E> + Send + 'static,
    C: WallClock,
    E: fmt::Debug + Send + 'static,
{
    /// Create a display that reads time from `clock`
    pub fn with_clock(
        clk: CLK,
        dio: DIO,
        brightness: Brightness,
        clock: C,
    ) -> Result<Self, Error<E>> {
        let bus = SerialBus::new(clk, dio).map_err(Error::Pin)?;
        debug!("tm1637 ready, brightness {}", brightness);
        Ok(Self {
            screen: Arc::new(Mutex::new(Screen {
                bus,
                brightness,
                on: true,
            })),
            clock: Arc::new(clock),
            task: None,
        })
    }

    /// Show up to four characters
    ///
    /// Supports `0-9`, `a-z`, `A-Z`, space, `-` and `*` (degree sign). With
    /// `colon` set, the point bit is lit on every digit, which lights the
    /// center colon on clock modules. Longer text is checked in full, then
    /// only its first four characters are shown.
    pub fn show(&mut self, text: &str, colon: bool) -> Result<(), Error<E>> {
        show_text(&self.screen, text, colon)
    }

    /// Write raw patterns starting at register `address` (0-5)
    pub fn show_segments(
        &mut self,
        patterns: &[SegmentPattern],
        address: u8,
    ) -> Result<(), Error<E>> {
        lock(&self.screen).write(patterns, address)
    }

    /// Show a number right-justified, clamped to `-999..=9999`
    pub fn number(&mut self, n: i32) -> Result<(), Error<E>> {
        show_text(&self.screen, &number_field(n), false)
    }

    /// Show a temperature in °C
    ///
    /// Below -9 shows `lo`, above 99 shows `hi`.
    pub fn temperature(&mut self, celsius: i32) -> Result<(), Error<E>> {
        show_text(&self.screen, &temperature_field(celsius), false)
    }

    /// Turn all four digits off
    pub fn blank(&mut self) -> Result<(), Error<E>> {
        lock(&self.screen).write(&[SegmentPattern::BLANK; DIGITS], 0)
    }

    /// Scroll text from right to left, blocking the caller
    ///
    /// Writes `len + 5` frames with `delay` between them; the first and the
    /// last frame are blank.
    pub fn scroll(&mut self, text: &str, delay: Duration) -> Result<(), Error<E>> {
        let patterns = encode_iter(text).collect::<Result<Vec<_>, _>>()?;
        self.scroll_segments(&patterns, delay)
    }

    /// Scroll pre-encoded patterns, blocking the caller
    pub fn scroll_segments(
        &mut self,
        patterns: &[SegmentPattern],
        delay: Duration,
    ) -> Result<(), Error<E>> {
        for (step, window) in ScrollWindows::new(patterns).enumerate() {
            if step > 0 {
                thread::sleep(delay);
            }
            lock(&self.screen).write(&window, 0)?;
        }
        Ok(())
    }

    /// Current brightness
    pub fn brightness(&self) -> Brightness {
        lock(&self.screen).brightness
    }

    /// Change brightness; takes effect immediately
    pub fn set_brightness(&mut self, brightness: Brightness) -> Result<(), Error<E>> {
        let mut screen = lock(&self.screen);
        screen.brightness = brightness;
        let on = screen.on;
        screen.bus.set_control(brightness, on).map_err(Error::Pin)
    }

    /// Switch the display on or off, keeping its contents
    pub fn set_display_on(&mut self, on: bool) -> Result<(), Error<E>> {
        let mut screen = lock(&self.screen);
        screen.on = on;
        let brightness = screen.brightness;
        screen.bus.set_control(brightness, on).map_err(Error::Pin)
    }

    /// Check if a clock or countdown animation is running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Show the local time as `HH:MM` with a blinking colon
    ///
    /// The colon is lit for the first half of every second, measured from
    /// the second boundary. Runs until [`clear`](Self::clear) or another
    /// animation replaces it.
    pub fn clock(&mut self) -> Result<(), Error<E>> {
        self.cancel_task();

        let screen = Arc::clone(&self.screen);
        let clock = Arc::clone(&self.clock);
        let task = BackgroundTask::spawn("tm1637-clock", move |stop| loop {
            if stop.wait(clock.until_next_second()) {
                return Ok(());
            }
            let tick = Instant::now();
            let field = clock_field(clock.now());

            show_text(&screen, &field, true)?;
            if stop.wait(COLON_HALF_PERIOD.saturating_sub(tick.elapsed())) {
                return Ok(());
            }
            // Colon-off half ends at the next boundary wait
            show_text(&screen, &field, false)?;
        })?;

        self.task = Some(task);
        Ok(())
    }

    /// Count down from `seconds` to 0, one step per second
    ///
    /// Replaces a running animation. An error that animation ended with is
    /// logged rather than returned here.
    ///
    /// With `background` unset the call blocks until the countdown has
    /// reached 0 and returns its result.
    pub fn countdown(&mut self, seconds: u32, background: bool) -> Result<(), Error<E>> {
        self.cancel_task();

        let screen = Arc::clone(&self.screen);
        let task = BackgroundTask::spawn("tm1637-countdown", move |stop| {
            for remaining in (1..=seconds).rev() {
                let n = i32::try_from(remaining).unwrap_or(i32::MAX);
                show_text(&screen, &number_field(n), false)?;
                if stop.wait(COUNTDOWN_STEP) {
                    debug!("countdown cancelled at {}", remaining);
                    return Ok(());
                }
            }
            show_text(&screen, &number_field(0), false)?;
            info!("countdown from {} finished", seconds);
            Ok(())
        })?;

        if background {
            self.task = Some(task);
            Ok(())
        } else {
            task.join()
        }
    }

    /// Stop any running animation
    ///
    /// Blocks until the worker has returned; no display write happens after
    /// this returns. Hands back the error the animation ended with, if any.
    /// The current contents stay on the display.
    pub fn clear(&mut self) -> Result<(), Error<E>> {
        match self.task.take() {
            Some(task) => task.stop(),
            None => Ok(()),
        }
    }

    /// Stop the animation that is about to be replaced
    ///
    /// An error it ended with belongs to no caller any more and is logged.
    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
    }

    /// Stop any animation and hand back the pins
    ///
    /// An error the animation ended with is logged, not returned.
    pub fn release(mut self) -> Result<(CLK, DIO), Error<E>> {
        self.cancel_task();
        let screen = Arc::try_unwrap(self.screen).map_err(|_| Error::Busy)?;
        let screen = screen.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(screen.bus.release())
    }
}
