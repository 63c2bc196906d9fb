//! TM1637 2-wire bus
//!
//! The chip speaks an I2C-like protocol without device addresses: a falling
//! data edge while the clock is high opens a transaction, a rising data edge
//! while the clock is high closes it. Bytes go out LSB first, each followed by
//! an acknowledgement slot in which the data line is released.
//!
//! The pins are driven as fast as the host can toggle them. On a Raspberry Pi
//! userspace GPIO write latency keeps the clock well below the chip's limit.

use embedded_hal::digital::OutputPin;
use log::trace;
use pilight_core::command::{self, Brightness};
use pilight_core::SegmentPattern;
use pilight_hal::FlexPin;

/// Bit-banged bus to one TM1637
pub struct SerialBus<CLK, DIO> {
    clk: CLK,
    dio: DIO,
}

/// Why a session was refused before touching the pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRange {
    pub address: u8,
    pub len: usize,
}

/// Session failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError<E> {
    /// Refused, nothing was sent
    OutOfRange(OutOfRange),
    /// Pin failure mid-session
    Pin(E),
}

impl<CLK, DIO, E> SerialBus<CLK, DIO>
where
    CLK: OutputPin<Error = E>,
    DIO: FlexPin<Error = E>,
{
    /// Take ownership of the pins and leave the bus idle (both lines high)
    pub fn new(mut clk: CLK, mut dio: DIO) -> Result<Self, E> {
        dio.set_as_output()?;
        clk.set_high()?;
        dio.set_high()?;
        Ok(Self { clk, dio })
    }

    /// Start condition
    pub fn start(&mut self) -> Result<(), E> {
        self.dio.set_high()?;
        self.clk.set_high()?;
        self.dio.set_low()?;
        self.clk.set_low()
    }

    /// Stop condition
    pub fn stop(&mut self) -> Result<(), E> {
        self.clk.set_low()?;
        self.dio.set_low()?;
        self.clk.set_high()?;
        self.dio.set_high()
    }

    /// Close the current transaction and open the next one
    fn turnaround(&mut self) -> Result<(), E> {
        self.stop()?;
        self.start()
    }

    /// Shift out one byte, LSB first, then clock the acknowledgement slot
    ///
    /// The acknowledgement level is not sampled.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), E> {
        for bit in 0..8 {
            self.clk.set_low()?;
            if byte & (1 << bit) != 0 {
                self.dio.set_high()?;
            } else {
                self.dio.set_low()?;
            }
            self.clk.set_high()?;
        }

        // Acknowledgement slot
        self.clk.set_low()?;
        self.dio.set_high()?;
        self.clk.set_high()?;
        self.dio.set_as_input()?;
        self.dio.set_as_output()
    }

    /// Write one screen update starting at register `address`
    ///
    /// Sends the data command, the address command with `patterns`, and the
    /// display control byte as three transactions. Refuses writes that start
    /// or end past the last register without touching the pins.
    pub fn set_segments(
        &mut self,
        patterns: &[SegmentPattern],
        address: u8,
        control: u8,
    ) -> Result<(), SessionError<E>> {
        let len = patterns.len();
        let address_cmd = command::address_set(address)
            .filter(|_| command::fits(address, len))
            .ok_or(SessionError::OutOfRange(OutOfRange { address, len }))?;

        trace!("session @{} {:02x?} ctrl {:02x}", address, patterns, control);
        self.session(address_cmd, patterns, control)
            .map_err(SessionError::Pin)
    }

    fn session(
        &mut self,
        address_cmd: u8,
        patterns: &[SegmentPattern],
        control: u8,
    ) -> Result<(), E> {
        self.start()?;
        self.write_byte(command::DATA_WRITE)?;
        self.turnaround()?;
        self.write_byte(address_cmd)?;
        for pattern in patterns {
            self.write_byte(pattern.bits())?;
        }
        self.turnaround()?;
        self.write_byte(control)?;
        self.stop()
    }

    /// Send only the display control byte
    pub fn set_control(&mut self, brightness: Brightness, on: bool) -> Result<(), E> {
        self.start()?;
        self.write_byte(command::display_control(brightness, on))?;
        self.stop()
    }

    /// Give the pins back
    pub fn release(self) -> (CLK, DIO) {
        (self.clk, self.dio)
    }
}
