//! TM1637 wire model
//!
//! Replays a recorded event log the way the chip sees it: a falling data edge
//! while the clock is high opens a transaction, a rising data edge while the
//! clock is high closes it, and data is sampled on each rising clock edge.
//! Every ninth rising edge is the acknowledgement slot and completes a byte.

use crate::pin::{PinAction, PinEvent, SimBoard};

/// Number of digit registers in the chip
pub const REGISTER_COUNT: usize = 6;

const CMD_MASK: u8 = 0xC0;
const CMD_CONTROL: u8 = 0x80;
const CMD_ADDRESS: u8 = 0xC0;

/// One address-set transaction: start address plus the bytes written from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub address: u8,
    pub data: Vec<u8>,
}

/// Decoded state of a simulated TM1637
#[derive(Debug, Clone)]
pub struct Tm1637Model {
    clk: u8,
    dio: u8,
    clk_high: bool,
    dio_high: bool,
    in_transaction: bool,
    shift: u8,
    bit_count: u8,
    bytes: Vec<u8>,
    transactions: Vec<Vec<u8>>,
    frames: Vec<Frame>,
    registers: [u8; REGISTER_COUNT],
    control: Option<u8>,
    /// Writes that ran past the last register
    overflow: usize,
}

impl Tm1637Model {
    /// Create a model listening on the given clock and data pins
    pub fn new(clk: u8, dio: u8) -> Self {
        Self {
            clk,
            dio,
            clk_high: false,
            dio_high: false,
            in_transaction: false,
            shift: 0,
            bit_count: 0,
            bytes: Vec::new(),
            transactions: Vec::new(),
            frames: Vec::new(),
            registers: [0; REGISTER_COUNT],
            control: None,
            overflow: 0,
        }
    }

    /// Decode everything a board has recorded so far
    pub fn decode(board: &SimBoard, clk: u8, dio: u8) -> Self {
        let mut model = Self::new(clk, dio);
        model.feed(&board.events());
        model
    }

    /// Feed more events into the model
    pub fn feed(&mut self, events: &[PinEvent]) {
        for event in events {
            let level = match event.action {
                PinAction::High => true,
                PinAction::Low => false,
                // Direction changes do not move the driven level
                PinAction::Input | PinAction::Output => continue,
            };

            if event.pin == self.clk {
                self.on_clock(level);
            } else if event.pin == self.dio {
                self.on_data(level);
            }
        }
    }

    fn on_clock(&mut self, level: bool) {
        let rising = level && !self.clk_high;
        self.clk_high = level;

        if !rising || !self.in_transaction {
            return;
        }

        if self.bit_count < 8 {
            if self.dio_high {
                self.shift |= 1 << self.bit_count;
            }
            self.bit_count += 1;
        } else {
            // Acknowledgement slot
            self.bytes.push(self.shift);
            self.shift = 0;
            self.bit_count = 0;
        }
    }

    fn on_data(&mut self, level: bool) {
        let was_high = self.dio_high;
        self.dio_high = level;

        if !self.clk_high || was_high == level {
            return;
        }

        if !level {
            // Start condition
            self.in_transaction = true;
            self.shift = 0;
            self.bit_count = 0;
            self.bytes.clear();
        } else if self.in_transaction {
            // Stop condition; a partial byte is discarded
            self.in_transaction = false;
            if !self.bytes.is_empty() {
                let bytes = core::mem::take(&mut self.bytes);
                self.apply(&bytes);
                self.transactions.push(bytes);
            }
        }
    }

    fn apply(&mut self, bytes: &[u8]) {
        let Some((&command, data)) = bytes.split_first() else {
            return;
        };

        match command & CMD_MASK {
            CMD_ADDRESS => {
                let address = command & 0x0F;
                for (i, &b) in data.iter().enumerate() {
                    match self.registers.get_mut(address as usize + i) {
                        Some(reg) => *reg = b,
                        None => self.overflow += 1,
                    }
                }
                self.frames.push(Frame {
                    address,
                    data: data.to_vec(),
                });
            }
            CMD_CONTROL => self.control = Some(command),
            // Data commands only select the write mode
            _ => {}
        }
    }

    /// All complete transactions, in order
    pub fn transactions(&self) -> &[Vec<u8>] {
        &self.transactions
    }

    /// All address-set transactions, in order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Current register contents
    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    /// The four visible digit registers
    pub fn digits(&self) -> [u8; 4] {
        [
            self.registers[0],
            self.registers[1],
            self.registers[2],
            self.registers[3],
        ]
    }

    /// Last display-control byte received
    pub fn control(&self) -> Option<u8> {
        self.control
    }

    /// Number of data bytes that ran past the last register
    pub fn overflow(&self) -> usize {
        self.overflow
    }
}
