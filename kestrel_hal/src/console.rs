//! Console output and key decoding.
//!
//! The console sits directly on the board's console UART. Input goes
//! through [`KeyDecoder`], which folds VT100 escape sequences into logical
//! keypresses; output is raw bytes plus ANSI attribute changes.

use crate::timer::{Clock, poll_until};
use crate::transports::Uart;
use kestrel_common::consts::CONSOLE_POLL_TICKS;
use kestrel_common::hal::error::HalError;
use std::fmt;

const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;
const BACKSPACE: u8 = 0x08;

/// Logical keypress produced by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Plain byte (DEL already folded into backspace).
    Char(u8),
    /// Cursor up (`ESC [ A`).
    Up,
    /// Cursor down (`ESC [ B`).
    Down,
}

impl Key {
    /// Scan code handed to the line editor for cursor keys.
    pub fn scan_code(self) -> u8 {
        match self {
            Key::Char(b) => b,
            Key::Up => 72,
            Key::Down => 80,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecodeState {
    #[default]
    Normal,
    EscSeen,
    CsiSeen,
}

/// Restartable VT100 input decoder.
///
/// Feeding bytes one at a time or in bulk through [`decode`] yields the same
/// key sequence.
#[derive(Debug, Clone, Default)]
pub struct KeyDecoder {
    state: DecodeState,
}

impl KeyDecoder {
    /// Fresh decoder in the `Normal` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one raw byte, returning a key once one is complete.
    pub fn feed(&mut self, byte: u8) -> Option<Key> {
        match (self.state, byte) {
            (DecodeState::Normal, ESC) => {
                self.state = DecodeState::EscSeen;
                None
            }
            (DecodeState::Normal, DEL) => Some(Key::Char(BACKSPACE)),
            (DecodeState::Normal, b) => Some(Key::Char(b)),
            (DecodeState::EscSeen, b'[') => {
                self.state = DecodeState::CsiSeen;
                None
            }
            (DecodeState::EscSeen, _) => {
                self.state = DecodeState::Normal;
                None
            }
            (DecodeState::CsiSeen, b) => {
                self.state = DecodeState::Normal;
                match b {
                    b'A' => Some(Key::Up),
                    b'B' => Some(Key::Down),
                    _ => None,
                }
            }
        }
    }

    /// True when no escape sequence is in progress.
    pub fn is_idle(&self) -> bool {
        self.state == DecodeState::Normal
    }
}

/// Decode a byte slice with `decoder`, appending keys to `out`.
pub fn decode(decoder: &mut KeyDecoder, bytes: &[u8], out: &mut Vec<Key>) {
    out.extend(bytes.iter().filter_map(|&b| decoder.feed(b)));
}

/// Console text attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    /// Diagnostic output.
    Debug,
    /// Echoed user input.
    User,
    /// Start-up banner.
    Init,
    /// Loader messages.
    Loader,
    /// Failures.
    Error,
}

impl Attr {
    /// ANSI sequence selecting this attribute.
    pub fn sequence(self) -> &'static str {
        match self {
            Attr::Debug => "\x1b[0m\x1b[32m",
            Attr::User => "\x1b[0m",
            Attr::Init => "\x1b[0m\x1b[35m",
            Attr::Loader => "\x1b[0m\x1b[1m",
            Attr::Error => "\x1b[0m\x1b[31m",
        }
    }
}

/// Reset attributes, clear the screen and show the cursor.
pub const RESET_SEQUENCE: &str = "\x1b[0m\x1b[2J\x1b[?25h";

/// Loader console.
pub struct Console {
    uart: Box<dyn Uart>,
    clock: Box<dyn Clock>,
    decoder: KeyDecoder,
}

impl Console {
    /// Console over `uart`, polling against `clock`.
    pub fn new(uart: Box<dyn Uart>, clock: Box<dyn Clock>) -> Self {
        Self {
            uart,
            clock,
            decoder: KeyDecoder::new(),
        }
    }

    /// Bring the console UART up.
    pub fn init(&mut self) -> Result<(), HalError> {
        self.decoder = KeyDecoder::new();
        self.uart.init()
    }

    /// Write one byte.
    pub fn putc(&mut self, byte: u8) -> Result<(), HalError> {
        self.uart.write_byte(byte)
    }

    /// Write formatted text; console output failures are dropped.
    pub fn print(&mut self, args: fmt::Arguments<'_>) {
        fmt::Write::write_fmt(self, args).ok();
    }

    /// Switch the text attribute.
    pub fn set_attr(&mut self, attr: Attr) {
        fmt::Write::write_str(self, attr.sequence()).ok();
    }

    /// True if a received byte is pending.
    pub fn keypressed(&self) -> bool {
        !self.uart.rx_empty()
    }

    /// Block until a complete keypress arrives.
    ///
    /// Each wait is a bounded poll, retried until a byte shows up.
    pub fn getc(&mut self) -> Key {
        loop {
            let uart = &self.uart;
            if !poll_until(self.clock.as_ref(), CONSOLE_POLL_TICKS, || !uart.rx_empty()) {
                continue;
            }
            if let Some(key) = self.uart.read_byte().and_then(|b| self.decoder.feed(b)) {
                return key;
            }
        }
    }

    /// Wait up to `ticks` for a keypress, consuming it if one arrives.
    ///
    /// Bytes go through the decoder, so a cursor key is consumed whole. A
    /// sequence the decoder discards still counts as a keypress. If the
    /// window closes mid-sequence the decoder keeps its state for `getc`.
    pub fn wait_keypress(&mut self, ticks: u64) -> bool {
        let start = self.clock.now();
        let mut consumed = false;
        loop {
            let remaining = ticks.saturating_sub(self.clock.now().wrapping_sub(start));
            let uart = &self.uart;
            if !poll_until(self.clock.as_ref(), remaining, || !uart.rx_empty()) {
                return consumed;
            }
            let Some(byte) = self.uart.read_byte() else {
                continue;
            };
            consumed = true;
            if self.decoder.feed(byte).is_some() || self.decoder.is_idle() {
                return true;
            }
        }
    }

    /// Drain the transmitter and release the UART.
    pub fn deinit(&mut self) {
        self.uart.deinit();
    }
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            if b == b'\n' {
                self.uart.write_byte(b'\r').map_err(|_| fmt::Error)?;
            }
            self.uart.write_byte(b).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{LoopbackUart, SimTimer};
    use proptest::prelude::*;

    fn keys(bytes: &[u8]) -> Vec<Key> {
        let mut out = Vec::new();
        decode(&mut KeyDecoder::new(), bytes, &mut out);
        out
    }

    #[test]
    fn up_sequence_yields_one_key() {
        let mut dec = KeyDecoder::new();
        assert_eq!(dec.feed(27), None);
        assert_eq!(dec.feed(91), None);
        assert_eq!(dec.feed(65), Some(Key::Up));
        assert!(dec.is_idle());
    }

    #[test]
    fn del_becomes_backspace() {
        assert_eq!(keys(&[127]), vec![Key::Char(8)]);
    }

    #[test]
    fn unknown_sequences_are_discarded() {
        assert_eq!(keys(b"\x1b[Cx"), vec![Key::Char(b'x')]);
        assert_eq!(keys(b"\x1bOy"), vec![Key::Char(b'y')]);
    }

    #[test]
    fn scan_codes() {
        assert_eq!(Key::Up.scan_code(), 72);
        assert_eq!(Key::Down.scan_code(), 80);
        assert_eq!(Key::Char(b'a').scan_code(), b'a');
    }

    #[test]
    fn split_feeding_matches_bulk() {
        let input = b"ab\x1b[A\x7f\x1b[B\x1bQc\x1b[Zd";
        let bulk = keys(input);

        for split in 0..=input.len() {
            let mut dec = KeyDecoder::new();
            let mut out = Vec::new();
            decode(&mut dec, &input[..split], &mut out);
            decode(&mut dec, &input[split..], &mut out);
            assert_eq!(out, bulk, "split at {split}");
        }

        let mut dec = KeyDecoder::new();
        let single: Vec<Key> = input.iter().filter_map(|&b| dec.feed(b)).collect();
        assert_eq!(single, bulk);
    }

    fn input_bytes() -> impl Strategy<Value = Vec<u8>> {
        let byte = prop::sample::select(vec![ESC, b'[', b'A', b'B', b'O', DEL, b'x', b'\r']);
        prop::collection::vec(byte, 0..48)
    }

    proptest! {
        #[test]
        fn any_split_decodes_like_bulk(input in input_bytes(), split in 0usize..48) {
            let split = split.min(input.len());
            let bulk = keys(&input);

            let mut dec = KeyDecoder::new();
            let mut out = Vec::new();
            decode(&mut dec, &input[..split], &mut out);
            decode(&mut dec, &input[split..], &mut out);
            prop_assert_eq!(&out, &bulk);

            let mut dec = KeyDecoder::new();
            let single: Vec<Key> = input.iter().filter_map(|&b| dec.feed(b)).collect();
            prop_assert_eq!(&single, &bulk);
        }

        #[test]
        fn decoder_never_emits_raw_escape_or_del(input in input_bytes()) {
            for key in keys(&input) {
                prop_assert_ne!(key, Key::Char(ESC));
                prop_assert_ne!(key, Key::Char(DEL));
            }
        }
    }

    #[test]
    fn getc_skips_escape_noise() {
        let uart = LoopbackUart::new();
        uart.push_rx(b"\x1b[Zq");
        let mut console = Console::new(Box::new(uart), Box::new(SimTimer::new(1)));
        assert_eq!(console.getc(), Key::Char(b'q'));
    }

    #[test]
    fn attributes_and_newlines_written() {
        let uart = LoopbackUart::new();
        let mut console = Console::new(Box::new(uart.clone()), Box::new(SimTimer::new(1)));
        console.set_attr(Attr::Error);
        console.print(format_args!("boom\n"));
        assert_eq!(uart.take_tx(), b"\x1b[0m\x1b[31mboom\r\n");
    }

    #[test]
    fn wait_keypress_times_out_then_sees_key() {
        let uart = LoopbackUart::new();
        let mut console = Console::new(Box::new(uart.clone()), Box::new(SimTimer::new(10)));
        assert!(!console.wait_keypress(1000));
        uart.push_rx(b" ");
        assert!(console.wait_keypress(1000));
        assert!(!console.keypressed());
    }

    #[test]
    fn wait_keypress_consumes_whole_cursor_sequence() {
        let uart = LoopbackUart::new();
        uart.push_rx(b"\x1b[Aq");
        let mut console = Console::new(Box::new(uart), Box::new(SimTimer::new(1)));
        assert!(console.wait_keypress(100));
        assert_eq!(console.getc(), Key::Char(b'q'));
    }

    #[test]
    fn wait_keypress_counts_discarded_sequence() {
        let uart = LoopbackUart::new();
        uart.push_rx(b"\x1bOx");
        let mut console = Console::new(Box::new(uart), Box::new(SimTimer::new(1)));
        assert!(console.wait_keypress(100));
        assert_eq!(console.getc(), Key::Char(b'x'));
    }

    #[test]
    fn wait_keypress_keeps_partial_sequence_for_getc() {
        let uart = LoopbackUart::new();
        let mut console = Console::new(Box::new(uart.clone()), Box::new(SimTimer::new(10)));
        uart.push_rx(b"\x1b[");
        assert!(console.wait_keypress(100));
        uart.push_rx(b"B");
        assert_eq!(console.getc(), Key::Down);
    }
}
