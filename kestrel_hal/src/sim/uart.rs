use super::{Journal, SimEvent};
use crate::transports::Uart;
use kestrel_common::hal::error::HalError;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

#[derive(Debug, Default)]
struct Line {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    up: bool,
}

/// In-memory UART. Clones share both directions, so a test keeps one clone
/// as the far end of the line.
#[derive(Debug, Clone, Default)]
pub struct LoopbackUart {
    line: Rc<RefCell<Line>>,
    journal: Option<(Journal, &'static str)>,
}

impl LoopbackUart {
    /// Idle line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `init`/`deinit` in `journal` under `name`.
    pub fn with_journal(mut self, journal: Journal, name: &'static str) -> Self {
        self.journal = Some((journal, name));
        self
    }

    /// Queue bytes for the UART to receive.
    pub fn push_rx(&self, bytes: &[u8]) {
        self.line.borrow_mut().rx.extend(bytes);
    }

    /// Take everything transmitted so far.
    pub fn take_tx(&self) -> Vec<u8> {
        std::mem::take(&mut self.line.borrow_mut().tx)
    }

    /// True between `init` and `deinit`.
    pub fn is_up(&self) -> bool {
        self.line.borrow().up
    }
}

impl Uart for LoopbackUart {
    fn init(&mut self) -> Result<(), HalError> {
        self.line.borrow_mut().up = true;
        if let Some((journal, name)) = &self.journal {
            journal.record(SimEvent::TransportInit(name.to_string()));
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.line.borrow_mut().rx.pop_front()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), HalError> {
        self.line.borrow_mut().tx.push(byte);
        Ok(())
    }

    fn rx_empty(&self) -> bool {
        self.line.borrow().rx.is_empty()
    }

    fn deinit(&mut self) {
        self.line.borrow_mut().up = false;
        if let Some((journal, name)) = &self.journal {
            journal.record(SimEvent::TransportDeinit(name.to_string()));
        }
    }
}

/// Console UART on the process's stdin and stdout.
///
/// A reader thread forwards stdin bytes over a channel so polls never
/// block.
#[derive(Debug, Default)]
pub struct StdioUart {
    rx: Option<Receiver<u8>>,
    pending: Cell<Option<u8>>,
}

impl StdioUart {
    /// Not started until `init`.
    pub fn new() -> Self {
        Self::default()
    }

    fn peek(&self) -> Option<u8> {
        if self.pending.get().is_none() {
            if let Some(Ok(b)) = self.rx.as_ref().map(Receiver::try_recv) {
                self.pending.set(Some(b));
            }
        }
        self.pending.get()
    }
}

impl Uart for StdioUart {
    fn init(&mut self) -> Result<(), HalError> {
        if self.rx.is_some() {
            return Ok(());
        }
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("stdin-uart".to_string())
            .spawn(move || {
                let mut byte = [0u8; 1];
                let mut stdin = std::io::stdin().lock();
                while let Ok(1) = stdin.read(&mut byte) {
                    if tx.send(byte[0]).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| HalError::InitFailed(format!("stdin reader: {e}")))?;
        self.rx = Some(rx);
        Ok(())
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.peek();
        self.pending.take()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), HalError> {
        let mut out = std::io::stdout().lock();
        out.write_all(&[byte])
            .and_then(|()| if byte == b'\n' { out.flush() } else { Ok(()) })
            .map_err(|e| HalError::Communication(e.to_string()))
    }

    fn rx_empty(&self) -> bool {
        self.peek().is_none()
    }

    fn deinit(&mut self) {
        std::io::stdout().flush().ok();
    }
}
