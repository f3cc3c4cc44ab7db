//! Raw keystroke reader.
//!
//! [`InputReader`] runs on its own thread, turns single bytes into an
//! editable answer string, and sends a snapshot of that string to the
//! session after every accepted key. It knows nothing about problems; the
//! session tells it to start over with [`Control::Clear`].

use crate::session::{Control, SessionEvent};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const ANSWER_CAPACITY: usize = 10;
pub const QUIT_KEY: u8 = b'q';
pub const BACKSPACE: u8 = 0x7f;
pub const CTRL_H: u8 = 0x08;
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Changed,
    Quit,
}

/// Fixed-capacity digit buffer with a front cursor.
#[derive(Debug, Clone, Default)]
pub struct AnswerBuffer {
    bytes: [u8; ANSWER_CAPACITY],
    cursor: usize,
}

impl AnswerBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, byte: u8) -> KeyOutcome {
        match byte {
            QUIT_KEY => KeyOutcome::Quit,
            BACKSPACE | CTRL_H => {
                if self.cursor == 0 {
                    return KeyOutcome::Ignored;
                }
                self.cursor -= 1;
                KeyOutcome::Changed
            }
            b'0'..=b'9' => {
                if self.cursor >= ANSWER_CAPACITY {
                    return KeyOutcome::Ignored;
                }
                self.bytes[self.cursor] = byte;
                self.cursor += 1;
                KeyOutcome::Changed
            }
            _ => KeyOutcome::Ignored,
        }
    }

    pub fn clear(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn snapshot(&self) -> String {
        self.bytes[..self.cursor].iter().map(|&b| b as char).collect()
    }
}

/// Non-blocking source of raw input bytes.
pub trait ByteSource: Send + 'static {
    /// Returns `Ok(None)` when no byte is ready.
    fn poll_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Production source reading key presses through crossterm.
#[derive(Debug, Default)]
pub struct CrosstermByteSource;

impl ByteSource for CrosstermByteSource {
    fn poll_byte(&mut self) -> io::Result<Option<u8>> {
        if !event::poll(Duration::ZERO)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(key_to_byte(key)),
            _ => Ok(None),
        }
    }
}

/// Maps a key press to the byte a raw terminal would have produced.
/// Ctrl+C quits, since raw mode swallows the interrupt signal.
pub fn key_to_byte(key: KeyEvent) -> Option<u8> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(QUIT_KEY),
        KeyCode::Char(c) if c.is_ascii() => Some(c as u8),
        KeyCode::Backspace | KeyCode::Delete => Some(BACKSPACE),
        _ => None,
    }
}

/// Test source fed through a channel. A dropped sender reads as end of file.
pub struct ChannelByteSource {
    rx: Receiver<u8>,
}

impl ChannelByteSource {
    pub fn new(rx: Receiver<u8>) -> Self {
        Self { rx }
    }
}

impl ByteSource for ChannelByteSource {
    fn poll_byte(&mut self) -> io::Result<Option<u8>> {
        match self.rx.try_recv() {
            Ok(byte) => Ok(Some(byte)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "byte source closed",
            )),
        }
    }
}

enum Step {
    Idle,
    Busy,
    Done,
}

pub struct InputReader<S: ByteSource> {
    source: S,
    buffer: AnswerBuffer,
    epoch: u64,
    events: Sender<SessionEvent>,
    control: Receiver<Control>,
    control_closed: bool,
}

/// Owner's handle on a running reader thread.
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ReaderHandle {
    /// Asks the reader to exit and waits for it.
    pub fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        if self.thread.join().is_err() {
            tracing::error!("input reader panicked");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

impl<S: ByteSource> InputReader<S> {
    pub fn new(source: S, events: Sender<SessionEvent>, control: Receiver<Control>) -> Self {
        Self {
            source,
            buffer: AnswerBuffer::new(),
            epoch: 0,
            events,
            control,
            control_closed: false,
        }
    }

    pub fn spawn(self) -> ReaderHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let thread = thread::spawn(move || self.run(&flag));
        ReaderHandle { stop, thread }
    }

    fn run(mut self, stop: &AtomicBool) {
        tracing::debug!("input reader started");
        while !stop.load(Ordering::SeqCst) {
            match self.step() {
                Step::Idle => thread::sleep(POLL_INTERVAL),
                Step::Busy => {}
                Step::Done => break,
            }
        }
        tracing::debug!("input reader stopped");
    }

    fn step(&mut self) -> Step {
        self.drain_control();

        let byte = match self.source.poll_byte() {
            Ok(Some(byte)) => byte,
            Ok(None) => return Step::Idle,
            Err(e) => {
                tracing::error!(error = %e, "reading input failed");
                let _ = self.events.send(SessionEvent::InputFailed(e.to_string()));
                return Step::Done;
            }
        };

        let event = match self.buffer.feed(byte) {
            KeyOutcome::Ignored => return Step::Busy,
            KeyOutcome::Changed => SessionEvent::Answer {
                epoch: self.epoch,
                text: self.buffer.snapshot(),
            },
            KeyOutcome::Quit => {
                let _ = self.events.send(SessionEvent::Quit);
                return Step::Done;
            }
        };

        match self.events.send(event) {
            Ok(()) => Step::Busy,
            Err(_) => Step::Done,
        }
    }

    fn drain_control(&mut self) {
        loop {
            match self.control.try_recv() {
                Ok(Control::Clear) => {
                    self.buffer.clear();
                    self.epoch += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.control_closed {
                        tracing::warn!("control channel closed; answers will no longer be cleared");
                        self.control_closed = true;
                    }
                    break;
                }
            }
        }
    }
}
