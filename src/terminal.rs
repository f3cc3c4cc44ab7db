use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// A terminal mode that must be undone before the process exits.
pub trait TerminalMode: Send + Sync {
    /// Return the terminal to cooked mode. Calling this more than once is a
    /// no-op.
    fn restore(&self) -> io::Result<()>;
}

/// Puts the terminal in raw mode for as long as it lives.
#[derive(Debug)]
pub struct RawModeGuard {
    active: AtomicBool,
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        tracing::debug!("raw mode enabled");
        Ok(Self {
            active: AtomicBool::new(true),
        })
    }
}

impl TerminalMode for RawModeGuard {
    fn restore(&self) -> io::Result<()> {
        if self.active.swap(false, Ordering::SeqCst) {
            disable_raw_mode()?;
            tracing::debug!("raw mode disabled");
        }
        Ok(())
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// No terminal to restore, for headless sessions and tests.
#[derive(Debug, Default)]
pub struct Headless {
    restored: AtomicBool,
}

impl Headless {
    pub fn was_restored(&self) -> bool {
        self.restored.load(Ordering::SeqCst)
    }
}

impl TerminalMode for Headless {
    fn restore(&self) -> io::Result<()> {
        self.restored.store(true, Ordering::SeqCst);
        Ok(())
    }
}
