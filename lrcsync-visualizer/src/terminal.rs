use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use std::io::{self, Stdout};

/// Owns the terminal while the visualizer draws.
///
/// Entering switches to the alternate screen and hides the cursor; dropping
/// the guard restores both, on every exit path including unwinding.
pub struct TerminalGuard {
    out: Stdout,
}

impl TerminalGuard {
    /// # Errors
    ///
    /// Returns an error if the terminal can not be switched.
    pub fn enter() -> io::Result<Self> {
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(Self { out })
    }

    pub fn writer(&mut self) -> &mut Stdout {
        &mut self.out
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(self.out, Show, LeaveAlternateScreen);
    }
}
