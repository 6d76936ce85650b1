//! Restores the terminal when the demo exits, however it exits.

use anyhow::Result;
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};

/// RAII guard around raw mode and the alternate screen.
///
/// Restores the terminal on drop, on early `?` returns, and (through
/// [`install_panic_hook`]) before a panic message is printed.
pub struct TerminalGuard {
    restored: bool,
}

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self { restored: false })
    }

    /// Leave raw mode and the alternate screen. Safe to call repeatedly.
    pub fn restore() {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        let _ = io::stdout().flush();
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if !self.restored {
            self.restored = true;
            Self::restore();
        }
    }
}

/// Install panic hook that restores terminal before printing panic.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        TerminalGuard::restore();
        original_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restored_guard_skips_cleanup() {
        let guard = TerminalGuard { restored: true };
        drop(guard);
    }

    #[test]
    fn test_restore_is_callable_without_a_terminal() {
        TerminalGuard::restore();
    }
}
