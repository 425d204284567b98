use std::io;
use std::panic;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};

/// Set while the browser owns the screen (raw mode + alternate screen).
static SCREEN_TAKEN: AtomicBool = AtomicBool::new(false);
static RESTORE_ON_PANIC: Once = Once::new();

/// Clears the ownership flag, returning whether it was set.
fn release_screen() -> bool {
    SCREEN_TAKEN.swap(false, Ordering::SeqCst)
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, Show)
}

/// A panic inside the event loop would otherwise print its message into the
/// alternate screen and leave the shell in raw mode.
fn install_panic_restore() {
    RESTORE_ON_PANIC.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if release_screen() {
                let _ = restore_terminal();
            }
            previous(info);
        }));
    });
}

/// The browser's hold on the terminal. The external player needs the screen
/// back in cooked mode, see [`TuiSession::handed_off`].
pub(super) struct TuiSession {
    _private: (),
}

impl TuiSession {
    pub(super) fn enter() -> Result<Self> {
        install_panic_restore();
        let session = Self { _private: () };
        session.take_screen()?;
        Ok(session)
    }

    /// Runs `f` with the normal screen restored and takes it back afterwards.
    pub(super) fn handed_off<R>(&mut self, f: impl FnOnce() -> R) -> Result<R> {
        self.give_back()?;
        let out = f();
        self.take_screen()?;
        Ok(out)
    }

    pub(super) fn leave(self) -> Result<()> {
        self.give_back()
    }

    fn take_screen(&self) -> Result<()> {
        if SCREEN_TAKEN.load(Ordering::SeqCst) {
            return Ok(());
        }
        execute!(io::stdout(), EnterAlternateScreen).context("failed to enter alternate screen")?;
        enable_raw_mode().context("failed to enable raw mode")?;
        SCREEN_TAKEN.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn give_back(&self) -> Result<()> {
        if release_screen() {
            restore_terminal().context("failed to restore terminal")?;
        }
        Ok(())
    }
}

impl Drop for TuiSession {
    fn drop(&mut self) {
        if release_screen() {
            let _ = restore_terminal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_is_released_exactly_once() {
        SCREEN_TAKEN.store(true, Ordering::SeqCst);
        assert!(release_screen());
        assert!(!release_screen());
    }
}
