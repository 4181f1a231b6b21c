//! Terminal setup and teardown utilities.

use std::io::{stdout, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};

use color_eyre::Result;
use crossterm::{
    cursor,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;

/// A type alias for the terminal type used in this application.
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Set while the alternate screen is up.
static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Switch to the alternate screen in raw mode.
pub fn init() -> Result<Tui> {
    ACTIVE.store(true, Ordering::SeqCst);
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(cursor::Hide)?;
    enable_raw_mode()?;

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    Ok(terminal)
}

/// Restore the terminal to its original state.
///
/// Does nothing unless [`init`] ran, so hooks firing in plain output mode
/// leave stdout alone.
pub fn restore() -> Result<()> {
    if !ACTIVE.swap(false, Ordering::SeqCst) {
        return Ok(());
    }
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(cursor::Show)?;

    Ok(())
}

/// Install panic and error hooks that restore the terminal before printing errors.
pub fn install_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .display_env_section(false)
        .panic_section("gesture-deck crashed. The log file in your cache directory has details.")
        .into_hooks();

    let panic_hook = panic_hook.into_panic_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        panic_hook(panic_info);
    }));

    let eyre_hook = eyre_hook.into_eyre_hook();
    color_eyre::eyre::set_hook(Box::new(move |error| {
        let _ = restore();
        eyre_hook(error)
    }))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_without_init_is_noop() {
        assert!(!ACTIVE.load(Ordering::SeqCst));
        restore().unwrap();
        restore().unwrap();
        assert!(!ACTIVE.load(Ordering::SeqCst));
    }
}
