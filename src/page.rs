//! Host surface the page handlers drive.
//!
//! SYSTEM CONTEXT
//! ==============
//! A browser page offers three effects to the handlers: a blocking alert, a
//! navigation to another page, and a display region whose contents are
//! overwritten wholesale. `Page` captures exactly those so the handlers run
//! unchanged in a terminal host or a test recorder.

#[cfg(test)]
#[path = "page_test.rs"]
mod page_test;

use std::io::Write;
use std::sync::Mutex;

/// Navigation targets. The filenames are fixed; other pages link to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Login,
    Dashboard,
}

impl Location {
    #[must_use]
    pub fn href(self) -> &'static str {
        match self {
            Self::Login => "login.html",
            Self::Dashboard => "dashboard.html",
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.href())
    }
}

pub trait Page: Send + Sync {
    /// Show a message the user must acknowledge.
    fn alert(&self, message: &str);

    /// Leave the current page for `target`.
    fn navigate(&self, target: Location);

    /// Replace the display region's contents. Last write wins.
    fn render(&self, content: &str);
}

// =============================================================================
// TERMINAL
// =============================================================================

/// `Page` over a text sink, used by the CLI host.
pub struct TerminalPage<W: Write + Send> {
    out: Mutex<W>,
    location: Mutex<Option<Location>>,
}

impl TerminalPage<std::io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalPage<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out), location: Mutex::new(None) }
    }

    /// Where the last navigation pointed, if any happened.
    pub fn location(&self) -> Option<Location> {
        self.location.lock().ok().and_then(|loc| *loc)
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
    }
}

impl<W: Write + Send> Page for TerminalPage<W> {
    fn alert(&self, message: &str) {
        self.write_line(&format!("[alert] {message}"));
    }

    fn navigate(&self, target: Location) {
        if let Ok(mut loc) = self.location.lock() {
            *loc = Some(target);
        }
        self.write_line(&format!("-> {target}"));
    }

    fn render(&self, content: &str) {
        self.write_line(content);
    }
}
