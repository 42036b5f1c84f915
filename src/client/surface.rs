//! Places a response can be revealed into.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

pub trait DisplaySurface: Send + Sync {
    fn clear(&self);
    fn push(&self, ch: char);
    /// Show or hide the "still typing" cursor.
    fn set_cursor(&self, _active: bool) {}
}

/// Keeps the revealed text in memory.
#[derive(Default)]
pub struct TextSurface {
    text: Mutex<String>,
    cursor: AtomicBool,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.text.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn cursor_active(&self) -> bool {
        self.cursor.load(Ordering::SeqCst)
    }
}

impl DisplaySurface for TextSurface {
    fn clear(&self) {
        self.text
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn push(&self, ch: char) {
        self.text
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ch);
    }

    fn set_cursor(&self, active: bool) {
        self.cursor.store(active, Ordering::SeqCst);
    }
}

/// Writes the response to stdout as it is revealed.
#[derive(Default)]
pub struct TerminalSurface {
    // Something was printed since the last line break
    dirty: AtomicBool,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn end_line(&self) {
        if self.dirty.swap(false, Ordering::SeqCst) {
            println!();
        }
    }
}

impl DisplaySurface for TerminalSurface {
    fn clear(&self) {
        self.end_line();
    }

    fn push(&self, ch: char) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout only loses the animation, the message is
        // still stored
        let _ = write!(stdout, "{}", ch);
        let _ = stdout.flush();
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn set_cursor(&self, active: bool) {
        if !active {
            self.end_line();
        }
    }
}
