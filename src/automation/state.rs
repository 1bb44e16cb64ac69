//! Loop outcome tracking and the stop request.

use std::fmt;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::automation::compare::Symbol;

/// Global abort flag - set by the stdin watcher.
pub static ABORT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// What one iteration of the loop ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Both numbers were read and the symbol was drawn
    Drawn(Symbol),
    /// The screenshot file was not there after capture
    MissingImage,
    /// OCR did not yield two numbers
    Unrecognized,
    /// Numbers were read but could not be compared
    Incomparable,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Drawn(symbol) => write!(f, "Drew '{}'", symbol),
            Outcome::MissingImage => write!(f, "Missing image"),
            Outcome::Unrecognized => write!(f, "Unrecognized"),
            Outcome::Incomparable => write!(f, "Incomparable"),
        }
    }
}

/// Running totals over the lifetime of the loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    pub iterations: u64,
    pub drawn: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl LoopSummary {
    pub fn record(&mut self, outcome: &anyhow::Result<Outcome>) {
        self.iterations += 1;
        match outcome {
            Ok(Outcome::Drawn(_)) => self.drawn += 1,
            Ok(_) => self.skipped += 1,
            Err(_) => self.errors += 1,
        }
    }
}

impl fmt::Display for LoopSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} iterations: {} drawn, {} skipped, {} errors",
            self.iterations, self.drawn, self.skipped, self.errors
        )
    }
}

/// Requests abort of the running loop.
pub fn request_abort() {
    ABORT_REQUESTED.store(true, Ordering::SeqCst);
}

/// Returns true if a line typed by the user means "stop".
fn is_stop_command(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "q" | "quit" | "esc" | "exit")
}

/// Watches stdin on a background thread and requests abort on a stop command.
pub fn spawn_stdin_watcher() {
    thread::spawn(|| {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) if is_stop_command(&line) => {
                    crate::log("Stop requested, finishing current iteration");
                    request_abort();
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}
