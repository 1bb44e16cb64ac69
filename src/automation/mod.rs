//! The comparison-game automation loop.
//!
//! This module provides:
//! - Configuration loading (regions, device, strokes)
//! - Touch input for drawing the answer
//! - Number comparison and symbol selection
//! - Two-region OCR fan-out
//! - The polling loop itself

pub mod compare;
pub mod config;
pub mod input;
pub mod ocr_worker;
pub mod runner;
pub mod state;

pub use config::{get_config, init_config, BotConfig};
pub use runner::BotContext;
pub use state::{spawn_stdin_watcher, ABORT_REQUESTED};
