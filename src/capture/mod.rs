//! Device communication for the comparison game.
//!
//! This module provides:
//! - The adb command wrapper (`Adb`)
//! - Screenshot capture (`take_screenshot`)
//! - The `Device` trait the polling loop drives

pub mod adb;
pub mod screenshot;

pub use adb::Adb;

use anyhow::Result;
use std::path::Path;

use crate::automation::input::Swipe;

/// Something that can show us its screen and accept touch gestures.
pub trait Device {
    /// Saves the current screen as a PNG at `local`.
    fn capture_screenshot(&self, local: &Path) -> Result<()>;

    fn swipe(&self, swipe: &Swipe) -> Result<()>;
}
