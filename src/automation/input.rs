//! Touch input simulation for drawing on the device screen.
//!
//! Gestures are sent as `adb shell input swipe x1 y1 x2 y2 duration`.
//! A symbol is drawn as two consecutive straight strokes.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::capture::adb::Adb;

/// A straight drag from (x1, y1) to (x2, y2) in absolute screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swipe {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
    /// Gesture duration in milliseconds
    #[serde(default = "default_swipe_duration")]
    pub duration_ms: u32,
}

fn default_swipe_duration() -> u32 {
    50
}

impl Swipe {
    pub const fn new(x1: u32, y1: u32, x2: u32, y2: u32, duration_ms: u32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            duration_ms,
        }
    }

    /// Arguments passed after `adb shell`.
    pub fn shell_args(&self) -> Vec<String> {
        vec![
            "input".to_string(),
            "swipe".to_string(),
            self.x1.to_string(),
            self.y1.to_string(),
            self.x2.to_string(),
            self.y2.to_string(),
            self.duration_ms.to_string(),
        ]
    }
}

/// Sends a single swipe gesture to the device.
pub fn send_swipe(adb: &Adb, swipe: &Swipe) -> Result<()> {
    crate::log(&format!(
        "Swipe ({}, {}) -> ({}, {}) in {}ms",
        swipe.x1, swipe.y1, swipe.x2, swipe.y2, swipe.duration_ms
    ));
    adb.shell(swipe.shell_args())?;
    Ok(())
}
