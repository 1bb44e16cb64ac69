//! Configuration types for the comparison bot.
//!
//! Loads settings from config.json at startup. Provides the device bridge
//! settings, crop regions, OCR options, and the strokes used to draw each symbol.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::automation::input::Swipe;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<BotConfig> = OnceLock::new();

/// A rectangle in absolute screenshot pixels: (left, upper, right, lower).
/// `right` and `lower` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: u32,
    pub upper: u32,
    pub right: u32,
    pub lower: u32,
}

impl PixelRect {
    pub const fn new(left: u32, upper: u32, right: u32, lower: u32) -> Self {
        Self {
            left,
            upper,
            right,
            lower,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.lower.saturating_sub(self.upper)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// How the two numbers are laid out on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionMode {
    /// One region containing both numbers
    Single(PixelRect),
    /// One region per number, left operand first
    Dual([PixelRect; 2]),
}

/// The two strokes drawn for each comparison result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolStrokes {
    pub greater: [Swipe; 2],
    pub less: [Swipe; 2],
    pub equal: [Swipe; 2],
}

impl Default for SymbolStrokes {
    fn default() -> Self {
        Self {
            // Upper-right diagonal, then lower-right diagonal
            greater: [
                Swipe::new(400, 800, 600, 1000, 50),
                Swipe::new(600, 1000, 400, 1200, 50),
            ],
            less: [
                Swipe::new(600, 800, 400, 1000, 50),
                Swipe::new(400, 1000, 600, 1200, 50),
            ],
            // Upper bar, then lower bar
            equal: [
                Swipe::new(400, 900, 600, 900, 50),
                Swipe::new(400, 1100, 600, 1100, 50),
            ],
        }
    }
}

/// Complete bot configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Path or name of the adb executable
    pub adb_path: String,
    /// Target device serial; None lets adb pick the only connected device
    pub device_serial: Option<String>,
    /// Where screencap writes on the device before it is pulled
    pub remote_screenshot_path: String,
    /// Sleep at the start of every iteration (milliseconds)
    pub poll_interval_ms: u64,
    /// One region (both numbers) or two regions (one number each)
    pub regions: Vec<PixelRect>,
    /// Run OCR for the two regions on separate threads
    pub parallel_ocr: bool,
    /// Explicit path to the tesseract executable
    pub tesseract_path: Option<String>,
    /// Tesseract page segmentation mode
    pub psm: u8,
    pub strokes: SymbolStrokes,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            adb_path: "adb".to_string(),
            device_serial: None,
            remote_screenshot_path: "/sdcard/screenshot.png".to_string(),
            poll_interval_ms: 300,
            regions: vec![PixelRect::new(250, 570, 870, 750)],
            parallel_ocr: true,
            tesseract_path: None,
            psm: 6,
            strokes: SymbolStrokes::default(),
        }
    }
}

impl BotConfig {
    /// Interprets `regions` as a single or dual region layout.
    pub fn region_mode(&self) -> Result<RegionMode> {
        if let Some(empty) = self.regions.iter().find(|r| r.is_empty()) {
            return Err(anyhow!("Crop region {:?} has zero area", empty));
        }
        match self.regions.as_slice() {
            [single] => Ok(RegionMode::Single(*single)),
            [first, second] => Ok(RegionMode::Dual([*first, *second])),
            other => Err(anyhow!(
                "Expected 1 or 2 crop regions, found {}",
                other.len()
            )),
        }
    }
}

/// Default config location: config.json next to the executable.
fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("config.json")))
        .unwrap_or_else(|| Path::new("config.json").to_path_buf())
}

/// Loads configuration from `path` (or the default location) or returns defaults.
pub fn load_config(path: Option<&Path>) -> BotConfig {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(&config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    BotConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config(path: Option<&Path>) {
    let _ = CONFIG.set(load_config(path));
}

/// Returns a reference to the global configuration.
/// Falls back to the default location if init_config() was never called.
pub fn get_config() -> &'static BotConfig {
    CONFIG.get_or_init(|| load_config(None))
}
