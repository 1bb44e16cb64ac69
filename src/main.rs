//! Compare Bot
//!
//! Plays a "which number is bigger" game on an Android device over adb:
//! captures the screen, reads the two numbers with Tesseract and draws
//! `>`, `<` or `=` back with swipe gestures.

mod automation;
mod capture;
mod ocr;
mod paths;

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use automation::{BotContext, ABORT_REQUESTED};
use capture::Adb;
use ocr::Tesseract;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths::get_log_file())
    {
        let _ = file.write_all(line.as_bytes());
    }
}

/// Command line options. Anything not given here comes from config.json.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to config.json (defaults to the one next to the executable)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device serial passed to adb -s
    #[arg(short, long)]
    serial: Option<String>,

    /// Stop after this many iterations
    #[arg(short = 'n', long, conflicts_with = "once")]
    iterations: Option<u64>,

    /// Run a single iteration and exit
    #[arg(long)]
    once: bool,

    /// Recognize the two regions one after the other
    #[arg(long)]
    sequential: bool,
}

impl Args {
    fn max_iterations(&self) -> Option<u64> {
        if self.once { Some(1) } else { self.iterations }
    }

    /// Applies command line overrides on top of the loaded config.
    fn apply(&self, config: &mut automation::BotConfig) {
        if let Some(serial) = &self.serial {
            config.device_serial = Some(serial.clone());
        }
        if self.sequential {
            config.parallel_ocr = false;
        }
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths::get_log_file())
        {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    let args = Args::parse();

    // Ensure output directories exist
    paths::ensure_directories()?;

    automation::init_config(args.config.as_deref());
    let mut config = automation::get_config().clone();
    args.apply(&mut config);

    let adb = Adb::from_config(&config);
    if let Err(e) = adb.check_connection() {
        log(&format!("Warning: {}", e));
        log("Screenshots will fail until a device is connected.");
    }

    let tesseract_paths = ocr::ensure_tesseract(config.tesseract_path.as_deref().map(Path::new))?;
    let tesseract = Tesseract::new(tesseract_paths, config.psm);

    let ctx = BotContext::new(&adb, &tesseract, config, paths::get_screenshots_dir())?;
    log(&format!("Region layout: {:?}", ctx.mode));

    automation::spawn_stdin_watcher();
    let summary = ctx.run_loop(args.max_iterations(), &ABORT_REQUESTED);
    log(&format!("Done: {}", summary));

    Ok(())
}
