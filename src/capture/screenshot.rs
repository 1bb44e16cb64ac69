//! Screenshot capture over adb.

use anyhow::{Context, Result};
use std::path::Path;

use super::adb::Adb;

/// Captures the device screen and saves it as a PNG at `local`.
///
/// This function:
/// 1. Runs `screencap -p` on the device into the remote screenshot path
/// 2. Pulls the file to `local`
/// 3. Deletes the remote file
pub fn take_screenshot(adb: &Adb, local: &Path) -> Result<()> {
    let remote = adb.remote_screenshot();

    adb.shell(["screencap", "-p", remote])
        .context("screencap failed")?;
    adb.pull(remote, local)
        .with_context(|| format!("Failed to pull {}", remote))?;

    // A leftover remote file is overwritten next time
    if let Err(e) = adb.shell(["rm", remote]) {
        crate::log(&format!("Could not delete {} on device: {}", remote, e));
    }

    crate::log(&format!("Screenshot saved to {}", local.display()));
    Ok(())
}
