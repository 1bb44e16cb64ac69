//! Wrapper around the `adb` command line tool.

use anyhow::{anyhow, Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::automation::config::BotConfig;
use crate::automation::input::{send_swipe, Swipe};
use crate::capture::screenshot::take_screenshot;
use crate::capture::Device;

/// A connection to one device through adb.
#[derive(Clone, Debug)]
pub struct Adb {
    program: PathBuf,
    serial: Option<String>,
    remote_screenshot: String,
}

impl Adb {
    pub fn new(
        program: impl Into<PathBuf>,
        serial: Option<String>,
        remote_screenshot: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            serial,
            remote_screenshot: remote_screenshot.into(),
        }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(
            &config.adb_path,
            config.device_serial.clone(),
            &config.remote_screenshot_path,
        )
    }

    /// Path of the temporary screenshot on the device.
    pub fn remote_screenshot(&self) -> &str {
        &self.remote_screenshot
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd
    }

    /// Runs adb with the given arguments and returns its stdout.
    /// A non-zero exit status is an error carrying stderr.
    pub fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let rendered = args
            .iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");

        let output = self
            .command()
            .args(&args)
            .output()
            .with_context(|| format!("Failed to run {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "adb {} failed ({}): {}",
                rendered,
                output.status,
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Runs `adb shell <args>`.
    pub fn shell<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut full: Vec<std::ffi::OsString> = vec!["shell".into()];
        full.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self.run(full)
    }

    /// Copies a file from the device to `local`.
    pub fn pull(&self, remote: &str, local: &Path) -> Result<()> {
        self.run([OsStr::new("pull"), OsStr::new(remote), local.as_os_str()])?;
        Ok(())
    }

    /// Verifies that the device is attached and online.
    pub fn check_connection(&self) -> Result<()> {
        let state = self.run(["get-state"])?;
        match state.trim() {
            "device" => Ok(()),
            other => Err(anyhow!("Device is not ready (state: {})", other)),
        }
    }
}

impl Device for Adb {
    fn capture_screenshot(&self, local: &Path) -> Result<()> {
        take_screenshot(self, local)
    }

    fn swipe(&self, swipe: &Swipe) -> Result<()> {
        send_swipe(self, swipe)
    }
}
