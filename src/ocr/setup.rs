use anyhow::{anyhow, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

#[cfg(windows)]
const TESSERACT_EXE: &str = "tesseract.exe";
#[cfg(not(windows))]
const TESSERACT_EXE: &str = "tesseract";

const COMMON_EXECUTABLES: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

const COMMON_TESSDATA: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

/// Resolved locations used to invoke Tesseract.
#[derive(Clone, Debug)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// None lets Tesseract use its compiled-in data directory
    pub tessdata: Option<PathBuf>,
}

/// Returns the directory for storing Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("compare-bot")
        .join("tesseract")
}

fn has_eng(dir: &Path) -> bool {
    dir.join("eng.traineddata").exists()
}

/// Returns true if running `exe --version` succeeds.
fn responds_to_version(exe: &Path) -> bool {
    Command::new(exe)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Finds the Tesseract executable: configured path, local dir, PATH, then common install paths.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() || responds_to_version(path) {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow!(
            "Configured tesseract_path does not exist: {}",
            path.display()
        ));
    }

    let local_exe = get_tesseract_dir().join(TESSERACT_EXE);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    let on_path = PathBuf::from("tesseract");
    if responds_to_version(&on_path) {
        return Ok(on_path);
    }

    COMMON_EXECUTABLES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| anyhow!("Tesseract not found. Please install Tesseract-OCR."))
}

/// Finds a tessdata directory containing eng.traineddata.
pub fn find_tessdata_dir() -> Option<PathBuf> {
    let local_tessdata = get_tesseract_dir().join("tessdata");
    if has_eng(&local_tessdata) {
        return Some(local_tessdata);
    }

    // Check TESSDATA_PREFIX environment variable
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if has_eng(&p) {
            return Some(p);
        }
        let p = p.join("tessdata");
        if has_eng(&p) {
            return Some(p);
        }
    }

    COMMON_TESSDATA
        .iter()
        .map(PathBuf::from)
        .find(|p| has_eng(p))
}

/// Asks the executable whether its built-in data directory has English.
fn builtin_has_eng(exe: &Path) -> bool {
    Command::new(exe)
        .arg("--list-langs")
        .output()
        .map(|o| {
            // Older builds print the list to stderr
            let mut listing = String::from_utf8_lossy(&o.stdout).to_string();
            listing.push_str(&String::from_utf8_lossy(&o.stderr));
            listing.lines().any(|l| l.trim() == "eng")
        })
        .unwrap_or(false)
}

/// Ensures Tesseract and English trained data are available.
/// Downloads eng.traineddata into the local data dir if nothing else provides it.
/// Only a missing executable is an error; a failed download leaves Tesseract on its defaults.
pub fn ensure_tesseract(configured: Option<&Path>) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(configured)?;
    log(&format!("Tesseract found at: {}", executable.display()));

    if let Some(tessdata) = find_tessdata_dir() {
        log(&format!("Using tessdata at: {}", tessdata.display()));
        return Ok(TesseractPaths {
            executable,
            tessdata: Some(tessdata),
        });
    }

    if builtin_has_eng(&executable) {
        return Ok(TesseractPaths {
            executable,
            tessdata: None,
        });
    }

    log("eng.traineddata not found, downloading...");
    let tessdata_dir = get_tesseract_dir().join("tessdata");
    Ok(provision_tessdata(executable, &tessdata_dir, download_tessdata))
}

/// Fetches trained data into `tessdata_dir` with `download`.
/// Falls back to the built-in data directory when that fails.
fn provision_tessdata<F>(executable: PathBuf, tessdata_dir: &Path, download: F) -> TesseractPaths
where
    F: FnOnce(&Path) -> Result<()>,
{
    let result = fs::create_dir_all(tessdata_dir)
        .map_err(anyhow::Error::from)
        .and_then(|()| download(tessdata_dir));

    match result {
        Ok(()) => TesseractPaths {
            executable,
            tessdata: Some(tessdata_dir.to_path_buf()),
        },
        Err(e) => {
            log(&format!("Warning: could not download eng.traineddata: {:#}", e));
            log("OCR will rely on Tesseract's built-in data directory.");
            TesseractPaths {
                executable,
                tessdata: None,
            }
        }
    }
}

/// Downloads English trained data
fn download_tessdata(tessdata_dir: &Path) -> Result<()> {
    let eng_url = format!("{}/eng.traineddata", TESSDATA_REPO);
    let eng_path = tessdata_dir.join("eng.traineddata");

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&eng_url)
        .header("User-Agent", "compare-bot")
        .send()?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download eng.traineddata: HTTP {}",
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(&eng_path)?;
    file.write_all(&bytes)?;

    log(&format!(
        "Downloaded eng.traineddata ({} bytes)",
        bytes.len()
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_configured_missing_executable_is_error() {
        let err = find_tesseract_executable(Some(Path::new("/nonexistent/tesseract"))).unwrap_err();
        assert!(err.to_string().contains("tesseract_path"));
    }

    #[test]
    fn test_configured_existing_executable_is_used() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("tesseract");
        fs::write(&exe, "").unwrap();
        assert_eq!(find_tesseract_executable(Some(exe.as_path())).unwrap(), exe);
    }

    #[test]
    fn test_has_eng() {
        let dir = tempdir().unwrap();
        assert!(!has_eng(dir.path()));
        fs::write(dir.path().join("eng.traineddata"), b"").unwrap();
        assert!(has_eng(dir.path()));
    }

    #[test]
    fn test_failed_download_falls_back_to_builtin() {
        let dir = tempdir().unwrap();
        let tessdata = dir.path().join("tessdata");
        let paths = provision_tessdata(PathBuf::from("tesseract"), &tessdata, |_| {
            Err(anyhow!("network unreachable"))
        });
        assert_eq!(paths.executable, PathBuf::from("tesseract"));
        assert!(paths.tessdata.is_none());
    }

    #[test]
    fn test_unwritable_data_dir_falls_back_to_builtin() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("not_a_dir");
        fs::write(&file, "").unwrap();
        let paths = provision_tessdata(PathBuf::from("tesseract"), &file.join("tessdata"), |_| {
            panic!("download must not run without a data dir")
        });
        assert!(paths.tessdata.is_none());
    }

    #[test]
    fn test_successful_download_uses_local_dir() {
        let dir = tempdir().unwrap();
        let tessdata = dir.path().join("tessdata");
        let paths = provision_tessdata(PathBuf::from("tesseract"), &tessdata, |d| {
            fs::write(d.join("eng.traineddata"), b"data")?;
            Ok(())
        });
        assert_eq!(paths.tessdata.as_deref(), Some(tessdata.as_path()));
        assert!(has_eng(&tessdata));
    }
}
