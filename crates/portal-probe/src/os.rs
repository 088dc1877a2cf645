//! Host OS detection by probing release files.

use std::io::Read;
#[cfg(target_os = "linux")]
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use portal_walk::{BoxError, DirFs, FileWalker, Inspection, WalkError, WalkFs, read_bounded};
use tracing::{debug, warn};

use crate::config::ProbeConfig;

/// Files that identify the distribution, relative to the root.
pub const RELEASE_PATTERN: &str = "etc/*release*";

/// Marker that identifies OpenWrt, matched case-insensitively.
pub const OPENWRT_MARKER: &str = "openwrt";

/// Searches release files for a distribution marker.
#[derive(Debug, Clone)]
pub struct ReleaseProbe {
    pattern: String,
    marker: String,
    max_file_size: u64,
}

impl Default for ReleaseProbe {
    fn default() -> Self {
        Self {
            pattern: RELEASE_PATTERN.to_string(),
            marker: OPENWRT_MARKER.to_string(),
            max_file_size: portal_walk::MAX_FILE_SIZE,
        }
    }
}

impl ReleaseProbe {
    /// Create a probe looking for `marker` in files matching `pattern`.
    pub fn new(pattern: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            marker: marker.into(),
            ..Self::default()
        }
    }

    /// Build a probe from the configured pattern, marker and size limit.
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(&config.release_pattern, &config.marker).with_max_file_size(config.max_file_size)
    }

    /// Cap how much of each file is read.
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Report whether any matching file mentions the marker.
    ///
    /// A file larger than the size cap fails the whole probe.
    pub fn detect<F: WalkFs + ?Sized>(&self, fs: &F) -> Result<bool, WalkError> {
        let marker = self.marker.to_lowercase();
        let limit = self.max_file_size;

        FileWalker::from_fn(|r: &mut dyn Read| -> Result<Inspection, BoxError> {
            let data = read_bounded(r, limit)?;
            let content = String::from_utf8_lossy(&data).to_lowercase();
            if content.contains(&marker) {
                Ok(Inspection::stop())
            } else {
                Ok(Inspection::next())
            }
        })
        .walk(fs, &[self.pattern.as_str()])
    }

    /// Run `detect` on the blocking pool, giving up after `timeout`.
    ///
    /// Returns `Ok(None)` on timeout. The walk itself has no cancellation
    /// hook, so it keeps running in the background until it finishes.
    pub async fn detect_with_timeout<F>(self, fs: F, timeout: Duration) -> Result<Option<bool>>
    where
        F: WalkFs + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(move || self.detect(&fs));
        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => {
                let found = joined.context("release probe task failed")??;
                Ok(Some(found))
            }
            Err(_) => {
                warn!(?timeout, "release probe timed out");
                Ok(None)
            }
        }
    }
}

/// Probe the configured root, or the OS root, for OpenWrt.
///
/// An inconclusive probe counts as "no": a walk error is logged and a
/// timeout gives `false`. Only failing to set up the runtime is an error.
pub fn probe_host(config: &ProbeConfig) -> Result<bool> {
    let fs = match &config.root {
        Some(root) => DirFs::new(root),
        None => root_dir_fs(),
    };
    debug!(root = %fs.root().display(), "probing release files");

    probe_blocking(
        ReleaseProbe::from_config(config),
        fs,
        Duration::from_millis(config.timeout_ms),
    )
}

/// Run `probe` against `fs` on a private runtime, waiting at most `timeout`.
fn probe_blocking<F>(probe: ReleaseProbe, fs: F, timeout: Duration) -> Result<bool>
where
    F: WalkFs + Send + 'static,
{
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to create runtime")?;
    let result = rt.block_on(probe.detect_with_timeout(fs, timeout));
    // Dropping the runtime would wait for an abandoned walk to finish
    rt.shutdown_background();

    match result {
        Ok(found) => Ok(found.unwrap_or(false)),
        Err(err) => {
            warn!("release probe failed, assuming not openwrt: {err:#}");
            Ok(false)
        }
    }
}

/// Return a filesystem rooted at the OS root directory.
#[cfg(unix)]
pub fn root_dir_fs() -> DirFs {
    DirFs::new("/")
}

/// Return a filesystem rooted at the volume holding the system directory,
/// usually `C:`.
#[cfg(windows)]
pub fn root_dir_fs() -> DirFs {
    match std::env::var("SystemDrive") {
        Ok(drive) => DirFs::new(format!("{drive}\\")),
        Err(err) => {
            warn!(error = %err, "getting root filesystem; using C:");
            DirFs::new("C:\\")
        }
    }
}

/// Check whether `fs` holds an OpenWrt root.
pub fn detect_openwrt<F: WalkFs + ?Sized>(fs: &F) -> Result<bool, WalkError> {
    ReleaseProbe::default().detect(fs)
}

/// Report whether the host OS is OpenWrt.
///
/// The probe runs once per process. An inconclusive probe counts as "no".
#[cfg(target_os = "linux")]
pub fn is_openwrt() -> bool {
    static IS_OPENWRT: OnceLock<bool> = OnceLock::new();

    *IS_OPENWRT.get_or_init(|| match detect_openwrt(&root_dir_fs()) {
        Ok(found) => found,
        Err(err) => {
            debug!(error = %err, "openwrt probe inconclusive");
            false
        }
    })
}

/// Report whether the host OS is OpenWrt, which it never is off Linux.
#[cfg(not(target_os = "linux"))]
pub fn is_openwrt() -> bool {
    debug!("openwrt probe skipped on this platform");
    false
}
