//! portal-probe: host probes for the captive-portal login client.
//!
//! - **os**: OpenWrt detection by walking release files with `portal-walk`
//! - **command**: run external tools with capped output
//! - **config**: probe settings loaded from `probe.toml`

pub mod command;
pub mod config;
pub mod os;

#[cfg(test)]
mod testutil;

pub use command::{CommandOutput, MAX_CMD_OUTPUT_SIZE, run_command};
pub use config::ProbeConfig;
pub use os::{ReleaseProbe, detect_openwrt, is_openwrt, probe_host, root_dir_fs};
