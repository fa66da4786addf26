// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.

use std::path::PathBuf;

use crate::paths;

/// Configuration for the dms-core daemon.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "dms-core", about = "Helper daemon for location and printer services")]
pub struct DaemonConfig {
    /// Path to the Unix-domain socket clients connect to.
    #[arg(long, env = "DMS_CORE_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Coalescing window for pub/sub state updates, in milliseconds.
    #[arg(long, default_value_t = 200, env = "DMS_CORE_COALESCE_MS")]
    pub coalesce_ms: u64,

    /// TCP dial timeout for the printer probe, in seconds.
    #[arg(long, default_value_t = 10, env = "DMS_CORE_PROBE_TIMEOUT_SECS")]
    pub probe_timeout_secs: u64,
}

impl DaemonConfig {
    /// Resolve the socket path, applying the documented defaults.
    pub fn socket_path(&self) -> PathBuf {
        if let Some(ref path) = self.socket {
            return path.clone();
        }
        if let Some(runtime) = paths::runtime_dir() {
            return runtime.join("dms-core.sock");
        }
        paths::state_home().join("dms-core").join("dms-core.sock")
    }

    pub fn coalesce_window(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.coalesce_ms)
    }

    pub fn probe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.probe_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
