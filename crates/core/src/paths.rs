// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! XDG base-directory resolution.

use std::path::PathBuf;

fn xdg_dir(env_var: &str, default_segments: &[&str]) -> PathBuf {
    if let Ok(dir) = std::env::var(env_var) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    let home = std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("/"));
    let mut path = home;
    path.extend(default_segments);
    path
}

/// `$XDG_CONFIG_HOME`, defaulting to `~/.config`.
pub fn config_home() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", &[".config"])
}

/// `$XDG_STATE_HOME`, defaulting to `~/.local/state`.
pub fn state_home() -> PathBuf {
    xdg_dir("XDG_STATE_HOME", &[".local", "state"])
}

/// `$XDG_CACHE_HOME`, defaulting to `~/.cache`.
pub fn cache_home() -> PathBuf {
    xdg_dir("XDG_CACHE_HOME", &[".cache"])
}

/// `$XDG_DATA_HOME`, defaulting to `~/.local/share`.
pub fn data_home() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"])
}

/// `$XDG_RUNTIME_DIR`, with no fallback directory (callers decide).
pub fn runtime_dir() -> Option<PathBuf> {
    std::env::var("XDG_RUNTIME_DIR").ok().filter(|d| !d.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
