// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use dms_core::config::DaemonConfig;

#[tokio::main]
async fn main() {
    // The `ipps` printer probe needs a process-wide rustls crypto provider;
    // install it once up front rather than on first use.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = DaemonConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = dms_core::run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
