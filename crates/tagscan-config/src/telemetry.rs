// SPDX-License-Identifier: GPL-3.0-or-later

//! Tracing subscriber setup for binaries and tests that embed the reader.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::TelemetryConfig;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins over `telemetry.log_level`. Returns `false` when a
/// subscriber was already installed, which lets test suites call this freely.
pub fn init_tracing(telemetry: &TelemetryConfig) -> bool {
    let fmt_layer = fmt::layer().with_target(true).with_level(true);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
