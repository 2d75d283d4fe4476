// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommand implementations for the bullion-live binary.

pub mod doctor;
pub mod fetch;
pub mod serve;

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise this crate logs at `info`, or
/// `debug` with `verbose`.
pub fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "bullion_live=debug"
    } else {
        "bullion_live=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
