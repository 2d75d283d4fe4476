// Copyright 2026 Bullion Live Contributors
// SPDX-License-Identifier: Apache-2.0

//! Environment readiness check.

use crate::config::{self, CHROMIUM_PATH_ENV};
use crate::renderer::chromium::find_chromium;
use anyhow::Result;

/// Report whether a render session can run on this machine.
pub async fn run() -> Result<()> {
    println!("bullion-live doctor");
    println!("===================");
    println!();

    println!("OS:     {}", std::env::consts::OS);
    println!("Arch:   {}", std::env::consts::ARCH);
    println!("Target: {}", config::TARGET_URL);
    println!();

    let chromium = find_chromium();
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install chromium or set {CHROMIUM_PATH_ENV}."
        ),
    }

    match std::env::var("PORT") {
        Ok(port) => println!("[OK] PORT={port}"),
        Err(_) => println!("[OK] PORT unset, using {}", config::DEFAULT_PORT),
    }

    println!();
    if chromium.is_some() {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}
