// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Smart Eye - Ophthalmology Assistant
//!
//! A desktop application for viewing and annotating eye images, browsing
//! DICOM and NIfTI volumes, keeping patient documents in folders and
//! writing PDF reports.

mod app;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::SmartEyeApp;

fn main() -> Result<()> {
    // Initialize logging; RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = io::serialization::load_settings(&io::serialization::settings_path());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1200.0, 800.0])
            .with_title("Smart Eye"),
        ..Default::default()
    };

    eframe::run_native(
        "Smart Eye",
        options,
        Box::new(move |_cc| Ok(Box::new(SmartEyeApp::new(settings)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
