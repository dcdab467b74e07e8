use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use eframe::NativeOptions;
use log::{error, info};

use pid_scope::app::ScopeApp;
use pid_scope::config::Cli;
use pid_scope::net::DiagForwarder;
use pid_scope::serial_link::SerialLink;
use pid_scope::storage::{self, SampleLog};

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "pid_scope=info");
    }
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        error!("Application encountered an error: {:?}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let save_mode = cli.save_mode();

    let link = SerialLink::open(&cli.port, cli.baud_rate)?;
    let forwarder = DiagForwarder::new()?;
    let log = Arc::new(Mutex::new(SampleLog::new()));

    let app = ScopeApp::new(
        link,
        forwarder,
        Arc::clone(&log),
        save_mode.is_enabled(),
        cli.buf,
        cli.interval,
        cli.target,
    );

    let native_options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(egui::vec2(1024.0, 640.0)),
        vsync: true,
        ..Default::default()
    };

    // A failed GUI startup is reported but still falls through to the log
    // write below; the serial port is flushed when the app is dropped.
    if let Err(e) = eframe::run_native(
        "PID Plotter",
        native_options,
        Box::new(|_cc| Box::new(app)),
    ) {
        error!("A display error occurred: {}", e);
    }

    if let Some(path) = save_mode.resolve(chrono::Local::now()) {
        if let Ok(log) = log.lock() {
            storage::write_log(&path, cli.interval, log.samples())
                .with_context(|| format!("failed to save log to {}", path.display()))?;
            info!("Saved to file {:?}.", path);
        }
    }

    Ok(())
}
