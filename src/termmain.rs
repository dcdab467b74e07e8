use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::Result;
use eframe::egui;
use eframe::NativeOptions;
use log::error;

use pid_scope::net;
use pid_scope::termapp::{TermApp, TermWindows, TERM_WINDOW};

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "pid_scope=info,term_plotter=info");
    }
    env_logger::init();

    if let Err(e) = run() {
        error!("Application encountered an error: {:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let socket = net::bind_term_socket()?;
    let windows = Arc::new(Mutex::new(TermWindows::new(TERM_WINDOW)));

    let native_options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(egui::vec2(900.0, 480.0)),
        vsync: true,
        ..Default::default()
    };

    let shared = Arc::clone(&windows);
    if let Err(e) = eframe::run_native(
        "PID Terms",
        native_options,
        Box::new(move |cc| {
            // The receive loop wants the egui context for repaint requests,
            // which only exists once the window does.
            let ctx = cc.egui_ctx.clone();
            let thread_windows = Arc::clone(&shared);
            thread::spawn(move || net::receive_terms(socket, thread_windows, ctx));
            Box::new(TermApp::new(shared))
        }),
    ) {
        error!("A display error occurred: {}", e);
    }

    Ok(())
}
