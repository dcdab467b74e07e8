use std::sync::{Arc, Mutex};
use std::time::Duration;

use eframe::egui;
use egui_plot::{Legend, Line, LineStyle, Plot, PlotPoints};
use log::{error, warn};

use crate::net::DiagForwarder;
use crate::protocol::{self, Command, SerialLine};
use crate::serial_link::SerialLink;
use crate::storage::SampleLog;
use crate::window::SlidingWindow;

/// Cadence of the serial poll / redraw pass.
const POLL_INTERVAL: Duration = Duration::from_millis(25);
// Plot y-range: the controller's 10-bit sensor range plus margin.
const Y_MIN: f64 = -50.0;
const Y_MAX: f64 = 1075.0;
/// Targets the change button alternates between.
const TOGGLE_LOW: i32 = 200;
const TOGGLE_HIGH: i32 = 800;

/// The acquisition/control UI. Single-threaded: each update pass drains the
/// serial port, then renders the plot and the command entry fields.
pub struct ScopeApp {
    link: SerialLink,
    forwarder: DiagForwarder,
    window: SlidingWindow,
    interval_ms: u32,
    target: i32,
    log: Arc<Mutex<SampleLog>>,
    logging: bool,
    last_sample: Option<i32>,
    target_entry: String,
    kp_entry: String,
    ki_entry: String,
    kd_entry: String,
    acc_entry: String,
    low_target: bool,
}

impl ScopeApp {
    pub fn new(
        link: SerialLink,
        forwarder: DiagForwarder,
        log: Arc<Mutex<SampleLog>>,
        logging: bool,
        buf: usize,
        interval_ms: u32,
        target: i32,
    ) -> Self {
        ScopeApp {
            link,
            forwarder,
            window: SlidingWindow::new(buf),
            interval_ms,
            target,
            log,
            logging,
            last_sample: None,
            target_entry: String::new(),
            kp_entry: String::new(),
            ki_entry: String::new(),
            kd_entry: String::new(),
            acc_entry: String::new(),
            low_target: false,
        }
    }

    /// Drains the serial port once: diagnostic lines are forwarded as-is,
    /// samples go into the display window (and the log, when enabled), and
    /// anything unreadable is reported and dropped.
    fn poll_serial(&mut self) {
        for line in self.link.drain_lines() {
            match protocol::classify(&line) {
                Ok(SerialLine::Diagnostic) => self.forwarder.forward(&line),
                Ok(SerialLine::Sample(value)) => {
                    self.window.push(value as f64);
                    self.last_sample = Some(value);
                    if self.logging {
                        if let Ok(mut log) = self.log.lock() {
                            log.record(value);
                        }
                    }
                }
                Err(e) => warn!(
                    "failed to read data: {} (line: {:?})",
                    e,
                    String::from_utf8_lossy(&line).trim_end()
                ),
            }
        }
    }

    fn send(&mut self, command: &Command) {
        if let Err(e) = self.link.send(command) {
            error!("{:?}", e);
        }
    }

    fn plot(&self, ui: &mut egui::Ui) {
        // A zero interval is log metadata only; plot in sample index then.
        let x_step = self.interval_ms.max(1) as f64;
        let x_max = (self.window.capacity() - 1) as f64 * x_step;

        let samples: Vec<[f64; 2]> = self
            .window
            .iter()
            .enumerate()
            .map(|(i, v)| [i as f64 * x_step, v])
            .collect();
        let target: Vec<[f64; 2]> = (0..self.window.capacity())
            .map(|i| [i as f64 * x_step, self.target as f64])
            .collect();

        Plot::new("sample_plot")
            .legend(Legend::default())
            .include_x(0.0)
            .include_x(x_max)
            .include_y(Y_MIN)
            .include_y(Y_MAX)
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(PlotPoints::from(samples)).name("position"));
                plot_ui.line(
                    Line::new(PlotPoints::from(target))
                        .name("target")
                        .style(LineStyle::dashed_loose()),
                );
            });
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let mut pending: Vec<Command> = Vec::new();

        egui::Grid::new("command_grid").show(ui, |ui| {
            ui.label("target:");
            let response = ui.text_edit_singleline(&mut self.target_entry);
            if submitted(ui, &response) {
                match self.target_entry.trim().parse::<i32>() {
                    Ok(value) => {
                        pending.push(Command::Target(value));
                        self.target = value;
                    }
                    Err(e) => error!("invalid target value {:?}: {}", self.target_entry, e),
                }
            }
            ui.end_row();

            gain_row(ui, "kp:", &mut self.kp_entry, Command::Kp, &mut pending);
            gain_row(ui, "ki:", &mut self.ki_entry, Command::Ki, &mut pending);
            gain_row(ui, "kd:", &mut self.kd_entry, Command::Kd, &mut pending);
            gain_row(ui, "acc:", &mut self.acc_entry, Command::Acc, &mut pending);
        });

        if ui.button("change").clicked() {
            self.low_target = !self.low_target;
            let value = if self.low_target { TOGGLE_LOW } else { TOGGLE_HIGH };
            pending.push(Command::Target(value));
            self.target = value;
            // resubmit the gains from whatever the entries currently hold
            push_gain("kp", &self.kp_entry, Command::Kp, &mut pending);
            push_gain("ki", &self.ki_entry, Command::Ki, &mut pending);
            push_gain("kd", &self.kd_entry, Command::Kd, &mut pending);
            push_gain("acc", &self.acc_entry, Command::Acc, &mut pending);
        }

        let readout = match self.last_sample {
            Some(value) => value.to_string(),
            None => "init".to_string(),
        };
        ui.label(egui::RichText::new(readout).size(15.0));

        for command in &pending {
            self.send(command);
        }
    }
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_serial();

        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::W)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            self.controls(ui);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.plot(ui);
        });

        ctx.request_repaint_after(POLL_INTERVAL);
    }
}

fn submitted(ui: &egui::Ui, response: &egui::Response) -> bool {
    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter))
}

fn gain_row(
    ui: &mut egui::Ui,
    label: &str,
    entry: &mut String,
    make: fn(f64) -> Command,
    pending: &mut Vec<Command>,
) {
    ui.label(label);
    let response = ui.text_edit_singleline(entry);
    if submitted(ui, &response) {
        push_gain(label.trim_end_matches(':'), entry, make, pending);
    }
    ui.end_row();
}

fn push_gain(name: &str, entry: &str, make: fn(f64) -> Command, pending: &mut Vec<Command>) {
    match entry.trim().parse::<f64>() {
        Ok(value) => pending.push(make(value)),
        Err(e) => error!("invalid {} value {:?}: {}", name, entry, e),
    }
}
