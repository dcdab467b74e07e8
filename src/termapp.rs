use std::sync::{Arc, Mutex};

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::protocol::TermSample;
use crate::window::SlidingWindow;

/// Number of values shown per term line.
pub const TERM_WINDOW: usize = 100;

/// Sliding windows for the three decomposed controller terms. Written by
/// the receive thread, read by the GUI.
pub struct TermWindows {
    pub proportional: SlidingWindow,
    pub integral: SlidingWindow,
    pub derivative: SlidingWindow,
}

impl TermWindows {
    pub fn new(capacity: usize) -> Self {
        TermWindows {
            proportional: SlidingWindow::new(capacity),
            integral: SlidingWindow::new(capacity),
            derivative: SlidingWindow::new(capacity),
        }
    }

    pub fn push(&mut self, sample: &TermSample) {
        self.proportional.push(sample.proportional);
        self.integral.push(sample.integral);
        self.derivative.push(sample.derivative);
    }
}

/// GUI for the term plotter process. The receive thread drives repaints,
/// so this only has to draw the current window contents.
pub struct TermApp {
    windows: Arc<Mutex<TermWindows>>,
}

impl TermApp {
    pub fn new(windows: Arc<Mutex<TermWindows>>) -> Self {
        TermApp { windows }
    }
}

impl eframe::App for TermApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label("PID term decomposition");

            if let Ok(windows) = self.windows.lock() {
                let series = [
                    (&windows.proportional, "proportional", egui::Color32::from_rgb(255, 0, 0)),
                    (&windows.integral, "integral", egui::Color32::from_rgb(0, 255, 0)),
                    (&windows.derivative, "derivative", egui::Color32::from_rgb(0, 0, 255)),
                ];

                Plot::new("term_plot")
                    .legend(Legend::default())
                    .show(ui, |plot_ui| {
                        for (window, name, color) in series {
                            let points: Vec<[f64; 2]> = window
                                .iter()
                                .enumerate()
                                .map(|(i, v)| [i as f64, v])
                                .collect();
                            plot_ui.line(
                                Line::new(PlotPoints::from(points)).name(name).color(color),
                            );
                        }
                    });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_updates_all_three_windows() {
        let mut windows = TermWindows::new(3);
        windows.push(&TermSample {
            proportional: 1.5,
            integral: -2.0,
            derivative: 0.25,
        });
        assert_eq!(
            windows.proportional.iter().collect::<Vec<_>>(),
            vec![0.0, 0.0, 1.5]
        );
        assert_eq!(
            windows.integral.iter().collect::<Vec<_>>(),
            vec![0.0, 0.0, -2.0]
        );
        assert_eq!(
            windows.derivative.iter().collect::<Vec<_>>(),
            vec![0.0, 0.0, 0.25]
        );
    }
}
