use std::path::PathBuf;

use chrono::{DateTime, Local};
use clap::Parser;

fn default_port() -> String {
    if cfg!(windows) {
        "COM4".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}

/// Command line options for the acquisition/control UI.
#[derive(Parser, Debug)]
#[command(
    name = "pid_scope",
    about = "Plots serial data from a microcontroller and sends tuning commands \
             back to it, for controllers that implement the matching input parsing"
)]
pub struct Cli {
    /// Number of buffered (displayed) values.
    #[arg(short, long, default_value_t = 100)]
    pub buf: usize,

    /// Interval at which data is sent from the microcontroller, in ms. Only
    /// used to scale the plot's x-axis and stored in the log file header.
    #[arg(short, long, default_value_t = 1)]
    pub interval: u32,

    /// Serial port to use for communication with the microcontroller.
    #[arg(short, long, default_value_t = default_port())]
    pub port: String,

    /// Baud rate for the serial connection.
    #[arg(short = 'r', long, default_value_t = 115_200)]
    pub baud_rate: u32,

    /// Save all measured values to a file at shutdown. An optional value
    /// names the file; without one a timestamped name is used. NOTE: this
    /// may take up a lot of memory when the program runs for a long time.
    #[arg(short, long, value_name = "FILE", num_args = 0..=1)]
    pub save: Option<Option<String>>,

    /// Initial target value.
    #[arg(short, long, default_value_t = 512)]
    pub target: i32,
}

impl Cli {
    pub fn save_mode(&self) -> SaveMode {
        match &self.save {
            None => SaveMode::Disabled,
            Some(None) => SaveMode::Timestamped,
            Some(Some(name)) => SaveMode::Named(PathBuf::from(name)),
        }
    }
}

/// Where the sample log goes at shutdown. The save flag has three states:
/// absent, bare, and with a filename.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveMode {
    Disabled,
    Timestamped,
    Named(PathBuf),
}

impl SaveMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, SaveMode::Disabled)
    }

    /// The file the log should be written to, if saving is enabled.
    pub fn resolve(&self, now: DateTime<Local>) -> Option<PathBuf> {
        match self {
            SaveMode::Disabled => None,
            SaveMode::Timestamped => Some(PathBuf::from(format!(
                "pid_data__{}",
                now.format("%Y-%m-%d__%H-%M-%S")
            ))),
            SaveMode::Named(path) => Some(path.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn defaults_match_the_documented_values() {
        let cli = Cli::try_parse_from(["pid_scope"]).unwrap();
        assert_eq!(cli.buf, 100);
        assert_eq!(cli.interval, 1);
        assert_eq!(cli.baud_rate, 115_200);
        assert_eq!(cli.target, 512);
        assert_eq!(cli.save_mode(), SaveMode::Disabled);
    }

    #[test]
    fn bare_save_flag_means_timestamped() {
        let cli = Cli::try_parse_from(["pid_scope", "--save"]).unwrap();
        assert_eq!(cli.save_mode(), SaveMode::Timestamped);
        assert!(cli.save_mode().is_enabled());
    }

    #[test]
    fn save_flag_with_value_names_the_file() {
        let cli = Cli::try_parse_from(["pid_scope", "--save", "run1.txt"]).unwrap();
        assert_eq!(cli.save_mode(), SaveMode::Named(PathBuf::from("run1.txt")));
    }

    #[test]
    fn timestamped_mode_resolves_to_the_default_name() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 13, 2, 3).unwrap();
        let path = SaveMode::Timestamped.resolve(now).unwrap();
        assert_eq!(path, PathBuf::from("pid_data__2024-05-01__13-02-03"));
    }

    #[test]
    fn disabled_mode_resolves_to_nothing() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 13, 2, 3).unwrap();
        assert_eq!(SaveMode::Disabled.resolve(now), None);
    }
}
