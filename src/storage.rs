use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Append-only record of every sample seen, independent of the display
/// window's eviction. Only written out once, at shutdown.
#[derive(Default)]
pub struct SampleLog {
    samples: Vec<i32>,
}

impl SampleLog {
    pub fn new() -> Self {
        SampleLog::default()
    }

    pub fn record(&mut self, value: i32) {
        self.samples.push(value);
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }
}

/// Writes the logged samples to `path`: an `i: <interval>` header line
/// (skipped for a zero interval), then one sample per line.
pub fn write_log(path: &Path, interval_ms: u32, samples: &[i32]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    if interval_ms != 0 {
        writeln!(out, "i: {}", interval_ms)?;
    }
    for value in samples {
        writeln!(out, "{}", value)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pid_scope_{}_{}", std::process::id(), name))
    }

    #[test]
    fn writes_interval_header_then_samples() {
        let mut log = SampleLog::new();
        for value in [10, 20, 30] {
            log.record(value);
        }

        let path = scratch_path("header");
        write_log(&path, 1, log.samples()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, "i: 1\n10\n20\n30\n");
    }

    #[test]
    fn zero_interval_skips_the_header() {
        let path = scratch_path("no_header");
        write_log(&path, 0, &[5]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, "5\n");
    }

    #[test]
    fn empty_log_still_writes_the_header() {
        let path = scratch_path("empty");
        write_log(&path, 25, &[]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, "i: 25\n");
    }
}
