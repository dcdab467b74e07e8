use std::io::{Read, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serialport::SerialPort;

use crate::protocol::{Command, LineFramer};

// Reads are gated on bytes_to_read, so this only bounds a read that races a
// disconnect.
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Owns the serial connection to the microcontroller: drains inbound lines
/// without blocking the GUI and writes tuning commands back out.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    framer: LineFramer,
}

impl SerialLink {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
            .with_context(|| format!("failed to open serial port {}", path))?;
        info!("Opened serial port {} at {} baud", path, baud_rate);
        Ok(SerialLink {
            port,
            framer: LineFramer::new(),
        })
    }

    /// Drains everything the driver has buffered and returns the complete
    /// lines observed so far. Transport errors end the pass with a warning;
    /// the next tick simply tries again.
    pub fn drain_lines(&mut self) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        let mut chunk = [0u8; 512];
        loop {
            match self.port.bytes_to_read() {
                Ok(0) => break,
                Ok(_) => match self.port.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => lines.extend(self.framer.push_bytes(&chunk[..n])),
                    Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                    Err(e) => {
                        warn!("serial read failed: {}", e);
                        break;
                    }
                },
                Err(e) => {
                    warn!("serial port unavailable: {}", e);
                    break;
                }
            }
        }
        lines
    }

    pub fn send(&mut self, command: &Command) -> Result<()> {
        self.port
            .write_all(&command.encode())
            .with_context(|| format!("failed to send {} command", command.name()))?;
        Ok(())
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        if let Err(e) = self.port.flush() {
            warn!("failed to flush serial port on close: {}", e);
        }
    }
}
