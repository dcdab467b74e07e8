use anyhow::{anyhow, Context, Result};
use memchr::memchr;

/// Prefix marking a diagnostic line on the serial wire. Everything else is
/// expected to be a bare integer sample.
pub const DIAG_PREFIX: &[u8] = b"output:";

/// Accumulates raw serial bytes and yields complete newline-terminated
/// lines. The serial driver hands us arbitrary chunks, so a partial line is
/// buffered until its terminator arrives.
#[derive(Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        LineFramer::default()
    }

    /// Appends `bytes` to the pending buffer and returns every complete
    /// line observed so far. Lines keep their trailing newline so that
    /// diagnostic lines can be forwarded verbatim.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = memchr(b'\n', &self.pending) {
            lines.push(self.pending.drain(..=pos).collect());
        }
        lines
    }
}

/// Classification of one inbound serial line.
#[derive(Debug, Clone, PartialEq)]
pub enum SerialLine {
    /// A PID term decomposition line, forwarded as-is to the term plotter.
    Diagnostic,
    /// A plain sensor reading.
    Sample(i32),
}

/// Classifies a raw line as diagnostic or sample. A failed classification
/// is non-fatal: the caller logs it, drops the line and keeps draining.
pub fn classify(raw: &[u8]) -> Result<SerialLine> {
    if raw.starts_with(DIAG_PREFIX) {
        return Ok(SerialLine::Diagnostic);
    }
    let text = std::str::from_utf8(raw).context("line is not valid ASCII")?;
    let value = text
        .trim()
        .parse::<i32>()
        .with_context(|| format!("not a sample value: {:?}", text.trim()))?;
    Ok(SerialLine::Sample(value))
}

/// A tuning command sent back to the microcontroller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Target(i32),
    Kp(f64),
    Ki(f64),
    Kd(f64),
    Acc(f64),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Target(_) => "target",
            Command::Kp(_) => "kp",
            Command::Ki(_) => "ki",
            Command::Kd(_) => "kd",
            Command::Acc(_) => "acc",
        }
    }

    /// Encodes the command as its wire text `"<name> <value>\n"`.
    pub fn encode(&self) -> Vec<u8> {
        let text = match self {
            Command::Target(value) => format!("target {}\n", value),
            Command::Kp(value) => format!("kp {}\n", value),
            Command::Ki(value) => format!("ki {}\n", value),
            Command::Kd(value) => format!("kd {}\n", value),
            Command::Acc(value) => format!("acc {}\n", value),
        };
        text.into_bytes()
    }
}

/// One decoded PID term decomposition record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermSample {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

/// Decodes a forwarded diagnostic line of the form
/// `output:\t<ignored>\tproportion=<f>\tintegral=<f>\tderivative=<f>`.
///
/// Malformed or truncated input yields an error; the receive loop logs and
/// skips it rather than terminating.
pub fn decode_terms(raw: &[u8]) -> Result<TermSample> {
    let text = std::str::from_utf8(raw).context("diagnostic line is not valid ASCII")?;
    let text = text.trim_end_matches(['\r', '\n']);
    let rest = text
        .strip_prefix("output:")
        .ok_or_else(|| anyhow!("missing diagnostic prefix in {:?}", text))?;

    let mut proportional = None;
    let mut integral = None;
    let mut derivative = None;
    for field in rest.split('\t') {
        if let Some(value) = field.strip_prefix("proportion=") {
            proportional = Some(parse_term("proportion", value)?);
        } else if let Some(value) = field.strip_prefix("integral=") {
            integral = Some(parse_term("integral", value)?);
        } else if let Some(value) = field.strip_prefix("derivative=") {
            derivative = Some(parse_term("derivative", value)?);
        }
    }

    match (proportional, integral, derivative) {
        (Some(proportional), Some(integral), Some(derivative)) => Ok(TermSample {
            proportional,
            integral,
            derivative,
        }),
        _ => Err(anyhow!("missing term fields in {:?}", text)),
    }
}

fn parse_term(label: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bad {} value {:?}", label, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framer_yields_complete_lines() {
        let mut framer = LineFramer::new();
        let lines = framer.push_bytes(b"512\n513\n");
        assert_eq!(lines, vec![b"512\n".to_vec(), b"513\n".to_vec()]);
    }

    #[test]
    fn framer_buffers_partial_lines_across_reads() {
        let mut framer = LineFramer::new();
        assert!(framer.push_bytes(b"51").is_empty());
        assert!(framer.push_bytes(b"2").is_empty());
        let lines = framer.push_bytes(b"\n60");
        assert_eq!(lines, vec![b"512\n".to_vec()]);
        let lines = framer.push_bytes(b"0\n");
        assert_eq!(lines, vec![b"600\n".to_vec()]);
    }

    #[test]
    fn classifies_diagnostic_by_prefix() {
        let line = b"output:\tfoo\tproportion=1.0\tintegral=2.0\tderivative=3.0\n";
        assert_eq!(classify(line).unwrap(), SerialLine::Diagnostic);
    }

    #[test]
    fn classifies_bare_integer_as_sample() {
        assert_eq!(classify(b"512\n").unwrap(), SerialLine::Sample(512));
        assert_eq!(classify(b"  -17 \r\n").unwrap(), SerialLine::Sample(-17));
    }

    #[test]
    fn malformed_sample_is_an_error_and_next_line_still_parses() {
        assert!(classify(b"abc\n").is_err());
        assert_eq!(classify(b"512\n").unwrap(), SerialLine::Sample(512));
    }

    #[test]
    fn non_ascii_line_is_an_error() {
        assert!(classify(&[0xff, 0xfe, b'\n']).is_err());
    }

    #[test]
    fn encodes_commands_as_wire_text() {
        assert_eq!(Command::Kp(1.5).encode(), b"kp 1.5\n".to_vec());
        assert_eq!(Command::Target(512).encode(), b"target 512\n".to_vec());
        assert_eq!(Command::Acc(0.25).encode(), b"acc 0.25\n".to_vec());
        assert_eq!(Command::Kd(-2.0).encode(), b"kd -2\n".to_vec());
    }

    #[test]
    fn decodes_term_line() {
        let rec =
            decode_terms(b"output:\tx\tproportion=1.5\tintegral=-2.0\tderivative=0.25").unwrap();
        assert_eq!(rec.proportional, 1.5);
        assert_eq!(rec.integral, -2.0);
        assert_eq!(rec.derivative, 0.25);
    }

    #[test]
    fn decodes_term_line_with_trailing_newline() {
        let rec =
            decode_terms(b"output:\tfoo\tproportion=1.0\tintegral=2.0\tderivative=3.0\n").unwrap();
        assert_eq!(rec.proportional, 1.0);
        assert_eq!(rec.integral, 2.0);
        assert_eq!(rec.derivative, 3.0);
    }

    #[test]
    fn truncated_term_line_is_an_error() {
        assert!(decode_terms(b"output:\tx\tproportion=1.5\tintegral=-2.0").is_err());
        assert!(decode_terms(b"output:").is_err());
        assert!(decode_terms(b"512\n").is_err());
    }

    #[test]
    fn bad_term_value_is_an_error() {
        let line = b"output:\tx\tproportion=oops\tintegral=2.0\tderivative=3.0";
        assert!(decode_terms(line).is_err());
    }
}
