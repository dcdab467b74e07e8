use std::net::UdpSocket;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use eframe::egui;
use log::{error, info, warn};

use crate::protocol;
use crate::termapp::TermWindows;

const TERM_HOST: &str = "127.0.0.1";
/// Port the acquisition process forwards diagnostic lines to.
pub const TERM_PORT: u16 = 10000;
/// Receive buffer for one forwarded diagnostic datagram.
pub const RECV_BUF_LEN: usize = 256;
/// The plotter redraws once per this many received datagrams.
const REDRAW_EVERY: usize = 100;

/// Fire-and-forget UDP forwarder for diagnostic lines.
pub struct DiagForwarder {
    socket: UdpSocket,
}

impl DiagForwarder {
    pub fn new() -> Result<Self> {
        let socket =
            UdpSocket::bind((TERM_HOST, 0)).context("failed to bind forwarding socket")?;
        Ok(DiagForwarder { socket })
    }

    /// Sends the raw line bytes to the term plotter. Delivery failures are
    /// ignored; the plotter may simply not be running.
    pub fn forward(&self, line: &[u8]) {
        let _ = self.socket.send_to(line, (TERM_HOST, TERM_PORT));
    }
}

/// Binds the plotter's listening socket.
pub fn bind_term_socket() -> Result<UdpSocket> {
    UdpSocket::bind((TERM_HOST, TERM_PORT))
        .with_context(|| format!("failed to bind udp port {}", TERM_PORT))
}

/// Blocking receive loop, run on a dedicated thread. Every decoded record
/// is pushed into the shared term windows; a repaint is requested once per
/// `REDRAW_EVERY` datagrams. Malformed datagrams are logged and skipped.
pub fn receive_terms(socket: UdpSocket, windows: Arc<Mutex<TermWindows>>, ctx: egui::Context) {
    info!("Listening for diagnostic lines on {}:{}", TERM_HOST, TERM_PORT);
    let mut buf = [0u8; RECV_BUF_LEN];
    let mut received = 0usize;
    loop {
        let len = match socket.recv_from(&mut buf) {
            Ok((len, _)) => len,
            Err(e) => {
                error!("udp receive failed: {}", e);
                continue;
            }
        };

        match protocol::decode_terms(&buf[..len]) {
            Ok(terms) => {
                if let Ok(mut windows) = windows.lock() {
                    windows.push(&terms);
                }
            }
            Err(e) => warn!("discarding malformed diagnostic line: {}", e),
        }

        received += 1;
        if received % REDRAW_EVERY == 0 {
            ctx.request_repaint();
        }
    }
}
