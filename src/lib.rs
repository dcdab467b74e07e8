//! Shared modules for the two pid_scope binaries: the serial
//! acquisition/control UI and the UDP term plotter.

pub mod app;
pub mod config;
pub mod net;
pub mod protocol;
pub mod serial_link;
pub mod storage;
pub mod termapp;
pub mod window;
