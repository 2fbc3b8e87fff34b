//! # Power-Saving Suspend Primitive
//!
//! The battery driver hands each chosen sleep duration to a [`PowerControl`]
//! collaborator instead of sleeping inline, so tests can record the
//! scheduler's decisions without waiting them out, and so the suspend depth
//! stays a platform concern.
//!
//! Entering a suspend is a suspension point that halts all processing for
//! the chosen duration; there is no cancellation. In deep mode the suspend
//! is a restart boundary: handshake/connection state does not survive it.

use crate::config::SleepMode;
use std::process;
use std::thread;
use std::time::Duration;

/// Suspend the device for a duration at the configured depth.
pub trait PowerControl {
    fn suspend(&mut self, duration: Duration, mode: SleepMode);
}

/// Host implementation of the suspend primitive.
///
/// Light suspend is a plain timed sleep; the process keeps its state and
/// resumes the loop. Deep suspend sleeps out the duration and then exits,
/// relying on the service supervisor (systemd `Restart=always`) to restart
/// the binary, which redoes the handshake from `Booting`. That mirrors the
/// microcontroller behavior where deep sleep resets all volatile state on
/// wake.
#[derive(Debug, Default)]
pub struct HostPower;

impl PowerControl for HostPower {
    fn suspend(&mut self, duration: Duration, mode: SleepMode) {
        thread::sleep(duration);
        if mode == SleepMode::Deep {
            eprintln!("Deep sleep wake: restarting from Booting");
            process::exit(0);
        }
    }
}
