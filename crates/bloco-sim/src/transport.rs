//! In-memory transport wrapping a simulated firmware
//!
//! Byte-faithful enough for the session's discipline to be exercised for
//! real: commands arrive as newline-terminated writes, responses queue up as
//! lines, noise can be interleaved, and a "silent" device swallows commands
//! without answering.

use crate::firmware::Firmware;
use bloco_serial::{transport::Transport, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One observable transport event, for assertions about exchange ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// A complete command line reached the device
    Command(String),
    /// The host consumed one queued line
    LineRead,
}

/// Shared view of a [`SimTransport`]'s event history
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<SimEvent>>>);

impl EventLog {
    fn push(&self, event: SimEvent) {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).push(event);
    }

    /// Snapshot of all events so far
    pub fn snapshot(&self) -> Vec<SimEvent> {
        self.0.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

/// A [`Transport`] backed by a simulated firmware
pub struct SimTransport {
    firmware: Box<dyn Firmware>,
    rx: VecDeque<String>,
    partial: Vec<u8>,
    /// Log lines injected ahead of every response batch
    noise: Vec<String>,
    /// Lines appended after every response batch (bytes the host should
    /// leave unread once it sees a terminal response)
    trailing: Vec<String>,
    silent: bool,
    latency: Duration,
    events: EventLog,
}

impl SimTransport {
    /// Wrap a firmware in a transport
    pub fn new(firmware: impl Firmware + 'static) -> Self {
        Self {
            firmware: Box::new(firmware),
            rx: VecDeque::new(),
            partial: Vec::new(),
            noise: Vec::new(),
            trailing: Vec::new(),
            silent: false,
            latency: Duration::ZERO,
            events: EventLog::default(),
        }
    }

    /// Interleave boot/log noise lines before each response batch
    pub fn with_noise(mut self, lines: &[&str]) -> Self {
        self.noise = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Append extra lines after each response batch
    pub fn with_trailing(mut self, lines: &[&str]) -> Self {
        self.trailing = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Device that never answers anything
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Add per-command processing time, for concurrency tests
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Handle to the event history; clone before boxing the transport
    pub fn events(&self) -> EventLog {
        self.events.clone()
    }

    fn dispatch(&mut self, line: String) {
        self.events.push(SimEvent::Command(line.clone()));
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if self.silent {
            log::trace!("sim: swallowing {}", line);
            return;
        }
        for noise in &self.noise {
            self.rx.push_back(noise.clone());
        }
        for response in self.firmware.handle_line(&line) {
            log::trace!("sim: {} -> {}", line, response);
            self.rx.push_back(response);
        }
        for extra in &self.trailing {
            self.rx.push_back(extra.clone());
        }
    }
}

impl Transport for SimTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.partial.extend_from_slice(data);
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line)
                .trim_end_matches(['\n', '\r'])
                .to_string();
            if !text.is_empty() {
                self.dispatch(text);
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        // An empty queue is the sim's version of the per-line timeout,
        // without the wall-clock wait.
        match self.rx.pop_front() {
            Some(line) => {
                self.events.push(SimEvent::LineRead);
                Ok(Some(line))
            }
            None => Ok(None),
        }
    }

    fn clear_input(&mut self) -> Result<()> {
        self.rx.clear();
        Ok(())
    }
}
