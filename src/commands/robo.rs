//! Robot monitor
//!
//! The robot never accepts commands over serial; it only logs what it
//! receives over the wireless link and what the executor is doing. This
//! module follows that log, printing every line and decoding the program
//! receive/execution events into status output.

use crate::cli::PortArgs;
use crate::devices;
use bloco_core::types;
use bloco_serial::Transport;
use regex::Regex;
use std::sync::OnceLock;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// One decoded robot log event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoboEvent {
    /// "Program start: expecting N blocks"
    ProgramStart {
        /// Announced block count
        expected: usize,
    },
    /// "Received block N: type=0xXX name=..."
    BlockReceived {
        /// Block index within the program
        index: usize,
        /// Block type id
        type_id: u8,
        /// Name label carried with the block
        label: String,
    },
    /// "Program end" - transmission finished, execution begins
    ProgramEnd,
    /// Executor step: "[N] type=0x..."
    ExecStep {
        /// Index of the block now executing
        index: usize,
    },
    /// "Program finished" / "Program END"
    ProgramFinished,
}

struct EventPatterns {
    start: Regex,
    block: Regex,
    step: Regex,
}

fn patterns() -> &'static EventPatterns {
    static PATTERNS: OnceLock<EventPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| EventPatterns {
        start: Regex::new(r"Program start: expecting (\d+) block").expect("static regex"),
        block: Regex::new(r"Received block (\d+): type=0x([0-9A-Fa-f]+)\s+name=(\S*)")
            .expect("static regex"),
        step: Regex::new(r"\[(\d+)\] type=0x").expect("static regex"),
    })
}

/// Decode one robot log line; `None` for ordinary log output
pub fn parse_event(line: &str) -> Option<RoboEvent> {
    let patterns = patterns();

    if let Some(caps) = patterns.start.captures(line) {
        return Some(RoboEvent::ProgramStart {
            expected: caps[1].parse().ok()?,
        });
    }
    if let Some(caps) = patterns.block.captures(line) {
        return Some(RoboEvent::BlockReceived {
            index: caps[1].parse().ok()?,
            type_id: u8::from_str_radix(&caps[2], 16).ok()?,
            label: caps[3].to_string(),
        });
    }
    // Execution-complete markers take precedence over the (case-distinct)
    // end-of-transmission marker.
    if line.contains("Program finished") || line.contains("Program END") {
        return Some(RoboEvent::ProgramFinished);
    }
    if line.contains("Program end") {
        return Some(RoboEvent::ProgramEnd);
    }
    if let Some(caps) = patterns.step.captures(line) {
        return Some(RoboEvent::ExecStep {
            index: caps[1].parse().ok()?,
        });
    }
    None
}

/// Follow the robot's serial log until interrupted
pub fn run_monitor(args: &PortArgs) -> CliResult {
    let (mut transport, port) = devices::open_monitor(args)?;
    println!("Monitoring {port} (Ctrl-C to stop)");

    // Program received so far: (type id, label) per block
    let mut program: Vec<(u8, String)> = Vec::new();

    loop {
        let line = match transport.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => continue,
            Err(e) => return Err(format!("serial read failed: {e}").into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        println!("{line}");

        match parse_event(&line) {
            Some(RoboEvent::ProgramStart { expected }) => {
                program.clear();
                println!(">>> Receiving {expected} block(s)...");
            }
            Some(RoboEvent::BlockReceived { type_id, label, .. }) => {
                program.push((type_id, label));
            }
            Some(RoboEvent::ProgramEnd) => {
                let names: Vec<&str> = program
                    .iter()
                    .map(|(id, _)| types::by_id(*id).map(|t| t.name).unwrap_or("?"))
                    .collect();
                println!(
                    ">>> Program received ({} blocks): {}",
                    program.len(),
                    names.join(" -> ")
                );
            }
            Some(RoboEvent::ExecStep { index }) => {
                let name = program
                    .get(index)
                    .and_then(|(id, _)| types::by_id(*id))
                    .map(|t| t.name)
                    .unwrap_or("?");
                println!(">>> Executing block #{index} ({name})");
            }
            Some(RoboEvent::ProgramFinished) => {
                println!(">>> Execution complete");
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_program_receive_events() {
        assert_eq!(
            parse_event("I (1200) robo: Program start: expecting 3 blocks"),
            Some(RoboEvent::ProgramStart { expected: 3 })
        );
        assert_eq!(
            parse_event("I (1210) robo: Received block 0: type=0x10 name=Go"),
            Some(RoboEvent::BlockReceived {
                index: 0,
                type_id: 0x10,
                label: "Go".to_string(),
            })
        );
        assert_eq!(
            parse_event("I (1220) robo: Program end"),
            Some(RoboEvent::ProgramEnd)
        );
    }

    #[test]
    fn decodes_executor_events() {
        assert_eq!(
            parse_event("I (2000) executor: [2] type=0x12"),
            Some(RoboEvent::ExecStep { index: 2 })
        );
        assert_eq!(
            parse_event("I (2400) executor: Program finished"),
            Some(RoboEvent::ProgramFinished)
        );
        // The all-caps end marker is execution-complete, not transmission end
        assert_eq!(
            parse_event("I (2400) executor: Program END"),
            Some(RoboEvent::ProgramFinished)
        );
    }

    #[test]
    fn ordinary_log_lines_are_not_events() {
        assert_eq!(parse_event("I (300) wifi: ESP-NOW ready"), None);
        assert_eq!(parse_event(""), None);
    }

    #[test]
    fn block_with_empty_name_still_decodes() {
        assert_eq!(
            parse_event("Received block 1: type=0x02 name="),
            Some(RoboEvent::BlockReceived {
                index: 1,
                type_id: 0x02,
                label: String::new(),
            })
        );
    }
}
