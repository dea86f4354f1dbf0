//! CLI command implementations
//!
//! One module per device console: `block` for the EEPROM programmer,
//! `board` for the reader board, `robo` for the robot's passive monitor,
//! `flash` for the build/flash wrapper.

pub mod block;
pub mod board;
pub mod flash;
pub mod robo;

/// List serial ports, marking the auto-detection pick
pub fn list_ports() {
    let ports = bloco_serial::available_ports();
    if ports.is_empty() {
        println!("No serial ports found.");
        return;
    }
    let detected = bloco_serial::detect_port();
    for port in &ports {
        if Some(port) == detected.as_ref() {
            println!("{}  (auto-detected)", port);
        } else {
            println!("{}", port);
        }
    }
}
