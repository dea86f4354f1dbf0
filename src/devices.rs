//! Port-spec dispatch: real serial ports and simulated devices
//!
//! A port spec is either a device path (`/dev/ttyACM0`) or one of the
//! simulator names, so every command can run without hardware.

use crate::cli::PortArgs;
use bloco_serial::{Session, Transport};
use bloco_sim::{BlockSim, BoardSim, SimTransport};

/// Simulated block programmer port spec
pub const SIM_BLOCK: &str = "sim:block";

/// Simulated reader board port spec
pub const SIM_BOARD: &str = "sim:board";

/// Resolve the port spec, auto-detecting when none was given
pub fn resolve_port(args: &PortArgs) -> Result<String, Box<dyn std::error::Error>> {
    match &args.port {
        Some(port) => Ok(port.clone()),
        None => bloco_serial::detect_port()
            .ok_or_else(|| "no serial port found; plug in a device or pass --port".into()),
    }
}

fn sim_transport(spec: &str) -> Option<Box<dyn Transport>> {
    match spec {
        SIM_BLOCK => Some(Box::new(SimTransport::new(BlockSim::new()))),
        SIM_BOARD => {
            // A small demo program so scans have something to show
            let board = BoardSim::with_blocks(&[
                (0, 0x01, "Begin"),
                (1, 0x10, "Go"),
                (2, 0x02, "End"),
            ]);
            Some(Box::new(SimTransport::new(board)))
        }
        _ => None,
    }
}

/// Open a connected session for the given port spec
pub fn open_session(args: &PortArgs) -> Result<(Session, String), Box<dyn std::error::Error>> {
    let spec = resolve_port(args)?;
    let session = Session::new();
    match sim_transport(&spec) {
        Some(transport) => session.attach(transport)?,
        None => session.connect(&spec, args.baud)?,
    }
    log::info!("Connected to {}", spec);
    Ok((session, spec))
}

/// Open a raw transport for passive monitoring (robot console)
pub fn open_monitor(
    args: &PortArgs,
) -> Result<(Box<dyn Transport>, String), Box<dyn std::error::Error>> {
    let spec = resolve_port(args)?;
    if spec.starts_with("sim:") {
        return Err("the robot monitor needs a real serial port".into());
    }
    let transport = bloco_serial::SerialTransport::open(&spec, args.baud)?;
    Ok((Box::new(transport), spec))
}
