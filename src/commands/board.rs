//! Reader board console commands

use crate::cli::PortArgs;
use crate::devices;
use bloco_core::{ChannelCache, NUM_CHANNELS};
use bloco_proto::{Command, Response, SendBlockSpec, SendSpec};
use std::sync::Arc;
use std::time::Duration;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Scan all slots once, or keep re-scanning with `--watch`
pub fn run_scan(args: &PortArgs, watch: bool, interval: u64) -> CliResult {
    let (session, port) = devices::open_session(args)?;
    let mut cache = ChannelCache::new();

    if !watch {
        let responses = session
            .exchange_multi(&Command::ScanChannels)
            .ok_or("scan failed: no response from board")?;
        apply_scan(&mut cache, &responses);
        print_slots(&cache);
        session.disconnect();
        return Ok(());
    }

    // Watch mode: each scan runs on a worker; this thread owns the cache
    // and does all the rendering. Interrupt to stop.
    let session = Arc::new(session);
    println!("Watching {port} (Ctrl-C to stop)");
    loop {
        let worker = {
            let session = Arc::clone(&session);
            bloco_serial::spawn(move || session.exchange_multi(&Command::ScanChannels))
        };
        match worker.take().flatten() {
            Some(responses) => {
                apply_scan(&mut cache, &responses);
                print_slots(&cache);
            }
            None => println!("Scan failed: no response from board"),
        }
        std::thread::sleep(Duration::from_secs(interval));
    }
}

/// Broadcast the inserted program to the robot
pub fn run_send(args: &PortArgs) -> CliResult {
    let (session, _) = devices::open_session(args)?;
    let responses = session
        .exchange_multi(&Command::SendToRobot)
        .ok_or("send failed: no response from board")?;
    if responses.iter().any(|r| matches!(r, Response::SendOk(_))) {
        println!("Program sent to robot!");
    } else {
        println!("Send completed (no confirmation)");
    }
    session.disconnect();
    Ok(())
}

/// Broadcast an explicit program, from a file or a list of type names
pub fn run_send_blocks(
    args: &PortArgs,
    file: Option<&std::path::Path>,
    names: &[String],
) -> CliResult {
    let blocks = match file {
        Some(path) => {
            let reader = std::fs::File::open(path)?;
            serde_json::from_reader::<_, Vec<SendBlockSpec>>(reader)?
        }
        None => names
            .iter()
            .map(|name| {
                bloco_core::types::resolve(name).map(|t| SendBlockSpec {
                    type_id: t.id,
                    name: t.default_label(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
    };
    // Same bound the firmware enforces for one wireless program
    if blocks.is_empty() || blocks.len() > NUM_CHANNELS {
        return Err(format!(
            "program must hold 1-{} blocks, got {}",
            NUM_CHANNELS,
            blocks.len()
        )
        .into());
    }

    let (session, _) = devices::open_session(args)?;
    let responses = session
        .exchange_multi(&Command::SendBlocks(SendSpec { blocks }))
        .ok_or("send failed: no response from board")?;
    for response in &responses {
        match response {
            Response::SendOk(ok) => {
                println!(
                    "Program sent to robot ({} block(s))",
                    ok.blocks_sent.map_or("?".to_string(), |n| n.to_string())
                );
                session.disconnect();
                return Ok(());
            }
            Response::Error(e) => return Err(format!("send failed: {}", e.text()).into()),
            other => log::debug!("Ignoring {} while waiting for SEND_OK", other.kind()),
        }
    }
    Err("send completed without confirmation".into())
}

/// Query the board's status summary
pub fn run_status(args: &PortArgs) -> CliResult {
    let (session, _) = devices::open_session(args)?;
    let responses = session
        .exchange_multi(&Command::GetStatus)
        .ok_or("status failed: no response from board")?;
    let status = responses
        .iter()
        .find_map(|r| match r {
            Response::Status(s) => Some(*s),
            _ => None,
        })
        .ok_or("status failed: board answered without a STATUS object")?;

    println!("Channels:       {}", status.num_channels);
    println!("Blocks present: {}", status.blocks_present);
    println!("I2C bus:        {}", if status.i2c_ok { "ok" } else { "FAULT" });
    session.disconnect();
    Ok(())
}

/// Fold a scan's BLOCK_DATA responses into the cache: present slots update,
/// empty and unreadable slots clear.
fn apply_scan(cache: &mut ChannelCache, responses: &[Response]) {
    for response in responses {
        if let Response::BlockData(data) = response {
            let result = match data.descriptor() {
                Some(descriptor) => cache.update(data.channel, descriptor),
                None => cache.clear(data.channel),
            };
            if let Err(e) = result {
                log::warn!("Ignoring scan result for channel {}: {}", data.channel, e);
            }
            if let Some(error) = &data.error {
                log::warn!("Channel {} read failed on the board: {}", data.channel, error);
            }
        }
    }
}

fn print_slots(cache: &ChannelCache) {
    println!(
        "{:<6} {:<22} {:<14} {:<16} {}",
        "Slot", "Block", "Category", "Name", "Checksum"
    );
    for ch in 0..NUM_CHANNELS as u8 {
        match cache.get(ch) {
            Some(desc) => {
                let category = bloco_core::types::by_id(desc.type_id)
                    .map(|t| t.category.label())
                    .unwrap_or("-");
                println!(
                    "{:<6} {:<22} {:<14} {:<16} {}",
                    ch,
                    desc.type_label(),
                    category,
                    if desc.name.is_empty() { "-" } else { &desc.name },
                    if desc.checksum_valid { "ok" } else { "MISMATCH" }
                );
            }
            None => println!("{:<6} {:<22} {:<14} {:<16} {}", ch, "(empty)", "-", "-", "-"),
        }
    }
    println!("Found {} block(s) across {} channels", cache.programmed_count(), NUM_CHANNELS);
}
