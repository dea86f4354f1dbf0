//! Block programmer console commands

use crate::cli::PortArgs;
use crate::devices;
use bloco_core::{image, types, ChannelCache, NUM_CHANNELS};
use bloco_proto::{Command, Response, WriteSpec};
use bloco_serial::Session;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Read one channel, or sweep all eight when `channel` is `None`
pub fn run_read(args: &PortArgs, channel: Option<u8>) -> CliResult {
    let (session, _) = devices::open_session(args)?;
    let mut cache = ChannelCache::new();

    match channel {
        Some(ch) => {
            if !read_into_cache(&session, &mut cache, ch) {
                return Err(format!("failed to read channel {ch}").into());
            }
            print_detail(ch, &cache);
        }
        None => {
            // The bulk path: eight sequential exchanges over the one link
            for ch in 0..NUM_CHANNELS as u8 {
                read_into_cache(&session, &mut cache, ch);
            }
            print_table(&cache);
        }
    }

    session.disconnect();
    Ok(())
}

/// Program a block into a channel, then re-read it to show the result
pub fn run_write(
    args: &PortArgs,
    channel: u8,
    block_type: &str,
    name: Option<String>,
    subtype: u8,
    param1: u8,
    param2: u8,
) -> CliResult {
    let block_type = types::resolve(block_type)?;
    let mut label = name.unwrap_or_else(|| block_type.default_label());
    if label.len() > image::NAME_MAX_LEN {
        log::warn!("Truncating name {:?} to {} bytes", label, image::NAME_MAX_LEN);
        label.truncate(image::NAME_MAX_LEN);
    }

    let (session, _) = devices::open_session(args)?;
    let cmd = Command::WriteBlock(WriteSpec {
        channel,
        type_id: block_type.id,
        subtype,
        param1,
        param2,
        name: label,
    });

    match session.exchange(&cmd) {
        Some(Response::WriteOk(ok)) => {
            println!(
                "Wrote {} to channel {} (serial {})",
                block_type.name, channel, ok.serial
            );
        }
        Some(Response::Error(e)) => return Err(format!("write failed: {}", e.text()).into()),
        Some(other) => {
            return Err(format!("unexpected response {} to WRITE_BLOCK", other.kind()).into())
        }
        None => return Err("no response from device".into()),
    }

    // Follow-up read so the displayed state is what the EEPROM really holds
    let mut cache = ChannelCache::new();
    if read_into_cache(&session, &mut cache, channel) {
        print_detail(channel, &cache);
    }
    session.disconnect();
    Ok(())
}

/// Erase a channel after confirmation
pub fn run_erase(args: &PortArgs, channel: u8, yes: bool) -> CliResult {
    if !yes && !confirm(&format!("Erase channel {channel}?"))? {
        println!("Aborted.");
        return Ok(());
    }

    let (session, _) = devices::open_session(args)?;
    match session.exchange(&Command::erase_block(channel)) {
        Some(Response::EraseOk(_)) => println!("Erased channel {channel}"),
        Some(Response::Error(e)) => return Err(format!("erase failed: {}", e.text()).into()),
        Some(other) => {
            return Err(format!("unexpected response {} to ERASE_BLOCK", other.kind()).into())
        }
        None => return Err("no response from device".into()),
    }
    session.disconnect();
    Ok(())
}

/// Verify a channel's checksum and type validity
pub fn run_verify(args: &PortArgs, channel: u8) -> CliResult {
    let (session, _) = devices::open_session(args)?;
    match session.exchange(&Command::verify_block(channel)) {
        Some(Response::VerifyOk(v)) if v.matches => {
            println!("Channel {channel}: verify OK");
            Ok(())
        }
        Some(Response::VerifyOk(_)) => {
            println!("Channel {channel}: verify MISMATCH");
            Err("verification mismatch".into())
        }
        Some(Response::Error(e)) => Err(format!("verify failed: {}", e.text()).into()),
        Some(other) => Err(format!("unexpected response {} to VERIFY_BLOCK", other.kind()).into()),
        None => Err("no response from device".into()),
    }
}

/// Program a sequence of blocks, pausing for EEPROM swaps between writes
pub fn run_batch(args: &PortArgs, file: &std::path::Path, yes: bool) -> CliResult {
    let reader = std::fs::File::open(file)?;
    let blocks: Vec<WriteSpec> = serde_json::from_reader(reader)?;
    if blocks.is_empty() {
        return Err("batch file contains no blocks".into());
    }

    let (session, _) = devices::open_session(args)?;
    let bar = ProgressBar::new(blocks.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut succeeded = 0usize;
    for (i, spec) in blocks.iter().enumerate() {
        if i > 0 && !yes {
            bar.suspend(|| -> CliResult {
                confirm_enter("Insert the next blank EEPROM and press Enter...")
            })?;
        }
        bar.set_message(types::describe(spec.type_id));
        match session.exchange(&Command::WriteBlock(spec.clone())) {
            Some(Response::WriteOk(ok)) => {
                succeeded += 1;
                log::info!("Block {} written, serial {}", i, ok.serial);
            }
            Some(Response::Error(e)) => log::error!("Block {} failed: {}", i, e.text()),
            Some(other) => log::error!("Block {}: unexpected response {}", i, other.kind()),
            None => log::error!("Block {}: no response", i),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!("Batch complete: {}/{} succeeded", succeeded, blocks.len());
    session.disconnect();
    if succeeded < blocks.len() {
        return Err("some blocks failed to program".into());
    }
    Ok(())
}

/// List the block type table
pub fn run_types(category: Option<&str>) -> CliResult {
    let filter = match category {
        Some(label) => Some(
            types::Category::from_label(label)
                .ok_or_else(|| format!("unknown category: {label}"))?,
        ),
        None => None,
    };

    println!("{:<6} {:<20} {}", "Id", "Name", "Category");
    for block_type in types::BLOCK_TYPES {
        if filter.is_some_and(|c| c != block_type.category) {
            continue;
        }
        println!(
            "0x{:02X}  {:<20} {}",
            block_type.id,
            block_type.name,
            block_type.category.label()
        );
    }
    Ok(())
}

/// One READ_BLOCK exchange, folded into the cache. Returns false when the
/// channel could not be read; the cache entry is cleared in that case.
fn read_into_cache(session: &Session, cache: &mut ChannelCache, channel: u8) -> bool {
    match session.exchange(&Command::read_block(channel)) {
        Some(Response::ReadData(data)) => {
            // The cache is keyed by the channel we asked about; the echo in
            // newer firmware is informational only.
            if let Err(e) = cache.update(channel, data.descriptor()) {
                log::error!("Cache update failed: {e}");
                return false;
            }
            true
        }
        Some(Response::Error(e)) => {
            log::warn!("Channel {} read error: {}", channel, e.text());
            let _ = cache.clear(channel);
            false
        }
        Some(other) => {
            log::warn!(
                "Unexpected response {} to READ_BLOCK on channel {}",
                other.kind(),
                channel
            );
            false
        }
        None => {
            log::warn!("Channel {}: no response", channel);
            false
        }
    }
}

fn print_detail(channel: u8, cache: &ChannelCache) {
    let Some(desc) = cache.get(channel) else {
        println!("Channel {channel}: no data");
        return;
    };
    println!("Channel {channel}");
    println!("  Type:    {}", desc.type_label());
    println!("  Subtype: {}", desc.subtype);
    println!("  Param 1: {}", desc.param1);
    println!("  Param 2: {}", desc.param2);
    println!("  Serial:  {}", desc.serial.as_deref().unwrap_or("---"));
    println!(
        "  Name:    {}",
        if desc.name.is_empty() {
            "(empty)"
        } else {
            &desc.name
        }
    );
    println!("  Status:  {}", desc.status());
}

fn print_table(cache: &ChannelCache) {
    println!(
        "{:<4} {:<22} {:<16} {:<10} {}",
        "Ch", "Type", "Name", "Serial", "Status"
    );
    for ch in 0..NUM_CHANNELS as u8 {
        match cache.get(ch) {
            Some(desc) => println!(
                "{:<4} {:<22} {:<16} {:<10} {}",
                ch,
                desc.type_label(),
                if desc.name.is_empty() { "-" } else { &desc.name },
                desc.serial.as_deref().unwrap_or("-"),
                desc.status()
            ),
            None => println!("{:<4} {:<22} {:<16} {:<10} {}", ch, "---", "-", "-", "no data"),
        }
    }
    println!("{} channel(s) programmed", cache.programmed_count());
}

fn confirm(prompt: &str) -> Result<bool, Box<dyn std::error::Error>> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn confirm_enter(prompt: &str) -> CliResult {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(())
}
