//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Connection options shared by every device-facing command
#[derive(clap::Args, Debug, Clone)]
pub struct PortArgs {
    /// Serial port (auto-detected when omitted; `sim:block` / `sim:board`
    /// open a simulated device)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(long, default_value_t = bloco_serial::DEFAULT_BAUD)]
    pub baud: u32,
}

#[derive(Parser)]
#[command(name = "bloco")]
#[command(author, version, about = "Console tools for the Bloco block programming system", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List serial ports, most likely device first
    ListPorts,

    /// Block EEPROM programmer console
    #[command(subcommand)]
    Block(BlockCommands),

    /// Reader board monitor
    #[command(subcommand)]
    Board(BoardCommands),

    /// Robot monitor
    #[command(subcommand)]
    Robo(RoboCommands),

    /// Build and flash a firmware project
    Flash {
        #[command(flatten)]
        port: PortArgs,

        /// Firmware project directory
        #[arg(long)]
        project: PathBuf,

        /// Build/flash tool to invoke
        #[arg(long, default_value = bloco_flash::DEFAULT_TOOL)]
        tool: String,

        /// Environment script to source first (ESP-IDF export.sh)
        #[arg(long)]
        env_script: Option<PathBuf>,

        /// Build without flashing
        #[arg(long)]
        build_only: bool,
    },
}

#[derive(Subcommand)]
pub enum BlockCommands {
    /// Read one channel, or all channels when none is given
    Read {
        #[command(flatten)]
        port: PortArgs,

        /// Channel to read (0-7)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=7))]
        channel: Option<u8>,
    },

    /// Program a block into a channel
    Write {
        #[command(flatten)]
        port: PortArgs,

        /// Target channel (0-7)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=7))]
        channel: u8,

        /// Block type: symbolic name (FORWARD), decimal or hex id (0x10)
        #[arg(short = 't', long = "type")]
        block_type: String,

        /// Name label (defaults to a title-cased form of the type name)
        #[arg(short, long)]
        name: Option<String>,

        /// Subtype byte
        #[arg(long, default_value_t = 0)]
        subtype: u8,

        /// First parameter byte
        #[arg(long, default_value_t = 0)]
        param1: u8,

        /// Second parameter byte
        #[arg(long, default_value_t = 0)]
        param2: u8,
    },

    /// Erase a channel back to blank
    Erase {
        #[command(flatten)]
        port: PortArgs,

        /// Target channel (0-7)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=7))]
        channel: u8,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Verify a channel's checksum and type validity
    Verify {
        #[command(flatten)]
        port: PortArgs,

        /// Target channel (0-7)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=7))]
        channel: u8,
    },

    /// Program a sequence of blocks from a JSON file, swapping EEPROMs
    /// between writes
    Batch {
        #[command(flatten)]
        port: PortArgs,

        /// JSON file with an array of write specs
        #[arg(short, long)]
        file: PathBuf,

        /// Do not pause for EEPROM swaps between blocks
        #[arg(short, long)]
        yes: bool,
    },

    /// List the block type table
    Types {
        /// Only show one category
        #[arg(short, long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum BoardCommands {
    /// Scan all multiplexer slots for inserted blocks
    Scan {
        #[command(flatten)]
        port: PortArgs,

        /// Keep re-scanning until interrupted
        #[arg(long)]
        watch: bool,

        /// Seconds between re-scans
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },

    /// Broadcast the currently inserted program to the robot
    Send {
        #[command(flatten)]
        port: PortArgs,
    },

    /// Broadcast an explicit program to the robot
    SendBlocks {
        #[command(flatten)]
        port: PortArgs,

        /// JSON file with an array of {type, name} blocks
        #[arg(short, long, conflicts_with = "blocks")]
        file: Option<PathBuf>,

        /// Comma-separated block type names (BEGIN,FORWARD,END)
        #[arg(short, long, value_delimiter = ',')]
        blocks: Vec<String>,
    },

    /// Query channel count and presence summary
    Status {
        #[command(flatten)]
        port: PortArgs,
    },
}

#[derive(Subcommand)]
pub enum RoboCommands {
    /// Follow the robot's serial log, decoding program receive and
    /// execution events
    Monitor {
        #[command(flatten)]
        port: PortArgs,
    },
}
