//! bloco - Console tools for the Bloco block programming system
//!
//! Three embedded devices make up the toy: a block EEPROM programmer, a
//! reader board with an I2C multiplexer, and a robot that receives programs
//! over a wireless link. All of them speak newline-delimited JSON over
//! serial; this binary is the host-side console for each of them, plus a
//! wrapper around the external build/flash tool.
//!
//! Pass `--port sim:block` or `--port sim:board` to drive a simulated
//! device instead of hardware.

mod cli;
mod commands;
mod devices;

use clap::Parser;
use cli::{BlockCommands, BoardCommands, Cli, Commands, RoboCommands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::ListPorts => {
            commands::list_ports();
            Ok(())
        }
        Commands::Block(subcmd) => match subcmd {
            BlockCommands::Read { port, channel } => commands::block::run_read(&port, channel),
            BlockCommands::Write {
                port,
                channel,
                block_type,
                name,
                subtype,
                param1,
                param2,
            } => commands::block::run_write(&port, channel, &block_type, name, subtype, param1, param2),
            BlockCommands::Erase { port, channel, yes } => {
                commands::block::run_erase(&port, channel, yes)
            }
            BlockCommands::Verify { port, channel } => commands::block::run_verify(&port, channel),
            BlockCommands::Batch { port, file, yes } => {
                commands::block::run_batch(&port, &file, yes)
            }
            BlockCommands::Types { category } => commands::block::run_types(category.as_deref()),
        },
        Commands::Board(subcmd) => match subcmd {
            BoardCommands::Scan {
                port,
                watch,
                interval,
            } => commands::board::run_scan(&port, watch, interval),
            BoardCommands::Send { port } => commands::board::run_send(&port),
            BoardCommands::SendBlocks { port, file, blocks } => {
                commands::board::run_send_blocks(&port, file.as_deref(), &blocks)
            }
            BoardCommands::Status { port } => commands::board::run_status(&port),
        },
        Commands::Robo(subcmd) => match subcmd {
            RoboCommands::Monitor { port } => commands::robo::run_monitor(&port),
        },
        Commands::Flash {
            port,
            project,
            tool,
            env_script,
            build_only,
        } => commands::flash::run_flash(&port, &project, tool, env_script, build_only),
    }
}
