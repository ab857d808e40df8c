use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::util;

use self::{replay::ReplayArg, simulate::SimulateArg};

mod replay;
pub(crate) mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Core configuration JSON file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play bot-driven falling-piece turns against a fixed-king table
    Simulate(#[clap(flatten)] SimulateArg),
    /// Apply a JSON script of spawns and operations to a fresh core
    Replay(#[clap(flatten)] ReplayArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    let config = util::load_config(args.config.as_deref())?;
    match args.mode {
        Mode::Simulate(arg) => simulate::run(&arg, config)?,
        Mode::Replay(arg) => replay::run(&arg, config)?,
    }
    Ok(())
}
