use std::path::PathBuf;

use structopt::clap::AppSettings;
use structopt::StructOpt;

use cpusim::utils::app_config;
use cpusim::utils::logging::GlobalLoggingContext;
use cpusim::utils::prelude::*;

use crate::commands::{self, Cmd};

/// Simulate classic CPU scheduling policies over a batch of processes
#[derive(StructOpt)]
#[structopt(name = "cpusim", global_settings = &[AppSettings::VersionlessSubcommands])]
struct Cli {
    /// Set a custom config file
    #[structopt(short, long, value_name = "FILE", parse(from_os_str), global = true)]
    config: Option<PathBuf>,

    /// Apply a preset defined under `[presets.<NAME>]`
    #[structopt(short, long, value_name = "NAME", global = true)]
    preset: Option<String>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Show the resolved configuration
    Config(commands::Config),
    /// Simulate one policy and print its report
    Run(commands::Run),
    /// Simulate every policy over the same batch and compare them
    Compare(commands::Compare),
    /// Write a random batch file
    Generate(commands::Generate),
}

/// Parse arguments, load the config and run the chosen subcommand
pub fn execute(logging: &mut GlobalLoggingContext) -> Result<()> {
    let cli = Cli::from_args();

    app_config::init(cli.config.as_deref(), cli.preset.as_deref())?;
    debug!(config = ?cli.config, preset = ?cli.preset, "configuration loaded");

    match cli.cmd {
        Command::Config(cmd) => dispatch(cmd, logging),
        Command::Run(cmd) => dispatch(cmd, logging),
        Command::Compare(cmd) => dispatch(cmd, logging),
        Command::Generate(cmd) => dispatch(cmd, logging),
    }
}

fn dispatch(cmd: impl Cmd, logging: &mut GlobalLoggingContext) -> Result<()> {
    logging.reconfigure(cmd.produces_output())?;
    cmd.run()
}
