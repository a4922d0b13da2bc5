use cpusim::utils::{self, prelude::*};

mod cli;
mod commands;

fn main() -> Result<()> {
    // panic setup should be done early
    utils::panic::setup();
    // basic logging setup, reconfigured once the config is loaded
    let mut logging = utils::logging::setup()?;

    trace!("Start cli execution");

    cli::execute(&mut logging)
}
