use anyhow::Result;
use std::process;
use log::error;

use envgate::gate::GateError;
use envgate::{app, cli, logging};

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Application panicked: {:?}", panic_info);
        eprintln!("Panic: {:?}", panic_info);
        process::exit(101);
    }));

    if let Err(e) = run() {
        // Activation refusals are an expected outcome, not a system error
        match e.downcast_ref::<GateError>() {
            Some(gate_error) if gate_error.is_fatal() => eprintln!("{}", gate_error),
            _ => {
                error!("Application error: {:#}", e);
                eprintln!("Error: {:#}", e);
            }
        }

        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::args::parse_args();

    cli::args::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;

    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    app::run_simulation(&args, &config_manager)
}
