use std::{process, time::Duration};

use tracing::error;
use tracing_subscriber::EnvFilter;

use initg::{
    cli::{Cli, parse_args},
    supervisor::{Supervisor, SupervisorOptions},
};

fn main() {
    let args = parse_args();
    init_logging(&args);

    // clap guarantees at least one element after `--`.
    let (command, command_args) = args
        .command
        .split_first()
        .expect("clap enforces a non-empty command");

    let options = SupervisorOptions {
        subreaper: args.subreaper,
        grace_period: Duration::from_millis(args.grace_period),
    };

    let result = Supervisor::launch(command, command_args, options)
        .and_then(Supervisor::run);

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            error!("{err}");
            process::exit(err.exit_code());
        }
    }
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
