mod handlers;
pub mod parse;

use clap::Parser;
pub use parse::Cli;
use tracing_subscriber::EnvFilter;

use crate::core::error::PlotError;

/// Log to stderr. `RUST_LOG` wins over `--debug`, which wins over `warn`.
fn init_logging(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // a subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> Result<(), PlotError> {
    let cli = parse::Cli::parse();
    match cli.cmd {
        parse::Command::Csv(a) => {
            init_logging(a.debug);
            handlers::csv(a)
        }
        parse::Command::Colors => {
            init_logging(false);
            handlers::colors();
            Ok(())
        }
        parse::Command::Demo(a) => {
            init_logging(a.debug);
            handlers::demo(&a)
        }
        parse::Command::Examples => {
            handlers::examples();
            Ok(())
        }
    }
}
