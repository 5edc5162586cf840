//! Tracing setup shared by the binaries.

use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Install a stderr subscriber. `RUST_LOG` overrides `verbose`.
pub fn init_tracing(verbose: u8, format: LogFormat) {
    let filter = match verbose {
        0 => "pdfa3pack_core=warn",
        1 => "pdfa3pack_core=info",
        2 => "pdfa3pack_core=debug",
        _ => "pdfa3pack_core=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
