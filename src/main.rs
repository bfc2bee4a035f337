mod config;
mod devices;
mod error;
mod telemetry;
mod transport;

use config::{Config, SourceConfig};
use devices::{FixedSource, ReadingSource, SerialSource};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use transport::StdoutTransport;

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet, the log directory is part of the config
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = setup_logging(&config.log_dir);
    info!("Starting application");

    let mut source: Box<dyn ReadingSource> = match &config.source {
        SourceConfig::Static => Box::new(FixedSource),
        SourceConfig::Serial(serial) => Box::new(SerialSource::new(serial.clone())),
    };
    let mut transport = StdoutTransport::new(config.connection.clone());

    match telemetry::run_cycle(config.labels.as_deref(), &mut *source, &mut transport) {
        Ok(_) => {
            info!("Application shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(log_dir: &Path) -> WorkerGuard {
    // Daily rotated file, the console is kept for the messages themselves
    let file_appender = rolling::daily(log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true)
        .init();

    guard
}
