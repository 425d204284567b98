use std::io;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::fmt;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Where log lines go. The TUI owns the terminal, so it logs to a file.
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

pub fn init_logging(verbose_level: u8, quiet: bool, target: LogTarget<'_>) -> Result<()> {
    let default_directive = if quiet {
        "error"
    } else {
        match verbose_level {
            0 => "warn",
            1 => "info,ureq=warn",
            2 => "debug,ureq=info,rustls=warn",
            _ => "trace",
        }
    };
    let filter = if quiet {
        EnvFilter::new(default_directive)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
    };
    let registry = Registry::default().with(filter);

    match target {
        LogTarget::Stderr => {
            let layer = fmt::layer().with_target(false).with_writer(io::stderr);
            registry.with(layer).try_init()?;
        }
        LogTarget::File(path) => {
            let dir = path
                .parent()
                .ok_or_else(|| anyhow!("log file path has no parent directory"))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("invalid log file name {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let layer = fmt::layer().with_ansi(false).with_writer(appender);
            registry.with(layer).try_init()?;
        }
    }

    Ok(())
}
