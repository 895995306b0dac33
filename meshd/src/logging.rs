//! Structured logging setup: stdout for interactive runs, a rolling
//! file for everything else. No syslog target and no daemonization —
//! `meshd` always runs in the foreground under a supervisor.

use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

pub enum LoggingOutput {
    Stdout,
    File(PathBuf),
}

pub fn setup_tracing(output: LoggingOutput) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match output {
        LoggingOutput::Stdout => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .init();
        }
        LoggingOutput::File(path) => {
            let dir: &Path = path.parent().unwrap_or_else(|| Path::new("."));
            let filename = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("invalid log file path: {}", path.display()))?;
            let writer = tracing_appender::rolling::never(dir, filename);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .init();
        }
    }
    Ok(())
}
