use std::path::Path;

use anyhow::{anyhow, Result};
use countdown_core::config::LOG_FILE;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";

/// Logs to `debug.log` in the data directory and, when `show_std` is set, to
/// stderr. `RUST_LOG` may hold a level or a full filter directive.
pub fn enable_logging(data_dir: &Path, show_std: bool) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(data_dir)?;

    let stderr = std::io::stderr.with_filter(move |_| show_std);

    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LEVEL.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter_for(&level))
        .with_ansi(false)
        .with_target(false)
        .with_writer(stderr.and(appender))
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {err}"))?;
    Ok(())
}

fn filter_for(level: &str) -> EnvFilter {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return EnvFilter::new(level);
    }
    let level = if level.is_empty() { DEFAULT_LEVEL } else { level };
    EnvFilter::new(format!(
        "{}={level},countdown_core={level}",
        env!("CARGO_PKG_NAME").replace('-', "_"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_levels_apply_to_both_crates() {
        let filter = filter_for("debug").to_string();
        assert!(filter.contains("countdown_master=debug"));
        assert!(filter.contains("countdown_core=debug"));
        assert!(filter_for("eframe=warn").to_string().contains("eframe=warn"));
    }
}
