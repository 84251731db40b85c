use std::fs;

use flexi_logger::{Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};
use once_cell::sync::OnceCell;

use crate::config::LoggingConfig;

static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

/// Start file logging for the process. Later calls are no-ops.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    LOGGER.get_or_try_init(|| -> anyhow::Result<LoggerHandle> {
        fs::create_dir_all(&config.directory)?;
        let handle = Logger::try_with_env_or_str(&config.spec)?
            .log_to_file(
                FileSpec::default()
                    .directory(&config.directory)
                    .basename("reader-playback"),
            )
            .duplicate_to_stderr(Duplicate::Info)
            .rotate(
                Criterion::AgeOrSize(Age::Day, 10_000_000),
                Naming::Numbers,
                Cleanup::KeepLogFiles(7),
            )
            .start()?;
        Ok(handle)
    })?;
    Ok(())
}
