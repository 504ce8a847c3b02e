// ============================================================================
// L2.1: LOGGER SUBSYSTEM
// ============================================================================
use std::fs;

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::info;

pub const LOG_DIRECTORY: &str = "logs";
pub const LOG_BASENAME: &str = "table_mirror";

/// Logs go to rotating files; only warnings and errors reach stderr so the
/// terminal grids stay readable. Keep the handle alive until exit.
pub fn init_logger(level: &str) -> Result<LoggerHandle, Box<dyn std::error::Error>> {
    fs::create_dir_all(LOG_DIRECTORY)?;
    let handle = Logger::try_with_str(level)?
        .log_to_file(
            FileSpec::default()
                .directory(LOG_DIRECTORY)
                .basename(LOG_BASENAME),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .write_mode(WriteMode::BufferAndFlush)
        .rotate(
            Criterion::Size(10_485_760),
            Naming::Numbers,
            Cleanup::KeepLogFiles(5),
        )
        .format(|w, now, record| {
            write!(
                w,
                "[{}] [{}] {}",
                now.format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                &record.args()
            )
        })
        .start()?;
    info!("════════════════════════════════════════════════");
    info!(
        "✅ Logger initialized - File: {}/{}_*.log",
        LOG_DIRECTORY, LOG_BASENAME
    );
    info!("════════════════════════════════════════════════");
    Ok(handle)
}
