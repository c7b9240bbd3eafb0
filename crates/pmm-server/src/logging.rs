//! Subscriber setup: up to two independently-leveled sinks, console and
//! file, composed as separate `tracing_subscriber::fmt::Layer`s over a
//! shared registry. Grounded on the teacher's single `tracing_subscriber::fmt()`
//! call in `main.rs`, extended to a second sink per spec §6's `log` section
//! (console and file are each independently enable/disable-able with their
//! own level).

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogConfig;

/// Install the process-wide subscriber from `config`. The returned guard
/// must be kept alive for the process lifetime — dropping it flushes and
/// stops the file sink's background writer thread.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
    let console_layer = config.enable_console_log.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(LevelFilter::from_level(config.console_log_level.to_tracing_level()))
    });

    let (file_layer, guard) = if config.enable_file_log {
        let (non_blocking, guard) = file_appender(&config.file_log_path);
        let layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(non_blocking)
            .with_filter(LevelFilter::from_level(config.file_log_level.to_tracing_level()));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry().with(console_layer).with(file_layer).init();
    guard
}

/// Split `path` into its parent directory and file name for
/// `tracing_appender::rolling::never`, which takes the two separately.
/// Falls back to `pmms.log` in the current directory when `path` is empty.
fn file_appender(path: &str) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let path = if path.is_empty() { "pmms.log" } else { path };
    let path = std::path::Path::new(path);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "pmms.log".to_string());

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    tracing_appender::non_blocking(file_appender)
}
