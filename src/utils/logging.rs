use crate::config::EngineSettings;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Installs the global subscriber. `RUST_LOG` overrides the configured filter.
///
/// Returns the file appender guard when file logging is on; keep it alive for
/// the lifetime of the process. Calling this twice is a no-op.
pub fn init(settings: &EngineSettings) -> Option<WorkerGuard> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return None;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    if settings.log_to_file {
        let logs = settings.data_paths().logs;
        let appender = tracing_appender::rolling::daily(logs.as_std_path(), "mod_collector.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file_layer = fmt::layer().with_writer(writer).with_ansi(false);

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init();
        match installed {
            Ok(()) => Some(guard),
            Err(e) => {
                warn!("Logging not installed, another subscriber is active: {e}");
                None
            }
        }
    } else {
        if let Err(e) = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
        {
            warn!("Logging not installed, another subscriber is active: {e}");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    // One test owns the process-wide subscriber state.
    #[test]
    fn no_guard_when_another_subscriber_owns_the_process() {
        tracing_subscriber::registry()
            .try_init()
            .expect("first global subscriber in this test binary");

        let tmp = tempfile::tempdir().unwrap();
        let settings = EngineSettings {
            data_dir: Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap(),
            log_to_file: true,
            log_filter: "debug".into(),
            ..EngineSettings::default()
        };

        assert!(init(&settings).is_none());
        assert!(init(&settings).is_none(), "second call is a no-op");
    }
}
