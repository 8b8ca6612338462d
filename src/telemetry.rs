//! Tracing subscriber setup for the binary.

use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Calling this twice is a
/// no-op that returns `false`.
pub fn init_tracing(default_level: &str) -> bool {
    if INITIALISED.set(()).is_err() {
        return false;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);

    Registry::default().with(filter).with(fmt_layer).try_init().is_ok()
}

/// Run `f` under a thread-local subscriber and return everything it logged.
#[cfg(test)]
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().map_err(|_| io::Error::other("poisoned"))?.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let buffer = Buffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().map(|b| b.clone()).unwrap_or_default();
    (value, String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        let _ = init_tracing("warn");
        assert!(!init_tracing("warn"));
    }

    #[test]
    fn test_capture_logs_collects_events() {
        let ((), logs) = capture_logs(|| tracing::info!(answer = 42, "captured"));
        assert!(logs.contains("captured"));
        assert!(logs.contains("answer=42"));
    }
}
