//! In-memory log capture for tests.
//!
//! ```
//! use greenhouse_telemetry::capture::capture_logs;
//!
//! let (logs, _guard) = capture_logs();
//! tracing::info!(status = 200, "done");
//! assert!(logs.contents().contains("status=200"));
//! ```

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Shared buffer that collects formatted log output.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Everything captured so far.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Captured output split into lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Lines containing `needle`.
    #[must_use]
    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.contains(needle))
            .collect()
    }
}

/// Writer handed out to the formatter for each event.
#[derive(Debug)]
pub struct CapturedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// Installs a thread-local subscriber writing plain text at `DEBUG` and above.
///
/// Output stays captured until the returned guard is dropped. Events are
/// formatted on a single line after the names of their enclosing spans, e.g.
/// `INFO greenhouse:request: target: message trace_id=... status=200`.
#[must_use]
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    capture_logs_with_filter("debug")
}

/// Like [`capture_logs`], filtered by an `EnvFilter` directive such as
/// `warn` or `info,greenhouse_store=debug`.
#[must_use]
pub fn capture_logs_with_filter(directive: &str) -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_env_filter(EnvFilter::new(directive))
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_events_with_span_fields() {
        let (logs, _guard) = capture_logs();

        let span = tracing::info_span!("request", trace_id = "abc");
        span.in_scope(|| tracing::info!(status = 404, "finished"));

        let lines = logs.lines_containing("finished");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("trace_id=\"abc\"") || lines[0].contains("trace_id=abc"));
        assert!(lines[0].contains("status=404"));
    }

    #[test]
    fn test_filter_drops_lower_levels() {
        let (logs, _guard) = capture_logs_with_filter("warn");

        tracing::info!("quiet");
        tracing::warn!("loud");

        assert!(!logs.contents().contains("quiet"));
        assert_eq!(logs.lines_containing("loud").len(), 1);
    }

    #[test]
    fn test_capture_ends_with_guard() {
        let (logs, guard) = capture_logs();
        tracing::info!("inside");
        drop(guard);
        tracing::info!("outside");

        let output = logs.contents();
        assert!(output.contains("inside"));
        assert!(!output.contains("outside"));
    }
}
