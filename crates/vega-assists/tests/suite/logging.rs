use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use vega_assists::{AssistConfig, LoggingConfig};
use vega_test_utils::Fixture;

use super::{assists_with, command_config};

#[derive(Clone, Default)]
struct SharedLogBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedLogBuffer {
    fn as_string(&self) -> String {
        let bytes = self.0.lock().expect("log buffer mutex poisoned").clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

struct SharedLogWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = self.0.lock().expect("log buffer mutex poisoned");
        out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedLogBuffer {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter(self.0.clone())
    }
}

fn capture(config: &LoggingConfig, run: impl FnOnce()) -> String {
    let logs = SharedLogBuffer::default();
    let subscriber = tracing_subscriber::registry()
        .with(config.env_filter())
        .with(config.fmt_layer(logs.clone()));
    tracing::subscriber::with_default(subscriber, run);
    logs.as_string()
}

fn logging(level: &str, json: bool) -> LoggingConfig {
    LoggingConfig {
        level: level.to_string(),
        json,
    }
}

#[test]
fn rule_outcomes_are_logged_at_debug() {
    let fixture = Fixture::parse("class A { void m() { int x = /*]*/0/*[*/; } }");
    let text = capture(&logging("vega.assists=debug", false), || {
        assists_with(&fixture, &command_config(), &[]);
    });
    assert!(text.contains("rule evaluated"), "got:\n{text}");
    assert!(text.contains("extract"), "got:\n{text}");
    assert!(!text.contains("dropping proposal"), "got:\n{text}");
}

#[test]
fn warn_level_stays_quiet_on_clean_runs() {
    let fixture = Fixture::parse("class A { void m() { int x = /*]*/0/*[*/; } }");
    let text = capture(&logging("warn", false), || {
        assists_with(&fixture, &AssistConfig::default(), &[]);
    });
    assert!(text.is_empty(), "unexpected output:\n{text}");
}

#[test]
fn json_logging_writes_one_object_per_line() {
    let fixture = Fixture::parse("class A { void m() { int x = /*]*/0/*[*/; } }");
    let text = capture(&logging("vega.assists=debug", true), || {
        assists_with(&fixture, &command_config(), &[]);
    });
    let events: Vec<serde_json::Value> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("log line is JSON"))
        .collect();
    assert!(!events.is_empty());
    assert!(events
        .iter()
        .any(|event| event["fields"]["message"] == "rule evaluated"));
}
