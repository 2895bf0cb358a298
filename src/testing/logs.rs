//! Per-thread log capture
//!
//! Installs a process-wide logger once and records every log call on the
//! calling thread, so parallel tests see only their own records. Async tests
//! must run on a current-thread runtime (the `#[tokio::test]` default).

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct ThreadLogger;

impl Log for ThreadLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.level(), record.args().to_string()));
        });
    }

    fn flush(&self) {}
}

static LOGGER: ThreadLogger = ThreadLogger;
static INSTALL: Once = Once::new();

/// Handle on the current thread's log records
pub struct LogCapture {
    _private: (),
}

impl LogCapture {
    /// Install the capturing logger (once) and clear this thread's records
    pub fn start() -> Self {
        INSTALL.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(LevelFilter::Trace);
            }
        });
        RECORDS.with(|records| records.borrow_mut().clear());
        Self { _private: () }
    }

    pub fn records(&self) -> Vec<(Level, String)> {
        RECORDS.with(|records| records.borrow().clone())
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.messages_at(Level::Error).len()
    }
}
