use std::sync::{Mutex, Once, OnceLock};

use log::{Level, Log, Metadata, Record};

/// Keeps every log record so tests can look for the lines they expect.
struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<CapturingLogger> = OnceLock::new();
static INSTALL: Once = Once::new();

fn logger() -> &'static CapturingLogger {
    let logger = LOGGER.get_or_init(|| CapturingLogger {
        records: Mutex::new(Vec::new()),
    });
    INSTALL.call_once(|| {
        log::set_logger(logger).expect("another logger is already installed");
        log::set_max_level(log::LevelFilter::Trace);
    });
    logger
}

/// Installs the capturing logger once per test binary.
pub fn init() {
    logger();
}

/// Messages logged at `level` that contain `needle`. Tests run in parallel,
/// so callers should look for text unique to their own test.
pub fn messages(level: Level, needle: &str) -> Vec<String> {
    let records = logger().records.lock().expect("log records poisoned");
    records
        .iter()
        .filter(|(l, message)| *l == level && message.contains(needle))
        .map(|(_, message)| message.clone())
        .collect()
}
