use crate::entry::LogEntry;
use crate::level::Severity;
use chrono::Local;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ===== Консольное представление записи =====

/// Запись, заранее подготовленная для консоли: данные уже отрендерены в JSON,
/// поэтому строку можно держать в фоновой задаче без самого payload.
#[derive(Debug, Clone)]
pub(crate) struct ConsoleLine {
    severity: Severity,
    tags: String,
    message: String,
    data: String,
}

impl ConsoleLine {
    pub(crate) fn from_entry<D: Serialize>(entry: &LogEntry<D>) -> Self {
        let data = match entry.data() {
            Some(data) => serde_json::to_string(data)
                .unwrap_or_else(|e| format!("<unencodable: {}>", e)),
            None => "null".to_owned(),
        };

        ConsoleLine {
            severity: entry.severity(),
            tags: format!("[{}]", entry.tags().join(", ")),
            message: entry.message().to_owned(),
            data,
        }
    }

    fn render(&self, timestamp: &str, verbose: bool) -> String {
        if verbose {
            format!(
                "{} {} - {} - {}\n {}",
                timestamp, self.severity, self.tags, self.message, self.data
            )
        } else {
            format!("{} {} - {} - {}", timestamp, self.severity, self.tags, self.message)
        }
    }
}

// ===== Синхронный вывод в консоль =====

#[derive(Clone)]
pub(crate) struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    pub(crate) fn new<W: Write + Send + 'static>(out: W) -> Self {
        Console {
            out: Arc::new(Mutex::new(Box::new(out))),
        }
    }

    pub(crate) fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub(crate) fn write(&self, line: &ConsoleLine, verbose: bool) {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let text = line.render(&timestamp, verbose);

        // Паника в другом потоке не должна глушить консоль
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(out, "{}", text);
        let _ = out.flush();
    }
}
