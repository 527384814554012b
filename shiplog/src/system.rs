//! Служебный канал самого логгера: сюда уходят подробности сбоев
//! (транспорт, кодирование, повторная инициализация).
//! На Linux это syslog, на остальных платформах stderr.

use crate::level::Severity;

#[cfg(target_os = "linux")]
use std::sync::{Mutex, PoisonError};

#[cfg(target_os = "linux")]
type Backend = syslog::Logger<syslog::LoggerBackend, syslog::Formatter3164>;

pub(crate) struct SystemLog {
    process: String,
    #[cfg(target_os = "linux")]
    backend: Option<Mutex<Backend>>,
}

impl SystemLog {
    #[cfg(target_os = "linux")]
    pub(crate) fn open(process: &str) -> Self {
        let formatter = syslog::Formatter3164 {
            facility: syslog::Facility::LOG_USER,
            process: process.to_owned(),
            ..Default::default()
        };
        // Нет сокета syslog -> канал просто молчит
        let backend = syslog::unix(formatter).ok().map(Mutex::new);
        SystemLog {
            process: process.to_owned(),
            backend,
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub(crate) fn open(process: &str) -> Self {
        SystemLog {
            process: process.to_owned(),
        }
    }

    #[cfg(target_os = "linux")]
    pub(crate) fn report(&self, severity: Severity, message: &str) {
        let Some(ref backend) = self.backend else {
            return;
        };
        let mut logger = backend.lock().unwrap_or_else(PoisonError::into_inner);
        let message = format!("[{}] {}", self.process, message);
        let _ = match severity {
            Severity::Critical => logger.crit(message),
            Severity::Error => logger.err(message),
            Severity::Warning => logger.warning(message),
            Severity::Info => logger.info(message),
            Severity::Debug => logger.debug(message),
        };
    }

    #[cfg(not(target_os = "linux"))]
    pub(crate) fn report(&self, severity: Severity, message: &str) {
        eprintln!("[{}] {}: {}", self.process, severity, message);
    }
}
