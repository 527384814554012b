use serde::Serialize;
use std::fmt;

// ===== Уровни важности =====

/// Уровень записи. Ничего не фильтрует: влияет только на маркировку.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Debug,
    Error,
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Debug => "DEBUG",
            Severity::Error => "ERROR",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
