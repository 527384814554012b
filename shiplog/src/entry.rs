use crate::level::Severity;
use serde::Serialize;

/// Тег служебных записей самого логгера.
pub const INTERNAL_TAG: &str = "logging";

/// Одна запись лога. Собирается один раз на вызов и дальше не меняется.
///
/// Первый тег всегда идентификатор системы, за ним теги вызывающего
/// в исходном порядке.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry<D> {
    severity: Severity,
    tags: Vec<String>,
    message: String,
    data: Option<D>,
}

impl<D> LogEntry<D> {
    pub fn new(
        severity: Severity,
        system: &str,
        tags: &[&str],
        message: &str,
        data: Option<D>,
    ) -> Self {
        let mut all_tags = Vec::with_capacity(tags.len() + 1);
        all_tags.push(system.to_owned());
        all_tags.extend(tags.iter().map(|tag| (*tag).to_owned()));

        LogEntry {
            severity,
            tags: all_tags,
            message: message.to_owned(),
            data,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }
}

impl<D: Serialize> LogEntry<D> {
    /// JSON-тело для коллектора: `{"severity", "tags", "message", "data"}`.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
