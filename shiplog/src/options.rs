use std::env;
use std::fmt;

pub const DEFAULT_TOKEN_HEADER: &str = "billes-log-token";

const HOST_VAR: &str = "SHIPLOG_HOST";
const SYSTEM_VAR: &str = "SHIPLOG_SYSTEM";
const TOKEN_VAR: &str = "SHIPLOG_TOKEN";
const TOKEN_HEADER_VAR: &str = "SHIPLOG_TOKEN_HEADER";

// ===== Настройки логгера =====

/// Пустой `host` означает: удалённого коллектора нет, пишем только в консоль.
#[derive(Clone, PartialEq, Eq)]
pub struct Options {
    pub host: String,
    pub system: String,
    pub token: String,
    pub token_header: String,
}

impl Options {
    pub fn new(host: impl Into<String>, system: impl Into<String>, token: impl Into<String>) -> Self {
        Options {
            host: host.into(),
            system: system.into(),
            token: token.into(),
            token_header: DEFAULT_TOKEN_HEADER.to_owned(),
        }
    }

    pub fn console_only(system: impl Into<String>) -> Self {
        Self::new(String::new(), system, String::new())
    }

    pub fn with_token_header(mut self, name: impl Into<String>) -> Self {
        self.token_header = name.into();
        self
    }

    /// Читает `SHIPLOG_HOST`, `SHIPLOG_SYSTEM`, `SHIPLOG_TOKEN`, `SHIPLOG_TOKEN_HEADER`.
    pub fn from_env() -> Self {
        fn env_or(key: &str, default: &str) -> String {
            env::var(key).unwrap_or_else(|_| default.to_owned())
        }

        Options {
            host: env_or(HOST_VAR, ""),
            system: env::var(SYSTEM_VAR).unwrap_or_else(|_| default_system()),
            token: env_or(TOKEN_VAR, ""),
            token_header: env_or(TOKEN_HEADER_VAR, DEFAULT_TOKEN_HEADER),
        }
    }

    pub fn has_remote(&self) -> bool {
        !self.host.trim().is_empty()
    }
}

fn default_system() -> String {
    env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unnamed".to_owned())
}

// Токен в отладочный вывод не попадает
impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("host", &self.host)
            .field("system", &self.system)
            .field("token", &"***")
            .field("token_header", &self.token_header)
            .finish()
    }
}
