//! # shiplog
//!
//! Логгер для одного процесса: собирает структурированную запись
//! (уровень, теги, сообщение, данные) и отправляет её POST-запросом
//! на удалённый коллектор. Если коллектор не задан или недоступен,
//! запись печатается в консоль.
//!
//! ```no_run
//! use shiplog::{ginfo, Options};
//!
//! shiplog::init(Options::new("http://collector:8080/logs", "billing", "token"))?;
//! ginfo!(["db"], "pool ready", serde_json::json!({ "size": 4 }));
//! # Ok::<(), shiplog::LogError>(())
//! ```

mod console;
mod dispatch;
mod entry;
mod errors;
mod global;
mod level;
mod logger;
mod options;
mod system;

#[cfg(test)]
mod testutil;

pub use entry::{LogEntry, INTERNAL_TAG};
pub use errors::LogError;
pub use global::{
    critical, debug, error, fatal, global, info, init, init_from_env, init_with_console,
    is_initialized, warning,
};
pub use level::Severity;
pub use logger::{Logger, FATAL_EXIT_CODE};
pub use options::{Options, DEFAULT_TOKEN_HEADER};

// ===== Макросы =====
//
// Теги пишутся в квадратных скобках, данные необязательны:
// `info!(logger, ["db"], "pool ready")`
// `info!(logger, ["db"], "pool ready", json!({ "size": 4 }))`

#[doc(hidden)]
#[macro_export]
macro_rules! __shiplog_call {
    ($logger:expr, $method:ident, [$($tag:expr),*], $msg:expr) => {
        $logger.$method(
            &[$(::core::convert::AsRef::<str>::as_ref(&$tag)),*],
            ::core::convert::AsRef::<str>::as_ref(&$msg),
            ::core::option::Option::None::<()>,
        )
    };
    ($logger:expr, $method:ident, [$($tag:expr),*], $msg:expr, $data:expr) => {
        $logger.$method(
            &[$(::core::convert::AsRef::<str>::as_ref(&$tag)),*],
            ::core::convert::AsRef::<str>::as_ref(&$msg),
            ::core::option::Option::Some($data),
        )
    };
}

#[macro_export]
macro_rules! critical {
    ($logger:expr, [$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($logger, critical, [$($tag),*], $msg $(, $data)?)
    };
}
#[macro_export]
macro_rules! debug {
    ($logger:expr, [$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($logger, debug, [$($tag),*], $msg $(, $data)?)
    };
}
#[macro_export]
macro_rules! info {
    ($logger:expr, [$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($logger, info, [$($tag),*], $msg $(, $data)?)
    };
}
#[macro_export]
macro_rules! warning {
    ($logger:expr, [$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($logger, warning, [$($tag),*], $msg $(, $data)?)
    };
}
#[macro_export]
macro_rules! error {
    ($logger:expr, [$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($logger, error, [$($tag),*], $msg $(, $data)?)
    };
}
#[macro_export]
macro_rules! fatal {
    ($logger:expr, [$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($logger, fatal, [$($tag),*], $msg $(, $data)?)
    };
}

// ===== Глобальные макросы =====

#[macro_export]
macro_rules! gcritical {
    ([$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($crate::global(), critical, [$($tag),*], $msg $(, $data)?)
    };
}
#[macro_export]
macro_rules! gdebug {
    ([$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($crate::global(), debug, [$($tag),*], $msg $(, $data)?)
    };
}
#[macro_export]
macro_rules! ginfo {
    ([$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($crate::global(), info, [$($tag),*], $msg $(, $data)?)
    };
}
#[macro_export]
macro_rules! gwarning {
    ([$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($crate::global(), warning, [$($tag),*], $msg $(, $data)?)
    };
}
#[macro_export]
macro_rules! gerror {
    ([$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($crate::global(), error, [$($tag),*], $msg $(, $data)?)
    };
}
#[macro_export]
macro_rules! gfatal {
    ([$($tag:expr),* $(,)?], $msg:expr $(, $data:expr)? $(,)?) => {
        $crate::__shiplog_call!($crate::global(), fatal, [$($tag),*], $msg $(, $data)?)
    };
}
