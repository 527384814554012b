use crate::entry::INTERNAL_TAG;
use crate::errors::LogError;
use crate::level::Severity;
use crate::logger::{Logger, FATAL_EXIT_CODE};
use crate::options::Options;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::io::{self, Write};
use std::process;

const REINIT_MESSAGE: &str = "Trying to instantiate an already instantiated logger";
const UNINIT_MESSAGE: &str = "You need to instantiate the logger first";

// ===== Глобальный логгер =====

static GLOBAL_LOGGER: OnceCell<Logger> = OnceCell::new();

pub fn init(options: Options) -> Result<(), LogError> {
    init_with_console(options, io::stdout())
}

/// Настройки из переменных окружения, см. `Options::from_env`.
pub fn init_from_env() -> Result<(), LogError> {
    init_with_console(Options::from_env(), io::stdout())
}

/// Повторный вызов ничего не меняет: пишет ERROR с тегом `logging`
/// от уже активного логгера и возвращает `AlreadyInitialized`.
pub fn init_with_console<W: Write + Send + 'static>(options: Options, console: W) -> Result<(), LogError> {
    if let Some(active) = GLOBAL_LOGGER.get() {
        return Err(reject_reinit(active));
    }

    let logger = Logger::with_console(options, console)?;
    match GLOBAL_LOGGER.set(logger) {
        Ok(()) => Ok(()),
        // Проиграли гонку другому инициализатору
        Err(_rejected) => Err(reject_reinit(global())),
    }
}

fn reject_reinit(active: &Logger) -> LogError {
    active.report_to_system(Severity::Error, REINIT_MESSAGE);
    active.error(&[INTERNAL_TAG], REINIT_MESSAGE, None::<()>);
    LogError::AlreadyInitialized
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Активный глобальный логгер. Обращение до `init` завершает процесс.
pub fn global() -> &'static Logger {
    match GLOBAL_LOGGER.get() {
        Some(logger) => logger,
        None => {
            eprintln!("{}", UNINIT_MESSAGE);
            process::exit(FATAL_EXIT_CODE)
        }
    }
}

pub fn critical<D: Serialize + Send + 'static>(tags: &[&str], message: &str, data: Option<D>) {
    global().critical(tags, message, data);
}

pub fn debug<D: Serialize + Send + 'static>(tags: &[&str], message: &str, data: Option<D>) {
    global().debug(tags, message, data);
}

pub fn error<D: Serialize + Send + 'static>(tags: &[&str], message: &str, data: Option<D>) {
    global().error(tags, message, data);
}

pub fn info<D: Serialize + Send + 'static>(tags: &[&str], message: &str, data: Option<D>) {
    global().info(tags, message, data);
}

pub fn warning<D: Serialize + Send + 'static>(tags: &[&str], message: &str, data: Option<D>) {
    global().warning(tags, message, data);
}

pub fn fatal<D: Serialize + Send + 'static>(tags: &[&str], message: &str, data: Option<D>) -> ! {
    global().fatal(tags, message, data)
}
