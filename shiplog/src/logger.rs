use crate::console::{Console, ConsoleLine};
use crate::dispatch::{Delivery, Dispatcher, Target};
use crate::entry::LogEntry;
use crate::errors::LogError;
use crate::level::Severity;
use crate::options::Options;
use reqwest::Client;
use serde::Serialize;
use std::io::Write;
use std::process;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};

pub const FATAL_EXIT_CODE: i32 = 1;

const DISPATCH_THREADS: usize = 2;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

// ===== Основной логгер =====

/// Логгер с собственным рантаймом доставки.
///
/// Все уровни, кроме `fatal`, возвращают управление сразу: запись собирается
/// синхронно, а кодирование и отправка уходят в фоновую задачу.
pub struct Logger {
    options: Options,
    dispatcher: Arc<Dispatcher>,
    runtime: Option<Runtime>,
}

impl Logger {
    pub fn new(options: Options) -> Result<Self, LogError> {
        Self::build(options, Console::stdout())
    }

    pub fn console_only(system: &str) -> Result<Self, LogError> {
        Self::new(Options::console_only(system))
    }

    /// То же, что `new`, но консольный вывод идёт в `console` вместо stdout.
    pub fn with_console<W: Write + Send + 'static>(options: Options, console: W) -> Result<Self, LogError> {
        Self::build(options, Console::new(console))
    }

    fn build(options: Options, console: Console) -> Result<Self, LogError> {
        // Кривой хост или токен не ошибка: такие записи уйдут в консоль при отправке
        let target = Target::from_options(&options);
        let client = Client::builder().build()?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(DISPATCH_THREADS)
            .thread_name("shiplog-dispatch")
            .enable_all()
            .build()?;

        let dispatcher = Dispatcher::new(
            &options.system,
            target,
            client,
            console,
            runtime.handle().clone(),
        );

        Ok(Logger {
            options,
            dispatcher: Arc::new(dispatcher),
            runtime: Some(runtime),
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn system(&self) -> &str {
        self.dispatcher.system()
    }

    /// Собирает запись с тегом системы впереди.
    pub fn entry<D>(&self, severity: Severity, tags: &[&str], message: &str, data: Option<D>) -> LogEntry<D> {
        LogEntry::new(severity, self.system(), tags, message, data)
    }

    pub fn log<D>(&self, severity: Severity, tags: &[&str], message: &str, data: Option<D>)
    where
        D: Serialize + Send + 'static,
    {
        let entry = self.entry(severity, tags, message, data);
        let dispatcher = Arc::clone(&self.dispatcher);
        let _ = self.dispatcher.spawn(dispatcher.dispatch(entry));
    }

    pub fn critical<D: Serialize + Send + 'static>(&self, tags: &[&str], message: &str, data: Option<D>) {
        self.log(Severity::Critical, tags, message, data);
    }

    pub fn debug<D: Serialize + Send + 'static>(&self, tags: &[&str], message: &str, data: Option<D>) {
        self.log(Severity::Debug, tags, message, data);
    }

    pub fn error<D: Serialize + Send + 'static>(&self, tags: &[&str], message: &str, data: Option<D>) {
        self.log(Severity::Error, tags, message, data);
    }

    pub fn info<D: Serialize + Send + 'static>(&self, tags: &[&str], message: &str, data: Option<D>) {
        self.log(Severity::Info, tags, message, data);
    }

    pub fn warning<D: Serialize + Send + 'static>(&self, tags: &[&str], message: &str, data: Option<D>) {
        self.log(Severity::Warning, tags, message, data);
    }

    /// Синхронно доставляет CRITICAL-запись, печатает её в подробном виде
    /// и завершает процесс с кодом `FATAL_EXIT_CODE`.
    pub fn fatal<D: Serialize + Send + 'static>(&self, tags: &[&str], message: &str, data: Option<D>) -> ! {
        self.report_fatal(tags, message, data);
        process::exit(FATAL_EXIT_CODE)
    }

    pub(crate) fn report_fatal<D>(&self, tags: &[&str], message: &str, data: Option<D>)
    where
        D: Serialize + Send + 'static,
    {
        let entry = self.entry(Severity::Critical, tags, message, data);
        let line = ConsoleLine::from_entry(&entry);

        let (tx, rx) = mpsc::channel();
        let dispatcher = Arc::clone(&self.dispatcher);
        let _ = self.dispatcher.spawn(async move {
            let delivery = dispatcher.dispatch(entry).await;
            let _ = tx.send(delivery);
            delivery
        });

        // Подробная строка печатается ровно один раз
        match rx.recv() {
            Ok(Delivery::Console { verbose: true }) => {}
            _ => self.dispatcher.console().write(&line, true),
        }

        // Дальше процесс завершится: дописываем уведомление о кодировании и прочие записи
        self.flush(DRAIN_TIMEOUT);
    }

    /// Сколько записей ещё не доставлено.
    pub fn pending(&self) -> usize {
        self.dispatcher.pending().count()
    }

    /// Блокирует поток, пока фоновые доставки не закончатся или не выйдет `timeout`.
    /// Возвращает `true`, если очередь опустела.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.dispatcher.pending().wait_idle(timeout)
    }

    /// Async-вариант `flush` без таймаута: не блокирует рантайм вызывающего.
    pub async fn drained(&self) {
        self.dispatcher.pending().idle().await
    }

    pub(crate) fn report_to_system(&self, severity: Severity, message: &str) {
        self.dispatcher.system_log().report(severity, message);
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        let pending = Arc::clone(self.dispatcher.pending());

        if Handle::try_current().is_err() {
            pending.wait_idle(DRAIN_TIMEOUT);
            runtime.shutdown_background();
            return;
        }

        // Внутри async-контекста блокироваться нельзя: рантайм доживает
        // в отдельном потоке, пока не допишутся записи
        thread::spawn(move || {
            pending.wait_idle(DRAIN_TIMEOUT);
            runtime.shutdown_background();
        });
    }
}
