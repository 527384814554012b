// example_tokio — логирование из асинхронных задач tokio через общий Logger

use serde_json::json;
use shiplog::{debug, error, warning, Logger, Options};
use std::sync::Arc;
use tokio::task;
use tokio::time::{sleep, Duration};

const APP_NAME: &str = "example_tokio";

// Асинхронный "воркер"
pub struct Worker {
    id: u32,
    log: Arc<Logger>,
}

impl Worker {
    pub fn new(id: u32, log: Arc<Logger>) -> Self {
        Self { id, log }
    }

    pub async fn run(&self) {
        let worker = format!("worker-{}", self.id);
        debug!(self.log, ["worker", worker], "Worker started (async)");

        // Имитация асинхронной работы
        sleep(Duration::from_millis(50 + (self.id as u64) * 100)).await;

        if self.id % 3 == 0 {
            warning!(self.log, ["worker", worker], "Worker has high priority task");
        }

        if self.id == 2 {
            error!(self.log, ["worker", worker], "Worker failed to process data", json!({ "batch": self.id }));
        }

        debug!(self.log, ["worker", worker], "Worker completed");
    }
}

#[tokio::main]
async fn main() {
    // 1. Инициализация: хост из окружения, иначе консоль
    let mut options = Options::from_env();
    options.system = APP_NAME.to_owned();
    let shared_logger = match Logger::new(options) {
        Ok(l) => Arc::new(l),
        Err(e) => {
            eprintln!("[FATAL] Cannot initialize logger: {}", e);
            std::process::exit(1);
        }
    };

    debug!(shared_logger, ["main"], "Tokio runtime initialized, spawning async tasks...");

    // 2. Основной код: несколько асинхронных задач
    let mut handles = vec![];
    for i in 0..5 {
        let logger_clone = Arc::clone(&shared_logger);
        handles.push(task::spawn(async move {
            Worker::new(i, logger_clone).run().await;
        }));
    }

    for h in handles {
        let _ = h.await;
    }

    debug!(shared_logger, ["main"], "All async tasks completed");

    // 3. Финальная часть: ждём доставку, не блокируя рантайм
    shared_logger.drained().await;
}
