// example_simple — логгер без коллектора: все записи идут в консоль

use serde_json::json;
use shiplog::{debug, error, info, warning, Logger};
use std::time::Duration;

const APP_NAME: &str = "example_simple";

fn main() {
    // 1. Инициализация: хост не задан, только консоль
    let logger = match Logger::console_only(APP_NAME) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[FATAL] Cannot initialize logger: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Основной код
    debug!(logger, ["startup"], "Application initialized successfully");
    info!(logger, ["data"], "Processing data block #1", json!({ "rows": 128 }));
    warning!(logger, ["data"], "Non-critical issue detected");
    error!(logger, [], "An error occurred, but we continue");

    // 3. Финальная часть: даём фоновым задачам дописать
    logger.flush(Duration::from_secs(2));
}
