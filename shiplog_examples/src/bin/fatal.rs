// example_fatal — фатальная ошибка: запись доставляется синхронно,
// печатается в подробном виде, процесс завершается с кодом 1

use shiplog::{gfatal, ginfo, Options};

const APP_NAME: &str = "example_fatal";

fn main() {
    if let Err(e) = shiplog::init(Options::console_only(APP_NAME)) {
        eprintln!("[FATAL] Cannot initialize logger: {}", e);
        std::process::exit(1);
    }

    ginfo!(["db"], "Connecting to primary");

    // Имитация потери соединения
    let connected = false;
    if !connected {
        gfatal!(["db"], "connection lost", serde_json::json!({ "host": "db-primary:5432" }));
    }

    // Не достигается
    ginfo!(["db"], "This will not be logged");
}
