// example_remote — отправка на коллектор, настройки из окружения:
//   SHIPLOG_HOST=http://localhost:8080/logs SHIPLOG_SYSTEM=billing SHIPLOG_TOKEN=secret cargo run --bin example_remote
// Если коллектор недоступен, записи появятся в консоли в подробном виде.

use serde::Serialize;
use shiplog::{ginfo, gwarning};
use std::time::Duration;

#[derive(Serialize)]
struct Invoice {
    id: u64,
    amount_cents: i64,
    currency: &'static str,
}

fn main() {
    // 1. Инициализация глобального логгера
    if let Err(e) = shiplog::init_from_env() {
        eprintln!("[FATAL] Cannot initialize logger: {}", e);
        std::process::exit(1);
    }

    // Повторная инициализация отклоняется и логируется как ERROR
    let _ = shiplog::init_from_env();

    // 2. Основной код
    let invoice = Invoice {
        id: 42,
        amount_cents: 129_900,
        currency: "EUR",
    };
    ginfo!(["invoices"], "Invoice issued", invoice);
    gwarning!(["invoices", "fx"], "Exchange rate is stale");

    // 3. Финальная часть
    shiplog::global().flush(Duration::from_secs(10));
}
