use crate::console::{Console, ConsoleLine};
use crate::entry::{LogEntry, INTERNAL_TAG};
use crate::errors::LogError;
use crate::level::Severity;
use crate::options::Options;
use crate::system::SystemLog;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::Serialize;
use std::future::Future;
use std::pin::pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

const ENCODE_FAILURE_MESSAGE: &str = "Could not post to log: \"data\" was not encodable - see local log";

/// Чем закончилась доставка одной записи.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// POST прошёл на транспортном уровне; статус ответа не проверяется.
    Remote,
    /// Запись ушла в консоль.
    Console { verbose: bool },
}

// ===== Адрес коллектора =====

/// Настройки коллектора как есть. Разбираются при каждой отправке:
/// кривой хост или токен дают сбой доставки, а не ошибку инициализации.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    host: String,
    token_header: String,
    token: String,
}

impl Target {
    /// `None`, если хост не задан.
    pub(crate) fn from_options(options: &Options) -> Option<Self> {
        if !options.has_remote() {
            return None;
        }
        Some(Target {
            host: options.host.trim().to_owned(),
            token_header: options.token_header.clone(),
            token: options.token.clone(),
        })
    }

    fn url(&self) -> Result<Url, LogError> {
        let url = Url::parse(&self.host).map_err(|_| LogError::InvalidHost(self.host.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LogError::InvalidHost(self.host.clone()));
        }
        Ok(url)
    }

    fn token_header(&self) -> Result<(HeaderName, HeaderValue), LogError> {
        let name = HeaderName::from_bytes(self.token_header.as_bytes())
            .map_err(|e| LogError::InvalidHeader(format!("{:?}: {}", self.token_header, e)))?;
        let value = HeaderValue::from_str(&self.token)
            .map_err(|e| LogError::InvalidHeader(format!("token for {}: {}", name, e)))?;
        Ok((name, value))
    }
}

// ===== Записи в полёте =====

/// Счётчик фоновых доставок. Обнуление будит и потоки (`wait_idle`),
/// и async-ожидающих (`idle`).
#[derive(Default)]
pub(crate) struct Pending {
    count: Mutex<usize>,
    drained: Condvar,
    drained_async: Notify,
}

impl Pending {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(self: &Arc<Self>) -> PendingGuard {
        *self.lock() += 1;
        PendingGuard(Arc::clone(self))
    }

    pub(crate) fn count(&self) -> usize {
        *self.lock()
    }

    /// Блокирует поток до обнуления счётчика. `false`, если вышел `timeout`.
    pub(crate) fn wait_idle(&self, timeout: Duration) -> bool {
        let count = self.lock();
        let (count, _) = self
            .drained
            .wait_timeout_while(count, timeout, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *count == 0
    }

    pub(crate) async fn idle(&self) {
        loop {
            let mut notified = pin!(self.drained_async.notified());
            // Подписываемся до проверки, чтобы не пропустить notify_waiters
            notified.as_mut().enable();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

struct PendingGuard(Arc<Pending>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut count = self.0.lock();
        *count -= 1;
        if *count == 0 {
            self.0.drained.notify_all();
            self.0.drained_async.notify_waiters();
        }
    }
}

// ===== Диспетчер =====

pub(crate) struct Dispatcher {
    system: String,
    target: Option<Target>,
    client: Client,
    console: Console,
    system_log: SystemLog,
    runtime: Handle,
    pending: Arc<Pending>,
}

impl Dispatcher {
    pub(crate) fn new(
        system: &str,
        target: Option<Target>,
        client: Client,
        console: Console,
        runtime: Handle,
    ) -> Self {
        Dispatcher {
            system: system.to_owned(),
            target,
            client,
            console,
            system_log: SystemLog::open(system),
            runtime,
            pending: Arc::new(Pending::default()),
        }
    }

    pub(crate) fn system(&self) -> &str {
        &self.system
    }

    pub(crate) fn console(&self) -> &Console {
        &self.console
    }

    pub(crate) fn system_log(&self) -> &SystemLog {
        &self.system_log
    }

    pub(crate) fn pending(&self) -> &Arc<Pending> {
        &self.pending
    }

    /// Запускает задачу в рантайме диспетчера и учитывает её до завершения.
    pub(crate) fn spawn<F>(&self, work: F) -> JoinHandle<Delivery>
    where
        F: Future<Output = Delivery> + Send + 'static,
    {
        let guard = self.pending.enter();
        self.runtime.spawn(async move {
            let _guard = guard;
            work.await
        })
    }

    /// Кодирует запись и доставляет её; любая неудача превращается в вывод в консоль.
    pub(crate) async fn dispatch<D: Serialize>(self: Arc<Self>, entry: LogEntry<D>) -> Delivery {
        let line = ConsoleLine::from_entry(&entry);
        match entry.encode() {
            Ok(body) => self.deliver(line, body).await,
            Err(err) => {
                self.console.write(&line, true);
                self.report_encode_failure(&LogError::Encode(err));
                Delivery::Console { verbose: true }
            }
        }
    }

    fn report_encode_failure(self: &Arc<Self>, err: &LogError) {
        self.system_log
            .report(Severity::Error, &format!("log entry dropped from remote path: {}", err));

        let notice = LogEntry::new(
            Severity::Error,
            &self.system,
            &[INTERNAL_TAG],
            ENCODE_FAILURE_MESSAGE,
            Some(err.to_string()),
        );
        let line = ConsoleLine::from_entry(&notice);
        match notice.encode() {
            Ok(body) => {
                let dispatcher = Arc::clone(self);
                let _ = self.spawn(async move { dispatcher.deliver(line, body).await });
            }
            Err(_) => self.console.write(&line, true),
        }
    }

    async fn deliver(&self, line: ConsoleLine, body: Vec<u8>) -> Delivery {
        let Some(ref target) = self.target else {
            self.console.write(&line, false);
            return Delivery::Console { verbose: false };
        };

        match self.post(target, body).await {
            Ok(()) => Delivery::Remote,
            Err(err) => {
                self.system_log.report(
                    Severity::Warning,
                    &format!("delivery to {} failed: {}", target.host, err),
                );
                self.console.write(&line, true);
                Delivery::Console { verbose: true }
            }
        }
    }

    async fn post(&self, target: &Target, body: Vec<u8>) -> Result<(), LogError> {
        let url = target.url()?;
        let (token_header, token) = target.token_header()?;
        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(token_header, token)
            .body(body)
            .send()
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::SharedBuf;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::net::TcpListener;
    use std::time::Duration;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(options: &Options, buf: &SharedBuf) -> Arc<Dispatcher> {
        let target = Target::from_options(options);
        Arc::new(Dispatcher::new(
            &options.system,
            target,
            Client::new(),
            Console::new(buf.clone()),
            Handle::current(),
        ))
    }

    fn entry<D>(data: Option<D>) -> LogEntry<D> {
        LogEntry::new(Severity::Error, "billing", &["db"], "connection lost", data)
    }

    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}/logs", port)
    }

    #[tokio::test]
    async fn no_host_writes_plain_line() {
        let buf = SharedBuf::default();
        let d = dispatcher(&Options::console_only("billing"), &buf);

        let delivery = d.dispatch(entry(Some(json!({ "retries": 3 })))).await;

        assert_eq!(delivery, Delivery::Console { verbose: false });
        let output = buf.contents();
        assert!(output.contains("ERROR - [billing, db] - connection lost\n"));
        assert!(!output.contains("retries"));
    }

    #[tokio::test]
    async fn remote_success_is_silent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "application/json"))
            .and(header("billes-log-token", "s3cr3t"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let buf = SharedBuf::default();
        let d = dispatcher(&Options::new(server.uri(), "billing", "s3cr3t"), &buf);

        let delivery = d.dispatch(entry(Some(json!({ "retries": 3 })))).await;

        assert_eq!(delivery, Delivery::Remote);
        assert!(buf.contents().is_empty());

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body,
            json!({
                "severity": "ERROR",
                "tags": ["billing", "db"],
                "message": "connection lost",
                "data": { "retries": 3 },
            })
        );
    }

    #[tokio::test]
    async fn error_status_is_not_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let buf = SharedBuf::default();
        let d = dispatcher(&Options::new(server.uri(), "billing", "t"), &buf);

        assert_eq!(d.dispatch(entry(None::<()>)).await, Delivery::Remote);
        assert!(buf.contents().is_empty());
    }

    #[tokio::test]
    async fn custom_token_header_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-collector-key", "k1"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let buf = SharedBuf::default();
        let options = Options::new(server.uri(), "billing", "k1").with_token_header("x-collector-key");
        let d = dispatcher(&options, &buf);

        assert_eq!(d.dispatch(entry(None::<()>)).await, Delivery::Remote);
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_verbose_line() {
        let buf = SharedBuf::default();
        let d = dispatcher(&Options::new(closed_port_url(), "billing", "t"), &buf);

        let delivery = d.dispatch(entry(Some(json!({ "retries": 3 })))).await;

        assert_eq!(delivery, Delivery::Console { verbose: true });
        assert!(buf
            .contents()
            .contains("ERROR - [billing, db] - connection lost\n {\"retries\":3}\n"));
    }

    #[tokio::test]
    async fn unencodable_payload_logs_entry_and_notice() {
        let buf = SharedBuf::default();
        let d = dispatcher(&Options::console_only("billing"), &buf);

        let mut data = HashMap::new();
        data.insert((1u8, 2u8), "pair");
        let delivery = Arc::clone(&d).dispatch(entry(Some(data))).await;

        assert_eq!(delivery, Delivery::Console { verbose: true });
        assert!(buf.contents().contains("ERROR - [billing, db] - connection lost\n <unencodable:"));
        assert!(
            buf.wait_for("ERROR - [billing, logging] - Could not post to log").await,
            "missing encode failure notice: {}",
            buf.contents()
        );
        tokio::time::timeout(Duration::from_secs(5), d.pending().idle())
            .await
            .unwrap();
        assert_eq!(d.pending().count(), 0);
    }

    #[tokio::test]
    async fn encode_failure_notice_goes_to_collector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let buf = SharedBuf::default();
        let d = dispatcher(&Options::new(server.uri(), "billing", "t"), &buf);

        let mut data = HashMap::new();
        data.insert((1u8, 2u8), "pair");
        Arc::clone(&d).dispatch(entry(Some(data))).await;

        let mut notice = None;
        for _ in 0..100 {
            if let Some(request) = server.received_requests().await.unwrap().first() {
                notice = Some(serde_json::from_slice::<Value>(&request.body).unwrap());
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let notice = notice.expect("notice never reached the collector");
        assert_eq!(notice["severity"], "ERROR");
        assert_eq!(notice["tags"], json!(["billing", "logging"]));
        assert!(buf.contents().contains("connection lost\n <unencodable:"));
    }

    #[tokio::test]
    async fn non_http_host_falls_back_at_send_time() {
        for host in ["ftp://collector/logs", "not a url", "collector.local:8080"] {
            let buf = SharedBuf::default();
            let d = dispatcher(&Options::new(host, "billing", "t"), &buf);

            let delivery = d.dispatch(entry(Some(json!({ "retries": 3 })))).await;

            assert_eq!(delivery, Delivery::Console { verbose: true }, "host {:?}", host);
            assert!(buf.contents().contains("connection lost\n {\"retries\":3}"));
        }
    }

    #[tokio::test]
    async fn bad_header_material_falls_back_at_send_time() {
        let bad_token = Options::new("http://127.0.0.1:9/logs", "billing", "line\nbreak");
        let bad_name = Options::new("http://127.0.0.1:9/logs", "billing", "t").with_token_header("bad header");
        for options in [bad_token, bad_name] {
            let buf = SharedBuf::default();
            let d = dispatcher(&options, &buf);

            assert_eq!(d.dispatch(entry(None::<()>)).await, Delivery::Console { verbose: true });
            assert!(buf.contents().contains("ERROR - [billing, db] - connection lost\n null"));
        }
    }

    #[test]
    fn send_time_resolution_reports_the_cause() {
        let target = Target::from_options(&Options::new("ftp://collector/logs", "billing", "t")).unwrap();
        assert!(matches!(target.url(), Err(LogError::InvalidHost(_))));

        let target = Target::from_options(&Options::new("http://collector", "billing", "a\nb")).unwrap();
        assert!(target.url().is_ok());
        assert!(matches!(target.token_header(), Err(LogError::InvalidHeader(_))));
    }

    #[test]
    fn blank_host_has_no_target() {
        assert!(Target::from_options(&Options::console_only("billing")).is_none());
    }

    #[test]
    fn pending_wait_wakes_when_last_guard_drops() {
        let pending = Arc::new(Pending::default());
        let first = pending.enter();
        let second = pending.enter();
        assert_eq!(pending.count(), 2);
        assert!(!pending.wait_idle(Duration::from_millis(20)));

        let waiter = {
            let pending = Arc::clone(&pending);
            std::thread::spawn(move || pending.wait_idle(Duration::from_secs(5)))
        };
        drop(first);
        drop(second);
        assert!(waiter.join().unwrap());
        assert_eq!(pending.count(), 0);
    }
}
