use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Консоль в памяти для проверок вывода.
#[derive(Clone, Default)]
pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Ждёт появления `needle` в выводе, не блокируя рантайм теста.
    pub(crate) async fn wait_for(&self, needle: &str) -> bool {
        for _ in 0..100 {
            if self.contents().contains(needle) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
