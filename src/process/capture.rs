// src/process/capture.rs

//! Concurrent draining of a child's stdout and stderr.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type Buffer = Arc<Mutex<String>>;

/// Readers attached to a child's pipes.
///
/// Each pipe is drained on its own Tokio task while the process runs, so a
/// process writing more than the OS pipe buffer never blocks on us.
pub(crate) struct OutputCapture {
    stdout: Buffer,
    stderr: Buffer,
    readers: Vec<JoinHandle<()>>,
}

impl OutputCapture {
    pub(crate) fn attach(child: &mut Child, label: &str) -> Self {
        let stdout = Buffer::default();
        let stderr = Buffer::default();
        let mut readers = Vec::with_capacity(2);

        if let Some(pipe) = child.stdout.take() {
            readers.push(spawn_reader(pipe, Arc::clone(&stdout), label, "stdout"));
        }
        if let Some(pipe) = child.stderr.take() {
            readers.push(spawn_reader(pipe, Arc::clone(&stderr), label, "stderr"));
        }

        Self {
            stdout,
            stderr,
            readers,
        }
    }

    /// Wait for both readers to hit end-of-file, at most `bound`, and return
    /// what was captured.
    ///
    /// A reader can outlive the process when an escaped descendant still holds
    /// the pipe open; such readers are aborted and their partial output kept.
    pub(crate) async fn finish(self, bound: Duration) -> (String, String) {
        for mut reader in self.readers {
            if tokio::time::timeout(bound, &mut reader).await.is_err() {
                warn!("output reader still open after process end; aborting it");
                reader.abort();
            }
        }

        (take(&self.stdout), take(&self.stderr))
    }
}

fn spawn_reader<R>(pipe: R, buffer: Buffer, label: &str, stream: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let label = label.to_string();
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut raw = Vec::new();

        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&raw);
                    debug!(cmd = %label, "{}: {}", stream, line.trim_end());
                    if let Ok(mut buf) = buffer.lock() {
                        buf.push_str(&line);
                    }
                }
                Err(e) => {
                    debug!(cmd = %label, error = %e, "{} reader stopped", stream);
                    break;
                }
            }
        }
    })
}

fn take(buffer: &Buffer) -> String {
    buffer
        .lock()
        .map(|mut buf| std::mem::take(&mut *buf))
        .unwrap_or_default()
}
