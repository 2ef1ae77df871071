// src/logging/event_log.rs

use crate::logging::banner_log::{BannerEventKind, BannerLog};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::oneshot;
use tokio::task;
use tokio::time::{self, Duration};
use tracing::{debug, warn};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::MakeWriter;

const RETENTION_HOURS: u64 = 72;

enum Message {
    Record(BannerLog),
    Flush(oneshot::Sender<()>),
}

/// Banner event log.
///
/// Records are queued on an mpsc channel and written by a background task
/// in batches, one hourly-rolling JSON-lines file per event kind
/// (`{prefix}_load.json`, `{prefix}_click.json`).
pub struct EventLog {
    sender: Sender<Message>,
}

impl EventLog {
    /// - `log_dir`: directory the files go to
    /// - `file_prefix`: file name prefix
    /// - `buffer_size`: channel capacity
    /// - `batch_size`: records per kind buffered before a write
    /// - `flush_interval`: periodic flush, milliseconds
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        log_dir: &str,
        file_prefix: &str,
        buffer_size: usize,
        batch_size: usize,
        flush_interval: u64,
    ) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let files: HashMap<BannerEventKind, Arc<RollingFileAppender>> = BannerEventKind::ALL
            .iter()
            .map(|kind| {
                let file_name = format!("{}_{}.json", file_prefix, kind.name());
                (*kind, Arc::new(rolling::hourly(log_dir, file_name)))
            })
            .collect();
        tokio::spawn(Self::background_writer(files, receiver, batch_size, flush_interval));

        let log_dir = log_dir.to_string();
        tokio::spawn(async move {
            let mut hourly = time::interval(Duration::from_secs(3600));
            loop {
                hourly.tick().await;
                cleanup_old_logs(&log_dir, RETENTION_HOURS).await;
            }
        });

        Arc::new(Self { sender })
    }

    pub async fn record(&self, entry: BannerLog) {
        if let Err(e) = self.sender.send(Message::Record(entry)).await {
            warn!(error = %e, "banner event log is closed, record dropped");
        }
    }

    /// Writes every queued record to disk before returning.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(Message::Flush(ack)).await.is_ok() {
            let _ = done.await;
        }
    }

    async fn background_writer(
        files: HashMap<BannerEventKind, Arc<RollingFileAppender>>,
        mut receiver: Receiver<Message>,
        batch_size: usize,
        flush_interval: u64,
    ) {
        let mut buffers: HashMap<BannerEventKind, Vec<String>> = HashMap::new();
        let mut interval = time::interval(Duration::from_millis(flush_interval));
        loop {
            tokio::select! {
                message = receiver.recv() => match message {
                    Some(Message::Record(entry)) => {
                        let kind = entry.event;
                        let line = match serde_json::to_string(&entry) {
                            Ok(line) => line,
                            Err(e) => {
                                warn!(error = %e, "unserializable banner event");
                                continue;
                            }
                        };
                        let buffer = buffers.entry(kind).or_default();
                        buffer.push(line);
                        if buffer.len() >= batch_size {
                            if let Some(file) = files.get(&kind) {
                                write_lines(file.clone(), std::mem::take(buffer)).await;
                            }
                        }
                    }
                    Some(Message::Flush(ack)) => {
                        flush_all(&files, &mut buffers).await;
                        let _ = ack.send(());
                    }
                    None => {
                        flush_all(&files, &mut buffers).await;
                        break;
                    }
                },
                _ = interval.tick() => flush_all(&files, &mut buffers).await,
            }
        }
    }
}

async fn flush_all(
    files: &HashMap<BannerEventKind, Arc<RollingFileAppender>>,
    buffers: &mut HashMap<BannerEventKind, Vec<String>>,
) {
    for (kind, buffer) in buffers.iter_mut() {
        if buffer.is_empty() {
            continue;
        }
        if let Some(file) = files.get(kind) {
            write_lines(file.clone(), std::mem::take(buffer)).await;
        }
    }
}

async fn write_lines(file: Arc<RollingFileAppender>, lines: Vec<String>) {
    let content = lines.join("\n") + "\n";
    let written = task::spawn_blocking(move || {
        let mut writer = file.make_writer();
        writer.write_all(content.as_bytes())
    })
    .await;
    match written {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "failed to write banner events"),
        Err(e) => warn!(error = %e, "banner event writer panicked"),
    }
}

async fn cleanup_old_logs(log_dir: &str, retention_hours: u64) {
    use std::time::{Duration as StdDuration, SystemTime};
    let retention = StdDuration::from_secs(retention_hours * 3600);
    let now = SystemTime::now();
    let mut dir = match tokio::fs::read_dir(log_dir).await {
        Ok(dir) => dir,
        Err(e) => {
            warn!(log_dir, error = %e, "failed to read log directory");
            return;
        }
    };
    while let Ok(Some(entry)) = dir.next_entry().await {
        let path = entry.path();
        let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) else {
            continue;
        };
        if now.duration_since(modified).unwrap_or_default() > retention {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "deleted old log file"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to delete old log file"),
            }
        }
    }
}
