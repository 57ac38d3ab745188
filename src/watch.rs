use std::{fs, path::PathBuf, time::Duration};

use async_watcher::{
    AsyncDebouncer,
    notify::{EventKind, RecursiveMode},
};
use iced::{
    futures::{SinkExt, Stream},
    stream,
};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

const DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug)]
pub enum WatchMessage {
    StartWatch(PathBuf),
    StopWatch(PathBuf),
}

#[derive(Debug, Clone)]
pub enum WatchNotification {
    Ready(mpsc::Sender<WatchMessage>),
    Changed(PathBuf),
}

/// Watches opened documents and reports modifications so their outline can be fetched again.
pub fn file_watcher() -> impl Stream<Item = WatchNotification> {
    stream::channel(100, |mut output| async move {
        let (sender, mut receiver) = mpsc::channel(100);
        let _ = output.send(WatchNotification::Ready(sender)).await;

        let (mut debouncer, mut file_events) =
            match AsyncDebouncer::new_with_channel(DEBOUNCE, Some(DEBOUNCE)).await {
                Ok(watcher) => watcher,
                Err(e) => {
                    error!("Could not start the file watcher: {e:?}");
                    return;
                }
            };

        loop {
            tokio::select! {
                Some(msg) = receiver.recv() => {
                    let result = match msg {
                        WatchMessage::StartWatch(path) => fs::canonicalize(&path)
                            .map_err(|e| e.to_string())
                            .and_then(|p| {
                                debouncer
                                    .watcher()
                                    .watch(&p, RecursiveMode::NonRecursive)
                                    .map_err(|e| e.to_string())
                            }),
                        WatchMessage::StopWatch(path) => fs::canonicalize(&path)
                            .map_err(|e| e.to_string())
                            .and_then(|p| debouncer.watcher().unwatch(&p).map_err(|e| e.to_string())),
                    };
                    if let Err(e) = result {
                        warn!("File watcher request failed: {e}");
                    }
                }
                Some(file_event) = file_events.recv() => {
                    match file_event {
                        Ok(events) => {
                            for e in &events {
                                if let EventKind::Modify(_) = e.event.kind
                                    && let Some(path) = e.event.paths.first()
                                {
                                    debug!("{path:?} modified");
                                    let _ = output.send(WatchNotification::Changed(path.clone())).await;
                                }
                            }
                        }
                        Err(errors) => {
                            for e in errors {
                                error!("File watcher error: {e}");
                            }
                        }
                    }
                }
                else => {
                    error!("File watcher channels closed");
                    break;
                }
            }
        }
    })
}
