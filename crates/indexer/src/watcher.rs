use crate::error::{IndexerError, Result};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use script_summaries_extractor::DESCRIPTOR_EXTENSION;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time;

/// Receives the relevant paths of one burst of source changes
pub type ChangeCallback = Arc<dyn Fn(&[PathBuf]) + Send + Sync>;

/// Anything that can report "sources changed" to registered callbacks
pub trait SourceChangeNotifier {
    fn register(&mut self, callback: ChangeCallback);
}

#[derive(Debug, Clone, Copy)]
pub struct SourceWatcherConfig {
    /// Quiet period that closes a burst of events
    pub debounce: Duration,
    /// Poll interval for backends that poll
    pub poll_interval: Duration,
}

impl Default for SourceWatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Watches a scan root and reports bursts of `.cs` / descriptor changes
pub struct SourceWatcher {
    root: PathBuf,
    config: SourceWatcherConfig,
    callbacks: Vec<ChangeCallback>,
}

impl SourceChangeNotifier for SourceWatcher {
    fn register(&mut self, callback: ChangeCallback) {
        self.callbacks.push(callback);
    }
}

impl SourceWatcher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config: SourceWatcherConfig::default(),
            callbacks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SourceWatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Watch until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// Callbacks run on a blocking thread, one burst at a time; events arriving meanwhile
    /// are queued and form the next burst.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<notify::Result<Event>>(256);
        let mut watcher = create_fs_watcher(tx, self.config.poll_interval)?;
        watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| IndexerError::Other(format!("watch {}: {e}", self.root.display())))?;
        log::info!("Watching {} for script changes", self.root.display());

        let callbacks: Arc<[ChangeCallback]> = self.callbacks.into();
        loop {
            let first = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let mut pending = BTreeSet::new();
            collect_relevant(first, &mut pending);
            while let Ok(Some(event)) = time::timeout(self.config.debounce, rx.recv()).await {
                collect_relevant(event, &mut pending);
            }
            if pending.is_empty() {
                continue;
            }

            let paths: Vec<PathBuf> = pending.into_iter().collect();
            log::debug!("Source change burst: {paths:?}");
            let callbacks = Arc::clone(&callbacks);
            let dispatched = tokio::task::spawn_blocking(move || {
                for callback in callbacks.iter() {
                    callback(&paths);
                }
            })
            .await;
            if let Err(e) = dispatched {
                log::error!("Source change callback failed: {e}");
            }
        }

        log::info!("Stopped watching {}", self.root.display());
        Ok(())
    }
}

fn create_fs_watcher(
    sender: mpsc::Sender<notify::Result<Event>>,
    poll_interval: Duration,
) -> Result<RecommendedWatcher> {
    RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default().with_poll_interval(poll_interval),
    )
    .map_err(|e| IndexerError::Other(format!("create watcher: {e}")))
}

fn collect_relevant(event: notify::Result<Event>, pending: &mut BTreeSet<PathBuf>) {
    match event {
        Ok(event) => {
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            pending.extend(event.paths.into_iter().filter(|p| is_relevant(p)));
        }
        Err(e) => log::warn!("Watch error: {e}"),
    }
}

/// Sources and assembly descriptors; everything else is noise
pub fn is_relevant(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ext.eq_ignore_ascii_case("cs") || ext.eq_ignore_ascii_case(DESCRIPTOR_EXTENSION)
        })
}
