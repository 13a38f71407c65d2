//! Temp artifact registry and background reaper
//!
//! Every transient file the pipeline creates is tracked in a [`TempRegistry`]
//! and eventually deleted by the [`Reaper`]: a work-queue worker that waits a
//! fixed delay, then attempts deletion with a fixed number of retries.
//! Exhausted retries are logged and the entry stays tracked, so a later
//! startup sweep can still collect it.
//!
//! The registry can mirror its contents to a journal file (one path per
//! line). With a journal the startup [`TempRegistry::sweep`] removes files
//! left behind by a crashed previous run; without one the sweep has nothing
//! to look at.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::error::SpeechError;

/// Process-wide set of transient file paths
///
/// Cloning is cheap; all clones share the same underlying set.
#[derive(Debug, Clone, Default)]
pub struct TempRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    paths: Mutex<HashSet<PathBuf>>,
    journal: Option<PathBuf>,
}

impl TempRegistry {
    /// Create a purely in-memory registry
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Create a registry backed by a journal file
    ///
    /// Paths recorded by a previous run are loaded back into the set so the
    /// startup sweep can delete them.
    #[must_use]
    pub fn with_journal(journal: impl Into<PathBuf>) -> Self {
        let journal = journal.into();

        let paths: HashSet<PathBuf> = match std::fs::read_to_string(&journal) {
            Ok(contents) => contents
                .lines()
                .filter(|line| !line.is_empty())
                .map(PathBuf::from)
                .collect(),
            Err(_) => HashSet::new(),
        };

        if !paths.is_empty() {
            info!(
                journal = %journal.display(),
                entries = paths.len(),
                "Recovered tracked temp files from journal"
            );
        }

        Self {
            inner: Arc::new(RegistryInner {
                paths: Mutex::new(paths),
                journal: Some(journal),
            }),
        }
    }

    /// Track a transient file
    pub fn add(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.inner.paths.lock().insert(path);
        self.flush_journal();
    }

    /// Stop tracking a transient file
    pub fn remove(&self, path: &Path) {
        self.inner.paths.lock().remove(path);
        self.flush_journal();
    }

    /// Whether a path is currently tracked
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.inner.paths.lock().contains(path)
    }

    /// Snapshot of all tracked paths
    #[must_use]
    pub fn tracked(&self) -> Vec<PathBuf> {
        self.inner.paths.lock().iter().cloned().collect()
    }

    /// Number of tracked paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.paths.lock().len()
    }

    /// Whether nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.paths.lock().is_empty()
    }

    /// Synchronously delete every tracked path from a prior run
    ///
    /// Called once at startup. Deletion failures are logged and the entry is
    /// kept; already-absent files are simply untracked.
    pub fn sweep(&self) {
        for path in self.tracked() {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "Purged temp file on startup");
                    self.remove(&path);
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    self.remove(&path);
                },
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Error purging temp file on startup");
                },
            }
        }
    }

    /// Rewrite the journal to match the in-memory set
    fn flush_journal(&self) {
        let Some(journal) = &self.inner.journal else {
            return;
        };

        let contents = {
            let paths = self.inner.paths.lock();
            let mut lines: Vec<&str> = paths
                .iter()
                .filter_map(|p| p.to_str())
                .collect();
            lines.sort_unstable();
            lines.join("\n")
        };

        if let Err(e) = std::fs::write(journal, contents) {
            warn!(journal = %journal.display(), error = %e, "Failed to write registry journal");
        }
    }
}

/// Background deletion worker
///
/// Scheduled paths are handed to a single worker task that spawns one
/// delete job per path into a `JoinSet`, with concurrency bounded by a
/// semaphore. [`Reaper::shutdown`] closes the queue and drains outstanding
/// jobs deterministically.
#[derive(Debug)]
pub struct Reaper {
    tx: Mutex<Option<mpsc::UnboundedSender<PathBuf>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Reaper {
    /// Spawn the reaper worker
    ///
    /// `delay` is slept before every deletion attempt; each path gets up to
    /// `retries` attempts. At most `max_concurrent` delete jobs run at once.
    #[must_use]
    pub fn spawn(
        registry: TempRegistry,
        delay: Duration,
        retries: u32,
        max_concurrent: usize,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<PathBuf>();
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

        let worker = tokio::spawn(async move {
            let mut jobs = JoinSet::new();
            loop {
                tokio::select! {
                    msg = rx.recv() => match msg {
                        Some(path) => {
                            let registry = registry.clone();
                            let semaphore = Arc::clone(&semaphore);
                            jobs.spawn(async move {
                                let _permit = semaphore.acquire_owned().await;
                                reap_one(&registry, &path, delay, retries).await;
                            });
                        },
                        None => break,
                    },
                    Some(_) = jobs.join_next(), if !jobs.is_empty() => {},
                }
            }
            // Queue closed: drain outstanding jobs before exiting
            while jobs.join_next().await.is_some() {}
        });

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Schedule a path for delayed deletion
    pub fn schedule(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let sent = self
            .tx
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(path.clone()).is_ok());
        if sent {
            debug!(path = %path.display(), "Scheduled temp file for deletion");
        } else {
            warn!(path = %path.display(), "Reaper is shut down, temp file not scheduled");
        }
    }

    /// Close the queue and wait for all outstanding deletions
    pub async fn shutdown(&self) {
        drop(self.tx.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(error = %e, "Reaper worker did not shut down cleanly");
            }
        }
    }
}

/// Delete one path with delay and retries
async fn reap_one(registry: &TempRegistry, path: &Path, delay: Duration, retries: u32) {
    let mut last_error = String::new();

    for attempt in 1..=retries.max(1) {
        tokio::time::sleep(delay).await;

        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                registry.remove(path);
                debug!(path = %path.display(), attempt, "Deleted temporary file");
                return;
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                registry.remove(path);
                return;
            },
            Err(e) => {
                last_error = e.to_string();
                error!(path = %path.display(), attempt, error = %e, "Error deleting temp file");
            },
        }
    }

    // Entry stays tracked so a later startup sweep can still collect it
    let err = SpeechError::Cleanup {
        path: path.display().to_string(),
        reason: last_error,
    };
    error!(%err, "Giving up on temp file after {retries} attempts");
}
