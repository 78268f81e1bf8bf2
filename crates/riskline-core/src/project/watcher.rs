//! File watching and debouncing for edit-triggered highlight cycles.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::RisklineError;

/// Watches a path for file system changes and sends events through a channel.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    pub path: PathBuf,
    pub kind: FileChangeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileChangeKind {
    Created,
    Modified,
    Removed,
}

impl FileWatcher {
    /// Start watching a path. Returns a receiver for file change events.
    pub fn watch(
        path: &Path,
    ) -> Result<(Self, mpsc::UnboundedReceiver<FileChangeEvent>), RisklineError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                if let Ok(event) = result {
                    let kind = match &event.kind {
                        notify::EventKind::Create(_) => FileChangeKind::Created,
                        notify::EventKind::Modify(_) => FileChangeKind::Modified,
                        notify::EventKind::Remove(_) => FileChangeKind::Removed,
                        _ => return,
                    };

                    for path in event.paths {
                        let _ = tx.send(FileChangeEvent {
                            path,
                            kind: kind.clone(),
                        });
                    }
                }
            },
            Config::default(),
        )
        .map_err(|e| RisklineError::Watch(format!("failed to create watcher: {e}")))?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| RisklineError::Watch(format!("failed to watch path: {e}")))?;

        Ok((Self { _watcher: watcher }, rx))
    }
}

/// Trailing-edge debouncer: every `note()` re-arms the deadline, so a burst
/// of events collapses into a single firing once the burst pauses.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Records an event and pushes the deadline out by the full delay.
    pub fn note(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// The armed deadline, for driving a timer in a select loop.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the armed deadline has passed; disarms on firing.
    pub fn fire(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::time::{sleep, timeout};

    #[test]
    fn test_debouncer_starts_disarmed() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.fire());
    }

    #[test]
    fn test_debouncer_fires_after_delay() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.note();
        assert!(debouncer.is_pending());
        assert!(!debouncer.fire());
        std::thread::sleep(Duration::from_millis(20));
        assert!(debouncer.fire());
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_debouncer_coalesces_bursts() {
        let mut debouncer = Debouncer::new(Duration::from_millis(30));
        debouncer.note();
        std::thread::sleep(Duration::from_millis(15));
        debouncer.note();
        // First deadline would have passed by now; the re-arm pushed it out.
        std::thread::sleep(Duration::from_millis(20));
        assert!(!debouncer.fire());
        std::thread::sleep(Duration::from_millis(15));
        assert!(debouncer.fire());
        // The burst fired exactly once.
        assert!(!debouncer.fire());
    }

    #[tokio::test]
    async fn test_watcher_detects_modification() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("tracked.rs");
        std::fs::write(&file, "fn main() {}\n").unwrap();

        let (_watcher, mut rx) = FileWatcher::watch(tmp.path()).unwrap();
        sleep(Duration::from_millis(100)).await;

        std::fs::write(&file, "fn main() { /* edited */ }\n").unwrap();

        let event = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timeout waiting for event")
            .expect("no event received");

        assert!(event.path.ends_with("tracked.rs"));
    }
}
