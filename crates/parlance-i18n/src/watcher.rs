//! Reloads locales when files under the locale root change.

use crate::error::{I18nError, I18nResult};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Quiet period after the last change before reloading.
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches a locale directory and runs a reload callback on its own thread.
///
/// Only creation or modification of `.json` files triggers a reload. Bursts
/// of events are coalesced into a single call. Dropping the watcher stops it.
#[derive(Debug)]
pub struct LocaleWatcher {
    watcher: Option<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
}

impl LocaleWatcher {
    /// Starts watching `root` recursively.
    pub fn spawn<F>(root: &Path, reload: F) -> I18nResult<Self>
    where
        F: Fn() -> I18nResult<()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        let worker = thread::Builder::new()
            .name("parlance-locale-watcher".to_string())
            .spawn(move || run(&rx, &reload))
            .map_err(|e| I18nError::Watcher(notify::Error::io(e)))?;

        info!("Watching {} for locale changes", root.display());
        Ok(Self {
            watcher: Some(watcher),
            worker: Some(worker),
        })
    }

    /// Whether the watcher is still running.
    pub const fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Stops watching and waits for an in-flight reload to finish.
    pub fn close(&mut self) {
        // Dropping the notify watcher drops the channel sender, which ends the worker loop.
        if self.watcher.take().is_none() {
            return;
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Locale watcher thread panicked");
            }
        }
        debug!("Locale watcher stopped");
    }
}

impl Drop for LocaleWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

fn run(rx: &Receiver<notify::Result<Event>>, reload: &dyn Fn() -> I18nResult<()>) {
    while let Ok(event) = rx.recv() {
        if !is_locale_change(&event) {
            continue;
        }

        loop {
            match rx.recv_timeout(DEBOUNCE) {
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        info!("Locale files changed, reloading");
        if let Err(e) = reload() {
            error!("Failed to reload locales: {}", e);
        }
    }
}

fn is_locale_change(event: &notify::Result<Event>) -> bool {
    match event {
        Ok(event) => {
            matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
                && event
                    .paths
                    .iter()
                    .any(|path| path.extension().is_some_and(|ext| ext == "json"))
        }
        Err(e) => {
            warn!("Locale watcher error: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn event(kind: EventKind, path: &str) -> notify::Result<Event> {
        Ok(Event::new(kind).add_path(PathBuf::from(path)))
    }

    #[test]
    fn test_only_json_writes_count() {
        assert!(is_locale_change(&event(EventKind::Create(CreateKind::File), "/l/en.json")));
        assert!(is_locale_change(&event(EventKind::Modify(ModifyKind::Any), "/l/en/ui.json")));
        assert!(!is_locale_change(&event(EventKind::Modify(ModifyKind::Any), "/l/notes.txt")));
        assert!(!is_locale_change(&event(EventKind::Remove(RemoveKind::File), "/l/en.json")));
    }

    #[test]
    fn test_reloads_after_file_change() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut watcher = LocaleWatcher::spawn(dir.path(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        std::fs::write(dir.path().join("en.json"), r#"{"A": "a"}"#).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while calls.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(50));
        }
        assert!(calls.load(Ordering::SeqCst) >= 1);

        watcher.close();
        assert!(!watcher.is_running());
    }
}
