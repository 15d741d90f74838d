//! File system watcher for live rebuild.
//!
//! Monitors the template, content and stylesheet directories, batches rapid
//! events with a debounce window, and feeds the surviving changes to the
//! [`Dispatcher`]. A change that fails to apply is logged and the loop keeps
//! watching; the site simply stays stale until the next event.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                     Event Loop                         │
//! │                                                        │
//! │  ┌──────────┐    ┌──────────┐    ┌──────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│ Dispatcher       │  │
//! │  │ events   │    │ (300ms)  │    │ (incremental ops)│  │
//! │  └──────────┘    └──────────┘    └──────────────────┘  │
//! └────────────────────────────────────────────────────────┘
//! ```

use crate::{
    dispatcher::{Change, ChangeKind, Dispatcher},
    log,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::RecvTimeoutError,
    },
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 300;
const IDLE_TIMEOUT_MS: u64 = 500;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Format path as relative to the input directory for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events, remembering the net change kind per path.
struct Debouncer {
    pending: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashMap::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Added,
            EventKind::Modify(_) => ChangeKind::Modified,
            EventKind::Remove(_) => ChangeKind::Deleted,
            _ => return,
        };
        for path in event.paths {
            if !is_temp_file(&path) {
                self.merge(path, kind);
            }
        }
        self.last_event = Some(Instant::now());
    }

    /// Collapse successive events on one path into their net effect.
    fn merge(&mut self, path: PathBuf, kind: ChangeKind) {
        use ChangeKind::{Added, Deleted, Modified};

        let merged = match (self.pending.get(&path).copied(), kind) {
            // Created and deleted within one window: nothing happened.
            (Some(Added), Deleted) => {
                self.pending.remove(&path);
                return;
            }
            (Some(Added), _) => Added,
            (Some(Deleted), Added) => Modified,
            (_, kind) => kind,
        };
        self.pending.insert(path, merged);
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<Change> {
        self.last_event = None;
        self.pending
            .drain()
            .map(|(path, kind)| Change { path, kind })
            .collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_millis(IDLE_TIMEOUT_MS)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handling
// =============================================================================

fn handle_changes(changes: &[Change], dispatcher: &mut Dispatcher, root: &Path) {
    for change in changes {
        let verb = match change.kind {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "changed",
            ChangeKind::Deleted => "deleted",
        };
        log!("watch"; "{verb} {}", rel_path(&change.path, root));

        if let Err(err) = dispatcher.dispatch(change) {
            log!("error"; "{err}");
        }
    }
    eprintln!(); // Blank line to separate rebuild sessions
}

// =============================================================================
// Watcher Setup
// =============================================================================

fn setup_watchers(watcher: &mut impl Watcher, dispatcher: &Dispatcher) -> Result<()> {
    let settings = &dispatcher.site().settings;
    let mut watched = vec![settings.template_dir(), settings.content_dir()];
    if let Some(sass_in) = settings.sass_in() {
        watched.push(sass_in);
    }

    let root = settings.input_dir.clone();
    let mut names = Vec::new();
    for path in watched {
        if !path.exists() {
            continue;
        }
        watcher
            .watch(&path, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        names.push(rel_path(&path, &root));
    }

    log!("watch"; "watching: {}", names.join(", "));
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Watch for changes and apply them until Ctrl+C. Blocks the calling thread.
pub fn watch_for_changes_blocking(mut dispatcher: Dispatcher) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, &dispatcher)?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let root = dispatcher.site().settings.input_dir.clone();
    let mut debouncer = Debouncer::new();

    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Ok(_)) => {}
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) => {
                if debouncer.ready() {
                    handle_changes(&debouncer.take(), &mut dispatcher, &root);
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    log!("watch"; "stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, path: &str) -> Event {
        let mut event = Event::new(kind);
        event.paths.push(PathBuf::from(path));
        event
    }

    fn create(path: &str) -> Event {
        event(EventKind::Create(notify::event::CreateKind::File), path)
    }

    fn modify(path: &str) -> Event {
        event(
            EventKind::Modify(notify::event::ModifyKind::Any),
            path,
        )
    }

    fn remove(path: &str) -> Event {
        event(EventKind::Remove(notify::event::RemoveKind::File), path)
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("a/.index.md.swp")));
        assert!(is_temp_file(Path::new("a/index.md~")));
        assert!(is_temp_file(Path::new("a/index.bak")));
        assert!(!is_temp_file(Path::new("a/index.md")));
    }

    #[test]
    fn test_debouncer_batches_and_filters() {
        let mut debouncer = Debouncer::new();
        debouncer.add(create("content/a.md"));
        debouncer.add(modify("content/a.md"));
        debouncer.add(create("content/.a.md.swp"));

        assert!(!debouncer.ready()); // Within the debounce window.
        let changes = debouncer.take();
        assert_eq!(changes.len(), 1);
        // Create followed by writes still reads as an addition.
        assert_eq!(changes[0].kind, ChangeKind::Added);
    }

    #[test]
    fn test_debouncer_cancels_create_delete_pair() {
        let mut debouncer = Debouncer::new();
        debouncer.add(create("content/tmp.md"));
        debouncer.add(remove("content/tmp.md"));
        assert!(debouncer.take().is_empty());
    }

    #[test]
    fn test_debouncer_delete_recreate_is_modify() {
        let mut debouncer = Debouncer::new();
        debouncer.add(remove("content/a.md"));
        debouncer.add(create("content/a.md"));

        let changes = debouncer.take();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Modified);
    }

    #[test]
    fn test_debouncer_timeout_switches_with_backlog() {
        let mut debouncer = Debouncer::new();
        assert_eq!(debouncer.timeout(), Duration::from_millis(IDLE_TIMEOUT_MS));
        debouncer.add(modify("content/a.md"));
        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));
    }
}
